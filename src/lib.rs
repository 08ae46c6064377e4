// Festival Manager - CRUD service for festivals and their scheduled events

pub mod app_state;
pub mod config;
pub mod error;
pub mod models;
pub mod seed;
pub mod service;
pub mod store;

// Re-exports for convenience
pub use error::{AppError, AppResult};
