// Festival Manager API server

use axum::Router;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;

use festival_manager::{app_state::AppState, config::Config, seed::seed_demo_data, service::create_router};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    // Load configuration
    let config = Config::from_env()?;

    // Initialize application state
    let state = AppState::new(config.clone()).await?;

    if config.seed_demo {
        seed_demo_data(&state.service).await?;
    }

    // Build main application router
    let app = Router::new()
        .nest("/api", create_router(state.service.clone()))
        .layer(CorsLayer::permissive());

    // Start server
    let addr: SocketAddr = config.server_address().parse()?;
    println!("Festival Manager API starting on http://{}", addr);
    println!("  GET    /api/festivals           - List festivals with events");
    println!("  POST   /api/festivals           - Create festival");
    println!("  GET    /api/festivals/{{id}}      - Get festival");
    println!("  PUT    /api/festivals/{{id}}      - Update festival");
    println!("  DELETE /api/festivals/{{id}}      - Delete festival (rejected while events exist)");
    println!("  GET    /api/events?festivalId=  - List events");
    println!("  POST   /api/events              - Create event");
    println!("  GET    /api/events/{{id}}         - Get event");
    println!("  PUT    /api/events/{{id}}         - Update event");
    println!("  DELETE /api/events/{{id}}         - Delete event");

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
