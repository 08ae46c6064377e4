// Demo data for local development, enabled with SEED_DEMO=1.

use chrono::{DateTime, NaiveDate, Utc};

use crate::{
    models::{NewEvent, NewFestival},
    service::FestivalService,
};

pub async fn seed_demo_data(service: &FestivalService) -> anyhow::Result<()> {
    // Restarting against a persistent database must not duplicate the data.
    if !service.list_festivals(Utc::now()).await?.is_empty() {
        tracing::info!("demo data already present, skipping seed");
        return Ok(());
    }

    let summer = service
        .create_festival(NewFestival {
            name: "Summer Music Festival".into(),
            kind: "Music".into(),
            description: Some("Annual summer music festival featuring various artists".into()),
            start_date: "2023-07-15".parse::<NaiveDate>()?,
            end_date: "2023-07-17".parse::<NaiveDate>()?,
            location: "Central Park, New York".into(),
            is_active: true,
        })
        .await?;

    let tech = service
        .create_festival(NewFestival {
            name: "Tech Conference 2023".into(),
            kind: "Technology".into(),
            description: Some("Leading technology conference with industry experts".into()),
            start_date: "2023-09-20".parse::<NaiveDate>()?,
            end_date: "2023-09-22".parse::<NaiveDate>()?,
            location: "Moscone Center, San Francisco".into(),
            is_active: true,
        })
        .await?;

    let expo = service
        .create_festival(NewFestival {
            name: "Food & Wine Expo".into(),
            kind: "Food & Drink".into(),
            description: Some("Experience the finest food and wine from around the world".into()),
            start_date: "2023-10-10".parse::<NaiveDate>()?,
            end_date: "2023-10-12".parse::<NaiveDate>()?,
            location: "McCormick Place, Chicago".into(),
            is_active: true,
        })
        .await?;

    let events = [
        (
            "Opening Concert",
            "Kick-off concert with headlining artists",
            "2023-07-15T18:00:00Z",
            "2023-07-15T23:00:00Z",
            "Main Stage",
            10_000,
            summer.id,
        ),
        (
            "Indie Showcase",
            "Showcasing up-and-coming indie artists",
            "2023-07-16T14:00:00Z",
            "2023-07-16T18:00:00Z",
            "Indie Stage",
            2_000,
            summer.id,
        ),
        (
            "Keynote: Future of AI",
            "Opening keynote on artificial intelligence trends",
            "2023-09-20T09:00:00Z",
            "2023-09-20T10:30:00Z",
            "Grand Ballroom",
            5_000,
            tech.id,
        ),
        (
            "Blockchain Workshop",
            "Hands-on workshop on blockchain development",
            "2023-09-21T13:00:00Z",
            "2023-09-21T16:00:00Z",
            "Workshop Room A",
            50,
            tech.id,
        ),
        (
            "Wine Tasting Masterclass",
            "Learn about wine varieties and tasting techniques",
            "2023-10-10T11:00:00Z",
            "2023-10-10T13:00:00Z",
            "Tasting Room 1",
            30,
            expo.id,
        ),
        (
            "Celebrity Chef Demo",
            "Live cooking demonstration by a celebrity chef",
            "2023-10-11T15:00:00Z",
            "2023-10-11T17:00:00Z",
            "Main Stage",
            200,
            expo.id,
        ),
    ];

    for (name, description, start, end, location, capacity, festival_id) in events {
        service
            .create_event(NewEvent {
                name: name.into(),
                description: Some(description.into()),
                start_time: start.parse::<DateTime<Utc>>()?,
                end_time: end.parse::<DateTime<Utc>>()?,
                location: location.into(),
                capacity,
                festival_id,
            })
            .await?;
    }

    tracing::info!("seeded 3 demo festivals and 6 demo events");
    Ok(())
}
