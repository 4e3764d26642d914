use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::EnvFilter;

use bookflow::config::AppConfig;
use bookflow::db;
use bookflow::services::actions::ActionBus;
use bookflow::services::flows::FlowRegistry;
use bookflow::services::profile_provider::HttpProfileProvider;
use bookflow::services::schedule::{OpenSchedule, ScheduleSource, SqliteSchedule};
use bookflow::services::submission::{BookingSink, SqliteSink, WebhookSink};
use bookflow::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = AppConfig::from_env();

    let (sink, schedule) = match &config.booking_webhook_url {
        Some(url) => {
            tracing::info!(url = %url, signed = config.booking_webhook_secret.is_some(), "completing bookings via webhook");
            (
                Box::new(WebhookSink::new(url.clone(), config.booking_webhook_secret.clone()))
                    as Box<dyn BookingSink>,
                Box::new(OpenSchedule) as Box<dyn ScheduleSource>,
            )
        }
        None => {
            tracing::info!(path = %config.database_url, "storing bookings in SQLite");
            let db = db::init_shared(&config.database_url)?;
            (
                Box::new(SqliteSink::new(db.clone())) as Box<dyn BookingSink>,
                Box::new(SqliteSchedule::new(db)) as Box<dyn ScheduleSource>,
            )
        }
    };

    match &config.business_hours {
        Some(hours) => tracing::info!(hours = %hours.to_human_readable(), "business hours loaded"),
        None => tracing::info!(
            start = %config.calendar.day_start,
            end = %config.calendar.day_end,
            "no BUSINESS_HOURS set, every bookable day uses the default window"
        ),
    }

    let state = Arc::new(AppState {
        profiles: Box::new(HttpProfileProvider::new(config.profile_api_url.clone())),
        config: config.clone(),
        flows: FlowRegistry::with_idle_timeout(config.flow_idle_timeout),
        sink,
        schedule,
        actions: ActionBus::new(),
    });

    // Background sweep of abandoned booking flows.
    let sweeper = state.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(60));
        loop {
            interval.tick().await;
            match sweeper.flows.evict_idle() {
                Ok(0) => {}
                Ok(evicted) => tracing::info!(evicted, remaining = sweeper.flows.len(), "swept idle booking flows"),
                Err(e) => tracing::error!(error = %e, "idle flow sweep failed"),
            }
        }
    });

    let app = bookflow::build_router(state);

    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("starting server on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
