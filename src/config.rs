use std::env;
use std::time::Duration;

use chrono::Weekday;

use crate::models::availability::{parse_time, parse_weekday};
use crate::models::Availability;
use crate::services::calendar::CalendarSettings;
use crate::services::flows::DEFAULT_IDLE_TIMEOUT;

/// Upper bound for `BOOKING_WINDOW_DAYS`. Larger windows are rejected.
pub const MAX_WINDOW_DAYS: u32 = 365;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub port: u16,
    pub database_url: String,
    pub booking_webhook_url: Option<String>,
    pub booking_webhook_secret: Option<String>,
    pub profile_api_url: String,
    pub calendar: CalendarSettings,
    pub business_hours: Option<Availability>,
    /// Booking flows untouched for this long are dropped.
    pub flow_idle_timeout: Duration,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let defaults = CalendarSettings::default();

        let calendar = CalendarSettings {
            window_days: parsed_var("BOOKING_WINDOW_DAYS", defaults.window_days, parse_window_days),
            excluded_weekday: parsed_var::<Option<Weekday>>(
                "EXCLUDED_WEEKDAY",
                defaults.excluded_weekday,
                |v| match v.trim().to_lowercase().as_str() {
                    "" | "none" => Some(None),
                    other => parse_weekday(other).ok().map(Some),
                },
            ),
            day_start: parsed_var("DAY_START", defaults.day_start, |v| parse_time(v).ok()),
            day_end: parsed_var("DAY_END", defaults.day_end, |v| parse_time(v).ok()),
            slot_minutes: parsed_var("SLOT_MINUTES", defaults.slot_minutes, |v| {
                v.parse().ok().filter(|m| *m > 0)
            }),
        };

        let business_hours = env::var("BUSINESS_HOURS").ok().and_then(|raw| {
            match Availability::from_json(&raw) {
                Ok(hours) => Some(hours),
                Err(e) => {
                    tracing::warn!(error = %e, "ignoring invalid BUSINESS_HOURS");
                    None
                }
            }
        });

        Self {
            port: env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(3000),
            database_url: env::var("DATABASE_URL").unwrap_or_else(|_| "bookflow.db".to_string()),
            booking_webhook_url: non_empty_var("BOOKING_WEBHOOK_URL"),
            booking_webhook_secret: non_empty_var("BOOKING_WEBHOOK_SECRET"),
            profile_api_url: env::var("PROFILE_API_URL")
                .unwrap_or_else(|_| "http://localhost:4100".to_string()),
            calendar,
            business_hours,
            flow_idle_timeout: parsed_var("FLOW_IDLE_MINUTES", DEFAULT_IDLE_TIMEOUT, |v| {
                v.trim()
                    .parse::<u64>()
                    .ok()
                    .filter(|m| *m > 0)
                    .map(|m| Duration::from_secs(m * 60))
            }),
        }
    }
}

fn parse_window_days(raw: &str) -> Option<u32> {
    raw.trim()
        .parse()
        .ok()
        .filter(|d| (1..=MAX_WINDOW_DAYS).contains(d))
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parsed_var<T: std::fmt::Debug>(key: &str, default: T, parse: impl FnOnce(&str) -> Option<T>) -> T {
    let Ok(raw) = env::var(key) else {
        return default;
    };
    match parse(&raw) {
        Some(value) => value,
        None => {
            tracing::warn!(key, value = %raw, ?default, "invalid config value, using default");
            default
        }
    }
}
