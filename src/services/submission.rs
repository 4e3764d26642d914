use anyhow::Context;
use async_trait::async_trait;
use base64::Engine;
use hmac::{Hmac, Mac};
use sha1::Sha1;

use crate::db::{queries, SharedConnection};
use crate::models::BookingSubmission;

pub const SIGNATURE_HEADER: &str = "x-bookflow-signature";

/// Receives a finished booking. Whatever the hosting application does with it
/// (CRM write, email, storage) happens behind this trait.
#[async_trait]
pub trait BookingSink: Send + Sync {
    async fn complete(&self, submission: &BookingSubmission) -> anyhow::Result<()>;
}

/// POSTs the completed-booking record to the hosting application.
pub struct WebhookSink {
    url: String,
    secret: Option<String>,
    client: reqwest::Client,
}

impl WebhookSink {
    pub fn new(url: String, secret: Option<String>) -> Self {
        Self {
            url,
            secret,
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl BookingSink for WebhookSink {
    async fn complete(&self, submission: &BookingSubmission) -> anyhow::Result<()> {
        let body = serde_json::to_vec(&submission.record)
            .context("failed to serialize booking record")?;

        let mut request = self
            .client
            .post(&self.url)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .header("x-booking-id", submission.booking_id.to_string());
        if let Some(secret) = &self.secret {
            request = request.header(SIGNATURE_HEADER, sign_payload(secret, &body)?);
        }

        request
            .body(body)
            .send()
            .await
            .context("failed to reach booking webhook")?
            .error_for_status()
            .context("booking webhook returned error")?;

        tracing::info!(booking_id = %submission.booking_id, "booking delivered to webhook");
        Ok(())
    }
}

/// Stores bookings locally. Also what [`super::schedule::SqliteSchedule`]
/// reads to mark slots as taken.
pub struct SqliteSink {
    db: SharedConnection,
}

impl SqliteSink {
    pub fn new(db: SharedConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl BookingSink for SqliteSink {
    async fn complete(&self, submission: &BookingSubmission) -> anyhow::Result<()> {
        let db = self
            .db
            .lock()
            .map_err(|_| anyhow::anyhow!("database lock poisoned"))?;
        queries::insert_booking(&db, submission).with_context(|| {
            format!(
                "could not store booking for {} at {}",
                submission.date, submission.record.time
            )
        })?;

        tracing::info!(booking_id = %submission.booking_id, date = %submission.date, "booking stored");
        Ok(())
    }
}

/// Base64 HMAC-SHA1 of the request body, keyed by the shared webhook secret.
pub fn sign_payload(secret: &str, body: &[u8]) -> anyhow::Result<String> {
    let mut mac = Hmac::<Sha1>::new_from_slice(secret.as_bytes())
        .map_err(|e| anyhow::anyhow!("invalid webhook secret: {e}"))?;
    mac.update(body);
    Ok(base64::engine::general_purpose::STANDARD.encode(mac.finalize().into_bytes()))
}
