use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::{Query, State};
use axum::http::HeaderMap;
use axum::response::sse::{Event, Sse};
use axum::Json;
use serde::Deserialize;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tokio_stream::wrappers::{BroadcastStream, IntervalStream};
use tokio_stream::StreamExt;

use crate::errors::AppError;
use crate::models::{ActionEvent, UserContext};
use crate::services::actions::SidebarState;
use crate::state::AppState;

/// EventSource cannot set headers, so the stream may name its session in the
/// query string instead of `X-User-Id`.
#[derive(Deserialize)]
pub struct SessionQuery {
    pub session: Option<String>,
}

fn session_key(query: SessionQuery, headers: &HeaderMap) -> Result<String, AppError> {
    query
        .session
        .filter(|s| !s.trim().is_empty())
        .or_else(|| UserContext::from_headers(headers).user_id)
        .ok_or_else(|| AppError::BadRequest("missing session or X-User-Id".to_string()))
}

// POST /api/actions
pub async fn publish_action(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<SessionQuery>,
    Json(event): Json<ActionEvent>,
) -> Result<Json<SidebarState>, AppError> {
    let session = session_key(query, &headers)?;
    Ok(Json(state.actions.publish(&session, &event)?))
}

fn sidebar_event(sidebar: &SidebarState) -> Event {
    let data = serde_json::to_string(sidebar).unwrap_or_default();
    Event::default().data(data).event("sidebar")
}

// GET /api/actions/events?session=
pub async fn action_events(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<SessionQuery>,
) -> Result<Sse<impl tokio_stream::Stream<Item = Result<Event, Infallible>>>, AppError> {
    let session = session_key(query, &headers)?;
    // Snapshot and receiver come from one lock, so no change falls between them.
    let (current, rx) = state.actions.subscribe(&session)?;
    tracing::debug!(session = %session, open = current.open, "sidebar subscriber joined");

    let initial = tokio_stream::once(Ok::<_, Infallible>(sidebar_event(&current)));

    let live_stream = BroadcastStream::new(rx).filter_map(move |result| match result {
        Ok(sidebar) => Some(Ok(sidebar_event(&sidebar))),
        Err(BroadcastStreamRecvError::Lagged(skipped)) => {
            tracing::warn!(session = %session, skipped, "sidebar subscriber lagged");
            None
        }
    });

    let keepalive_stream = StreamExt::map(
        IntervalStream::new(tokio::time::interval(Duration::from_secs(30))),
        |_| Ok(Event::default().comment("keepalive")),
    );

    Ok(Sse::new(StreamExt::merge(initial.chain(live_stream), keepalive_stream)))
}
