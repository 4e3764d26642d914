use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::NaiveDate;
use serde::Deserialize;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::{CompletedBooking, ContactDetails, ServiceDescriptor};
use crate::services::booking_flow::{FlowController, FlowSnapshot};
use crate::services::{calendar, flows};
use crate::state::AppState;

// Transition endpoints always answer with the current snapshot. A disabled
// action leaves the flow unchanged, which the snapshot makes visible.

#[derive(Deserialize)]
pub struct StartFlowRequest {
    #[serde(default)]
    pub service: ServiceDescriptor,
}

// POST /api/flows
pub async fn start_flow(
    State(state): State<Arc<AppState>>,
    Json(req): Json<StartFlowRequest>,
) -> Result<(StatusCode, Json<FlowSnapshot>), AppError> {
    let today = chrono::Local::now().date_naive();
    let controller = FlowController::new(req.service, today, &state.config.calendar);
    let service = controller.draft().service.display_name().to_string();

    let id = state.flows.start(controller)?;
    tracing::info!(flow_id = %id, service = %service, "booking flow started");

    let snapshot = state.flows.with_flow(id, |flow| flow.snapshot(id))?;
    Ok((StatusCode::CREATED, Json(snapshot)))
}

// GET /api/flows/:id
pub async fn get_flow(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<FlowSnapshot>, AppError> {
    Ok(Json(state.flows.with_flow(id, |flow| flow.snapshot(id))?))
}

// DELETE /api/flows/:id
pub async fn abandon_flow(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    state.flows.abandon(id)?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Deserialize)]
pub struct MonthRequest {
    pub offset: i32,
}

// POST /api/flows/:id/month
pub async fn navigate_month(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(req): Json<MonthRequest>,
) -> Result<Json<FlowSnapshot>, AppError> {
    transition(&state, id, |flow| flow.navigate_month(req.offset))
}

#[derive(Deserialize)]
pub struct DateRequest {
    pub date: NaiveDate,
}

// POST /api/flows/:id/date
pub async fn select_date(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(req): Json<DateRequest>,
) -> Result<Json<FlowSnapshot>, AppError> {
    let date = req.date;
    // The window is fixed when the flow starts, so a long-lived flow could
    // still offer days that have since passed.
    let today = chrono::Local::now().date_naive();
    if date < today || !state.flows.with_flow(id, |flow| flow.is_bookable(date))? {
        return Ok(Json(state.flows.with_flow(id, |flow| flow.snapshot(id))?));
    }

    // Looked up before taking the registry lock.
    let booked = state
        .schedule
        .booked_times(date)
        .await
        .map_err(|e| AppError::Availability(format!("{e:#}")))?;
    let slots = calendar::time_slots(
        date,
        &state.config.calendar,
        state.config.business_hours.as_ref(),
        &booked,
    );
    tracing::debug!(flow_id = %id, %date, booked = booked.len(), "date selected");

    transition(&state, id, move |flow| flow.select_date(date, slots))
}

#[derive(Deserialize)]
pub struct TimeRequest {
    pub time: String,
}

// POST /api/flows/:id/time
pub async fn select_time(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(req): Json<TimeRequest>,
) -> Result<Json<FlowSnapshot>, AppError> {
    transition(&state, id, |flow| flow.select_time(&req.time))
}

// POST /api/flows/:id/continue
pub async fn continue_to_contact(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<FlowSnapshot>, AppError> {
    transition(&state, id, FlowController::continue_to_contact)
}

// POST /api/flows/:id/contact
pub async fn submit_contact(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(details): Json<ContactDetails>,
) -> Result<Json<FlowSnapshot>, AppError> {
    transition(&state, id, move |flow| flow.submit_contact(details))
}

// POST /api/flows/:id/back
pub async fn go_back(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<FlowSnapshot>, AppError> {
    transition(&state, id, FlowController::back)
}

#[derive(Deserialize)]
pub struct SubmitRequest {
    #[serde(default)]
    pub notes: String,
}

// POST /api/flows/:id/submit
pub async fn submit_booking(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(req): Json<SubmitRequest>,
) -> Result<Json<CompletedBooking>, AppError> {
    let record = flows::submit(&state.flows, state.sink.as_ref(), id, req.notes).await?;
    Ok(Json(record))
}

fn transition(
    state: &AppState,
    id: Uuid,
    f: impl FnOnce(&mut FlowController) -> bool,
) -> Result<Json<FlowSnapshot>, AppError> {
    let snapshot = state.flows.with_flow(id, |flow| {
        let before = flow.step();
        if f(flow) && flow.step() != before {
            tracing::info!(flow_id = %id, from = before.as_str(), to = flow.step().as_str(), "step changed");
        }
        flow.snapshot(id)
    })?;
    Ok(Json(snapshot))
}
