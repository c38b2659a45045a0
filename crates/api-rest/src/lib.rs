//! # API REST
//!
//! REST API implementation for the appointment engine.
//!
//! Handles:
//! - HTTP endpoints with axum
//! - OpenAPI/Swagger documentation
//! - REST-specific concerns (JSON wire types, status code mapping, CORS)
//!
//! The server holds one caller-owned [`Session`]; the async mutex serialises access to it, so
//! every request sees a consistent working set.

#![warn(rust_2018_idioms)]

use appointment_core::{
    config::parse_time_of_day, local_today, Appointment, AppointmentError, AppointmentId,
    ConflictGroup, CoreConfig, GenerationParams, Reminder, Session,
};
use axum::{
    extract::{Path as AxumPath, Query, State},
    http::StatusCode,
    response::Json,
    routing::{get, post, put},
    Router,
};
use chrono::NaiveDate;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::Mutex;
use tower_http::cors::CorsLayer;
use utoipa::{IntoParams, OpenApi, ToSchema};
use utoipa_swagger_ui::SwaggerUi;

/// Application state for the REST API server
///
/// Contains the shared session that all request handlers read and mutate.
#[derive(Clone)]
pub struct AppState {
    session: Arc<Mutex<Session>>,
}

impl AppState {
    pub fn new(cfg: Arc<CoreConfig>) -> Self {
        Self {
            session: Arc::new(Mutex::new(Session::new(cfg))),
        }
    }
}

type ApiError = (StatusCode, String);

#[derive(Serialize, Deserialize, ToSchema)]
pub struct HealthRes {
    pub ok: bool,
    pub message: String,
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct GenerateReq {
    pub num_patients: u32,
    pub num_days: u32,
    /// Appointment length in minutes
    pub appointment_duration: u32,
    /// Minutes between candidate slot starts
    pub time_interval: u32,
    /// Book one random slot per patient per day instead of the full grid
    #[serde(default)]
    pub sampled: bool,
    /// Seed for sampled generation
    #[serde(default)]
    pub seed: Option<u64>,
    /// First schedule date (YYYY-MM-DD); defaults to today
    #[serde(default)]
    pub today: Option<String>,
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct AppointmentRes {
    pub id: u32,
    pub patient_id: String,
    /// YYYY-MM-DD
    pub date: String,
    /// HH:MM
    pub start_time: String,
    /// HH:MM
    pub end_time: String,
    pub duration_minutes: u32,
}

impl From<&Appointment> for AppointmentRes {
    fn from(appt: &Appointment) -> Self {
        Self {
            id: appt.id().0,
            patient_id: appt.patient_id().to_string(),
            date: appt.date().to_string(),
            start_time: appt.start_time().format("%H:%M").to_string(),
            end_time: appt.end_time().format("%H:%M").to_string(),
            duration_minutes: appt.duration_minutes(),
        }
    }
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct ListAppointmentsRes {
    pub appointments: Vec<AppointmentRes>,
}

impl ListAppointmentsRes {
    fn from_slice(appointments: &[Appointment]) -> Self {
        Self {
            appointments: appointments.iter().map(AppointmentRes::from).collect(),
        }
    }
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct ConflictGroupRes {
    pub date: String,
    pub start_time: String,
    pub end_time: String,
    pub appointment_ids: Vec<u32>,
}

impl From<ConflictGroup> for ConflictGroupRes {
    fn from(group: ConflictGroup) -> Self {
        Self {
            date: group.date.to_string(),
            start_time: group.start_time.format("%H:%M").to_string(),
            end_time: group.end_time.format("%H:%M").to_string(),
            appointment_ids: group.appointment_ids.into_iter().map(|id| id.0).collect(),
        }
    }
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct ConflictsRes {
    pub appointments: Vec<AppointmentRes>,
    pub groups: Vec<ConflictGroupRes>,
}

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct RemindersQuery {
    /// Reference date (YYYY-MM-DD); reminders cover the following day. Defaults to today.
    pub reference_date: Option<String>,
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct ReminderRes {
    pub appointment_id: u32,
    pub patient_id: String,
    pub message: String,
}

impl From<Reminder> for ReminderRes {
    fn from(reminder: Reminder) -> Self {
        Self {
            appointment_id: reminder.appointment_id.0,
            patient_id: reminder.patient_id.to_string(),
            message: reminder.message,
        }
    }
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct RemindersRes {
    pub reminders: Vec<ReminderRes>,
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct RescheduleReq {
    /// YYYY-MM-DD
    pub new_date: String,
    /// HH:MM
    pub new_start_time: String,
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health,
        generate_appointments,
        list_appointments,
        list_conflicts,
        list_reminders,
        cancel_appointment,
        reschedule_appointment,
    ),
    components(schemas(
        HealthRes,
        GenerateReq,
        AppointmentRes,
        ListAppointmentsRes,
        ConflictGroupRes,
        ConflictsRes,
        ReminderRes,
        RemindersRes,
        RescheduleReq,
    ))
)]
pub struct ApiDoc;

/// Builds the REST router over `state`, including Swagger UI.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/appointments", get(list_appointments))
        .route("/appointments/generate", post(generate_appointments))
        .route(
            "/appointments/:id",
            put(reschedule_appointment).delete(cancel_appointment),
        )
        .route("/conflicts", get(list_conflicts))
        .route("/reminders", get(list_reminders))
        .merge(
            SwaggerUi::new("/swagger-ui/{_:.*}").url("/api-docs/openapi.json", ApiDoc::openapi()),
        )
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Maps engine errors onto HTTP status codes.
fn error_response(err: AppointmentError) -> ApiError {
    let status = match &err {
        AppointmentError::InvalidInput(_)
        | AppointmentError::TimeOverflow { .. }
        | AppointmentError::Text(_) => StatusCode::BAD_REQUEST,
        AppointmentError::NotFound(_) => StatusCode::NOT_FOUND,
        AppointmentError::DuplicateId { .. } => StatusCode::CONFLICT,
    };
    if status == StatusCode::CONFLICT {
        tracing::error!("Working set invariant violated: {err}");
    } else {
        tracing::debug!("Rejected request: {err}");
    }
    (status, err.to_string())
}

fn parse_date(value: &str) -> Result<NaiveDate, ApiError> {
    value.trim().parse::<NaiveDate>().map_err(|e| {
        (
            StatusCode::BAD_REQUEST,
            format!("invalid date '{}': {e}", value.trim()),
        )
    })
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Health check response", body = HealthRes)
    )
)]
/// Health check endpoint for the REST API
#[axum::debug_handler]
async fn health() -> Json<HealthRes> {
    Json(HealthRes {
        ok: true,
        message: "Appointment REST API is alive".into(),
    })
}

#[utoipa::path(
    post,
    path = "/appointments/generate",
    request_body = GenerateReq,
    responses(
        (status = 200, description = "Working set replaced", body = ListAppointmentsRes),
        (status = 400, description = "Bad request")
    )
)]
/// Replace the working set with a generated schedule
///
/// # Errors
/// Returns `400 Bad Request` if any parameter is zero, the date is malformed, or the slot grid
/// would run past midnight.
#[axum::debug_handler]
async fn generate_appointments(
    State(state): State<AppState>,
    Json(req): Json<GenerateReq>,
) -> Result<Json<ListAppointmentsRes>, ApiError> {
    let today = match req.today.as_deref() {
        Some(date) => parse_date(date)?,
        None => local_today(),
    };
    let params = GenerationParams {
        num_patients: req.num_patients,
        num_days: req.num_days,
        appointment_duration: req.appointment_duration,
        time_interval: req.time_interval,
    };

    let mut session = state.session.lock().await;
    let generated = if req.sampled {
        let mut rng = match req.seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };
        session.generate_sampled(&params, today, &mut rng)
    } else {
        session.generate(&params, today)
    }
    .map_err(error_response)?;

    Ok(Json(ListAppointmentsRes::from_slice(generated)))
}

#[utoipa::path(
    get,
    path = "/appointments",
    responses(
        (status = 200, description = "Current working set", body = ListAppointmentsRes)
    )
)]
/// List the current working set
#[axum::debug_handler]
async fn list_appointments(State(state): State<AppState>) -> Json<ListAppointmentsRes> {
    let session = state.session.lock().await;
    Json(ListAppointmentsRes::from_slice(session.appointments()))
}

#[utoipa::path(
    get,
    path = "/conflicts",
    responses(
        (status = 200, description = "Conflicting appointments and their slot groups", body = ConflictsRes)
    )
)]
/// List double-booked appointments
#[axum::debug_handler]
async fn list_conflicts(State(state): State<AppState>) -> Json<ConflictsRes> {
    let session = state.session.lock().await;
    Json(ConflictsRes {
        appointments: session.conflicts().iter().map(AppointmentRes::from).collect(),
        groups: session
            .conflict_groups()
            .into_iter()
            .map(ConflictGroupRes::from)
            .collect(),
    })
}

#[utoipa::path(
    get,
    path = "/reminders",
    params(RemindersQuery),
    responses(
        (status = 200, description = "Reminders for the day after the reference date", body = RemindersRes),
        (status = 400, description = "Bad request")
    )
)]
/// Render reminders for the day after `reference_date`
///
/// An empty list means no appointments fall on that day.
#[axum::debug_handler]
async fn list_reminders(
    State(state): State<AppState>,
    Query(query): Query<RemindersQuery>,
) -> Result<Json<RemindersRes>, ApiError> {
    let reference_date = match query.reference_date.as_deref() {
        Some(date) => parse_date(date)?,
        None => local_today(),
    };
    let session = state.session.lock().await;
    Ok(Json(RemindersRes {
        reminders: session
            .reminders(reference_date)
            .into_iter()
            .map(ReminderRes::from)
            .collect(),
    }))
}

#[utoipa::path(
    delete,
    path = "/appointments/{id}",
    params(("id" = u32, Path, description = "Appointment id")),
    responses(
        (status = 200, description = "Appointment cancelled", body = ListAppointmentsRes),
        (status = 404, description = "Unknown id (strict policy only)")
    )
)]
/// Cancel an appointment
///
/// Under the default policy an unknown id leaves the working set unchanged and still returns
/// `200 OK`.
#[axum::debug_handler]
async fn cancel_appointment(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<u32>,
) -> Result<Json<ListAppointmentsRes>, ApiError> {
    let mut session = state.session.lock().await;
    session.cancel(AppointmentId(id)).map_err(error_response)?;
    Ok(Json(ListAppointmentsRes::from_slice(session.appointments())))
}

#[utoipa::path(
    put,
    path = "/appointments/{id}",
    request_body = RescheduleReq,
    params(("id" = u32, Path, description = "Appointment id")),
    responses(
        (status = 200, description = "Appointment rescheduled", body = ListAppointmentsRes),
        (status = 400, description = "Bad request"),
        (status = 404, description = "Unknown id (strict policy only)"),
        (status = 409, description = "Duplicate ids in the working set")
    )
)]
/// Move an appointment to a new date and start time
///
/// The end time is recomputed from the appointment's own duration.
#[axum::debug_handler]
async fn reschedule_appointment(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<u32>,
    Json(req): Json<RescheduleReq>,
) -> Result<Json<ListAppointmentsRes>, ApiError> {
    let new_date = parse_date(&req.new_date)?;
    let new_start = parse_time_of_day(&req.new_start_time).map_err(error_response)?;

    let mut session = state.session.lock().await;
    session
        .reschedule(AppointmentId(id), new_date, new_start)
        .map_err(error_response)?;
    Ok(Json(ListAppointmentsRes::from_slice(session.appointments())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use appointment_core::MissingIdPolicy;
    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    fn app(policy: MissingIdPolicy) -> Router {
        let cfg = CoreConfig::default().with_missing_id_policy(policy);
        router(AppState::new(Arc::new(cfg)))
    }

    fn json_request(method: &str, uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn empty_request(method: &str, uri: &str) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap()
    }

    async fn send(app: &Router, request: Request<Body>) -> (StatusCode, serde_json::Value) {
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
        (status, body)
    }

    fn generate_body() -> serde_json::Value {
        serde_json::json!({
            "num_patients": 2,
            "num_days": 2,
            "appointment_duration": 30,
            "time_interval": 120,
            "today": "2026-10-19"
        })
    }

    #[tokio::test]
    async fn health_reports_ok() {
        let app = app(MissingIdPolicy::Ignore);
        let (status, body) = send(&app, empty_request("GET", "/health")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["ok"], true);
    }

    #[tokio::test]
    async fn generate_then_query_views() {
        let app = app(MissingIdPolicy::Ignore);

        let (status, body) = send(
            &app,
            json_request("POST", "/appointments/generate", generate_body()),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let appointments = body["appointments"].as_array().unwrap();
        assert_eq!(appointments.len(), 20);
        assert_eq!(appointments[0]["start_time"], "09:00");
        assert_eq!(appointments[0]["end_time"], "09:30");

        let (_, body) = send(&app, empty_request("GET", "/conflicts")).await;
        assert_eq!(body["appointments"].as_array().unwrap().len(), 20);
        assert_eq!(body["groups"].as_array().unwrap().len(), 10);

        let (status, body) = send(
            &app,
            empty_request("GET", "/reminders?reference_date=2026-10-19"),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let reminders = body["reminders"].as_array().unwrap();
        assert_eq!(reminders.len(), 10);
        assert_eq!(
            reminders[0]["message"],
            "Reminder: You have an appointment scheduled on 2026-10-20 at 09:00 AM. Please arrive 10 minutes early."
        );
    }

    #[tokio::test]
    async fn generate_rejects_zero_interval() {
        let app = app(MissingIdPolicy::Ignore);
        let mut body = generate_body();
        body["time_interval"] = serde_json::json!(0);
        let (status, _) = send(&app, json_request("POST", "/appointments/generate", body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn cancel_and_reschedule_mutate_the_session() {
        let app = app(MissingIdPolicy::Ignore);
        send(&app, json_request("POST", "/appointments/generate", generate_body())).await;

        let (status, body) = send(&app, empty_request("DELETE", "/appointments/1")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["appointments"].as_array().unwrap().len(), 19);

        let (status, body) = send(
            &app,
            json_request(
                "PUT",
                "/appointments/2",
                serde_json::json!({ "new_date": "2026-10-25", "new_start_time": "10:15" }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let moved = body["appointments"]
            .as_array()
            .unwrap()
            .iter()
            .find(|a| a["id"] == 2)
            .unwrap();
        assert_eq!(moved["date"], "2026-10-25");
        assert_eq!(moved["start_time"], "10:15");
        assert_eq!(moved["end_time"], "10:45");

        let (_, body) = send(&app, empty_request("GET", "/appointments")).await;
        assert_eq!(body["appointments"].as_array().unwrap().len(), 19);
    }

    #[tokio::test]
    async fn unknown_id_follows_policy() {
        let lenient = app(MissingIdPolicy::Ignore);
        send(&lenient, json_request("POST", "/appointments/generate", generate_body())).await;
        let (status, body) = send(&lenient, empty_request("DELETE", "/appointments/999")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["appointments"].as_array().unwrap().len(), 20);

        let strict = app(MissingIdPolicy::Reject);
        send(&strict, json_request("POST", "/appointments/generate", generate_body())).await;
        let (status, _) = send(&strict, empty_request("DELETE", "/appointments/999")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn reschedule_rejects_malformed_time() {
        let app = app(MissingIdPolicy::Ignore);
        send(&app, json_request("POST", "/appointments/generate", generate_body())).await;
        let (status, _) = send(
            &app,
            json_request(
                "PUT",
                "/appointments/2",
                serde_json::json!({ "new_date": "2026-10-25", "new_start_time": "quarter past" }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
