use crate::application::classifier;
use crate::application::dashboard::DashboardService;
use crate::application::oauth::OAuthManager;
use crate::application::reconciler::{CalendarReconciler, ItemFailure};
use crate::application::schedule_builder::ScheduleBuilder;
use crate::application::templates::default_week_template;
use crate::domain::models::{DashboardEventView, ScheduledEntry, WeekWindow};
use crate::infrastructure::backup::{ScheduleBackup, write_backup};
use crate::infrastructure::calendar_client::ReqwestCalendarClient;
use crate::infrastructure::config::AppConfig;
use crate::infrastructure::credential_store::ConfiguredCredentialStore;
use crate::infrastructure::error::AppError;
use crate::infrastructure::oauth_client::ReqwestOAuthClient;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;

/// Everything the handlers need, constructed once at startup and shared.
/// There is no lock between the read endpoints and a running reconciliation;
/// a poll may observe a partially rebuilt week.
pub struct AppState {
    pub config: AppConfig,
    pub backup_path: PathBuf,
    pub oauth: OAuthManager<ConfiguredCredentialStore, ReqwestOAuthClient>,
    pub builder: ScheduleBuilder,
    pub reconciler: CalendarReconciler<ReqwestCalendarClient>,
    pub dashboard: DashboardService<ReqwestCalendarClient>,
}

impl AppState {
    fn zone(&self) -> Tz {
        self.builder.zone()
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/events", get(get_events))
        .route("/api/stats", get(get_stats))
        .route("/api/current-event", get(get_current_event))
        .route("/api/next-event", get(get_next_event))
        .route("/api/auth/status", get(get_auth_status))
        .route("/api/auth/code", post(post_auth_code))
        .route("/api/create-schedule", post(post_create_schedule))
        .fallback(|| async { (StatusCode::NOT_FOUND, "not found") })
        .with_state(state)
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

fn error_status(error: &AppError) -> StatusCode {
    match error {
        AppError::Authentication(_) => StatusCode::UNAUTHORIZED,
        AppError::CalendarUnavailable(_) => StatusCode::BAD_GATEWAY,
        AppError::InvalidSession(_) | AppError::InvalidTimeZone(_) => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        AppError::Credential(_)
        | AppError::InvalidConfig(_)
        | AppError::Io(_)
        | AppError::Json(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn error_response(error: AppError) -> Response {
    log::error!("request failed: {error}");
    (
        error_status(&error),
        Json(ErrorBody {
            error: error.to_string(),
        }),
    )
        .into_response()
}

async fn current_week_views(state: &AppState) -> Result<(Vec<DashboardEventView>, DateTime<Tz>), AppError> {
    let token = state.oauth.require_access_token().await?;
    let now = Utc::now().with_timezone(&state.zone());
    let window = WeekWindow::for_date(now.date_naive());
    let views = state
        .dashboard
        .week_views(&token.access_token, window, now)
        .await?;
    Ok((views, now))
}

async fn get_events(State(state): State<Arc<AppState>>) -> Response {
    match current_week_views(&state).await {
        Ok((views, _)) => Json(views).into_response(),
        Err(error) => error_response(error),
    }
}

async fn get_stats(State(state): State<Arc<AppState>>) -> Response {
    match current_week_views(&state).await {
        Ok((views, now)) => Json(classifier::aggregate(&views, now)).into_response(),
        Err(error) => error_response(error),
    }
}

async fn get_current_event(State(state): State<Arc<AppState>>) -> Response {
    match current_week_views(&state).await {
        Ok((views, _)) => Json(classifier::current_event(&views).cloned()).into_response(),
        Err(error) => error_response(error),
    }
}

async fn get_next_event(State(state): State<Arc<AppState>>) -> Response {
    match current_week_views(&state).await {
        Ok((views, _)) => Json(classifier::next_event(&views).cloned()).into_response(),
        Err(error) => error_response(error),
    }
}

async fn get_auth_status(State(state): State<Arc<AppState>>) -> Response {
    match state.oauth.token_status() {
        Ok(status) => Json(status).into_response(),
        Err(error) => error_response(error),
    }
}

#[derive(Debug, Deserialize)]
struct AuthCodeRequest {
    code: String,
}

#[derive(Debug, Serialize)]
struct AuthCodeResponse {
    authenticated: bool,
}

async fn post_auth_code(
    State(state): State<Arc<AppState>>,
    Json(request): Json<AuthCodeRequest>,
) -> Response {
    match state.oauth.authenticate_with_code(&request.code).await {
        Ok(_) => Json(AuthCodeResponse {
            authenticated: true,
        })
        .into_response(),
        Err(error) => error_response(error),
    }
}

#[derive(Debug, Default, Deserialize)]
struct CreateScheduleRequest {
    #[serde(default)]
    events: Vec<ScheduledEntry>,
}

#[derive(Debug, Serialize)]
struct CreateScheduleResponse {
    deleted: usize,
    attempted: usize,
    created: usize,
    failures: Vec<ItemFailure>,
    backup_written: bool,
    backup_path: String,
}

async fn post_create_schedule(
    State(state): State<Arc<AppState>>,
    body: Option<Json<CreateScheduleRequest>>,
) -> Response {
    let request = body.map(|Json(value)| value).unwrap_or_default();
    match run_create_schedule(&state, request).await {
        Ok(response) => Json(response).into_response(),
        Err(error) => error_response(error),
    }
}

async fn run_create_schedule(
    state: &AppState,
    request: CreateScheduleRequest,
) -> Result<CreateScheduleResponse, AppError> {
    let token = state.oauth.require_access_token().await?;
    let now = Utc::now().with_timezone(&state.zone());
    let window = WeekWindow::for_date(now.date_naive());

    let (records, backup) = if request.events.is_empty() {
        let template = default_week_template();
        let records = state.builder.build(window.week_start, &template)?;
        let backup = ScheduleBackup::from_template(window.week_start, &template, Utc::now());
        (records, backup)
    } else {
        let records = state.builder.build_from_entries(&request.events)?;
        for record in &records {
            if !window.contains(record.start.date_naive()) {
                return Err(AppError::InvalidSession(format!(
                    "session '{}' falls outside the reconciliation window {} .. {}",
                    record.title, window.week_start, window.week_end
                )));
            }
        }
        let backup = ScheduleBackup::from_entries(&request.events, Utc::now());
        (records, backup)
    };

    let calendar_id = state
        .dashboard
        .resolve_calendar_id(&token.access_token)
        .await?;
    let result = state
        .reconciler
        .reconcile(&token.access_token, &calendar_id, window, &records)
        .await?;

    let backup_written = match write_backup(&state.backup_path, &backup) {
        Ok(()) => true,
        Err(error) => {
            log::warn!("failed to write schedule backup: {error}");
            false
        }
    };

    Ok(CreateScheduleResponse {
        deleted: result.deleted,
        attempted: result.attempted,
        created: result.created,
        failures: result.failures,
        backup_written,
        backup_path: state.backup_path.display().to_string(),
    })
}
