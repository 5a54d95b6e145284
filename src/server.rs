use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use chrono::Local;
use log::{error, info, warn};
use serde::Serialize;
use serde_json::json;
use tokio::net::TcpListener;

use crate::config::JiraConfig;
use crate::defects::{require_statuses, resolve_type_filter, DefectService, DEFAULT_TREND_DAYS};
use crate::error::{DefectLensError, Result};
use crate::fallback::{FallbackMonitor, FallbackSnapshot};
use crate::models::{Breakdown, DefectSummary, DueSummary, TrendResponse};
use crate::providers::jira::jql::validate_fragment;
use crate::providers::jira::{Clause, TypeFilter};

/// Shared by every request. When Jira could not be configured, `service`
/// holds the reason and query endpoints answer 500 with it.
pub struct AppState {
    service: std::result::Result<DefectService, String>,
    monitor: Arc<FallbackMonitor>,
}

impl AppState {
    pub fn new(service: DefectService, monitor: Arc<FallbackMonitor>) -> Self {
        Self {
            service: Ok(service),
            monitor,
        }
    }

    pub fn unconfigured(reason: impl Into<String>, monitor: Arc<FallbackMonitor>) -> Self {
        Self {
            service: Err(reason.into()),
            monitor,
        }
    }

    /// Builds the service from startup settings, keeping the failure reason
    /// so the server can still start and report it.
    pub fn from_config(config: Result<JiraConfig>, monitor: Arc<FallbackMonitor>) -> Self {
        let service = config.and_then(|config| {
            info!(
                "Serving defects for project {} from {}",
                config.project_key,
                config.site_url()
            );
            DefectService::from_config(&config, Arc::clone(&monitor))
        });

        match service {
            Ok(service) => Self::new(service, monitor),
            Err(e) => {
                warn!("{e}; query endpoints will fail until configured");
                Self::unconfigured(e.to_string(), monitor)
            }
        }
    }

    fn service(&self) -> Result<&DefectService> {
        self.service
            .as_ref()
            .map_err(|reason| DefectLensError::Config(reason.clone()))
    }

    fn type_filter(&self, raw: Option<&str>) -> TypeFilter {
        resolve_type_filter(raw, &self.monitor)
    }
}

impl IntoResponse for DefectLensError {
    fn into_response(self) -> Response {
        let status = match &self {
            DefectLensError::InvalidInput(_) => {
                warn!("Rejected request: {self}");
                StatusCode::BAD_REQUEST
            }
            _ => {
                error!("Request failed: {self}");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

/// Query string of the defect endpoints. Repeated keys are kept, so it is
/// read from raw pairs rather than a struct.
#[derive(Debug, Default)]
pub struct DefectParams {
    pub statuses: Vec<String>,
    pub type_filter: Option<String>,
    pub time: Option<String>,
    pub jql: Option<String>,
}

impl DefectParams {
    pub fn from_pairs(pairs: Vec<(String, String)>) -> Self {
        let mut repeated = Vec::new();
        let mut csv: Option<String> = None;
        let mut params = Self::default();

        for (key, value) in pairs {
            match key.as_str() {
                "status" => repeated.push(value),
                "statuses" => {
                    csv.get_or_insert(value);
                }
                "type" => {
                    params.type_filter.get_or_insert(value);
                }
                "time" => {
                    params.time.get_or_insert(value);
                }
                "jql" => {
                    params.jql.get_or_insert(value);
                }
                _ => {}
            }
        }

        let statuses = if repeated.is_empty() {
            csv.map(|csv| csv.split(',').map(str::to_string).collect())
                .unwrap_or_default()
        } else {
            repeated
        };
        params.statuses = statuses
            .into_iter()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        params.time = params.time.filter(|s| !s.trim().is_empty());
        params.jql = params.jql.filter(|s| !s.trim().is_empty());
        params
    }

    /// `time` is appended as-is, `jql` inside parentheses.
    pub fn clauses(&self) -> Result<Vec<Clause>> {
        let mut clauses = Vec::new();
        if let Some(time) = &self.time {
            validate_fragment("time", time)?;
            clauses.push(Clause::Raw(time.clone()));
        }
        if let Some(jql) = &self.jql {
            validate_fragment("jql", jql)?;
            clauses.push(Clause::Grouped(jql.clone()));
        }
        Ok(clauses)
    }
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    configured: bool,
    fallbacks: FallbackSnapshot,
}

async fn defect_query(
    State(state): State<Arc<AppState>>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Result<Json<DefectSummary>> {
    let params = DefectParams::from_pairs(pairs);
    require_statuses(&params.statuses)?;
    let clauses = params.clauses()?;

    let service = state.service()?;
    let type_filter = state.type_filter(params.type_filter.as_deref());
    let summary = service
        .summarize(&params.statuses, type_filter, &clauses)
        .await?;

    Ok(Json(summary))
}

async fn defect_trend(
    State(state): State<Arc<AppState>>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Result<Json<TrendResponse>> {
    let params = DefectParams::from_pairs(pairs);
    let service = state.service()?;
    let type_filter = state.type_filter(params.type_filter.as_deref());

    let days = service
        .summarize_by_day_window(DEFAULT_TREND_DAYS, type_filter, &Local::now())
        .await;

    Ok(Json(TrendResponse { days }))
}

async fn defect_due_summary(
    State(state): State<Arc<AppState>>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Result<Json<DueSummary>> {
    let params = DefectParams::from_pairs(pairs);
    let service = state.service()?;
    let type_filter = state.type_filter(params.type_filter.as_deref());

    Ok(Json(service.due_summary(type_filter).await?))
}

async fn defect_breakdown(
    State(state): State<Arc<AppState>>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Result<Json<Breakdown>> {
    let params = DefectParams::from_pairs(pairs);
    let service = state.service()?;
    let type_filter = state.type_filter(params.type_filter.as_deref());

    Ok(Json(service.breakdown(type_filter).await?))
}

async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        configured: state.service.is_ok(),
        fallbacks: state.monitor.snapshot(),
    })
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/defect/query", get(defect_query))
        .route("/defect/summary-7-days", get(defect_trend))
        .route("/defect/due-summary", get(defect_due_summary))
        .route("/defect/breakdown", get(defect_breakdown))
        .route("/health", get(health))
        .with_state(state)
}

pub async fn serve(bind: SocketAddr, state: Arc<AppState>) -> anyhow::Result<()> {
    let listener = TcpListener::bind(bind).await?;
    info!("Listening on http://{}", listener.local_addr()?);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!("Failed to listen for shutdown signal: {e}");
            }
            info!("Shutting down");
        })
        .await?;

    Ok(())
}
