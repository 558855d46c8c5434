//! JSON API for quoting and proposal export.
//!
//! - `POST /api/v1/quote`: price a quote request
//! - `POST /api/v1/proposal?date=`: proposal lines and plain text
//! - `POST /api/v1/proposal/export?format=`: proposal document as a download
//! - `GET  /api/v1/catalog`: phase defaults and add-on catalog

use std::sync::Arc;

use archquote_core::domain::catalog::{default_phase_weights, Catalog, CatalogAddOn};
use archquote_core::domain::quote::{Phase, QuoteInput};
use archquote_core::errors::{ApplicationError, DomainError, InterfaceError};
use archquote_core::export::{ExportFormat, ExporterSet};
use archquote_core::intake::{parse_date, QuoteRequest, DEFAULT_AREA_SQM};
use archquote_core::pricing::{PricingEngine, QuoteResult};
use archquote_core::proposal::{format_proposal, format_summary};
use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::{Local, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

#[derive(Clone)]
pub struct ApiState {
    pub engine: Arc<dyn PricingEngine>,
    pub exporters: Arc<ExporterSet>,
    pub catalog: Arc<Catalog>,
}

#[derive(Debug, Serialize)]
pub struct QuoteResponse {
    pub result: QuoteResult,
    pub summary: Vec<String>,
    pub warnings: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct ProposalResponse {
    pub lines: Vec<String>,
    pub text: String,
    pub warnings: Vec<String>,
    pub available_formats: Vec<ExportFormat>,
}

#[derive(Debug, Serialize)]
pub struct PhaseDefault {
    pub code: &'static str,
    pub name: &'static str,
    pub default_weight: u32,
}

#[derive(Debug, Serialize)]
pub struct CatalogResponse {
    pub default_area_sqm: Decimal,
    pub phases: Vec<PhaseDefault>,
    pub add_ons: Vec<CatalogAddOn>,
}

#[derive(Debug, Deserialize, Default)]
pub struct ProposalQuery {
    pub date: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
pub struct ExportQuery {
    pub format: Option<String>,
    pub date: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: String,
    pub detail: String,
    pub correlation_id: String,
}

pub struct ApiFailure(InterfaceError);

impl IntoResponse for ApiFailure {
    fn into_response(self) -> Response {
        let (status, correlation_id) = match &self.0 {
            InterfaceError::BadRequest { correlation_id, .. } => {
                (StatusCode::BAD_REQUEST, correlation_id.clone())
            }
            InterfaceError::ServiceUnavailable { correlation_id, .. } => {
                (StatusCode::SERVICE_UNAVAILABLE, correlation_id.clone())
            }
            InterfaceError::Internal { correlation_id, .. } => {
                (StatusCode::INTERNAL_SERVER_ERROR, correlation_id.clone())
            }
        };

        let payload = ApiError {
            error: self.0.user_message().to_string(),
            detail: self.0.message().to_string(),
            correlation_id,
        };
        (status, Json(payload)).into_response()
    }
}

fn fail(error: impl Into<ApplicationError>, correlation_id: &str) -> ApiFailure {
    let error: ApplicationError = error.into();
    let error = error.into_interface(correlation_id);
    warn!(
        event_name = "api.request.failed",
        correlation_id = %correlation_id,
        error = %error,
        "request failed"
    );
    ApiFailure(error)
}

pub fn router(state: ApiState) -> Router {
    Router::new()
        .route("/api/v1/quote", post(create_quote))
        .route("/api/v1/proposal", post(create_proposal))
        .route("/api/v1/proposal/export", post(export_proposal))
        .route("/api/v1/catalog", get(catalog))
        .with_state(state)
}

fn price(
    state: &ApiState,
    request: QuoteRequest,
) -> Result<(QuoteInput, QuoteResult), DomainError> {
    let input = request.into_input(&state.catalog)?;
    let result = state.engine.compute(&input);
    Ok((input, result))
}

fn proposal_date(raw: Option<&str>) -> Result<NaiveDate, DomainError> {
    match raw.filter(|raw| !raw.trim().is_empty()) {
        Some(raw) => parse_date(raw),
        None => Ok(Local::now().date_naive()),
    }
}

async fn create_quote(
    State(state): State<ApiState>,
    Json(request): Json<QuoteRequest>,
) -> Result<Json<QuoteResponse>, ApiFailure> {
    let correlation_id = Uuid::new_v4().to_string();
    let (_, result) = price(&state, request).map_err(|e| fail(e, &correlation_id))?;

    info!(
        event_name = "quote.computed",
        correlation_id = %correlation_id,
        final_price = %result.final_price,
        warnings = result.warnings.len(),
        "quote computed"
    );

    let warnings = result.warnings.iter().map(|warning| warning.message()).collect();
    let summary = format_summary(&result);
    Ok(Json(QuoteResponse { result, summary, warnings }))
}

async fn create_proposal(
    State(state): State<ApiState>,
    Query(query): Query<ProposalQuery>,
    Json(request): Json<QuoteRequest>,
) -> Result<Json<ProposalResponse>, ApiFailure> {
    let correlation_id = Uuid::new_v4().to_string();
    let today = proposal_date(query.date.as_deref()).map_err(|e| fail(e, &correlation_id))?;
    let (input, result) = price(&state, request).map_err(|e| fail(e, &correlation_id))?;

    let document = format_proposal(&input, &result, today);
    info!(
        event_name = "proposal.rendered",
        correlation_id = %correlation_id,
        lines = document.lines.len(),
        warnings = result.warnings.len(),
        "proposal rendered"
    );

    Ok(Json(ProposalResponse {
        text: document.to_text(),
        lines: document.lines,
        warnings: result.warnings.iter().map(|warning| warning.message()).collect(),
        available_formats: state.exporters.available_formats(),
    }))
}

async fn export_proposal(
    State(state): State<ApiState>,
    Query(query): Query<ExportQuery>,
    Json(request): Json<QuoteRequest>,
) -> Result<Response, ApiFailure> {
    let correlation_id = Uuid::new_v4().to_string();
    let format = match query.format.as_deref() {
        Some(raw) => raw.parse::<ExportFormat>().map_err(|e| fail(e, &correlation_id))?,
        None => ExportFormat::Text,
    };
    let exporter = state.exporters.get(format).ok_or_else(|| {
        fail(ApplicationError::ExportUnavailable(format.to_string()), &correlation_id)
    })?;

    let today = proposal_date(query.date.as_deref()).map_err(|e| fail(e, &correlation_id))?;
    let (input, result) = price(&state, request).map_err(|e| fail(e, &correlation_id))?;
    let document = format_proposal(&input, &result, today);

    let exported = exporter.export(&document).await.map_err(|e| fail(e, &correlation_id))?;
    info!(
        event_name = "proposal.exported",
        correlation_id = %correlation_id,
        requested_format = %format,
        format = %exported.format,
        size = exported.bytes.len(),
        "proposal exported"
    );

    let disposition = format!("attachment; filename=\"{}\"", exported.file_name);
    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, exported.content_type.to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        exported.bytes,
    )
        .into_response())
}

async fn catalog(State(state): State<ApiState>) -> Json<CatalogResponse> {
    let weights = default_phase_weights();
    Json(CatalogResponse {
        default_area_sqm: DEFAULT_AREA_SQM,
        phases: Phase::ALL
            .into_iter()
            .map(|phase| PhaseDefault {
                code: phase.code(),
                name: phase.name(),
                default_weight: weights.get(&phase).copied().unwrap_or(0),
            })
            .collect(),
        add_ons: state.catalog.add_ons().to_vec(),
    })
}
