use std::sync::Arc;

use archquote_core::export::{ExportFormat, ExporterSet};
use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use chrono::Utc;
use serde::Serialize;

#[derive(Clone)]
pub struct HealthState {
    exporters: Arc<ExporterSet>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthCheck {
    pub status: &'static str,
    pub detail: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: HealthCheck,
    pub export: HealthCheck,
    pub checked_at: String,
}

pub fn router(exporters: Arc<ExporterSet>) -> Router {
    Router::new().route("/health", get(health)).with_state(HealthState { exporters })
}

/// Missing export formats degrade the export check only; quoting stays ready.
pub async fn health(State(state): State<HealthState>) -> (StatusCode, Json<HealthResponse>) {
    let payload = HealthResponse {
        status: "ready",
        service: HealthCheck {
            status: "ready",
            detail: "archquote-server runtime initialized".to_string(),
        },
        export: export_check(&state.exporters),
        checked_at: Utc::now().to_rfc3339(),
    };

    (StatusCode::OK, Json(payload))
}

fn export_check(exporters: &ExporterSet) -> HealthCheck {
    let formats = exporters
        .available_formats()
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ");

    if exporters.supports(ExportFormat::Pdf) {
        HealthCheck { status: "ready", detail: format!("export formats: {formats}") }
    } else {
        HealthCheck {
            status: "degraded",
            detail: format!("pdf export unavailable; export formats: {formats}"),
        }
    }
}
