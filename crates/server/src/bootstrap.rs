use std::sync::Arc;

use archquote_core::config::{AppConfig, ConfigError};
use archquote_core::domain::catalog::Catalog;
use archquote_core::export::{locate_pdf_converter, ExportError, ExporterSet};
use archquote_core::pricing::DeterministicPricingEngine;
use thiserror::Error;
use tracing::{info, warn};

use crate::render::{HtmlExporter, PdfExporter};
use crate::routes::ApiState;

pub struct Application {
    pub config: AppConfig,
    pub state: ApiState,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("proposal template could not be loaded: {0}")]
    Template(#[source] ExportError),
}

pub async fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(
        event_name = "system.bootstrap.start",
        correlation_id = "bootstrap",
        "starting application bootstrap"
    );

    let exporters = build_exporters(&config)?;
    info!(
        event_name = "system.bootstrap.exporters_ready",
        correlation_id = "bootstrap",
        formats = ?exporters.available_formats(),
        "proposal exporters registered"
    );

    let state = ApiState {
        engine: Arc::new(DeterministicPricingEngine::new(config.pricing.clone())),
        exporters: Arc::new(exporters),
        catalog: Arc::new(Catalog::default()),
    };

    Ok(Application { config, state })
}

fn build_exporters(config: &AppConfig) -> Result<ExporterSet, BootstrapError> {
    let company_name = &config.export.company_name;

    let html = match config.export.template_dir.as_deref() {
        Some(dir) => match HtmlExporter::from_dir(dir, company_name) {
            Ok(html) => html,
            Err(error) => {
                warn!(
                    event_name = "system.bootstrap.template_fallback",
                    correlation_id = "bootstrap",
                    error = %error,
                    "failed to load proposal template from filesystem, using embedded fallback"
                );
                HtmlExporter::embedded(company_name).map_err(BootstrapError::Template)?
            }
        },
        None => HtmlExporter::embedded(company_name).map_err(BootstrapError::Template)?,
    };

    let mut exporters = ExporterSet::text_only().with(Arc::new(html.clone()));

    match locate_pdf_converter(&config.export) {
        Some(converter) => {
            exporters = exporters.with(Arc::new(PdfExporter::new(html, converter)));
        }
        None if config.export.pdf_enabled => {
            warn!(
                event_name = "system.bootstrap.pdf_unavailable",
                correlation_id = "bootstrap",
                "wkhtmltopdf not found - PDF export disabled"
            );
        }
        None => {}
    }

    Ok(exporters)
}
