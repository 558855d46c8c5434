//! Optional document export capability.
//!
//! The pricing engine and the proposal formatter never depend on an exporter.
//! A missing format is a configuration state reported by
//! [`ExporterSet::available_formats`], not an error raised while quoting.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::ExportConfig;
use crate::errors::DomainError;
use crate::proposal::ProposalDocument;

pub const EXPORT_FILE_STEM: &str = "proposta_orcamento";
pub const PDF_CONVERTER_BINARY: &str = "wkhtmltopdf";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportFormat {
    Text,
    Html,
    Pdf,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            Self::Text => "txt",
            Self::Html => "html",
            Self::Pdf => "pdf",
        }
    }

    pub fn content_type(self) -> &'static str {
        match self {
            Self::Text => "text/plain; charset=utf-8",
            Self::Html => "text/html; charset=utf-8",
            Self::Pdf => "application/pdf",
        }
    }

    pub fn file_name(self) -> String {
        format!("{EXPORT_FILE_STEM}.{}", self.extension())
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for ExportFormat {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "txt" | "text" => Ok(Self::Text),
            "html" => Ok(Self::Html),
            "pdf" => Ok(Self::Pdf),
            _ => Err(DomainError::unknown_option("export format", value)),
        }
    }
}

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("template error: {0}")]
    Template(String),
    #[error("conversion error: {0}")]
    Conversion(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExportedDocument {
    /// Format actually produced, which may differ from the one requested after a fallback.
    pub format: ExportFormat,
    pub file_name: String,
    pub content_type: &'static str,
    pub bytes: Vec<u8>,
}

impl ExportedDocument {
    pub fn new(format: ExportFormat, bytes: Vec<u8>) -> Self {
        Self { format, file_name: format.file_name(), content_type: format.content_type(), bytes }
    }
}

#[async_trait]
pub trait DocumentExporter: Send + Sync {
    fn format(&self) -> ExportFormat;

    async fn export(&self, document: &ProposalDocument) -> Result<ExportedDocument, ExportError>;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct TextExporter;

#[async_trait]
impl DocumentExporter for TextExporter {
    fn format(&self) -> ExportFormat {
        ExportFormat::Text
    }

    async fn export(&self, document: &ProposalDocument) -> Result<ExportedDocument, ExportError> {
        Ok(ExportedDocument::new(ExportFormat::Text, document.to_text().into_bytes()))
    }
}

#[derive(Clone, Default)]
pub struct ExporterSet {
    exporters: Vec<Arc<dyn DocumentExporter>>,
}

impl ExporterSet {
    /// Plain text only; every deployment can offer it.
    pub fn text_only() -> Self {
        Self::default().with(Arc::new(TextExporter))
    }

    /// Registers an exporter, replacing any previous one for the same format.
    pub fn with(mut self, exporter: Arc<dyn DocumentExporter>) -> Self {
        let format = exporter.format();
        self.exporters.retain(|existing| existing.format() != format);
        self.exporters.push(exporter);
        self
    }

    pub fn get(&self, format: ExportFormat) -> Option<Arc<dyn DocumentExporter>> {
        self.exporters.iter().find(|exporter| exporter.format() == format).cloned()
    }

    pub fn available_formats(&self) -> Vec<ExportFormat> {
        self.exporters.iter().map(|exporter| exporter.format()).collect()
    }

    pub fn supports(&self, format: ExportFormat) -> bool {
        self.get(format).is_some()
    }
}

impl fmt::Debug for ExporterSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExporterSet").field("formats", &self.available_formats()).finish()
    }
}

/// Locates the HTML to PDF converter: the configured path when it exists,
/// otherwise `wkhtmltopdf` on `PATH`. `None` when PDF export is disabled.
pub fn locate_pdf_converter(config: &ExportConfig) -> Option<PathBuf> {
    if !config.pdf_enabled {
        return None;
    }

    match config.wkhtmltopdf_path.as_deref() {
        Some(path) => Some(Path::new(path)).filter(|path| path.is_file()).map(Path::to_path_buf),
        None => which::which(PDF_CONVERTER_BINARY).ok(),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;

    use super::{
        locate_pdf_converter, DocumentExporter, ExportError, ExportFormat, ExportedDocument,
        ExporterSet, TextExporter,
    };
    use crate::config::AppConfig;
    use crate::proposal::ProposalDocument;

    fn document() -> ProposalDocument {
        ProposalDocument {
            lines: vec!["Proposta".to_string(), String::new(), "PREÇO FINAL: R$ 1,00".to_string()],
        }
    }

    #[tokio::test]
    async fn text_exporter_joins_lines_with_newlines() {
        let exported = TextExporter.export(&document()).await.expect("text export");

        assert_eq!(exported.format, ExportFormat::Text);
        assert_eq!(exported.file_name, "proposta_orcamento.txt");
        assert_eq!(exported.content_type, "text/plain; charset=utf-8");
        assert_eq!(
            String::from_utf8(exported.bytes).expect("utf-8"),
            "Proposta\n\nPREÇO FINAL: R$ 1,00"
        );
    }

    #[test]
    fn text_only_set_reports_missing_formats_without_failing() {
        let exporters = ExporterSet::text_only();

        assert_eq!(exporters.available_formats(), vec![ExportFormat::Text]);
        assert!(exporters.get(ExportFormat::Pdf).is_none());
        assert!(!exporters.supports(ExportFormat::Html));
    }

    #[tokio::test]
    async fn registering_same_format_replaces_previous_exporter() {
        struct ShoutingText;

        #[async_trait]
        impl DocumentExporter for ShoutingText {
            fn format(&self) -> ExportFormat {
                ExportFormat::Text
            }

            async fn export(
                &self,
                document: &ProposalDocument,
            ) -> Result<ExportedDocument, ExportError> {
                Ok(ExportedDocument::new(
                    ExportFormat::Text,
                    document.to_text().to_uppercase().into_bytes(),
                ))
            }
        }

        let exporters = ExporterSet::text_only().with(Arc::new(ShoutingText));
        assert_eq!(exporters.available_formats().len(), 1);

        let exporter = exporters.get(ExportFormat::Text).expect("text exporter");
        let exported = exporter.export(&document()).await.expect("export");
        assert!(String::from_utf8(exported.bytes).expect("utf-8").starts_with("PROPOSTA"));
    }

    #[test]
    fn formats_parse_from_extensions() {
        assert_eq!("TXT".parse::<ExportFormat>().expect("txt"), ExportFormat::Text);
        assert_eq!("pdf".parse::<ExportFormat>().expect("pdf"), ExportFormat::Pdf);
        assert!("docx".parse::<ExportFormat>().is_err());
    }

    #[test]
    fn converter_lookup_respects_disabled_flag_and_missing_paths() {
        let mut export = AppConfig::default().export;
        export.pdf_enabled = false;
        assert!(locate_pdf_converter(&export).is_none());

        export.pdf_enabled = true;
        export.wkhtmltopdf_path = Some("/nonexistent/bin/wkhtmltopdf".to_string());
        assert!(locate_pdf_converter(&export).is_none());

        let dir = tempfile::TempDir::new().expect("temp dir");
        let fake = dir.path().join("wkhtmltopdf");
        std::fs::write(&fake, b"#!/bin/sh\n").expect("fake converter");
        export.wkhtmltopdf_path = Some(fake.display().to_string());
        assert_eq!(locate_pdf_converter(&export), Some(fake));
    }
}
