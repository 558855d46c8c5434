//! HTML and PDF renderings of a proposal.
//!
//! HTML comes from a tera template, one paragraph per proposal line. PDF is
//! that HTML converted by `wkhtmltopdf`; a failed conversion falls back to
//! the HTML document.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;

use archquote_core::export::{DocumentExporter, ExportError, ExportFormat, ExportedDocument};
use archquote_core::proposal::ProposalDocument;
use async_trait::async_trait;
use tera::{Context, Tera};
use tokio::process::Command;
use tracing::{error, info, warn};

pub const PROPOSAL_TEMPLATE: &str = "proposal/document.html.tera";

#[derive(Clone, Debug)]
pub struct HtmlExporter {
    tera: Arc<Tera>,
    company_name: String,
}

impl HtmlExporter {
    /// Loads `proposal/document.html.tera` from `template_dir`.
    pub fn from_dir(template_dir: &str, company_name: &str) -> Result<Self, ExportError> {
        let tera = Tera::new(&format!("{}/**/*", template_dir.trim_end_matches('/')))
            .map_err(|e| ExportError::Template(e.to_string()))?;

        if !tera.get_template_names().any(|name| name == PROPOSAL_TEMPLATE) {
            return Err(ExportError::Template(format!(
                "`{PROPOSAL_TEMPLATE}` not found under `{template_dir}`"
            )));
        }

        Ok(Self { tera: Arc::new(tera), company_name: company_name.to_string() })
    }

    pub fn embedded(company_name: &str) -> Result<Self, ExportError> {
        let mut tera = Tera::default();
        tera.add_raw_template(
            PROPOSAL_TEMPLATE,
            include_str!("../../../templates/proposal/document.html.tera"),
        )
        .map_err(|e| ExportError::Template(e.to_string()))?;

        Ok(Self { tera: Arc::new(tera), company_name: company_name.to_string() })
    }

    pub fn render(&self, document: &ProposalDocument) -> Result<String, ExportError> {
        let mut context = Context::new();
        context.insert("title", document.title());
        context.insert("lines", &document.lines);
        context.insert("company_name", &self.company_name);

        self.tera
            .render(PROPOSAL_TEMPLATE, &context)
            .map_err(|e| ExportError::Template(e.to_string()))
    }
}

#[async_trait]
impl DocumentExporter for HtmlExporter {
    fn format(&self) -> ExportFormat {
        ExportFormat::Html
    }

    async fn export(&self, document: &ProposalDocument) -> Result<ExportedDocument, ExportError> {
        let html = self.render(document)?;
        Ok(ExportedDocument::new(ExportFormat::Html, html.into_bytes()))
    }
}

#[derive(Clone, Debug)]
pub struct PdfExporter {
    html: HtmlExporter,
    converter: PathBuf,
}

impl PdfExporter {
    pub fn new(html: HtmlExporter, converter: PathBuf) -> Self {
        info!(
            event_name = "system.export.pdf_converter",
            correlation_id = "bootstrap",
            path = %converter.display(),
            "wkhtmltopdf found"
        );
        Self { html, converter }
    }

    async fn convert_html_to_pdf(&self, html: &str) -> Result<Vec<u8>, ExportError> {
        let temp_dir = std::env::temp_dir();
        let html_path = temp_dir.join(format!("proposal_{}.html", uuid::Uuid::new_v4()));
        let pdf_path = temp_dir.join(format!("proposal_{}.pdf", uuid::Uuid::new_v4()));

        tokio::fs::write(&html_path, html).await?;
        let converted = run_converter(&self.converter, &html_path, &pdf_path).await;

        let _ = tokio::fs::remove_file(&html_path).await;
        let _ = tokio::fs::remove_file(&pdf_path).await;

        let pdf_bytes = converted?;
        info!(size = pdf_bytes.len(), "PDF generated successfully");
        Ok(pdf_bytes)
    }
}

async fn run_converter(
    converter: &Path,
    html_path: &Path,
    pdf_path: &Path,
) -> Result<Vec<u8>, ExportError> {
    let output = Command::new(converter)
        .args(["--page-size", "A4"])
        .args(["--margin-top", "20mm", "--margin-bottom", "20mm"])
        .args(["--margin-left", "25mm", "--margin-right", "25mm"])
        .args(["--encoding", "utf-8", "--quiet"])
        .arg(html_path)
        .arg(pdf_path)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .await?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        error!(stderr = %stderr, "wkhtmltopdf failed");
        return Err(ExportError::Conversion(stderr.trim().to_string()));
    }

    Ok(tokio::fs::read(pdf_path).await?)
}

#[async_trait]
impl DocumentExporter for PdfExporter {
    fn format(&self) -> ExportFormat {
        ExportFormat::Pdf
    }

    async fn export(&self, document: &ProposalDocument) -> Result<ExportedDocument, ExportError> {
        let html = self.html.render(document)?;

        match self.convert_html_to_pdf(&html).await {
            Ok(pdf_bytes) => Ok(ExportedDocument::new(ExportFormat::Pdf, pdf_bytes)),
            Err(e) => {
                warn!(error = %e, "PDF conversion failed, falling back to HTML");
                Ok(ExportedDocument::new(ExportFormat::Html, html.into_bytes()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use archquote_core::export::{DocumentExporter, ExportFormat};
    use archquote_core::proposal::ProposalDocument;

    use super::{HtmlExporter, PdfExporter, PROPOSAL_TEMPLATE};

    fn document() -> ProposalDocument {
        ProposalDocument {
            lines: vec![
                "Proposta de Serviços — Arquitetura".to_string(),
                String::new(),
                "  - Dificuldade: × 1.10 (Média)".to_string(),
                "- Maquete <escala 1:50> (1×): R$ 900,00".to_string(),
                "PREÇO FINAL: R$ 8.190,00".to_string(),
            ],
        }
    }

    #[test]
    fn embedded_template_renders_one_paragraph_per_line() {
        let exporter = HtmlExporter::embedded("Atelier Teste").expect("embedded template");
        let html = exporter.render(&document()).expect("render");

        assert!(html.contains("<title>Proposta de Serviços — Arquitetura</title>"));
        assert!(html.contains("Times New Roman"));
        assert!(html.contains("<p>&nbsp;</p>"));
        assert!(html.contains("<p>PREÇO FINAL: R$ 8.190,00</p>"));
        assert!(html.contains("Atelier Teste"));
        assert_eq!(html.matches("<p>").count(), 5);
    }

    #[test]
    fn line_content_is_escaped() {
        let exporter = HtmlExporter::embedded("Atelier").expect("embedded template");
        let html = exporter.render(&document()).expect("render");

        assert!(html.contains("Maquete &lt;escala 1:50&gt;"));
        assert!(!html.contains("<escala"));
    }

    #[test]
    fn template_directory_must_contain_proposal_template() {
        let dir = tempfile::TempDir::new().expect("temp dir");
        let result = HtmlExporter::from_dir(&dir.path().display().to_string(), "Atelier");
        assert!(result.is_err(), "{PROPOSAL_TEMPLATE} should be required");
    }

    #[test]
    fn template_directory_overrides_embedded_template() {
        let dir = tempfile::TempDir::new().expect("temp dir");
        std::fs::create_dir_all(dir.path().join("proposal")).expect("proposal dir");
        std::fs::write(
            dir.path().join("proposal/document.html.tera"),
            "{{ company_name }}|{{ lines | length }}",
        )
        .expect("template");

        let exporter = HtmlExporter::from_dir(&dir.path().display().to_string(), "Atelier")
            .expect("custom template");
        assert_eq!(exporter.render(&document()).expect("render"), "Atelier|5");
    }

    #[tokio::test]
    async fn html_exporter_reports_html_document() {
        let exporter = HtmlExporter::embedded("Atelier").expect("embedded template");
        let exported = exporter.export(&document()).await.expect("export");

        assert_eq!(exported.format, ExportFormat::Html);
        assert_eq!(exported.file_name, "proposta_orcamento.html");
        assert_eq!(exported.content_type, "text/html; charset=utf-8");
    }

    #[tokio::test]
    async fn failed_conversion_falls_back_to_html() {
        let html = HtmlExporter::embedded("Atelier").expect("embedded template");
        let exporter = PdfExporter::new(html, PathBuf::from("/nonexistent/bin/wkhtmltopdf"));

        let exported = exporter.export(&document()).await.expect("fallback export");
        assert_eq!(exported.format, ExportFormat::Html);
        assert!(String::from_utf8(exported.bytes).expect("utf-8").contains("PREÇO FINAL"));
    }
}
