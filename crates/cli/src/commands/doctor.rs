use archquote_core::config::{AppConfig, LoadOptions};
use archquote_core::domain::catalog::Catalog;
use archquote_core::export::{locate_pdf_converter, PDF_CONVERTER_BINARY};
use archquote_core::intake::QuoteRequest;
use archquote_core::pricing::{DeterministicPricingEngine, PricingEngine};
use archquote_core::proposal::money::format_brl;
use serde::Serialize;

use super::CommandResult;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
enum CheckStatus {
    Pass,
    Warn,
    Fail,
    Skipped,
}

#[derive(Debug, Serialize)]
struct DoctorCheck {
    name: &'static str,
    status: CheckStatus,
    details: String,
}

#[derive(Debug, Serialize)]
struct DoctorReport {
    overall_status: CheckStatus,
    summary: String,
    checks: Vec<DoctorCheck>,
}

pub fn run(json_output: bool) -> CommandResult {
    let report = build_report();
    let exit_code = if report.overall_status == CheckStatus::Fail { 1 } else { 0 };

    let output = if json_output {
        serde_json::to_string_pretty(&report).unwrap_or_else(|error| {
            format!(
                "{{\"overall_status\":\"fail\",\"summary\":\"doctor serialization failed\",\"error\":\"{}\"}}",
                escape_json(&error.to_string())
            )
        })
    } else {
        render_human(&report)
    };

    CommandResult { exit_code, output }
}

fn build_report() -> DoctorReport {
    let mut checks = Vec::new();

    match AppConfig::load(LoadOptions::default()) {
        Ok(config) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Pass,
                details: "configuration loaded and validated".to_string(),
            });
            checks.push(check_pricing_sanity(&config));
            checks.push(check_retrofit_factor(&config));
            checks.push(check_pdf_export(&config));
        }
        Err(error) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Fail,
                details: error.to_string(),
            });
            for name in ["pricing_sanity", "retrofit_factor", "pdf_export"] {
                checks.push(DoctorCheck {
                    name,
                    status: CheckStatus::Skipped,
                    details: "skipped because configuration did not load".to_string(),
                });
            }
        }
    }

    let overall_status = if checks.iter().any(|check| check.status == CheckStatus::Fail) {
        CheckStatus::Fail
    } else if checks.iter().any(|check| check.status == CheckStatus::Warn) {
        CheckStatus::Warn
    } else {
        CheckStatus::Pass
    };
    let summary = match overall_status {
        CheckStatus::Pass => "doctor: all readiness checks passed",
        CheckStatus::Warn => "doctor: ready with degraded capabilities",
        _ => "doctor: one or more readiness checks failed",
    }
    .to_string();

    DoctorReport { overall_status, summary, checks }
}

/// Prices the default form and checks the minimum fee does not exceed the
/// variable base right above the threshold.
fn check_pricing_sanity(config: &AppConfig) -> DoctorCheck {
    let engine = DeterministicPricingEngine::new(config.pricing.clone());
    let input = match QuoteRequest::default().into_input(&Catalog::default()) {
        Ok(input) => input,
        Err(error) => {
            return DoctorCheck {
                name: "pricing_sanity",
                status: CheckStatus::Fail,
                details: format!("default form could not be built: {error}"),
            };
        }
    };
    let result = engine.compute(&input);

    let rates = engine.rates();
    let threshold_base = rates.minimum_fee_area_sqm * rates.rate_per_sqm;
    if threshold_base < rates.minimum_fee {
        return DoctorCheck {
            name: "pricing_sanity",
            status: CheckStatus::Warn,
            details: format!(
                "areas just above the threshold price below the minimum fee ({} < {}); default form quotes {}",
                format_brl(threshold_base),
                format_brl(rates.minimum_fee),
                format_brl(result.final_price)
            ),
        };
    }

    DoctorCheck {
        name: "pricing_sanity",
        status: CheckStatus::Pass,
        details: format!("default form quotes {}", format_brl(result.final_price)),
    }
}

fn check_retrofit_factor(config: &AppConfig) -> DoctorCheck {
    match config.pricing.retrofit_factor {
        Some(factor) => DoctorCheck {
            name: "retrofit_factor",
            status: CheckStatus::Pass,
            details: format!("retrofit quotes use × {factor}"),
        },
        None => DoctorCheck {
            name: "retrofit_factor",
            status: CheckStatus::Warn,
            details: "pricing.retrofit_factor unset; retrofit quotes use × 1.00 with a warning"
                .to_string(),
        },
    }
}

fn check_pdf_export(config: &AppConfig) -> DoctorCheck {
    if !config.export.pdf_enabled {
        return DoctorCheck {
            name: "pdf_export",
            status: CheckStatus::Skipped,
            details: "disabled by export.pdf_enabled".to_string(),
        };
    }

    match locate_pdf_converter(&config.export) {
        Some(path) => DoctorCheck {
            name: "pdf_export",
            status: CheckStatus::Pass,
            details: format!("converter found at `{}`", path.display()),
        },
        None => DoctorCheck {
            name: "pdf_export",
            status: CheckStatus::Warn,
            details: format!(
                "`{PDF_CONVERTER_BINARY}` not found; proposals export as text and HTML only"
            ),
        },
    }
}

fn render_human(report: &DoctorReport) -> String {
    let mut lines = Vec::new();
    lines.push(report.summary.clone());

    for check in &report.checks {
        let marker = match check.status {
            CheckStatus::Pass => "ok",
            CheckStatus::Warn => "warn",
            CheckStatus::Fail => "fail",
            CheckStatus::Skipped => "skip",
        };
        lines.push(format!("- [{marker}] {}: {}", check.name, check.details));
    }

    lines.join("\n")
}

fn escape_json(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}
