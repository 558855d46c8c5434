pub mod catalog;
pub mod config;
pub mod doctor;
pub mod proposal;
pub mod quote;

use archquote_core::config::{AppConfig, LoadOptions};
use archquote_core::domain::catalog::Catalog;
use archquote_core::domain::quote::{
    Difficulty, FinishLevel, NatureOfWork, Phase, QuoteInput, Urgency,
};
use archquote_core::errors::DomainError;
use archquote_core::intake::{AddOnRequest, QuoteRequest};
use clap::Args;
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::Value;

pub const EXIT_CONFIG: u8 = 2;
pub const EXIT_INPUT: u8 = 3;
pub const EXIT_IO: u8 = 4;

#[derive(Debug, Clone)]
pub struct CommandResult {
    pub exit_code: u8,
    pub output: String,
}

#[derive(Debug, Serialize)]
struct CommandOutcome {
    command: String,
    status: String,
    error_class: Option<String>,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<Value>,
}

impl CommandResult {
    pub fn success(command: &str, message: impl Into<String>) -> Self {
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "ok".to_string(),
            error_class: None,
            message: message.into(),
            data: None,
        };
        Self { exit_code: 0, output: serialize_payload(payload) }
    }

    pub fn with_data(command: &str, message: impl Into<String>, data: &impl Serialize) -> Self {
        let data = match serde_json::to_value(data) {
            Ok(data) => data,
            Err(error) => return Self::failure(command, "serialization", error.to_string(), 1),
        };
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "ok".to_string(),
            error_class: None,
            message: message.into(),
            data: Some(data),
        };
        Self { exit_code: 0, output: serialize_payload(payload) }
    }

    pub fn failure(
        command: &str,
        error_class: &str,
        message: impl Into<String>,
        exit_code: u8,
    ) -> Self {
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "error".to_string(),
            error_class: Some(error_class.to_string()),
            message: message.into(),
            data: None,
        };
        Self { exit_code, output: serialize_payload(payload) }
    }

    pub fn plain(output: impl Into<String>) -> Self {
        Self { exit_code: 0, output: output.into() }
    }
}

fn serialize_payload(payload: CommandOutcome) -> String {
    serde_json::to_string(&payload).unwrap_or_else(|error| {
        format!(
            "{{\"command\":\"unknown\",\"status\":\"error\",\"error_class\":\"serialization\",\"message\":\"{}\"}}",
            error.to_string().replace('\\', "\\\\").replace('"', "\\\"")
        )
    })
}

/// Quote form fields shared by `quote` and `proposal`.
#[derive(Debug, Clone, Default, Args)]
pub struct QuoteArgs {
    #[arg(long, value_name = "M2", allow_hyphen_values = true, help = "Built area in m² (default 52)")]
    pub area: Option<Decimal>,
    #[arg(long, help = "pequena|media|grande (default media)")]
    pub difficulty: Option<Difficulty>,
    #[arg(long, help = "nova|reforma|retrofit (default reforma)")]
    pub nature: Option<NatureOfWork>,
    #[arg(long, help = "conv|medio|premium (default medio)")]
    pub finish: Option<FinishLevel>,
    #[arg(long, help = "normal|urgente (default normal)")]
    pub urgency: Option<Urgency>,
    #[arg(
        long = "weight",
        value_name = "PHASE=N",
        value_parser = parse_weight,
        help = "Phase weight in percent, e.g. EXEC=40 (repeatable)"
    )]
    pub weights: Vec<(Phase, u32)>,
    #[arg(long = "phase", value_name = "PHASE", help = "Phase included in the proposal (repeatable, default all)")]
    pub phases: Vec<Phase>,
    #[arg(long = "addon", value_name = "ID[:QTY[:PRICE]]", help = "Catalog or custom add-on (repeatable)")]
    pub add_ons: Vec<String>,
    #[arg(long = "free-extra", value_name = "BRL", allow_hyphen_values = true)]
    pub free_extra: Option<Decimal>,
}

impl QuoteArgs {
    pub fn into_request(self) -> Result<QuoteRequest, DomainError> {
        let add_ons = self
            .add_ons
            .iter()
            .map(|raw| AddOnRequest::parse_shorthand(raw))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(QuoteRequest {
            area_sqm: self.area,
            difficulty: self.difficulty,
            nature_of_work: self.nature,
            finish_level: self.finish,
            urgency: self.urgency,
            phase_weights: (!self.weights.is_empty())
                .then(|| self.weights.into_iter().collect()),
            included_phases: (!self.phases.is_empty()).then(|| self.phases.into_iter().collect()),
            add_ons,
            free_extra: self.free_extra,
        })
    }
}

fn parse_weight(raw: &str) -> Result<(Phase, u32), String> {
    let (phase, weight) =
        raw.split_once('=').ok_or_else(|| format!("expected PHASE=N, got `{raw}`"))?;
    let phase = phase.parse::<Phase>().map_err(|error| error.to_string())?;
    let weight = weight
        .trim()
        .parse::<u32>()
        .map_err(|_| format!("weight for {phase} must be a whole percentage, got `{weight}`"))?;
    Ok((phase, weight))
}

pub(crate) fn load_config(command: &str) -> Result<AppConfig, CommandResult> {
    AppConfig::load(LoadOptions::default()).map_err(|error| {
        CommandResult::failure(command, "config_validation", error.to_string(), EXIT_CONFIG)
    })
}

pub(crate) fn build_input(command: &str, args: QuoteArgs) -> Result<QuoteInput, CommandResult> {
    args.into_request()
        .and_then(|request| request.into_input(&Catalog::default()))
        .map_err(|error| {
            CommandResult::failure(command, "invalid_input", error.to_string(), EXIT_INPUT)
        })
}
