//! Client-facing proposal text and the on-screen quote summary.
//!
//! Both renderings are pure: the same input, result and date always produce
//! the same lines.

pub mod money;

use chrono::NaiveDate;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::domain::quote::{Phase, QuoteInput};
use crate::pricing::{BaseRule, QuoteResult};

use self::money::{fixed_point, format_brl, whole};

pub const PROPOSAL_TITLE: &str = "Proposta de Serviços — Arquitetura";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProposalDocument {
    pub lines: Vec<String>,
}

impl ProposalDocument {
    pub fn title(&self) -> &str {
        self.lines.first().map(String::as_str).unwrap_or(PROPOSAL_TITLE)
    }

    pub fn to_text(&self) -> String {
        self.lines.join("\n")
    }
}

fn factor(value: Decimal) -> String {
    fixed_point(value, 2, RoundingStrategy::MidpointAwayFromZero)
}

pub fn format_proposal(input: &QuoteInput, result: &QuoteResult, today: NaiveDate) -> ProposalDocument {
    let mut lines = vec![
        PROPOSAL_TITLE.to_string(),
        String::new(),
        format!("Data: {}", today.format("%d/%m/%Y")),
        format!("Área: {} m²", whole(input.area_sqm)),
    ];

    match &result.base_rule {
        BaseRule::MinimumFee { fee, threshold_sqm } => {
            lines.push(format!(
                "Regra aplicada: mínimo {} (≤ {} m²)",
                format_brl(*fee),
                whole(*threshold_sqm)
            ));
        }
        BaseRule::RatePerSqm { rate, threshold_sqm, unclamped } => {
            lines.push(format!(
                "Regra aplicada: {}/m² (> {} m²)",
                format_brl(*rate),
                whole(*threshold_sqm)
            ));
            lines.push(format!("Base variável (área × R$/m²): {}", format_brl(*unclamped)));
        }
    }
    lines.push(format!("Base considerada: {}", format_brl(result.base)));

    lines.push("Multiplicadores:".to_string());
    lines.push(format!(
        "  - Dificuldade: × {} ({})",
        factor(result.factors.difficulty),
        input.difficulty.label()
    ));
    lines.push(format!(
        "  - Natureza: × {} ({})",
        factor(result.factors.nature_of_work),
        input.nature_of_work.label()
    ));
    lines.push(format!(
        "  - Acabamento: × {} ({})",
        factor(result.factors.finish_level),
        input.finish_level.label()
    ));
    lines.push(format!(
        "  - Urgência: × {} ({})",
        factor(result.factors.urgency),
        input.urgency.label()
    ));
    lines.push(String::new());

    lines.push("Quebra por fase (antes dos adicionais):".to_string());
    for phase in Phase::ALL {
        lines.push(format!(
            "  - {}: {} ({}% de {})",
            phase.name(),
            format_brl(result.phase_value(phase)),
            whole(result.normalized_weight(phase) * Decimal::ONE_HUNDRED),
            format_brl(result.subtotal_all_phases)
        ));
    }
    lines.push(String::new());

    if result.included_phases.is_empty() {
        lines.push("Nenhuma fase selecionada.".to_string());
    } else {
        let codes: Vec<&str> = result.included_phases.iter().map(|phase| phase.code()).collect();
        lines.push(format!("Fases incluídas nesta proposta: {}", codes.join(", ")));
    }
    lines.push(format!(
        "Subtotal (fases incluídas): {}",
        format_brl(result.subtotal_included_phases)
    ));

    if result.has_add_ons_section() {
        lines.push("Adicionais:".to_string());
        for line in &result.add_on_lines {
            lines.push(format!("- {} ({}×): {}", line.name, line.quantity, format_brl(line.amount)));
        }
        if result.free_extra > Decimal::ZERO {
            lines.push(format!("- Extra livre: {}", format_brl(result.free_extra)));
        }
        lines.push(format!("Adicionais total: {}", format_brl(result.add_ons_total)));
    }

    if !result.warnings.is_empty() {
        lines.push(String::new());
        for warning in &result.warnings {
            lines.push(format!("Aviso: {}", warning.message()));
        }
    }

    lines.push(String::new());
    lines.push(format!("PREÇO FINAL: {}", format_brl(result.final_price)));

    ProposalDocument { lines }
}

/// Metrics block shown next to the form, before any proposal is exported.
pub fn format_summary(result: &QuoteResult) -> Vec<String> {
    let mut lines = vec![
        format!("Preço final: {}", format_brl(result.final_price)),
        format!("Base: {}", format_brl(result.base)),
        format!(
            "Multiplicadores: × {}",
            fixed_point(result.multiplier, 3, RoundingStrategy::MidpointAwayFromZero)
        ),
        format!("Subtotal (todas as fases): {}", format_brl(result.subtotal_all_phases)),
        format!("Subtotal (fases incluídas): {}", format_brl(result.subtotal_included_phases)),
        format!("Adicionais: {}", format_brl(result.add_ons_total)),
        String::new(),
        "Fases (quebrado):".to_string(),
    ];
    for phase in Phase::ALL {
        lines.push(format!("- {}: {}", phase.code(), format_brl(result.phase_value(phase))));
    }
    if result.phase_weight_sum > 0 {
        lines.push(format!(
            "Soma atual: {}% (o cálculo normaliza para 100% se necessário)",
            result.phase_weight_sum
        ));
    }
    for warning in &result.warnings {
        lines.push(format!("Aviso: {}", warning.message()));
    }
    lines
}
