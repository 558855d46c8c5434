pub mod rates;

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::quote::{NatureOfWork, Phase, QuoteInput};

use self::rates::RateTable;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricingTraceStep {
    pub stage: String,
    pub detail: String,
    pub amount: Decimal,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricingTrace {
    pub steps: Vec<PricingTraceStep>,
}

impl PricingTrace {
    fn push(&mut self, stage: &str, detail: impl Into<String>, amount: Decimal) {
        self.steps.push(PricingTraceStep {
            stage: stage.to_string(),
            detail: detail.into(),
            amount,
        });
    }
}

/// Which base-amount rule produced `QuoteResult::base`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum BaseRule {
    MinimumFee { fee: Decimal, threshold_sqm: Decimal },
    RatePerSqm { rate: Decimal, threshold_sqm: Decimal, unclamped: Decimal },
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppliedFactors {
    pub difficulty: Decimal,
    pub nature_of_work: Decimal,
    pub finish_level: Decimal,
    pub urgency: Decimal,
}

impl AppliedFactors {
    pub fn product(&self) -> Decimal {
        self.difficulty
            .saturating_mul(self.nature_of_work)
            .saturating_mul(self.finish_level)
            .saturating_mul(self.urgency)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddOnLine {
    pub name: String,
    pub quantity: u32,
    pub amount: Decimal,
}

/// Non-blocking conditions the input layer should show next to the result.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum QuoteWarning {
    ZeroPhaseWeights,
    UndefinedNatureFactor { nature: NatureOfWork },
}

impl QuoteWarning {
    pub fn message(&self) -> String {
        match self {
            Self::ZeroPhaseWeights => "Defina ao menos 1% em alguma fase.".to_string(),
            Self::UndefinedNatureFactor { nature } => format!(
                "Natureza \"{}\" não possui multiplicador definido; aplicado × 1.00.",
                nature.label()
            ),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuoteResult {
    pub base: Decimal,
    pub applied_rate_per_sqm: Option<Decimal>,
    pub base_rule: BaseRule,
    pub factors: AppliedFactors,
    pub multiplier: Decimal,
    pub subtotal_all_phases: Decimal,
    pub phase_weight_sum: u32,
    pub normalized_weights: BTreeMap<Phase, Decimal>,
    pub phase_values: BTreeMap<Phase, Decimal>,
    pub included_phases: Vec<Phase>,
    pub subtotal_included_phases: Decimal,
    pub add_on_lines: Vec<AddOnLine>,
    pub free_extra: Decimal,
    pub add_ons_total: Decimal,
    pub final_price: Decimal,
    pub warnings: Vec<QuoteWarning>,
    pub trace: PricingTrace,
}

impl QuoteResult {
    pub fn phase_value(&self, phase: Phase) -> Decimal {
        self.phase_values.get(&phase).copied().unwrap_or(Decimal::ZERO)
    }

    pub fn normalized_weight(&self, phase: Phase) -> Decimal {
        self.normalized_weights.get(&phase).copied().unwrap_or(Decimal::ZERO)
    }

    pub fn has_add_ons_section(&self) -> bool {
        !self.add_on_lines.is_empty() || self.free_extra > Decimal::ZERO
    }
}

pub trait PricingEngine: Send + Sync {
    fn compute(&self, input: &QuoteInput) -> QuoteResult;
}

#[derive(Clone, Debug, Default)]
pub struct DeterministicPricingEngine {
    rates: RateTable,
}

impl DeterministicPricingEngine {
    pub fn new(rates: RateTable) -> Self {
        Self { rates }
    }

    pub fn rates(&self) -> &RateTable {
        &self.rates
    }
}

impl PricingEngine for DeterministicPricingEngine {
    fn compute(&self, input: &QuoteInput) -> QuoteResult {
        compute_quote(input, &self.rates)
    }
}

pub fn base_amount(area_sqm: Decimal, rates: &RateTable) -> (Decimal, BaseRule) {
    let area = area_sqm.max(Decimal::ZERO);
    if area <= rates.minimum_fee_area_sqm {
        return (
            rates.minimum_fee,
            BaseRule::MinimumFee {
                fee: rates.minimum_fee,
                threshold_sqm: rates.minimum_fee_area_sqm,
            },
        );
    }

    let unclamped = area.saturating_mul(rates.rate_per_sqm);
    let base = unclamped.max(rates.minimum_fee);
    (
        base,
        BaseRule::RatePerSqm {
            rate: rates.rate_per_sqm,
            threshold_sqm: rates.minimum_fee_area_sqm,
            unclamped,
        },
    )
}

/// Renormalizes the weights to sum to 1. A zero sum yields all zeros.
pub fn normalize_weights(input: &QuoteInput) -> BTreeMap<Phase, Decimal> {
    let sum = input.weight_sum();
    Phase::ALL
        .iter()
        .map(|phase| {
            let share = if sum == 0 {
                Decimal::ZERO
            } else {
                Decimal::from(input.weight(*phase)) / Decimal::from(sum)
            };
            (*phase, share)
        })
        .collect()
}

/// Amounts are non-negative, so saturation only ever pins at `Decimal::MAX`.
fn saturating_sum(amounts: impl Iterator<Item = Decimal>) -> Decimal {
    amounts.fold(Decimal::ZERO, Decimal::saturating_add)
}

pub fn compute_quote(input: &QuoteInput, rates: &RateTable) -> QuoteResult {
    let mut warnings = Vec::new();
    let mut trace = PricingTrace { steps: Vec::new() };

    let (base, base_rule) = base_amount(input.area_sqm, rates);
    let applied_rate_per_sqm = match &base_rule {
        BaseRule::MinimumFee { .. } => None,
        BaseRule::RatePerSqm { rate, .. } => Some(*rate),
    };
    trace.push(
        "base",
        match &base_rule {
            BaseRule::MinimumFee { .. } => "minimum fee (area <= threshold)".to_string(),
            BaseRule::RatePerSqm { .. } => "max(area * rate_per_sqm, minimum_fee)".to_string(),
        },
        base,
    );

    let (nature_factor, nature_defined) = rates.nature_factor(input.nature_of_work);
    if !nature_defined {
        warnings.push(QuoteWarning::UndefinedNatureFactor { nature: input.nature_of_work });
    }
    let factors = AppliedFactors {
        difficulty: rates.difficulty_factor(input.difficulty),
        nature_of_work: nature_factor,
        finish_level: rates.finish_factor(input.finish_level),
        urgency: rates.urgency_factor(input.urgency),
    };
    let multiplier = factors.product();
    trace.push("multiplier", "difficulty * nature * finish * urgency", multiplier);

    let subtotal_all_phases = base.saturating_mul(multiplier);
    trace.push("subtotal_all_phases", "base * multiplier", subtotal_all_phases);

    let phase_weight_sum = input.weight_sum();
    if phase_weight_sum == 0 {
        warnings.push(QuoteWarning::ZeroPhaseWeights);
    }
    let normalized_weights = normalize_weights(input);
    let phase_values: BTreeMap<Phase, Decimal> = normalized_weights
        .iter()
        .map(|(phase, share)| (*phase, subtotal_all_phases.saturating_mul(*share)))
        .collect();

    let included_phases: Vec<Phase> =
        Phase::ALL.iter().copied().filter(|phase| input.included_phases.contains(phase)).collect();
    let subtotal_included_phases =
        saturating_sum(included_phases.iter().map(|phase| phase_values[phase]));
    trace.push(
        "subtotal_included_phases",
        format!(
            "sum(phase_values) for {}",
            included_phases.iter().map(|phase| phase.code()).collect::<Vec<_>>().join(",")
        ),
        subtotal_included_phases,
    );

    let add_on_lines: Vec<AddOnLine> = input
        .add_ons
        .iter()
        .filter(|add_on| add_on.enabled)
        .map(|add_on| {
            let quantity = add_on.quantity.max(1);
            AddOnLine {
                name: add_on.name.clone(),
                quantity,
                amount: add_on.unit_price.max(Decimal::ZERO).saturating_mul(Decimal::from(quantity)),
            }
        })
        .collect();
    let free_extra = input.free_extra.max(Decimal::ZERO);
    let add_ons_total =
        saturating_sum(add_on_lines.iter().map(|line| line.amount)).saturating_add(free_extra);
    trace.push("add_ons", "sum(unit_price * max(1, quantity)) + max(0, free_extra)", add_ons_total);

    let final_price = subtotal_included_phases.saturating_add(add_ons_total);
    trace.push("final_price", "subtotal_included_phases + add_ons_total", final_price);

    QuoteResult {
        base,
        applied_rate_per_sqm,
        base_rule,
        factors,
        multiplier,
        subtotal_all_phases,
        phase_weight_sum,
        normalized_weights,
        phase_values,
        included_phases,
        subtotal_included_phases,
        add_on_lines,
        free_extra,
        add_ons_total,
        final_price,
        warnings,
        trace,
    }
}
