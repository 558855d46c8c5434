//! Input collection boundary shared by the CLI and the HTTP API.
//!
//! A [`QuoteRequest`] mirrors the quotation form: every field is optional and
//! falls back to the form defaults. Converting it into a [`QuoteInput`]
//! clamps numeric fields to their minimums.

use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::catalog::{default_phase_weights, Catalog};
use crate::domain::quote::{
    AddOn, Difficulty, FinishLevel, NatureOfWork, Phase, QuoteInput, Urgency,
};
use crate::errors::DomainError;

pub const DEFAULT_AREA_SQM: Decimal = Decimal::from_parts(52, 0, 0, false, 0);
/// Largest accepted area, in m².
pub const MAX_AREA_SQM: Decimal = Decimal::from_parts(1_000_000_000, 0, 0, false, 0);
/// Largest accepted add-on unit price or free extra, in R$.
pub const MAX_AMOUNT: Decimal = Decimal::from_parts(3_567_587_328, 232, 0, false, 0);

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AddOnRequest {
    /// Catalog id, or a free label for custom items.
    pub id: String,
    pub name: Option<String>,
    pub unit_price: Option<Decimal>,
    pub quantity: Option<u32>,
    pub enabled: Option<bool>,
}

impl AddOnRequest {
    /// Parses the CLI shorthand `ID[:QTY[:PRICE]]`.
    pub fn parse_shorthand(raw: &str) -> Result<Self, DomainError> {
        let mut parts = raw.split(':').map(str::trim);
        let id = parts.next().filter(|id| !id.is_empty()).ok_or_else(|| {
            DomainError::UnknownAddOn(raw.to_string())
        })?;

        let quantity = match parts.next().filter(|part| !part.is_empty()) {
            Some(quantity) => Some(
                quantity
                    .parse::<u32>()
                    .map_err(|_| DomainError::unknown_option("add-on quantity", quantity))?,
            ),
            None => None,
        };
        let unit_price = match parts.next().filter(|part| !part.is_empty()) {
            Some(price) => Some(
                price
                    .parse::<Decimal>()
                    .map_err(|_| DomainError::unknown_option("add-on price", price))?,
            ),
            None => None,
        };

        Ok(Self { id: id.to_string(), quantity, unit_price, ..Self::default() })
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuoteRequest {
    pub area_sqm: Option<Decimal>,
    pub difficulty: Option<Difficulty>,
    pub nature_of_work: Option<NatureOfWork>,
    pub finish_level: Option<FinishLevel>,
    pub urgency: Option<Urgency>,
    pub phase_weights: Option<BTreeMap<Phase, u32>>,
    pub included_phases: Option<BTreeSet<Phase>>,
    pub add_ons: Vec<AddOnRequest>,
    pub free_extra: Option<Decimal>,
}

impl QuoteRequest {
    pub fn into_input(self, catalog: &Catalog) -> Result<QuoteInput, DomainError> {
        let mut phase_weights = default_phase_weights();
        if let Some(overrides) = self.phase_weights {
            phase_weights.extend(overrides);
        }

        let add_ons = self
            .add_ons
            .into_iter()
            .map(|request| resolve_add_on(request, catalog))
            .collect::<Result<Vec<_>, _>>()?;

        let area_sqm = within_limit(
            "area_sqm",
            self.area_sqm.unwrap_or(DEFAULT_AREA_SQM).max(Decimal::ZERO),
            MAX_AREA_SQM,
        )?;
        let free_extra = within_limit(
            "free_extra",
            self.free_extra.unwrap_or(Decimal::ZERO).max(Decimal::ZERO),
            MAX_AMOUNT,
        )?;

        Ok(QuoteInput {
            area_sqm,
            difficulty: self.difficulty.unwrap_or(Difficulty::Medium),
            nature_of_work: self.nature_of_work.unwrap_or(NatureOfWork::Renovation),
            finish_level: self.finish_level.unwrap_or(FinishLevel::Mid),
            urgency: self.urgency.unwrap_or(Urgency::Normal),
            phase_weights,
            included_phases: self
                .included_phases
                .unwrap_or_else(|| Phase::ALL.into_iter().collect()),
            add_ons,
            free_extra,
        })
    }
}

fn resolve_add_on(request: AddOnRequest, catalog: &Catalog) -> Result<AddOn, DomainError> {
    let (name, unit_price) = match (catalog.find(&request.id), request.unit_price) {
        (Some(item), price) => (
            request.name.unwrap_or_else(|| item.name.to_string()),
            price.unwrap_or(item.default_price),
        ),
        (None, Some(price)) => (request.name.unwrap_or_else(|| request.id.clone()), price),
        (None, None) => return Err(DomainError::UnknownAddOn(request.id)),
    };

    Ok(AddOn {
        name,
        unit_price: within_limit("unit_price", unit_price.max(Decimal::ZERO), MAX_AMOUNT)?,
        quantity: request.quantity.unwrap_or(1).max(1),
        enabled: request.enabled.unwrap_or(true),
    })
}

fn within_limit(field: &'static str, value: Decimal, max: Decimal) -> Result<Decimal, DomainError> {
    if value > max {
        return Err(DomainError::OutOfRange { field, value: value.to_string(), max });
    }
    Ok(value)
}

pub fn parse_date(raw: &str) -> Result<NaiveDate, DomainError> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|_| DomainError::InvalidDate(raw.to_string()))
}

#[cfg(test)]
mod tests {
    use std::collections::{BTreeMap, BTreeSet};

    use rust_decimal::Decimal;

    use super::{parse_date, AddOnRequest, QuoteRequest, MAX_AMOUNT, MAX_AREA_SQM};
    use crate::domain::catalog::Catalog;
    use crate::domain::quote::{Difficulty, NatureOfWork, Phase};
    use crate::errors::DomainError;

    fn dec(value: &str) -> Decimal {
        value.parse().expect("valid decimal literal")
    }

    #[test]
    fn empty_request_uses_form_defaults() {
        let input = QuoteRequest::default().into_input(&Catalog::default()).expect("defaults");

        assert_eq!(input.area_sqm, dec("52"));
        assert_eq!(input.difficulty, Difficulty::Medium);
        assert_eq!(input.nature_of_work, NatureOfWork::Renovation);
        assert_eq!(input.weight_sum(), 100);
        assert_eq!(input.included_phases.len(), 4);
        assert!(input.add_ons.is_empty());
    }

    #[test]
    fn negative_numbers_are_clamped() {
        let request = QuoteRequest {
            area_sqm: Some(dec("-5")),
            free_extra: Some(dec("-100")),
            add_ons: vec![AddOnRequest {
                id: "render".to_string(),
                unit_price: Some(dec("-10")),
                quantity: Some(0),
                ..AddOnRequest::default()
            }],
            ..QuoteRequest::default()
        };
        let input = request.into_input(&Catalog::default()).expect("clamped input");

        assert_eq!(input.area_sqm, Decimal::ZERO);
        assert_eq!(input.free_extra, Decimal::ZERO);
        assert_eq!(input.add_ons[0].unit_price, Decimal::ZERO);
        assert_eq!(input.add_ons[0].quantity, 1);
    }

    #[test]
    fn partial_weights_override_defaults() {
        let request = QuoteRequest {
            phase_weights: Some(BTreeMap::from([(Phase::ConstructionOversight, 0)])),
            included_phases: Some(BTreeSet::from([Phase::PreliminaryStudy])),
            ..QuoteRequest::default()
        };
        let input = request.into_input(&Catalog::default()).expect("input");

        assert_eq!(input.weight(Phase::ConstructionOversight), 0);
        assert_eq!(input.weight(Phase::ExecutionDocuments), 35);
        assert_eq!(input.weight_sum(), 80);
        assert_eq!(input.included_phases, BTreeSet::from([Phase::PreliminaryStudy]));
    }

    #[test]
    fn catalog_add_on_takes_catalog_name_and_price() {
        let request = QuoteRequest {
            add_ons: vec![AddOnRequest::parse_shorthand("visita").expect("shorthand")],
            ..QuoteRequest::default()
        };
        let input = request.into_input(&Catalog::default()).expect("input");

        assert_eq!(input.add_ons[0].name, "1ª visita (levantamento)");
        assert_eq!(input.add_ons[0].unit_price, dec("700"));
        assert!(input.add_ons[0].enabled);
    }

    #[test]
    fn custom_add_on_requires_a_price() {
        let custom = AddOnRequest::parse_shorthand("Maquete:2:1500").expect("shorthand");
        assert_eq!(custom.quantity, Some(2));
        assert_eq!(custom.unit_price, Some(dec("1500")));

        let input = QuoteRequest { add_ons: vec![custom], ..QuoteRequest::default() }
            .into_input(&Catalog::default())
            .expect("custom add-on");
        assert_eq!(input.add_ons[0].name, "Maquete");

        let error = QuoteRequest {
            add_ons: vec![AddOnRequest::parse_shorthand("drone").expect("shorthand")],
            ..QuoteRequest::default()
        }
        .into_input(&Catalog::default())
        .expect_err("unknown add-on without price");
        assert_eq!(error, DomainError::UnknownAddOn("drone".to_string()));
    }

    #[test]
    fn shorthand_rejects_bad_quantity() {
        let error = AddOnRequest::parse_shorthand("render:lots").expect_err("bad quantity");
        assert!(matches!(error, DomainError::UnknownOption { field: "add-on quantity", .. }));
    }

    #[test]
    fn request_deserializes_from_form_json() {
        let request: QuoteRequest = serde_json::from_str(
            r#"{
                "area_sqm": 120,
                "difficulty": "grande",
                "urgency": "urgent",
                "phase_weights": {"EP": 10, "OBRA": 30},
                "add_ons": [{"id": "compat", "quantity": 2}],
                "free_extra": "250.50"
            }"#,
        )
        .expect("request json");

        let input = request.into_input(&Catalog::default()).expect("input");
        assert_eq!(input.area_sqm, dec("120"));
        assert_eq!(input.difficulty, Difficulty::Large);
        assert_eq!(input.weight(Phase::PreliminaryStudy), 10);
        assert_eq!(input.free_extra, dec("250.50"));
        assert_eq!(input.add_ons[0].quantity, 2);
    }

    #[test]
    fn oversized_area_and_amounts_are_rejected() {
        let request: QuoteRequest =
            serde_json::from_str(r#"{"area_sqm": "600000000000000000000000000"}"#)
                .expect("request json");
        let error = request.into_input(&Catalog::default()).expect_err("area too large");
        assert!(matches!(error, DomainError::OutOfRange { field: "area_sqm", .. }));

        let error = QuoteRequest {
            add_ons: vec![AddOnRequest::parse_shorthand("render:2:2000000000000").expect("shorthand")],
            ..QuoteRequest::default()
        }
        .into_input(&Catalog::default())
        .expect_err("unit price too large");
        assert!(matches!(error, DomainError::OutOfRange { field: "unit_price", .. }));

        let error = QuoteRequest { free_extra: Some(dec("1000000000000.01")), ..QuoteRequest::default() }
            .into_input(&Catalog::default())
            .expect_err("free extra too large");
        assert!(matches!(error, DomainError::OutOfRange { field: "free_extra", .. }));
    }

    #[test]
    fn limits_themselves_are_accepted() {
        let input = QuoteRequest {
            area_sqm: Some(MAX_AREA_SQM),
            free_extra: Some(MAX_AMOUNT),
            ..QuoteRequest::default()
        }
        .into_input(&Catalog::default())
        .expect("input at the limits");

        assert_eq!(input.area_sqm, dec("1000000000"));
        assert_eq!(input.free_extra, dec("1000000000000"));
    }

    #[test]
    fn dates_use_iso_format() {
        assert!(parse_date("2026-10-19").is_ok());
        assert_eq!(parse_date("19/10/2026"), Err(DomainError::InvalidDate("19/10/2026".to_string())));
    }
}
