use archquote_core::domain::catalog::{default_phase_weights, Catalog, CatalogAddOn};
use archquote_core::domain::quote::Phase;
use archquote_core::intake::DEFAULT_AREA_SQM;
use rust_decimal::Decimal;
use serde::Serialize;

use super::CommandResult;

#[derive(Debug, Serialize)]
struct PhaseEntry {
    code: &'static str,
    name: &'static str,
    default_weight: u32,
}

#[derive(Debug, Serialize)]
struct CatalogView {
    default_area_sqm: Decimal,
    phases: Vec<PhaseEntry>,
    add_ons: Vec<CatalogAddOn>,
}

pub fn run() -> CommandResult {
    let weights = default_phase_weights();
    let view = CatalogView {
        default_area_sqm: DEFAULT_AREA_SQM,
        phases: Phase::ALL
            .into_iter()
            .map(|phase| PhaseEntry {
                code: phase.code(),
                name: phase.name(),
                default_weight: weights.get(&phase).copied().unwrap_or(0),
            })
            .collect(),
        add_ons: Catalog::default().add_ons().to_vec(),
    };

    CommandResult::with_data("catalog", "default phases and add-on catalog", &view)
}
