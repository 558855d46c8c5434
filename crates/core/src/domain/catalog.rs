use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::Serialize;

use crate::domain::quote::Phase;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CatalogAddOn {
    pub id: &'static str,
    pub name: &'static str,
    pub default_price: Decimal,
}

/// Default add-on items offered with every quote, all disabled until selected.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Catalog {
    add_ons: Vec<CatalogAddOn>,
}

impl Default for Catalog {
    fn default() -> Self {
        Self::new(vec![
            CatalogAddOn {
                id: "visita",
                name: "1ª visita (levantamento)",
                default_price: Decimal::new(700, 0),
            },
            CatalogAddOn {
                id: "render",
                name: "Renderização realista (unid.)",
                default_price: Decimal::new(250, 0),
            },
            CatalogAddOn {
                id: "visitaExtra",
                name: "Visita extra de obra",
                default_price: Decimal::new(300, 0),
            },
            CatalogAddOn {
                id: "compat",
                name: "Compatibilização com terceiros (disciplina)",
                default_price: Decimal::new(800, 0),
            },
        ])
    }
}

impl Catalog {
    pub fn new(add_ons: Vec<CatalogAddOn>) -> Self {
        Self { add_ons }
    }

    pub fn find(&self, id: &str) -> Option<&CatalogAddOn> {
        self.add_ons.iter().find(|add_on| add_on.id == id)
    }

    pub fn add_ons(&self) -> &[CatalogAddOn] {
        &self.add_ons
    }
}

pub fn default_phase_weights() -> BTreeMap<Phase, u32> {
    BTreeMap::from([
        (Phase::PreliminaryStudy, 20),
        (Phase::SchematicDesign, 25),
        (Phase::ExecutionDocuments, 35),
        (Phase::ConstructionOversight, 20),
    ])
}
