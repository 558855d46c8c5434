use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::quote::{Difficulty, FinishLevel, NatureOfWork, Urgency};

/// Base-amount constants plus the multiplier lookup tables.
///
/// The minimum fee, threshold and per-m² rate can be overridden through the
/// `[pricing]` config section. The category factors are fixed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateTable {
    pub minimum_fee: Decimal,
    pub minimum_fee_area_sqm: Decimal,
    pub rate_per_sqm: Decimal,
    /// Retrofit has no factor of its own. `None` prices it at 1.00 and flags the quote.
    pub retrofit_factor: Option<Decimal>,
}

impl Default for RateTable {
    fn default() -> Self {
        Self {
            minimum_fee: Decimal::new(5000, 0),
            minimum_fee_area_sqm: Decimal::new(40, 0),
            rate_per_sqm: Decimal::new(150, 0),
            retrofit_factor: None,
        }
    }
}

impl RateTable {
    pub fn difficulty_factor(&self, difficulty: Difficulty) -> Decimal {
        match difficulty {
            Difficulty::Small => Decimal::new(100, 2),
            Difficulty::Medium => Decimal::new(110, 2),
            Difficulty::Large => Decimal::new(115, 2),
        }
    }

    /// Returns the factor and whether it came from the table (`false` for an unset retrofit).
    pub fn nature_factor(&self, nature: NatureOfWork) -> (Decimal, bool) {
        match nature {
            NatureOfWork::New | NatureOfWork::Renovation => (Decimal::new(100, 2), true),
            NatureOfWork::Retrofit => match self.retrofit_factor {
                Some(factor) => (factor, true),
                None => (Decimal::ONE, false),
            },
        }
    }

    pub fn finish_factor(&self, finish: FinishLevel) -> Decimal {
        match finish {
            FinishLevel::Standard => Decimal::new(100, 2),
            FinishLevel::Mid => Decimal::new(105, 2),
            FinishLevel::Premium => Decimal::new(110, 2),
        }
    }

    pub fn urgency_factor(&self, urgency: Urgency) -> Decimal {
        match urgency {
            Urgency::Normal => Decimal::new(100, 2),
            Urgency::Urgent => Decimal::new(125, 2),
        }
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::RateTable;
    use crate::domain::quote::NatureOfWork;

    #[test]
    fn retrofit_without_configured_factor_is_flagged() {
        let rates = RateTable::default();
        assert_eq!(rates.nature_factor(NatureOfWork::Retrofit), (Decimal::ONE, false));
        assert_eq!(rates.nature_factor(NatureOfWork::Renovation), (Decimal::ONE, true));
    }

    #[test]
    fn configured_retrofit_factor_is_used() {
        let rates = RateTable { retrofit_factor: Some(Decimal::new(120, 2)), ..RateTable::default() };
        assert_eq!(rates.nature_factor(NatureOfWork::Retrofit), (Decimal::new(120, 2), true));
    }
}
