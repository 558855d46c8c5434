pub mod config;
pub mod domain;
pub mod errors;
pub mod export;
pub mod intake;
pub mod pricing;
pub mod proposal;

pub use domain::catalog::{Catalog, CatalogAddOn};
pub use domain::quote::{AddOn, Difficulty, FinishLevel, NatureOfWork, Phase, QuoteInput, Urgency};
pub use errors::{ApplicationError, DomainError, InterfaceError};
pub use export::{DocumentExporter, ExportError, ExportFormat, ExportedDocument, ExporterSet};
pub use intake::{AddOnRequest, QuoteRequest};
pub use pricing::rates::RateTable;
pub use pricing::{compute_quote, DeterministicPricingEngine, PricingEngine, QuoteResult, QuoteWarning};
pub use proposal::{format_proposal, format_summary, ProposalDocument};
