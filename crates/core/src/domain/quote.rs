use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::errors::DomainError;

/// Project stage billed as a share of the pre-add-on subtotal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Phase {
    #[serde(rename = "EP")]
    PreliminaryStudy,
    #[serde(rename = "AP")]
    SchematicDesign,
    #[serde(rename = "EXEC")]
    ExecutionDocuments,
    #[serde(rename = "OBRA")]
    ConstructionOversight,
}

impl Phase {
    pub const ALL: [Phase; 4] = [
        Phase::PreliminaryStudy,
        Phase::SchematicDesign,
        Phase::ExecutionDocuments,
        Phase::ConstructionOversight,
    ];

    pub fn code(self) -> &'static str {
        match self {
            Self::PreliminaryStudy => "EP",
            Self::SchematicDesign => "AP",
            Self::ExecutionDocuments => "EXEC",
            Self::ConstructionOversight => "OBRA",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::PreliminaryStudy => "Estudo Preliminar",
            Self::SchematicDesign => "Anteprojeto",
            Self::ExecutionDocuments => "Executivo",
            Self::ConstructionOversight => "Acompanhamento de obra",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Phase {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_uppercase().as_str() {
            "EP" => Ok(Self::PreliminaryStudy),
            "AP" => Ok(Self::SchematicDesign),
            "EXEC" => Ok(Self::ExecutionDocuments),
            "OBRA" => Ok(Self::ConstructionOversight),
            _ => Err(DomainError::unknown_option("phase", value)),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    #[serde(alias = "pequena")]
    Small,
    #[serde(alias = "media")]
    Medium,
    #[serde(alias = "grande")]
    Large,
}

impl Difficulty {
    pub fn label(self) -> &'static str {
        match self {
            Self::Small => "Pequena",
            Self::Medium => "Média",
            Self::Large => "Grande",
        }
    }
}

impl FromStr for Difficulty {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "small" | "pequena" => Ok(Self::Small),
            "medium" | "media" => Ok(Self::Medium),
            "large" | "grande" => Ok(Self::Large),
            _ => Err(DomainError::unknown_option("difficulty", value)),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NatureOfWork {
    #[serde(alias = "nova")]
    New,
    #[serde(alias = "reforma")]
    Renovation,
    Retrofit,
}

impl NatureOfWork {
    pub fn label(self) -> &'static str {
        match self {
            Self::New => "Obra nova",
            Self::Renovation => "Reforma",
            Self::Retrofit => "Retrofit",
        }
    }
}

impl FromStr for NatureOfWork {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "new" | "nova" => Ok(Self::New),
            "renovation" | "reforma" => Ok(Self::Renovation),
            "retrofit" => Ok(Self::Retrofit),
            _ => Err(DomainError::unknown_option("nature_of_work", value)),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinishLevel {
    #[serde(alias = "conv")]
    Standard,
    #[serde(alias = "medio")]
    Mid,
    Premium,
}

impl FinishLevel {
    pub fn label(self) -> &'static str {
        match self {
            Self::Standard => "Convencional",
            Self::Mid => "Médio-alto",
            Self::Premium => "Premium",
        }
    }
}

impl FromStr for FinishLevel {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "standard" | "conv" => Ok(Self::Standard),
            "mid" | "medio" => Ok(Self::Mid),
            "premium" => Ok(Self::Premium),
            _ => Err(DomainError::unknown_option("finish_level", value)),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Urgency {
    Normal,
    #[serde(alias = "urgente")]
    Urgent,
}

impl Urgency {
    pub fn label(self) -> &'static str {
        match self {
            Self::Normal => "Normal",
            Self::Urgent => "Urgente",
        }
    }
}

impl FromStr for Urgency {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "normal" => Ok(Self::Normal),
            "urgent" | "urgente" => Ok(Self::Urgent),
            _ => Err(DomainError::unknown_option("urgency", value)),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AddOn {
    pub name: String,
    pub unit_price: Decimal,
    pub quantity: u32,
    pub enabled: bool,
}

/// Parameters of a single quotation. Built once per computation and never mutated.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct QuoteInput {
    pub area_sqm: Decimal,
    pub difficulty: Difficulty,
    pub nature_of_work: NatureOfWork,
    pub finish_level: FinishLevel,
    pub urgency: Urgency,
    pub phase_weights: BTreeMap<Phase, u32>,
    pub included_phases: BTreeSet<Phase>,
    pub add_ons: Vec<AddOn>,
    pub free_extra: Decimal,
}

impl QuoteInput {
    pub fn weight(&self, phase: Phase) -> u32 {
        self.phase_weights.get(&phase).copied().unwrap_or(0)
    }

    pub fn weight_sum(&self) -> u32 {
        Phase::ALL.iter().map(|phase| self.weight(*phase)).sum()
    }
}
