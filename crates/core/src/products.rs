//! Store catalog: consumable products and the job each purchase creates.

use serde::Serialize;
use serde_json::Value;

use crate::error::CoreError;
use crate::job_spec::{JobKind, JobSpec};
use crate::systems::ReadingSystem;

/// A consumable in-app product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Product {
    SingleSystem,
    CompleteReading,
    CompatibilityOverlay,
    NuclearPackage,
}

/// Catalog entry returned by `GET /api/v1/products`.
#[derive(Debug, Clone, Serialize)]
pub struct ProductInfo {
    pub sku: &'static str,
    pub title: &'static str,
    pub job_type: &'static str,
    pub price_usd_micros: i64,
    /// `None` when the job type fixes its own systems.
    pub max_systems: Option<usize>,
}

impl Product {
    pub const ALL: [Product; 4] = [
        Product::SingleSystem,
        Product::CompleteReading,
        Product::CompatibilityOverlay,
        Product::NuclearPackage,
    ];

    pub fn sku(self) -> &'static str {
        match self {
            Product::SingleSystem => "single_system",
            Product::CompleteReading => "complete_reading",
            Product::CompatibilityOverlay => "compatibility_overlay",
            Product::NuclearPackage => "nuclear_package",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Product::SingleSystem => "Single System Reading",
            Product::CompleteReading => "Complete Reading (All 5 Systems)",
            Product::CompatibilityOverlay => "Compatibility Overlay",
            Product::NuclearPackage => "Nuclear Package (Everything)",
        }
    }

    pub fn price_usd_micros(self) -> i64 {
        match self {
            Product::SingleSystem => 13_990_000,
            Product::CompleteReading => 33_990_000,
            Product::CompatibilityOverlay => 40_990_000,
            Product::NuclearPackage => 107_990_000,
        }
    }

    pub fn job_kind(self) -> JobKind {
        match self {
            Product::SingleSystem | Product::CompleteReading => JobKind::Extended,
            Product::CompatibilityOverlay => JobKind::LegacyBundle,
            Product::NuclearPackage => JobKind::Bundle,
        }
    }

    pub fn max_systems(self) -> Option<usize> {
        match self {
            Product::SingleSystem | Product::CompatibilityOverlay => Some(1),
            Product::CompleteReading => Some(ReadingSystem::CANONICAL.len()),
            Product::NuclearPackage => None,
        }
    }

    pub fn from_sku(sku: &str) -> Result<Self, CoreError> {
        Self::ALL
            .into_iter()
            .find(|product| product.sku() == sku)
            .ok_or_else(|| CoreError::UnknownProduct(sku.to_string()))
    }

    pub fn info(self) -> ProductInfo {
        ProductInfo {
            sku: self.sku(),
            title: self.title(),
            job_type: self.job_kind().as_str(),
            price_usd_micros: self.price_usd_micros(),
            max_systems: self.max_systems(),
        }
    }

    /// Systems a purchase covers when the buyer picked none.
    ///
    /// `None` leaves the job type's own default in place.
    fn default_systems(self) -> Option<&'static [ReadingSystem]> {
        match self {
            Product::CompleteReading => Some(&ReadingSystem::CANONICAL),
            Product::CompatibilityOverlay => Some(&[ReadingSystem::Western]),
            Product::SingleSystem | Product::NuclearPackage => None,
        }
    }

    /// Fill product-specific defaults into raw params before normalization.
    ///
    /// A complete reading covers every system and a compatibility overlay
    /// covers Western astrology, unless the buyer picked some.
    pub fn prepare_params(self, params: Value) -> Value {
        let Some(defaults) = self.default_systems() else {
            return params;
        };
        let has_systems = params
            .get("systems")
            .and_then(Value::as_array)
            .is_some_and(|systems| !systems.is_empty());
        if has_systems {
            return params;
        }

        let systems: Value = defaults
            .iter()
            .map(|system| Value::from(system.as_str()))
            .collect();
        let mut map = match params {
            Value::Object(map) => map,
            _ => serde_json::Map::new(),
        };
        map.insert("systems".into(), systems);
        Value::Object(map)
    }

    /// Reject a normalized job that covers more systems than was purchased.
    pub fn check(self, spec: &JobSpec) -> Result<(), CoreError> {
        debug_assert_eq!(spec.kind(), self.job_kind());
        match self.max_systems() {
            Some(max) if spec.systems().len() > max => Err(CoreError::SystemLimit {
                sku: self.sku(),
                max,
                requested: spec.systems().len(),
            }),
            _ => Ok(()),
        }
    }
}
