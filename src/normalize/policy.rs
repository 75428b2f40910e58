//! Named normalization policy values
//!
//! The brand table, the fuel fallback, the mileage scale rule and the validation ranges are
//! market-specific heuristics. They live here as defaults and can be overridden per config.

use crate::config::NormalizeConfig;
use crate::models::FuelType;

/// Brand tokens searched for in titles, mapped to canonical names
pub const DEFAULT_BRANDS: &[(&str, &str)] = &[
    ("audi", "Audi"),
    ("bmw", "BMW"),
    ("mercedes", "Mercedes-Benz"),
    ("volkswagen", "Volkswagen"),
    ("vw", "VW"),
    ("toyota", "Toyota"),
    ("hyundai", "Hyundai"),
    ("kia", "Kia"),
    ("volvo", "Volvo"),
    ("renault", "Renault"),
    ("citroen", "Citroen"),
    ("peugeot", "Peugeot"),
    ("ford", "Ford"),
    ("opel", "Opel"),
    ("seat", "SEAT"),
    ("skoda", "Skoda"),
    ("mazda", "Mazda"),
    ("honda", "Honda"),
    ("nissan", "Nissan"),
    ("fiat", "Fiat"),
    ("lancia", "Lancia"),
    ("alfa romeo", "Alfa Romeo"),
    ("suzuki", "Suzuki"),
];

/// Format version stamped on every normalized record
pub const DATA_VERSION: &str = "2.0";

/// How many years past the reference year a registration may lie
pub const MAX_YEARS_AHEAD: i32 = 1;

/// Resolved policy used by the normalizer
#[derive(Debug, Clone)]
pub struct NormalizePolicy {
    /// Lowercased brand tokens with their canonical names
    pub brands: Vec<(String, String)>,
    pub fallback_fuel: FuelType,
    pub mileage_scale_below: u64,
    pub mileage_scale_factor: u64,
    pub min_price: u64,
    pub max_price: u64,
    pub min_year: i32,
    pub source: String,
}

impl NormalizePolicy {
    /// Builds the policy from config, using the built-in brand table when none is given
    pub fn from_config(config: &NormalizeConfig) -> Self {
        let brands = if config.brands.is_empty() {
            DEFAULT_BRANDS
                .iter()
                .map(|(token, name)| (token.to_string(), name.to_string()))
                .collect()
        } else {
            config
                .brands
                .iter()
                .map(|entry| (entry.token.trim().to_lowercase(), entry.name.clone()))
                .collect()
        };

        Self {
            brands,
            fallback_fuel: config.fallback_fuel,
            mileage_scale_below: config.mileage_scale_below,
            mileage_scale_factor: config.mileage_scale_factor,
            min_price: config.min_price,
            max_price: config.max_price,
            min_year: config.min_year,
            source: config.source.clone(),
        }
    }

    /// Latest acceptable registration year for a given reference year
    pub fn max_year(&self, reference_year: i32) -> i32 {
        reference_year + MAX_YEARS_AHEAD
    }
}

impl Default for NormalizePolicy {
    fn default() -> Self {
        Self::from_config(&NormalizeConfig::default())
    }
}
