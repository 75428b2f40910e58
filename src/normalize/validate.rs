//! Validation gate for normalized records

use crate::models::NormalizedRecord;
use crate::normalize::NormalizePolicy;
use thiserror::Error;

/// Why a record was kept out of the normalized output
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RejectionReason {
    #[error("Missing price")]
    MissingPrice,

    #[error("Missing year")]
    MissingYear,

    #[error("Missing brand")]
    MissingBrand,

    #[error("Price {price} outside [{min}, {max}]")]
    PriceOutOfRange { price: u64, min: u64, max: u64 },

    #[error("Year {year} outside [{min}, {max}]")]
    YearOutOfRange { year: i32, min: i32, max: i32 },
}

impl RejectionReason {
    /// Stable code used to group review entries
    pub fn code(&self) -> &'static str {
        match self {
            Self::MissingPrice => "missing_price",
            Self::MissingYear => "missing_year",
            Self::MissingBrand => "missing_brand",
            Self::PriceOutOfRange { .. } => "price_out_of_range",
            Self::YearOutOfRange { .. } => "year_out_of_range",
        }
    }
}

/// Checks required fields first, then ranges
///
/// # Arguments
///
/// * `record` - The projected record
/// * `policy` - Ranges to enforce
/// * `reference_year` - The current year; registrations up to one year ahead pass
pub fn validate(
    record: &NormalizedRecord,
    policy: &NormalizePolicy,
    reference_year: i32,
) -> Result<(), RejectionReason> {
    let price = record.price_numeric.ok_or(RejectionReason::MissingPrice)?;
    let year = record.year_numeric.ok_or(RejectionReason::MissingYear)?;
    if record.brand.is_none() {
        return Err(RejectionReason::MissingBrand);
    }

    if price < policy.min_price || price > policy.max_price {
        return Err(RejectionReason::PriceOutOfRange {
            price,
            min: policy.min_price,
            max: policy.max_price,
        });
    }

    let max_year = policy.max_year(reference_year);
    if year < policy.min_year || year > max_year {
        return Err(RejectionReason::YearOutOfRange {
            year,
            min: policy.min_year,
            max: max_year,
        });
    }

    Ok(())
}
