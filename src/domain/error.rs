use thiserror::Error;

use crate::infra::prices::PriceSourceError;

#[derive(Debug, Error)]
pub enum AdvisorError {
    #[error("quantity must be a positive number, got {0}")]
    InvalidQuantity(f64),
    #[error("no markets available to compare")]
    EmptyMarketSet,
    #[error("price source failed: {0}")]
    PriceSource(#[from] PriceSourceError),
}

pub type AdvisorResult<T> = Result<T, AdvisorError>;

/// Rejects zero, negative and non-finite quantities.
pub fn validate_quantity(quantity: f64) -> AdvisorResult<f64> {
    if quantity.is_finite() && quantity > 0.0 {
        Ok(quantity)
    } else {
        Err(AdvisorError::InvalidQuantity(quantity))
    }
}
