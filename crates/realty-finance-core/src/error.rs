use rust_decimal::Decimal;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RealtyFinanceError {
    #[error("Invalid parameter: {field} — {reason}")]
    InvalidParameter { field: String, reason: String },

    #[error("Unable to compute {function}: no convergence after {iterations} iterations (delta: {last_delta})")]
    Convergence {
        function: String,
        iterations: u32,
        last_delta: Decimal,
    },

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl RealtyFinanceError {
    /// Shorthand for the common validation failure.
    pub fn invalid(field: &str, reason: impl Into<String>) -> Self {
        RealtyFinanceError::InvalidParameter {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Validation failure for amounts whose arithmetic leaves Decimal range.
    pub fn overflow(field: &str) -> Self {
        Self::invalid(field, "Value too large to compute")
    }
}

impl From<serde_json::Error> for RealtyFinanceError {
    fn from(e: serde_json::Error) -> Self {
        RealtyFinanceError::Serialization(e.to_string())
    }
}
