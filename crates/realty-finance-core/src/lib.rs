pub mod breakeven;
pub mod error;
pub mod format;
pub mod time_value;
pub mod types;

#[cfg(feature = "financing")]
pub mod financing;

#[cfg(feature = "consortium")]
pub mod consortium;

#[cfg(feature = "cet")]
pub mod cet;

#[cfg(feature = "comparison")]
pub mod comparison;

pub use error::RealtyFinanceError;
pub use types::*;

/// Standard result type for all realty-finance operations
pub type RealtyFinanceResult<T> = Result<T, RealtyFinanceError>;
