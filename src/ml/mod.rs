//! Learning primitives: standardization, OLS regression, metrics and the
//! seeded train/test split.

pub mod metrics;
pub mod regression;
pub mod scaler;
pub mod split;
