//! Nutritional scoring of dishes, a linear regression trained on those
//! scores, and nearest-dish lookup for the `nutriscore` CLI and HTTP API.

pub mod artifact;
pub mod config;
pub mod data;
pub mod error;
pub mod locate;
pub mod ml;
pub mod pipeline;
pub mod score;
pub mod server;
pub mod state;
pub mod ui;
