mod config;
mod error;
mod gateway;

pub use config::GatewayConfig;
pub use error::GatewayError;
pub use gateway::{Gateway, SyncOutcome};
