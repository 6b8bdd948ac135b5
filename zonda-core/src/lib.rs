//! Core library for the Potrerillos zonda monitor.
//!
//! This crate defines:
//! - Configuration & credentials handling
//! - Abstraction over weather providers (one GET per fetch, no retries)
//! - Alert tier classification under a configurable threshold policy
//! - Report rendering and the action dispatcher used by chat front-ends
//!
//! It is used by `zonda-bot`, but can also be reused by other binaries or services.

pub mod alert;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod format;
pub mod model;
pub mod provider;

pub use alert::{AlertPolicy, LegacyThresholds, ZondaThresholds};
pub use config::{Config, LocationConfig, ProviderConfig, TelegramConfig};
pub use dispatch::{Action, Dispatcher, Reply};
pub use error::FetchError;
pub use model::{AlertTier, Coordinates, Report, WeatherReading};
pub use provider::{ProviderId, WeatherProvider};
