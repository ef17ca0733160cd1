//! Core library for the `talkweather` console app.
//!
//! This crate defines:
//! - Configuration & credentials handling
//! - The weather provider abstraction and the weatherapi.com client
//! - Shared domain models (snapshots, forecasts, units)
//! - Speech output and voice settings
//! - Report files and the diagnostics log
//!
//! It is used by `talkweather-cli`, but can also be reused by other binaries.

pub mod config;
pub mod logging;
pub mod model;
pub mod narration;
pub mod provider;
pub mod report;

pub use config::Config;
pub use model::{Forecast, ForecastDay, TemperatureUnit, WeatherSnapshot};
pub use narration::{Speaker, SpeechBackend, Voice, VoiceProfile};
pub use provider::{Endpoint, WeatherError, WeatherProvider};
