use crate::{
    Config, Forecast, TemperatureUnit, WeatherSnapshot, provider::weatherapi::WeatherApiProvider,
};
use async_trait::async_trait;
use std::fmt::{self, Debug};

pub mod weatherapi;

/// Which remote operation a request or failure belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    Current,
    Forecast,
}

impl Endpoint {
    pub fn as_str(&self) -> &'static str {
        match self {
            Endpoint::Current => "current",
            Endpoint::Forecast => "forecast",
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum WeatherError {
    /// The request never produced a response (DNS, connect, reset, ...).
    #[error("{endpoint} request could not be sent: {source}")]
    Request {
        endpoint: Endpoint,
        #[source]
        source: reqwest::Error,
    },

    #[error("{endpoint} request failed with status {status}: {body}")]
    Status {
        endpoint: Endpoint,
        status: reqwest::StatusCode,
        body: String,
    },

    /// A success response whose body lacks the fields we read.
    #[error("unexpected {endpoint} response body: {source}")]
    Schema {
        endpoint: Endpoint,
        #[source]
        source: serde_json::Error,
    },
}

impl WeatherError {
    pub fn endpoint(&self) -> Endpoint {
        match self {
            WeatherError::Request { endpoint, .. }
            | WeatherError::Status { endpoint, .. }
            | WeatherError::Schema { endpoint, .. } => *endpoint,
        }
    }

    /// `true` for a malformed body, `false` for transport-level failures.
    pub fn is_schema(&self) -> bool {
        matches!(self, WeatherError::Schema { .. })
    }

    /// The sentence narrated to the user; never contains weather data.
    pub fn user_message(&self, city: &str) -> String {
        match (self.endpoint(), self.is_schema()) {
            (Endpoint::Current, true) => {
                "Could not fetch the weather information. Please try again.".to_string()
            }
            (Endpoint::Current, false) => {
                format!("Failed to retrieve weather data for {city}. Please try again.")
            }
            (Endpoint::Forecast, true) => {
                "Could not fetch the weather forecast. Please try again.".to_string()
            }
            (Endpoint::Forecast, false) => {
                format!("Failed to retrieve forecast data for {city}. Please try again.")
            }
        }
    }
}

#[async_trait]
pub trait WeatherProvider: Send + Sync + Debug {
    async fn current(
        &self,
        city: &str,
        unit: TemperatureUnit,
    ) -> Result<WeatherSnapshot, WeatherError>;

    async fn forecast(
        &self,
        city: &str,
        unit: TemperatureUnit,
        days: u8,
    ) -> Result<Forecast, WeatherError>;
}

/// Construct the weatherapi.com provider from config.
pub fn provider_from_config(config: &Config) -> anyhow::Result<Box<dyn WeatherProvider>> {
    let api_key = config.api_key()?;

    Ok(Box::new(WeatherApiProvider::with_base_url(
        api_key.to_owned(),
        &config.base_url,
    )))
}
