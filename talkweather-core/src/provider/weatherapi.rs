use async_trait::async_trait;
use chrono::{Local, NaiveDate};
use reqwest::Client;
use serde::Deserialize;

use crate::{
    model::{Forecast, ForecastDay, TemperatureUnit, WeatherSnapshot},
    provider::{Endpoint, WeatherError},
};

use super::WeatherProvider;

/// Client for the weatherapi.com `current.json` and `forecast.json` endpoints.
#[derive(Debug, Clone)]
pub struct WeatherApiProvider {
    api_key: String,
    base_url: String,
    http: Client,
}

impl WeatherApiProvider {
    pub fn with_base_url(api_key: String, base_url: &str) -> Self {
        Self {
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            http: Client::new(),
        }
    }

    /// GET `<base>/<endpoint>.json` and return the body of a success response.
    async fn get_body(
        &self,
        endpoint: Endpoint,
        params: &[(&str, &str)],
    ) -> Result<String, WeatherError> {
        let url = format!("{}/{}.json", self.base_url, endpoint.as_str());

        let res = self
            .http
            .get(&url)
            .query(&[("key", self.api_key.as_str())])
            .query(params)
            .send()
            .await
            .map_err(|source| WeatherError::Request { endpoint, source })?;

        let status = res.status();
        let body = res
            .text()
            .await
            .map_err(|source| WeatherError::Request { endpoint, source })?;

        if !status.is_success() {
            return Err(WeatherError::Status {
                endpoint,
                status,
                body: truncate_body(&body),
            });
        }

        Ok(body)
    }

    async fn fetch_current(
        &self,
        city: &str,
        unit: TemperatureUnit,
    ) -> Result<WeatherSnapshot, WeatherError> {
        let endpoint = Endpoint::Current;
        let body = self.get_body(endpoint, &[("q", city), ("aqi", "no")]).await?;

        let parsed: WaCurrentResponse = serde_json::from_str(&body)
            .map_err(|source| WeatherError::Schema { endpoint, source })?;
        let current = parsed.current;

        Ok(WeatherSnapshot {
            city: city.to_string(),
            timestamp: Local::now(),
            temperature: unit.select(current.temp_c, current.temp_f),
            unit,
            condition: current.condition.text,
            humidity_pct: current.humidity,
            wind_kph: current.wind_kph,
        })
    }

    async fn fetch_forecast(
        &self,
        city: &str,
        unit: TemperatureUnit,
        days: u8,
    ) -> Result<Forecast, WeatherError> {
        let endpoint = Endpoint::Forecast;
        let days = days.to_string();
        let body = self
            .get_body(
                endpoint,
                &[("q", city), ("days", days.as_str()), ("aqi", "no"), ("alerts", "no")],
            )
            .await?;

        let parsed: WaForecastResponse = serde_json::from_str(&body)
            .map_err(|source| WeatherError::Schema { endpoint, source })?;

        let days = parsed
            .forecast
            .forecastday
            .into_iter()
            .map(|entry| ForecastDay {
                date: entry.date,
                max_temp: unit.select(entry.day.maxtemp_c, entry.day.maxtemp_f),
                min_temp: unit.select(entry.day.mintemp_c, entry.day.mintemp_f),
                condition: entry.day.condition.text,
            })
            .collect();

        Ok(Forecast {
            city: city.to_string(),
            unit,
            days,
        })
    }
}

#[derive(Debug, Deserialize)]
struct WaCondition {
    text: String,
}

#[derive(Debug, Deserialize)]
struct WaCurrent {
    temp_c: f64,
    temp_f: f64,
    humidity: u8,
    wind_kph: f64,
    condition: WaCondition,
}

#[derive(Debug, Deserialize)]
struct WaCurrentResponse {
    current: WaCurrent,
}

#[derive(Debug, Deserialize)]
struct WaDay {
    maxtemp_c: f64,
    maxtemp_f: f64,
    mintemp_c: f64,
    mintemp_f: f64,
    condition: WaCondition,
}

#[derive(Debug, Deserialize)]
struct WaForecastDay {
    date: NaiveDate,
    day: WaDay,
}

#[derive(Debug, Deserialize)]
struct WaForecast {
    forecastday: Vec<WaForecastDay>,
}

#[derive(Debug, Deserialize)]
struct WaForecastResponse {
    forecast: WaForecast,
}

#[async_trait]
impl WeatherProvider for WeatherApiProvider {
    async fn current(
        &self,
        city: &str,
        unit: TemperatureUnit,
    ) -> Result<WeatherSnapshot, WeatherError> {
        self.fetch_current(city, unit)
            .await
            .inspect_err(|err| log_failure(city, err))
    }

    async fn forecast(
        &self,
        city: &str,
        unit: TemperatureUnit,
        days: u8,
    ) -> Result<Forecast, WeatherError> {
        self.fetch_forecast(city, unit, days)
            .await
            .inspect_err(|err| log_failure(city, err))
    }
}

fn log_failure(city: &str, err: &WeatherError) {
    let what = match err.endpoint() {
        Endpoint::Current => "weather data",
        Endpoint::Forecast => "forecast",
    };
    tracing::error!(
        city,
        endpoint = %err.endpoint(),
        schema = err.is_schema(),
        "Error retrieving {what} for {city}: {err}"
    );
}

/// Collapse whitespace runs (newlines included) so the body fits on one log line, then cap it.
fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    let body = body.split_whitespace().collect::<Vec<_>>().join(" ");
    match body.char_indices().nth(MAX) {
        Some((cut, _)) => format!("{}...", &body[..cut]),
        None => body,
    }
}
