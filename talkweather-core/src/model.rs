use chrono::{DateTime, Local, NaiveDate};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// Temperature unit chosen by the user for one query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TemperatureUnit {
    Celsius,
    Fahrenheit,
}

impl TemperatureUnit {
    /// Single-letter form used in prompts, report lines and file names.
    pub fn letter(&self) -> &'static str {
        match self {
            TemperatureUnit::Celsius => "C",
            TemperatureUnit::Fahrenheit => "F",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            TemperatureUnit::Celsius => "Celsius",
            TemperatureUnit::Fahrenheit => "Fahrenheit",
        }
    }

    /// Pick between two values the service already reports in both units.
    pub fn select<T>(&self, celsius: T, fahrenheit: T) -> T {
        match self {
            TemperatureUnit::Celsius => celsius,
            TemperatureUnit::Fahrenheit => fahrenheit,
        }
    }
}

impl fmt::Display for TemperatureUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.letter())
    }
}

impl FromStr for TemperatureUnit {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_uppercase().as_str() {
            "C" => Ok(TemperatureUnit::Celsius),
            "F" => Ok(TemperatureUnit::Fahrenheit),
            _ => Err(anyhow::anyhow!(
                "Unknown temperature unit '{value}'. Supported units: C, F."
            )),
        }
    }
}

/// Current conditions for one city at the moment of the request.
#[derive(Debug, Clone, PartialEq)]
pub struct WeatherSnapshot {
    pub city: String,
    pub timestamp: DateTime<Local>,
    pub temperature: f64,
    pub unit: TemperatureUnit,
    pub condition: String,
    pub humidity_pct: u8,
    pub wind_kph: f64,
}

impl WeatherSnapshot {
    /// The sentence that gets printed, spoken and saved.
    pub fn summary(&self) -> String {
        format!(
            "As of {}, the current temperature in {} is {:?} degrees {}. \
             The weather is {}. \
             Humidity is {}% and wind speed is {:?} kph.",
            self.timestamp.format("%Y-%m-%d %H:%M:%S"),
            self.city,
            self.temperature,
            self.unit.label(),
            self.condition,
            self.humidity_pct,
            self.wind_kph,
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ForecastDay {
    pub date: NaiveDate,
    pub max_temp: f64,
    pub min_temp: f64,
    pub condition: String,
}

/// Multi-day outlook, days kept in the order the service returned them.
#[derive(Debug, Clone, PartialEq)]
pub struct Forecast {
    pub city: String,
    pub unit: TemperatureUnit,
    pub days: Vec<ForecastDay>,
}

impl Forecast {
    /// One line per day, no header.
    pub fn report(&self) -> String {
        let unit = self.unit.letter();
        self.days
            .iter()
            .map(|day| {
                format!(
                    "Date: {}, Max Temp: {:?}°{unit}, Min Temp: {:?}°{unit}, Weather: {}",
                    day.date, day.max_temp, day.min_temp, day.condition
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}
