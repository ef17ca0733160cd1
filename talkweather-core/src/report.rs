use anyhow::{Context, Result};
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::TemperatureUnit;

/// `weather_info_<city>_<unit>.txt`, with path-unsafe characters in `city` replaced by `_`.
pub fn report_file_name(city: &str, unit: TemperatureUnit) -> String {
    let city: String = city
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    format!("weather_info_{city}_{}.txt", unit.letter())
}

/// Write `text` to the report file for `city`/`unit` inside `dir`, replacing any previous one.
pub fn save_report(dir: &Path, text: &str, city: &str, unit: TemperatureUnit) -> Result<PathBuf> {
    let path = dir.join(report_file_name(city, unit));

    fs::write(&path, text)
        .with_context(|| format!("Failed to write weather report: {}", path.display()))?;

    Ok(path)
}
