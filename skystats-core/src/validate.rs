//! Syntactic format predicates applied to extracted fields.
//!
//! These checks only look at the shape of a value. A humidity of `150%`
//! matches its pattern and passes; range checks live in
//! [`crate::plausibility`] and are applied separately.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::ValidationError;

pub const PRESSURE_PATTERN: &str = r"^\d{3,4} mbar$";
pub const HUMIDITY_PATTERN: &str = r"^\d{1,3}%$";
pub const TEMPERATURE_PATTERN: &str = r"^\d{1,2}°C$";
pub const WIND_POWER_PATTERN: &str = r"^\d{1,2} km/h$";
pub const AQI_VALUE_PATTERN: &str = r"^\d{1,3}$";

static PRESSURE: LazyLock<Regex> = LazyLock::new(|| Regex::new(PRESSURE_PATTERN).unwrap());
static HUMIDITY: LazyLock<Regex> = LazyLock::new(|| Regex::new(HUMIDITY_PATTERN).unwrap());
static TEMPERATURE: LazyLock<Regex> = LazyLock::new(|| Regex::new(TEMPERATURE_PATTERN).unwrap());
static WIND_POWER: LazyLock<Regex> = LazyLock::new(|| Regex::new(WIND_POWER_PATTERN).unwrap());
static AQI_VALUE: LazyLock<Regex> = LazyLock::new(|| Regex::new(AQI_VALUE_PATTERN).unwrap());

fn matches(
    regex: &Regex,
    pattern: &'static str,
    field: &'static str,
    value: String,
) -> Result<String, ValidationError> {
    if regex.is_match(&value) {
        Ok(value)
    } else {
        Err(ValidationError::InvalidFormat {
            field,
            value,
            pattern,
        })
    }
}

pub fn pressure(value: String) -> Result<String, ValidationError> {
    matches(&PRESSURE, PRESSURE_PATTERN, "pressure", value)
}

pub fn humidity(value: String) -> Result<String, ValidationError> {
    matches(&HUMIDITY, HUMIDITY_PATTERN, "humidity", value)
}

pub fn temperature(value: String) -> Result<String, ValidationError> {
    matches(&TEMPERATURE, TEMPERATURE_PATTERN, "temperature", value)
}

pub fn wind_power(value: String) -> Result<String, ValidationError> {
    matches(&WIND_POWER, WIND_POWER_PATTERN, "wind power", value)
}

pub fn aqi_value(value: String) -> Result<String, ValidationError> {
    matches(&AQI_VALUE, AQI_VALUE_PATTERN, "AQI value", value)
}

/// Whitespace-only text counts as empty.
pub fn non_empty(field: &'static str, value: String) -> Result<String, ValidationError> {
    if value.trim().is_empty() {
        Err(ValidationError::Empty { field })
    } else {
        Ok(value)
    }
}
