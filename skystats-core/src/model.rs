use serde::Serialize;
use std::{convert::TryFrom, fmt};

use crate::{error::ValidationError, validate};

/// Raw weather fields as pulled from the page, before validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawWeather {
    pub pressure: String,
    pub humidity: String,
    pub temperature: String,
    pub summary: String,
    pub wind_power: String,
    pub wind_direction: String,
}

/// Raw air-quality fields as pulled from the page, before validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawAirQuality {
    pub aqi_value: String,
    pub aqi_status: String,
    pub recommendation: String,
}

/// Current weather conditions. Only constructible from a fully valid [`RawWeather`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WeatherSnapshot {
    pressure: String,
    humidity: String,
    temperature: String,
    #[serde(rename = "weather_summary")]
    summary: String,
    wind_power: String,
    #[serde(rename = "wind_dir")]
    wind_direction: String,
}

impl WeatherSnapshot {
    pub fn pressure(&self) -> &str {
        &self.pressure
    }

    pub fn humidity(&self) -> &str {
        &self.humidity
    }

    pub fn temperature(&self) -> &str {
        &self.temperature
    }

    pub fn summary(&self) -> &str {
        &self.summary
    }

    pub fn wind_power(&self) -> &str {
        &self.wind_power
    }

    pub fn wind_direction(&self) -> &str {
        &self.wind_direction
    }
}

impl TryFrom<RawWeather> for WeatherSnapshot {
    type Error = ValidationError;

    fn try_from(raw: RawWeather) -> Result<Self, Self::Error> {
        Ok(Self {
            pressure: validate::pressure(raw.pressure)?,
            humidity: validate::humidity(raw.humidity)?,
            temperature: validate::temperature(raw.temperature)?,
            summary: validate::non_empty("weather summary", raw.summary)?,
            wind_power: validate::wind_power(raw.wind_power)?,
            wind_direction: validate::non_empty("wind direction", raw.wind_direction)?,
        })
    }
}

/// AQI severity tiers, matched case-sensitively against the page text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum AqiStatus {
    Good,
    Moderate,
    #[serde(rename = "Unhealthy for Sensitive Groups")]
    UnhealthyForSensitiveGroups,
    Unhealthy,
    #[serde(rename = "Very Unhealthy")]
    VeryUnhealthy,
    Hazardous,
}

impl AqiStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AqiStatus::Good => "Good",
            AqiStatus::Moderate => "Moderate",
            AqiStatus::UnhealthyForSensitiveGroups => "Unhealthy for Sensitive Groups",
            AqiStatus::Unhealthy => "Unhealthy",
            AqiStatus::VeryUnhealthy => "Very Unhealthy",
            AqiStatus::Hazardous => "Hazardous",
        }
    }

    pub const fn all() -> &'static [AqiStatus] {
        &[
            AqiStatus::Good,
            AqiStatus::Moderate,
            AqiStatus::UnhealthyForSensitiveGroups,
            AqiStatus::Unhealthy,
            AqiStatus::VeryUnhealthy,
            AqiStatus::Hazardous,
        ]
    }
}

impl fmt::Display for AqiStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for AqiStatus {
    type Error = ValidationError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::all()
            .iter()
            .copied()
            .find(|status| status.as_str() == value)
            .ok_or_else(|| ValidationError::UnknownAqiStatus {
                value: value.to_string(),
            })
    }
}

/// Current air-quality reading. Only constructible from a fully valid [`RawAirQuality`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AirQualitySnapshot {
    aqi_value: String,
    #[serde(rename = "aqi_status_text")]
    aqi_status: AqiStatus,
    #[serde(rename = "recommendation_detail")]
    recommendation: String,
}

impl AirQualitySnapshot {
    pub fn aqi_value(&self) -> &str {
        &self.aqi_value
    }

    pub fn aqi_status(&self) -> AqiStatus {
        self.aqi_status
    }

    pub fn recommendation(&self) -> &str {
        &self.recommendation
    }
}

impl TryFrom<RawAirQuality> for AirQualitySnapshot {
    type Error = ValidationError;

    fn try_from(raw: RawAirQuality) -> Result<Self, Self::Error> {
        Ok(Self {
            aqi_value: validate::aqi_value(raw.aqi_value)?,
            aqi_status: AqiStatus::try_from(raw.aqi_status.as_str())?,
            recommendation: validate::non_empty("recommendation detail", raw.recommendation)?,
        })
    }
}

/// Combined current-conditions payload; a key is present only if its source succeeded.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CurrentConditions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub air_data: Option<AirQualitySnapshot>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weather_data: Option<WeatherSnapshot>,
}

impl CurrentConditions {
    pub fn is_empty(&self) -> bool {
        self.air_data.is_none() && self.weather_data.is_none()
    }

    /// Serialize to a single JSON object, or `None` when no source succeeded.
    pub fn to_json(&self) -> serde_json::Result<Option<String>> {
        if self.is_empty() {
            return Ok(None);
        }
        serde_json::to_string(self).map(Some)
    }
}
