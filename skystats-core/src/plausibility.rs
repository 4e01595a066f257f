//! Optional range checks on records that already passed format validation.

use std::fmt::Debug;

use crate::{
    error::PlausibilityError,
    model::{AirQualitySnapshot, WeatherSnapshot},
};

/// A semantic check over validated records. Both hooks accept by default.
pub trait PlausibilityCheck: Send + Sync + Debug {
    fn name(&self) -> &'static str;

    fn check_weather(&self, _weather: &WeatherSnapshot) -> Result<(), PlausibilityError> {
        Ok(())
    }

    fn check_air(&self, _air: &AirQualitySnapshot) -> Result<(), PlausibilityError> {
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct HumidityAtMostHundred;

impl PlausibilityCheck for HumidityAtMostHundred {
    fn name(&self) -> &'static str {
        "humidity-at-most-100"
    }

    fn check_weather(&self, weather: &WeatherSnapshot) -> Result<(), PlausibilityError> {
        let percent = leading_number(weather.humidity());
        if percent.is_some_and(|p| p <= 100) {
            Ok(())
        } else {
            Err(PlausibilityError {
                check: self.name(),
                field: "humidity",
                value: weather.humidity().to_string(),
            })
        }
    }
}

/// US EPA scale tops out at 500.
#[derive(Debug, Clone, Copy, Default)]
pub struct AqiWithinScale;

impl PlausibilityCheck for AqiWithinScale {
    fn name(&self) -> &'static str {
        "aqi-within-scale"
    }

    fn check_air(&self, air: &AirQualitySnapshot) -> Result<(), PlausibilityError> {
        if leading_number(air.aqi_value()).is_some_and(|v| v <= 500) {
            Ok(())
        } else {
            Err(PlausibilityError {
                check: self.name(),
                field: "AQI value",
                value: air.aqi_value().to_string(),
            })
        }
    }
}

/// The checks enabled by `[validation] plausibility = true`.
pub fn default_checks() -> Vec<Box<dyn PlausibilityCheck>> {
    vec![Box::new(HumidityAtMostHundred), Box::new(AqiWithinScale)]
}

fn leading_number(value: &str) -> Option<u32> {
    let digits: String = value.chars().take_while(|c| c.is_ascii_digit()).collect();
    digits.parse().ok()
}
