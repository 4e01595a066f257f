//! Fixed query settings for the historical weather archive.

pub const ARCHIVE_URL: &str = "https://archive-api.open-meteo.com/v1/archive";

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
    pub timezone: &'static str,
}

/// Hanoi, Vietnam.
pub const HANOI: Location = Location {
    latitude: 21.0245,
    longitude: 105.8412,
    timezone: "Asia/Bangkok",
};

pub const HOURLY_COLUMNS: &[&str] = &[
    "apparent_temperature",
    "cloud_cover",
    "dew_point_2m",
    "is_day",
    "precipitation",
    "pressure_msl",
    "surface_pressure",
    "temperature_2m",
    "vapour_pressure_deficit",
    "wind_direction_10m",
    "wind_gusts_10m",
    "wind_speed_10m",
];

pub const DAILY_COLUMNS: &[&str] = &[
    "apparent_temperature_max",
    "apparent_temperature_min",
    "daylight_duration",
    "precipitation_hours",
    "precipitation_sum",
    "shortwave_radiation_sum",
    "sunrise",
    "sunset",
    "sunshine_duration",
    "temperature_2m_max",
    "temperature_2m_min",
    "weather_code",
    "wind_gusts_10m_max",
    "wind_speed_10m_max",
];
