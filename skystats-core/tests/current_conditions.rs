//! End-to-end current-conditions runs against fixture pages.

use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::Value;
use skystats_core::{Config, CurrentPipeline, FailureStage, FetchError, Fetcher, SourceId};

const AIR_URL: &str = "https://air.example/hanoi";
const WEATHER_URL: &str = "https://weather.example/hanoi";

#[derive(Debug)]
struct FixtureFetcher {
    air_up: bool,
    weather_up: bool,
}

#[async_trait]
impl Fetcher for FixtureFetcher {
    async fn fetch_text(&self, url: &str, _: &[(&str, String)]) -> Result<String, FetchError> {
        let unavailable = || FetchError::Status {
            url: url.to_string(),
            status: StatusCode::SERVICE_UNAVAILABLE,
            body: "upstream down".into(),
        };
        match url {
            AIR_URL if self.air_up => Ok(include_str!("fixtures/air_quality_page.html").into()),
            WEATHER_URL if self.weather_up => Ok(include_str!("fixtures/weather_page.html").into()),
            _ => Err(unavailable()),
        }
    }
}

fn config() -> Config {
    Config::default().with_overrides(Some(AIR_URL.into()), Some(WEATHER_URL.into()))
}

async fn run(air_up: bool, weather_up: bool) -> (Option<Value>, skystats_core::CurrentReport) {
    let fetcher = FixtureFetcher {
        air_up,
        weather_up,
    };
    let pipeline = CurrentPipeline::from_config(&config(), fetcher).unwrap();
    let report = pipeline.run().await;
    let json = report
        .conditions
        .to_json()
        .unwrap()
        .map(|s| serde_json::from_str(&s).unwrap());
    (json, report)
}

#[tokio::test]
async fn full_payload() {
    let (json, report) = run(true, true).await;
    let json = json.expect("output produced");

    assert!(report.failures.is_empty());
    assert_eq!(json["air_data"]["aqi_value"], "75");
    assert_eq!(json["air_data"]["aqi_status_text"], "Moderate");
    assert_eq!(json["weather_data"]["pressure"], "1005 mbar");
    assert_eq!(json["weather_data"]["humidity"], "67%");
    assert_eq!(json["weather_data"]["temperature"], "34°C");
    assert_eq!(json["weather_data"]["weather_summary"], "Partly sunny.");
    assert_eq!(json["weather_data"]["wind_power"], "11 km/h");
    assert_eq!(
        json["weather_data"]["wind_dir"],
        "Wind blowing from 0° North to South"
    );
}

#[tokio::test]
async fn air_source_down_leaves_only_weather() {
    let (json, report) = run(false, true).await;
    let json = json.expect("output produced");

    let keys: Vec<&str> = json
        .as_object()
        .unwrap()
        .keys()
        .map(String::as_str)
        .collect();
    assert_eq!(keys, vec!["weather_data"]);
    let failure = report.failure(SourceId::AirQuality).unwrap();
    assert_eq!(failure.stage, FailureStage::Fetch);
}

#[tokio::test]
async fn both_sources_down_produce_nothing() {
    let (json, report) = run(false, false).await;

    assert!(json.is_none());
    assert_eq!(report.failures.len(), 2);
}
