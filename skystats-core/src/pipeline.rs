//! Current-conditions flow: fetch → parse → extract → validate for each source,
//! with failures isolated per source.

use std::fmt;
use tracing::{info, warn};

use crate::{
    config::{Config, SourceUrls},
    document::Document,
    error::ExtractError,
    extract::{AirQualityPageRules, Extractor, SourceId, WeatherPageRules},
    http::Fetcher,
    model::{AirQualitySnapshot, CurrentConditions, WeatherSnapshot},
    plausibility::{self, PlausibilityCheck},
};

/// Stage at which a source was dropped from the result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureStage {
    Fetch,
    Extraction,
    Validation,
    Plausibility,
}

impl FailureStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureStage::Fetch => "fetch",
            FailureStage::Extraction => "extraction",
            FailureStage::Validation => "validation",
            FailureStage::Plausibility => "plausibility",
        }
    }
}

impl fmt::Display for FailureStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFailure {
    pub source: SourceId,
    pub stage: FailureStage,
    pub message: String,
}

impl SourceFailure {
    fn new(source: SourceId, stage: FailureStage, err: impl fmt::Display) -> Self {
        Self {
            source,
            stage,
            message: err.to_string(),
        }
    }
}

impl fmt::Display for SourceFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} failure: {}",
            self.source, self.stage, self.message
        )
    }
}

/// What a run produced: the records that made it, and why the others did not.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CurrentReport {
    pub conditions: CurrentConditions,
    pub failures: Vec<SourceFailure>,
}

impl CurrentReport {
    pub fn failure(&self, source: SourceId) -> Option<&SourceFailure> {
        self.failures.iter().find(|f| f.source == source)
    }
}

#[derive(Debug)]
pub struct CurrentPipeline<F> {
    urls: SourceUrls,
    fetcher: F,
    air_rules: AirQualityPageRules,
    weather_rules: WeatherPageRules,
    checks: Vec<Box<dyn PlausibilityCheck>>,
}

impl<F: Fetcher> CurrentPipeline<F> {
    pub fn new(
        urls: SourceUrls,
        fetcher: F,
        air_rules: AirQualityPageRules,
        weather_rules: WeatherPageRules,
    ) -> Self {
        Self {
            urls,
            fetcher,
            air_rules,
            weather_rules,
            checks: Vec::new(),
        }
    }

    /// Build from resolved configuration: URLs, AQI tiers and plausibility switch.
    pub fn from_config(config: &Config, fetcher: F) -> anyhow::Result<Self> {
        let urls = config.source_urls()?;
        let air_rules = AirQualityPageRules::new(config.sources.aqi_tiers.as_slice())?;
        let weather_rules = WeatherPageRules::new()?;

        let mut pipeline = Self::new(urls, fetcher, air_rules, weather_rules);
        if config.validation.plausibility {
            pipeline = pipeline.with_checks(plausibility::default_checks());
        }
        Ok(pipeline)
    }

    pub fn with_checks(mut self, checks: Vec<Box<dyn PlausibilityCheck>>) -> Self {
        self.checks = checks;
        self
    }

    /// Run both sources. A failing source never prevents the other from running.
    pub async fn run(&self) -> CurrentReport {
        let (air, weather) = tokio::join!(self.air_quality(), self.weather());

        let mut report = CurrentReport::default();
        match air {
            Ok(record) => report.conditions.air_data = Some(record),
            Err(failure) => report.failures.push(failure),
        }
        match weather {
            Ok(record) => report.conditions.weather_data = Some(record),
            Err(failure) => report.failures.push(failure),
        }
        report
    }

    async fn fetch(&self, source: SourceId, url: &str) -> Result<String, SourceFailure> {
        self.fetcher.fetch_text(url, &[]).await.map_err(|e| {
            warn!(%source, error = %e, "Error requesting {source} information");
            SourceFailure::new(source, FailureStage::Fetch, e)
        })
    }

    async fn air_quality(&self) -> Result<AirQualitySnapshot, SourceFailure> {
        let body = self.fetch(SourceId::AirQuality, &self.urls.air_url).await?;
        let record = process(&self.air_rules, &body, AirQualitySnapshot::try_from)?;
        self.check(SourceId::AirQuality, |c| c.check_air(&record))?;
        info!(air_data = ?record, "Air Data");
        Ok(record)
    }

    async fn weather(&self) -> Result<WeatherSnapshot, SourceFailure> {
        let body = self.fetch(SourceId::Weather, &self.urls.weather_url).await?;
        let record = process(&self.weather_rules, &body, WeatherSnapshot::try_from)?;
        self.check(SourceId::Weather, |c| c.check_weather(&record))?;
        info!(weather_data = ?record, "Weather Data");
        Ok(record)
    }

    fn check<E: fmt::Display>(
        &self,
        source: SourceId,
        run: impl Fn(&dyn PlausibilityCheck) -> Result<(), E>,
    ) -> Result<(), SourceFailure> {
        for check in &self.checks {
            run(check.as_ref()).map_err(|e| {
                warn!(%source, error = %e, "Implausible {source} information");
                SourceFailure::new(source, FailureStage::Plausibility, e)
            })?;
        }
        Ok(())
    }
}

/// Parse, extract and validate one document. Synchronous: the parsed tree never
/// lives across an await point.
fn process<X, T, E>(
    rules: &X,
    body: &str,
    validate: impl FnOnce(X::Raw) -> Result<T, E>,
) -> Result<T, SourceFailure>
where
    X: Extractor,
    E: fmt::Display,
{
    let source = rules.source();
    let doc = Document::parse(body);

    let raw = rules.extract(&doc).map_err(|e: ExtractError| {
        warn!(%source, error = %e, "Error parsing {source} information");
        SourceFailure::new(source, FailureStage::Extraction, e)
    })?;

    validate(raw).map_err(|e| {
        warn!(%source, error = %e, "Invalid {source} information");
        SourceFailure::new(source, FailureStage::Validation, e)
    })
}
