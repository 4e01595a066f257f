use regex::Regex;
use std::sync::LazyLock;
use tracing::debug;

use crate::{
    document::{Document, Node, Query},
    error::ExtractError,
    model::RawAirQuality,
};

use super::{Extractor, SourceId};

const SUMMARY: &str = "div.aqi-overview__summary";
const STATUS_TEXT: &str = ".aqi-status__text";
const VALUE_TEXT: &str = ".aqi-value__value";
const RECOMMENDATIONS: &str = "div.recommendation__detail";
const ROW: &str = "tr";
const LINK_TAG: &str = "a";

static TIER_CLASS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_-]+$").unwrap());

/// Tier classes accepted by default.
///
/// The page marks the summary block with a severity-specific class, so a rule
/// bound to `aqi-yellow` only matches while the AQI sits in that tier. Other
/// tiers are accepted only when their class names are listed explicitly in
/// the configuration.
pub const DEFAULT_AQI_TIERS: &[&str] = &["aqi-yellow"];

/// Extraction rules for the air-quality page.
#[derive(Debug, Clone)]
pub struct AirQualityPageRules {
    summaries: Vec<Query>,
    status_text: Query,
    value_text: Query,
    recommendations: Query,
    row: Query,
}

impl AirQualityPageRules {
    pub fn new<S: AsRef<str>>(tiers: &[S]) -> Result<Self, ExtractError> {
        if tiers.is_empty() {
            return Err(ExtractError::Selector {
                selector: SUMMARY.to_string(),
                message: "no AQI tier classes configured".to_string(),
            });
        }

        let summaries = tiers
            .iter()
            .map(|tier| tier_query(tier.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            summaries,
            status_text: Query::parse(STATUS_TEXT)?,
            value_text: Query::parse(VALUE_TEXT)?,
            recommendations: Query::parse(RECOMMENDATIONS)?,
            row: Query::parse(ROW)?,
        })
    }

    pub fn with_default_tiers() -> Result<Self, ExtractError> {
        Self::new(DEFAULT_AQI_TIERS)
    }

    fn summary<'a>(&self, doc: &'a Document) -> Result<Node<'a>, ExtractError> {
        self.summaries
            .iter()
            .find_map(|query| doc.one(query).ok())
            .ok_or_else(|| {
                let tried: Vec<&str> = self.summaries.iter().map(Query::as_str).collect();
                ExtractError::missing(tried.join(" | "))
            })
    }
}

/// Summary query for one tier. The tier must be a single class name.
fn tier_query(tier: &str) -> Result<Query, ExtractError> {
    if !TIER_CLASS.is_match(tier) {
        return Err(ExtractError::Selector {
            selector: format!("{SUMMARY}.{tier}"),
            message: format!("AQI tier {tier:?} is not a single class name"),
        });
    }
    Query::parse(&format!("{SUMMARY}.{tier}"))
}

impl Extractor for AirQualityPageRules {
    type Raw = RawAirQuality;

    fn source(&self) -> SourceId {
        SourceId::AirQuality
    }

    fn extract(&self, doc: &Document) -> Result<RawAirQuality, ExtractError> {
        let summary = self.summary(doc)?;
        let aqi_status = summary.one(&self.status_text)?.text().trim().to_string();
        let aqi_value = summary.one(&self.value_text)?.text().trim().to_string();

        // Product links are stripped before the rows are read.
        let recommendation = doc
            .one(&self.recommendations)?
            .all(&self.row)
            .iter()
            .map(|row| row.text_excluding(LINK_TAG).trim().to_string())
            .collect::<Vec<_>>()
            .join("\n");

        debug!(%aqi_value, %aqi_status, "extracted air-quality fields");

        Ok(RawAirQuality {
            aqi_value,
            aqi_status,
            recommendation,
        })
    }
}
