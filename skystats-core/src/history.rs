//! Historical weather from the archive API: request validation, query
//! building and reshaping the response into a [`HistoricalSeries`].

use chrono::{DateTime, NaiveDate, NaiveTime, TimeDelta, TimeZone, Utc};
use chrono_tz::Tz;
use std::{fmt, str::FromStr};
use tracing::info;

use crate::{
    config::ArchiveConfig,
    error::{HistoryError, RequestError},
    http::Fetcher,
};

pub mod params;
pub mod response;
pub mod series;

pub use response::ArchiveResponse;
pub use series::HistoricalSeries;

pub const EARLIEST_START: NaiveDate = match NaiveDate::from_ymd_opt(2012, 1, 1) {
    Some(date) => date,
    None => panic!("invalid earliest start date"),
};

pub const LATEST_END: NaiveDate = match NaiveDate::from_ymd_opt(2022, 12, 31) {
    Some(date) => date,
    None => panic!("invalid latest end date"),
};

const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Frequency {
    Hourly,
    Daily,
}

impl Frequency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Frequency::Hourly => "hourly",
            Frequency::Daily => "daily",
        }
    }

    pub const fn all() -> &'static [Frequency] {
        &[Frequency::Hourly, Frequency::Daily]
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Frequency {
    type Err = RequestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "hourly" => Ok(Frequency::Hourly),
            "daily" => Ok(Frequency::Daily),
            other => Err(RequestError::InvalidFrequency(other.to_string())),
        }
    }
}

/// A validated archive window: `EARLIEST_START <= start < end <= LATEST_END`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, RequestError> {
        if start < EARLIEST_START {
            return Err(RequestError::StartTooEarly {
                start,
                min: EARLIEST_START,
            });
        }
        if end > LATEST_END {
            return Err(RequestError::EndTooLate {
                end,
                max: LATEST_END,
            });
        }
        if end <= start {
            return Err(RequestError::EndNotAfterStart { start, end });
        }
        Ok(Self { start, end })
    }

    /// Parse two `YYYY-MM-DD` strings and validate the window.
    pub fn parse(start: &str, end: &str) -> Result<Self, RequestError> {
        Self::new(parse_date(start)?, parse_date(end)?)
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    pub fn days(&self) -> usize {
        // end > start is guaranteed by construction.
        (self.end - self.start).num_days().unsigned_abs() as usize
    }

    /// Start instant of every bucket in `[start, end)`, with days bounded by
    /// local midnight in `tz`. Days with a DST change have 23 or 25 hourly buckets.
    pub fn bucket_starts(&self, frequency: Frequency, tz: Tz) -> Vec<DateTime<Utc>> {
        match frequency {
            Frequency::Hourly => {
                let start = local_midnight(self.start, tz);
                let hours = (local_midnight(self.end, tz) - start).num_hours();
                (0..hours).map(|h| start + TimeDelta::hours(h)).collect()
            }
            Frequency::Daily => self
                .start
                .iter_days()
                .take(self.days())
                .map(|d| local_midnight(d, tz))
                .collect(),
        }
    }
}

fn local_midnight(date: NaiveDate, tz: Tz) -> DateTime<Utc> {
    let midnight = date.and_time(NaiveTime::MIN);
    // Midnight skipped by a DST jump: the day starts an hour later.
    let next_hour = midnight + TimeDelta::hours(1);
    tz.from_local_datetime(&midnight)
        .earliest()
        .or_else(|| tz.from_local_datetime(&next_hour).earliest())
        .map(|t| t.with_timezone(&Utc))
        .unwrap_or_else(|| midnight.and_utc())
}

fn parse_date(input: &str) -> Result<NaiveDate, RequestError> {
    NaiveDate::parse_from_str(input.trim(), DATE_FORMAT)
        .map_err(|_| RequestError::InvalidDate {
            input: input.to_string(),
        })
}

/// Request parameters for one archive call.
#[derive(Debug, Clone)]
pub struct ArchiveQuery<'a> {
    config: &'a ArchiveConfig,
    range: DateRange,
    frequency: Frequency,
}

impl<'a> ArchiveQuery<'a> {
    pub fn new(config: &'a ArchiveConfig, range: DateRange, frequency: Frequency) -> Self {
        Self {
            config,
            range,
            frequency,
        }
    }

    pub fn columns(&self) -> &'a [String] {
        match self.frequency {
            Frequency::Hourly => &self.config.hourly_columns,
            Frequency::Daily => &self.config.daily_columns,
        }
    }

    pub fn params(&self) -> Vec<(&'static str, String)> {
        vec![
            ("latitude", self.config.latitude.to_string()),
            ("longitude", self.config.longitude.to_string()),
            ("timezone", self.config.timezone.clone()),
            ("start_date", self.range.start().format(DATE_FORMAT).to_string()),
            ("end_date", self.range.end().format(DATE_FORMAT).to_string()),
            (self.frequency.as_str(), self.columns().join(",")),
            ("timeformat", "unixtime".to_string()),
        ]
    }
}

/// Fetches and reshapes archive series. One request per call; retries and
/// caching belong to the [`Fetcher`].
#[derive(Debug)]
pub struct ArchiveClient<F> {
    fetcher: F,
    config: ArchiveConfig,
}

impl<F: Fetcher> ArchiveClient<F> {
    pub fn new(fetcher: F, config: ArchiveConfig) -> Self {
        Self { fetcher, config }
    }

    pub async fn fetch_historical(
        &self,
        range: &DateRange,
        frequency: Frequency,
    ) -> Result<HistoricalSeries, HistoryError> {
        let tz = self.config.zone()?;
        let query = ArchiveQuery::new(&self.config, *range, frequency);
        let body = self
            .fetcher
            .fetch_text(&self.config.url, &query.params())
            .await?;

        let response: ArchiveResponse = serde_json::from_str(&body)?;
        response.log_metadata();

        let starts = range.bucket_starts(frequency, tz);
        let series = response.into_series(frequency, query.columns(), starts)?;
        info!(
            rows = series.row_count(),
            "{frequency} data retrieved successfully"
        );
        Ok(series)
    }

    /// Validate raw caller input, then fetch. Nothing is requested when validation fails.
    pub async fn get_history(
        &self,
        start: &str,
        end: &str,
        frequency: &str,
    ) -> Result<HistoricalSeries, HistoryError> {
        let range = DateRange::parse(start, end)?;
        let frequency = Frequency::from_str(frequency)?;
        self.fetch_historical(&range, frequency).await
    }
}

#[cfg(test)]
mod tests {
    use super::response::tests::{LOCAL_MIDNIGHT, archive_json};
    use super::*;
    use crate::error::FetchError;
    use async_trait::async_trait;
    use chrono_tz::{Asia::Bangkok, Europe::Berlin};
    use rstest::rstest;
    use std::sync::Mutex;

    #[derive(Debug, Default)]
    struct RecordingFetcher {
        body: String,
        requests: Mutex<Vec<(String, Vec<(String, String)>)>>,
    }

    #[async_trait]
    impl Fetcher for RecordingFetcher {
        async fn fetch_text(
            &self,
            url: &str,
            query: &[(&str, String)],
        ) -> Result<String, FetchError> {
            let query = query
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect();
            self.requests.lock().unwrap().push((url.to_string(), query));
            Ok(self.body.clone())
        }
    }

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, DATE_FORMAT).unwrap()
    }

    #[rstest]
    #[case("2012-01-01", "2022-12-31")]
    #[case("2020-01-01", "2020-01-02")]
    fn accepts_valid_ranges(#[case] start: &str, #[case] end: &str) {
        let range = DateRange::parse(start, end).expect("valid range");
        assert_eq!(range.start(), date(start));
        assert_eq!(range.end(), date(end));
    }

    #[rstest]
    #[case("2011-12-31", "2022-12-31", "before the earliest supported date 2012-01-01")]
    #[case("2020-01-01", "2023-01-01", "after the latest supported date 2022-12-31")]
    #[case("2020-01-01", "2020-01-01", "must be strictly after start date")]
    #[case("2020-02-01", "2020-01-01", "must be strictly after start date")]
    #[case("2020/01/01", "2020-01-02", "Invalid date \"2020/01/01\"")]
    #[case("2020-01-01", "tomorrow", "Invalid date \"tomorrow\"")]
    fn rejects_invalid_ranges(#[case] start: &str, #[case] end: &str, #[case] message: &str) {
        let err = DateRange::parse(start, end).unwrap_err();
        assert!(err.to_string().contains(message), "{err}");
    }

    #[test]
    fn rejection_carries_the_offending_dates() {
        assert_eq!(
            DateRange::parse("2011-12-31", "2022-12-31").unwrap_err(),
            RequestError::StartTooEarly {
                start: date("2011-12-31"),
                min: EARLIEST_START,
            }
        );
        assert_eq!(
            DateRange::parse("2020-02-01", "2020-01-01").unwrap_err(),
            RequestError::EndNotAfterStart {
                start: date("2020-02-01"),
                end: date("2020-01-01"),
            }
        );
    }

    #[test]
    fn bucket_counts() {
        let range = DateRange::parse("2020-02-27", "2020-03-02").unwrap();
        assert_eq!(range.days(), 4);
        assert_eq!(range.bucket_starts(Frequency::Daily, Bangkok).len(), 4);
        assert_eq!(range.bucket_starts(Frequency::Hourly, Bangkok).len(), 96);
    }

    #[test]
    fn buckets_start_at_local_midnight() {
        let range = DateRange::parse("2020-01-01", "2020-01-03").unwrap();

        let hourly = range.bucket_starts(Frequency::Hourly, Bangkok);
        assert_eq!(hourly[0].timestamp(), LOCAL_MIDNIGHT);
        assert_eq!(hourly[1].timestamp() - hourly[0].timestamp(), 3_600);

        let daily = range.bucket_starts(Frequency::Daily, Bangkok);
        assert_eq!(daily[1].timestamp() - daily[0].timestamp(), 86_400);
    }

    #[rstest]
    #[case("2020-03-29", "2020-03-30", 23)]
    #[case("2020-10-25", "2020-10-26", 25)]
    #[case("2020-06-01", "2020-06-02", 24)]
    fn hourly_buckets_follow_dst(#[case] start: &str, #[case] end: &str, #[case] hours: usize) {
        let range = DateRange::parse(start, end).unwrap();
        let buckets = range.bucket_starts(Frequency::Hourly, Berlin);
        let hour = TimeDelta::hours(1);

        assert_eq!(buckets.len(), hours);
        assert!(buckets.windows(2).all(|w| w[1] - w[0] == hour));
    }

    #[test]
    fn daily_buckets_across_dst_are_local_midnights() {
        let range = DateRange::parse("2020-03-28", "2020-03-31").unwrap();
        let starts: Vec<String> = range
            .bucket_starts(Frequency::Daily, Berlin)
            .iter()
            .map(|t| t.to_rfc3339())
            .collect();
        assert_eq!(
            starts,
            [
                "2020-03-27T23:00:00+00:00",
                "2020-03-28T23:00:00+00:00",
                "2020-03-29T22:00:00+00:00",
            ]
        );
    }

    #[test]
    fn frequency_parsing() {
        for f in Frequency::all() {
            assert_eq!(Frequency::from_str(f.as_str()).unwrap(), *f);
        }
        assert_eq!(
            Frequency::from_str("weekly").unwrap_err(),
            RequestError::InvalidFrequency("weekly".into())
        );
        assert!(Frequency::from_str("Daily").is_err());
    }

    #[test]
    fn query_params_carry_location_range_and_columns() {
        let config = ArchiveConfig::default();
        let range = DateRange::parse("2020-01-01", "2020-01-03").unwrap();
        let params = ArchiveQuery::new(&config, range, Frequency::Daily).params();

        let get = |key: &str| {
            params
                .iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| v.as_str())
        };
        assert_eq!(get("latitude"), Some("21.0245"));
        assert_eq!(get("longitude"), Some("105.8412"));
        assert_eq!(get("timezone"), Some("Asia/Bangkok"));
        assert_eq!(get("start_date"), Some("2020-01-01"));
        assert_eq!(get("end_date"), Some("2020-01-03"));
        assert_eq!(get("timeformat"), Some("unixtime"));
        assert_eq!(get("hourly"), None);

        let daily = get("daily").unwrap();
        assert_eq!(daily.split(',').next(), Some("apparent_temperature_max"));
        assert_eq!(daily.split(',').count(), 14);
    }

    #[tokio::test]
    async fn fetch_historical_reshapes_response() {
        let config = ArchiveConfig::default();
        let columns: Vec<&str> = config.hourly_columns.iter().map(String::as_str).collect();
        let fetcher = RecordingFetcher {
            body: archive_json(Frequency::Hourly, &columns, 3).to_string(),
            ..Default::default()
        };
        let client = ArchiveClient::new(fetcher, config);

        let range = DateRange::parse("2020-01-01", "2020-01-03").unwrap();
        let series = client
            .fetch_historical(&range, Frequency::Hourly)
            .await
            .unwrap();

        assert_eq!(series.row_count(), 48);
        assert_eq!(series.columns().len(), 12);
        assert_eq!(series.columns()[0], "apparent_temperature");

        let requests = client.fetcher.requests.lock().unwrap();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].0, params::ARCHIVE_URL);
    }

    #[tokio::test]
    async fn unknown_timezone_aborts_before_any_request() {
        let config = ArchiveConfig {
            timezone: "Mars/Olympus".into(),
            ..ArchiveConfig::default()
        };
        let client = ArchiveClient::new(RecordingFetcher::default(), config);

        let err = client
            .get_history("2020-01-01", "2020-01-02", "daily")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            HistoryError::Request(RequestError::UnknownTimezone { .. })
        ));
        assert!(client.fetcher.requests.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn invalid_input_aborts_before_any_request() {
        let client = ArchiveClient::new(RecordingFetcher::default(), ArchiveConfig::default());

        let err = client
            .get_history("2011-06-01", "2012-06-01", "daily")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            HistoryError::Request(RequestError::StartTooEarly { .. })
        ));

        let err = client
            .get_history("2020-01-01", "2020-02-01", "weekly")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            HistoryError::Request(RequestError::InvalidFrequency(_))
        ));

        assert!(client.fetcher.requests.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn undecodable_body_is_fatal() {
        let fetcher = RecordingFetcher {
            body: "<html>oops</html>".into(),
            ..Default::default()
        };
        let client = ArchiveClient::new(fetcher, ArchiveConfig::default());

        let err = client
            .get_history("2020-01-01", "2020-01-02", "daily")
            .await
            .unwrap_err();
        assert!(matches!(err, HistoryError::Decode(_)));
    }
}
