use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use serde::Deserialize;

use super::{FluxProvenance, SolarCondition, SolarSource, SourceError};

const DEFAULT_BASE_URL: &str = "https://services.swpc.noaa.gov";

/// NOAA SWPC solar/geomagnetic source. F10.7 is global (one Penticton
/// measurement per day for the whole Earth); historical coverage is
/// month-granularity averages expanded piecewise-constant per day.
pub struct NoaaSource {
    client: reqwest::Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct FluxRecord {
    time_tag: String,
    #[serde(deserialize_with = "lenient_f64")]
    flux: f64,
}

#[derive(Debug, Deserialize)]
struct KpRecord {
    #[serde(deserialize_with = "lenient_f64")]
    kp_index: f64,
}

#[derive(Debug, Deserialize)]
struct MonthlyIndexRecord {
    #[serde(rename = "time-tag")]
    time_tag: String,
    #[serde(rename = "f10.7", default, deserialize_with = "lenient_f64")]
    f107: f64,
}

/// SWPC feeds are inconsistent about numeric encoding; values arrive
/// as JSON numbers or as quoted strings depending on the endpoint.
/// Unparseable or null values become 0.0 and are filtered downstream.
fn lenient_f64<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::Number(n) => n.as_f64().unwrap_or(0.0),
        serde_json::Value::String(s) => s.trim().parse().unwrap_or(0.0),
        _ => 0.0,
    })
}

impl NoaaSource {
    pub fn new(base_url: Option<String>) -> Result<Self, SourceError> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(15))
            .build()?;
        Ok(NoaaSource {
            client,
            base_url: base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
        })
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, path: &str) -> Result<T, SourceError> {
        let response = self
            .client
            .get(format!("{}{path}", self.base_url))
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(SourceError::Status(response.status()));
        }
        Ok(response.json().await?)
    }

    /// Kp is best-effort garnish on the flux value; failures degrade to
    /// a quiet-conditions default instead of failing the whole query.
    async fn current_kp(&self) -> f64 {
        match self
            .get_json::<Vec<KpRecord>>("/json/planetary_k_index_1m.json")
            .await
        {
            Ok(records) => records.last().map(|r| r.kp_index).unwrap_or(2.0),
            Err(e) => {
                log::warn!("kp index fetch failed ({e}), assuming quiet conditions");
                2.0
            }
        }
    }
}

#[async_trait::async_trait]
impl SolarSource for NoaaSource {
    async fn current(&self) -> Result<SolarCondition, SourceError> {
        let records: Vec<FluxRecord> = self.get_json("/json/f107_cm_flux.json").await?;
        let latest = records
            .last()
            .ok_or_else(|| SourceError::Payload("empty f10.7 feed".into()))?;

        if latest.flux <= 0.0 {
            return Err(SourceError::Payload("non-positive f10.7 value".into()));
        }
        if !(50.0..400.0).contains(&latest.flux) {
            log::warn!("suspicious f10.7 value {} sfu (nominal 70-300)", latest.flux);
        }

        let timestamp = parse_swpc_timestamp(&latest.time_tag)
            .ok_or_else(|| SourceError::Payload(format!("bad time tag {}", latest.time_tag)))?;

        Ok(SolarCondition {
            timestamp,
            f107: latest.flux,
            kp: self.current_kp().await,
            provenance: FluxProvenance::Observed,
        })
    }

    async fn historical(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<SolarCondition>, SourceError> {
        let records: Vec<MonthlyIndexRecord> = self
            .get_json("/json/solar-cycle/observed-solar-cycle-indices.json")
            .await?;

        let mut monthly: Vec<(NaiveDate, f64)> = records
            .iter()
            .filter(|r| r.f107 > 0.0)
            .filter_map(|r| parse_month_tag(&r.time_tag).map(|d| (d, r.f107)))
            .collect();
        monthly.sort_by_key(|(date, _)| *date);

        if monthly.is_empty() {
            return Err(SourceError::Payload("no usable f10.7 history".into()));
        }

        Ok(expand_monthly_to_daily(&monthly, start, end))
    }
}

/// Expand month-granularity averages to one value per day, treating
/// each month's value as constant across the month. Days before the
/// first known month fall back to the estimated default.
pub fn expand_monthly_to_daily(
    monthly: &[(NaiveDate, f64)],
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Vec<SolarCondition> {
    let mut out = Vec::new();
    let mut day = start.date_naive();
    let last = end.date_naive();

    while day <= last {
        let month_key = NaiveDate::from_ymd_opt(day.year(), day.month(), 1);
        let value = month_key.and_then(|key| {
            monthly
                .iter()
                .rev()
                .find(|(date, _)| *date <= key)
                .map(|(_, f107)| *f107)
        });

        let timestamp = DateTime::<Utc>::from_naive_utc_and_offset(
            day.and_hms_opt(0, 0, 0).unwrap_or_default(),
            Utc,
        );
        out.push(match value {
            Some(f107) => SolarCondition {
                timestamp,
                f107,
                kp: 2.0,
                provenance: FluxProvenance::Observed,
            },
            None => SolarCondition::estimated(timestamp),
        });
        day = day + Duration::days(1);
    }

    out
}

fn parse_swpc_timestamp(tag: &str) -> Option<DateTime<Utc>> {
    let normalized = tag.trim_end_matches('Z');
    chrono::NaiveDateTime::parse_from_str(normalized, "%Y-%m-%dT%H:%M:%S")
        .ok()
        .map(|dt| DateTime::from_naive_utc_and_offset(dt, Utc))
}

/// SWPC month tags are "YYYY-MM".
fn parse_month_tag(tag: &str) -> Option<NaiveDate> {
    let (year, month) = tag.get(..7)?.split_once('-')?;
    NaiveDate::from_ymd_opt(year.parse().ok()?, month.parse().ok()?, 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn month_tags_parse() {
        assert_eq!(
            parse_month_tag("2024-06"),
            NaiveDate::from_ymd_opt(2024, 6, 1)
        );
        assert_eq!(
            parse_month_tag("2024-06-15"),
            NaiveDate::from_ymd_opt(2024, 6, 1)
        );
        assert!(parse_month_tag("junk").is_none());
    }

    #[test]
    fn monthly_values_are_piecewise_constant() {
        let monthly = vec![
            (NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(), 140.0),
            (NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(), 160.0),
        ];
        let start = Utc.with_ymd_and_hms(2024, 5, 30, 0, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2024, 6, 2, 0, 0, 0).unwrap();
        let daily = expand_monthly_to_daily(&monthly, start, end);

        assert_eq!(daily.len(), 4);
        assert_eq!(daily[0].f107, 140.0);
        assert_eq!(daily[1].f107, 140.0);
        assert_eq!(daily[2].f107, 160.0);
        assert_eq!(daily[3].f107, 160.0);
        assert!(daily.iter().all(|d| d.provenance == FluxProvenance::Observed));
    }

    #[test]
    fn days_before_coverage_fall_back_to_estimated() {
        let monthly = vec![(NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(), 160.0)];
        let start = Utc.with_ymd_and_hms(2024, 5, 31, 0, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        let daily = expand_monthly_to_daily(&monthly, start, end);

        assert_eq!(daily[0].provenance, FluxProvenance::Estimated);
        assert_eq!(daily[0].f107, crate::sources::ESTIMATED_F107);
        assert_eq!(daily[1].f107, 160.0);
    }

    #[test]
    fn swpc_timestamps_parse_with_and_without_zulu() {
        assert!(parse_swpc_timestamp("2024-06-01T17:00:00Z").is_some());
        assert!(parse_swpc_timestamp("2024-06-01T17:00:00").is_some());
        assert!(parse_swpc_timestamp("not-a-time").is_none());
    }
}
