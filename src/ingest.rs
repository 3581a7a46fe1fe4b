//! Bulk loading of grid samples: CSV import and the demo seed set.

use chrono::{DateTime, Duration, NaiveDateTime, Utc};
use serde::Deserialize;
use std::io::Read;
use std::path::Path;
use thiserror::Error;
use tracing::info;

use crate::domain::{GridSample, DEFAULT_CAPACITY_MW, DEFAULT_EFFICIENCY_PERCENT};
use crate::error::GridResult;
use crate::repo::{IngestReport, StateStore};

const NAIVE_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];

/// Base values of the seed set: region, demand MW, supply MW.
const SEED_REGIONS: [(&str, f64, f64); 4] = [
    ("us-west", 1000.0, 1100.0),
    ("us-east", 1500.0, 1550.0),
    ("us-central", 800.0, 850.0),
    ("pgae", 1200.0, 1250.0),
];
const SEED_SAMPLES_PER_REGION: i64 = 3;

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("cannot read '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("CSV parsing error at line {line}: {source}")]
    Csv { line: u64, source: csv::Error },
    #[error("unrecognized timestamp '{value}' at line {line}")]
    Timestamp { line: u64, value: String },
}

/// One CSV row. `timestamp` is RFC 3339 or a naive UTC date-time.
#[derive(Debug, Deserialize)]
struct CsvRow {
    region: String,
    demand: f64,
    supply: f64,
    timestamp: String,
    #[serde(default)]
    current_load: Option<f64>,
    #[serde(default)]
    capacity: Option<f64>,
    #[serde(default)]
    efficiency: Option<f64>,
}

pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(value) {
        return Some(ts.with_timezone(&Utc));
    }
    NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
        .map(|naive| naive.and_utc())
}

/// Reads `region,demand,supply,timestamp` rows. Region admission and value
/// checks happen later, in [`StateStore::record`].
pub fn read_samples<R: Read>(reader: R) -> Result<Vec<GridSample>, IngestError> {
    let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let mut samples = Vec::new();
    for result in reader.deserialize::<CsvRow>() {
        let row = result.map_err(|source| IngestError::Csv {
            line: source.position().map_or(0, |p| p.line()),
            source,
        })?;
        let line = samples.len() as u64 + 2;
        let observed_at = parse_timestamp(&row.timestamp).ok_or_else(|| IngestError::Timestamp {
            line,
            value: row.timestamp.clone(),
        })?;
        samples.push(GridSample {
            current_load: row.current_load.unwrap_or(0.0),
            capacity_mw: row.capacity.unwrap_or(DEFAULT_CAPACITY_MW),
            efficiency_percent: row.efficiency.unwrap_or(DEFAULT_EFFICIENCY_PERCENT),
            ..GridSample::new(row.region, row.demand, row.supply, observed_at)
        });
    }
    Ok(samples)
}

pub fn read_samples_from_path(path: &Path) -> Result<Vec<GridSample>, IngestError> {
    let file = std::fs::File::open(path).map_err(|source| IngestError::Io {
        path: path.display().to_string(),
        source,
    })?;
    read_samples(file)
}

/// Three samples per demo region, two hours apart, starting two days before
/// `now`.
pub fn seed_samples(now: DateTime<Utc>) -> Vec<GridSample> {
    let base = now - Duration::days(2);
    let mut samples = Vec::with_capacity(SEED_REGIONS.len() * SEED_SAMPLES_PER_REGION as usize);
    for (i, (region, demand, supply)) in SEED_REGIONS.iter().enumerate() {
        for j in 0..SEED_SAMPLES_PER_REGION {
            let observed_at = base + Duration::hours(i as i64 * 6 + j * 2);
            let step = j as f64;
            samples.push(GridSample::new(
                *region,
                demand + (step * 10.0 - 10.0),
                supply + (step * 15.0 - 15.0),
                observed_at,
            ));
        }
    }
    samples
}

pub async fn seed(store: &StateStore) -> GridResult<IngestReport> {
    let report = store.record_batch(seed_samples(Utc::now())).await?;
    info!(accepted = report.accepted, rejected = report.rejected, "seed data loaded");
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::access::AccessControl;
    use crate::repo::InMemoryRepo;
    use chrono::TimeZone;
    use rstest::rstest;
    use std::sync::Arc;

    #[rstest]
    #[case("2024-03-01T12:00:00Z")]
    #[case("2024-03-01T14:00:00+02:00")]
    #[case("2024-03-01 12:00:00")]
    #[case(" 2024-03-01T12:00:00 ")]
    fn test_parse_timestamp(#[case] raw: &str) {
        assert_eq!(
            parse_timestamp(raw),
            Some(Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap())
        );
    }

    #[test]
    fn test_parse_timestamp_rejects_garbage() {
        assert_eq!(parse_timestamp("yesterday"), None);
    }

    #[test]
    fn test_read_samples() {
        let csv = "region,demand,supply,timestamp\n\
                   us-west,1000,1100,2024-03-01 12:00:00\n\
                   pgae, 1200.5 ,1250,2024-03-01T13:00:00Z\n";
        let samples = read_samples(csv.as_bytes()).unwrap();
        assert_eq!(samples.len(), 2);
        assert_eq!(samples[1].region, "pgae");
        assert_eq!(samples[1].demand, 1200.5);
        assert_eq!(samples[0].capacity_mw, DEFAULT_CAPACITY_MW);
    }

    #[test]
    fn test_read_samples_optional_columns() {
        let csv = "region,demand,supply,timestamp,current_load,capacity,efficiency\n\
                   us-east,1500,1550,2024-03-01 12:00:00,1400,2000,92.5\n";
        let samples = read_samples(csv.as_bytes()).unwrap();
        assert_eq!(samples[0].current_load, 1400.0);
        assert_eq!(samples[0].capacity_mw, 2000.0);
        assert_eq!(samples[0].efficiency_percent, 92.5);
    }

    #[test]
    fn test_read_samples_errors() {
        let bad_number = "region,demand,supply,timestamp\nus-west,lots,1100,2024-03-01 12:00:00\n";
        assert!(matches!(
            read_samples(bad_number.as_bytes()),
            Err(IngestError::Csv { .. })
        ));

        let bad_time = "region,demand,supply,timestamp\nus-west,1000,1100,noon\n";
        assert!(matches!(
            read_samples(bad_time.as_bytes()),
            Err(IngestError::Timestamp { line: 2, .. })
        ));
    }

    #[test]
    fn test_seed_samples_layout() {
        let now = Utc.with_ymd_and_hms(2024, 3, 3, 0, 0, 0).unwrap();
        let samples = seed_samples(now);
        assert_eq!(samples.len(), 12);
        let west: Vec<_> = samples.iter().filter(|s| s.region == "us-west").collect();
        assert_eq!(
            west.iter().map(|s| (s.demand, s.supply)).collect::<Vec<_>>(),
            vec![(990.0, 1085.0), (1000.0, 1100.0), (1010.0, 1115.0)]
        );
        let pgae_last = samples.last().unwrap();
        assert_eq!(pgae_last.region, "pgae");
        assert_eq!(pgae_last.observed_at, now - Duration::days(2) + Duration::hours(22));
    }

    #[tokio::test]
    async fn test_seed_into_store() {
        let store = StateStore::new(Arc::new(InMemoryRepo::default()), AccessControl::default());
        let report = seed(&store).await.unwrap();
        assert_eq!(report, IngestReport { accepted: 12, rejected: 0 });
        assert_eq!(store.latest(Some("us-central")).await.unwrap().demand, 810.0);
    }
}
