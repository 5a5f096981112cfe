// driftgate-core/src/domain/baseline.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use std::collections::HashMap;
use std::fmt;

use crate::domain::snapshot::{MetricSnapshot, stat};

/// Historical reference handed to a detector.
#[derive(Debug, Clone, PartialEq)]
pub enum Baseline {
    /// "Last known good" observation.
    Reference(MetricSnapshot),
    /// Time-ascending observations of one metric key (full history, not truncated).
    Window(Vec<MetricSnapshot>),
}

impl fmt::Display for Baseline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Baseline::Reference(snapshot) => write!(f, "{}", snapshot.describe()),
            Baseline::Window(snapshots) => {
                let latest = snapshots
                    .last()
                    .map(|s| s.count.to_string())
                    .unwrap_or_else(|| "-".to_string());
                write!(f, "{} snapshots (latest count={})", snapshots.len(), latest)
            }
        }
    }
}

/// A persisted baseline file format.
///
/// Loading is done by the store; the document only knows how to expose the
/// baseline of one metric key and how to fold a run's snapshots into itself.
pub trait BaselineDocument: Serialize + DeserializeOwned + Send + Sync {
    fn baseline_for(&self, metric_key: &str) -> Option<Baseline>;

    /// Returns the document to write back, or `None` if there is nothing to record.
    fn record(
        existing: Option<Self>,
        snapshots: &[MetricSnapshot],
        recorded_at: DateTime<Utc>,
        retain: Option<usize>,
    ) -> Option<Self>;
}

// --- SINGLE-VALUE BASELINE (drift policy) ---

/// `{"count", "norm_mean", "norm_std", "norm_min", "norm_max"}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormBaseline {
    pub count: u64,
    pub norm_mean: f64,
    pub norm_std: f64,
    // Older files written for an empty collection carry no range
    #[serde(default)]
    pub norm_min: f64,
    #[serde(default)]
    pub norm_max: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recorded_at: Option<DateTime<Utc>>,
}

impl NormBaseline {
    pub fn from_snapshot(snapshot: &MetricSnapshot, recorded_at: DateTime<Utc>) -> Self {
        let get = |name| snapshot.stat(name).unwrap_or(0.0);
        Self {
            count: snapshot.count,
            norm_mean: get(stat::MEAN),
            norm_std: get(stat::STD),
            norm_min: get(stat::MIN),
            norm_max: get(stat::MAX),
            recorded_at: Some(recorded_at),
        }
    }

    pub fn to_snapshot(&self, metric_key: &str) -> MetricSnapshot {
        // Files without a timestamp predate `recorded_at`
        let timestamp = self.recorded_at.unwrap_or(DateTime::<Utc>::UNIX_EPOCH);
        MetricSnapshot::new(metric_key, self.count)
            .at(timestamp)
            .with_stat(stat::MEAN, self.norm_mean)
            .with_stat(stat::STD, self.norm_std)
            .with_stat(stat::MIN, self.norm_min)
            .with_stat(stat::MAX, self.norm_max)
    }
}

impl BaselineDocument for NormBaseline {
    // The file holds a single collection; the key only labels the snapshot.
    fn baseline_for(&self, metric_key: &str) -> Option<Baseline> {
        Some(Baseline::Reference(self.to_snapshot(metric_key)))
    }

    fn record(
        existing: Option<Self>,
        snapshots: &[MetricSnapshot],
        recorded_at: DateTime<Utc>,
        _retain: Option<usize>,
    ) -> Option<Self> {
        match snapshots.last() {
            Some(snapshot) => Some(Self::from_snapshot(snapshot, recorded_at)),
            None => existing,
        }
    }
}

// --- WINDOWED BASELINE (z-score policy) ---

/// `{"snapshots": [{"timestamp", "mart", "count"}, ...]}`, append-only.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SnapshotHistory {
    #[serde(default)]
    pub snapshots: Vec<HistoryEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    #[serde(with = "iso8601")]
    pub timestamp: DateTime<Utc>,
    pub mart: String,
    pub count: u64,
}

impl SnapshotHistory {
    /// Keeps only the most recent `retain` entries of each mart, preserving file order.
    /// "Most recent" follows the window order: by timestamp, then by position.
    pub fn prune(&mut self, retain: usize) {
        let mut by_time: Vec<usize> = (0..self.snapshots.len()).collect();
        by_time.sort_by_key(|&i| self.snapshots[i].timestamp);

        let mut kept_per_mart: HashMap<&str, usize> = HashMap::new();
        let mut keep = vec![false; self.snapshots.len()];
        for &i in by_time.iter().rev() {
            let kept = kept_per_mart.entry(self.snapshots[i].mart.as_str()).or_insert(0);
            if *kept < retain {
                *kept += 1;
                keep[i] = true;
            }
        }
        let mut flags = keep.into_iter();
        self.snapshots.retain(|_| flags.next().unwrap_or(false));
    }
}

impl BaselineDocument for SnapshotHistory {
    fn baseline_for(&self, metric_key: &str) -> Option<Baseline> {
        let mut entries: Vec<&HistoryEntry> = self
            .snapshots
            .iter()
            .filter(|entry| entry.mart == metric_key)
            .collect();
        if entries.is_empty() {
            return None;
        }
        // Stable: entries sharing a timestamp keep their append order
        entries.sort_by_key(|entry| entry.timestamp);

        let window = entries
            .into_iter()
            .map(|entry| MetricSnapshot::row_count(&entry.mart, entry.count).at(entry.timestamp))
            .collect();
        Some(Baseline::Window(window))
    }

    fn record(
        existing: Option<Self>,
        snapshots: &[MetricSnapshot],
        recorded_at: DateTime<Utc>,
        retain: Option<usize>,
    ) -> Option<Self> {
        let mut history = existing.unwrap_or_default();
        history
            .snapshots
            .extend(snapshots.iter().map(|snapshot| HistoryEntry {
                timestamp: recorded_at,
                mart: snapshot.metric_key.clone(),
                count: snapshot.count,
            }));
        if let Some(retain) = retain {
            history.prune(retain);
        }
        Some(history)
    }
}

/// RFC 3339 on write; RFC 3339 or naive ISO 8601 (read as UTC) on read.
mod iso8601 {
    use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
    use serde::{Deserialize, Deserializer, Serializer, de::Error};

    pub fn serialize<S: Serializer>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_rfc3339_opts(SecondsFormat::Micros, true))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).ok_or_else(|| D::Error::custom(format!("invalid ISO 8601 timestamp '{}'", raw)))
    }

    pub(super) fn parse(raw: &str) -> Option<DateTime<Utc>> {
        if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
            return Some(dt.with_timezone(&Utc));
        }
        NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
            .ok()
            .map(|naive| naive.and_utc())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use anyhow::Result;
    use chrono::TimeZone;

    fn ts(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, day, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_norm_baseline_legacy_file_without_range() -> Result<()> {
        let doc: NormBaseline =
            serde_json::from_str(r#"{"count": 0, "norm_mean": 0.0, "norm_std": 0.0}"#)?;
        assert_eq!(doc.norm_min, 0.0);
        assert_eq!(doc.recorded_at, None);
        Ok(())
    }

    #[test]
    fn test_norm_baseline_is_replaced() {
        let old = NormBaseline::from_snapshot(
            &MetricSnapshot::from_vectors("documents", &[vec![1.0]]),
            ts(1),
        );
        let current = MetricSnapshot::from_vectors("documents", &[vec![3.0, 4.0]]);
        let new = NormBaseline::record(Some(old), &[current], ts(2), None).unwrap();
        assert_eq!(new.count, 1);
        assert_eq!(new.norm_mean, 5.0);
        assert_eq!(new.recorded_at, Some(ts(2)));
    }

    #[test]
    fn test_history_accepts_naive_and_rfc3339_timestamps() -> Result<()> {
        let doc: SnapshotHistory = serde_json::from_str(
            r#"{"snapshots": [
                {"timestamp": "2024-05-01T12:00:00.123456", "mart": "orders", "count": 10},
                {"timestamp": "2024-05-02T12:00:00Z", "mart": "orders", "count": 11}
            ]}"#,
        )?;
        assert_eq!(doc.snapshots.len(), 2);
        assert_eq!(doc.snapshots[1].timestamp, ts(2));
        Ok(())
    }

    #[test]
    fn test_history_rejects_garbage_timestamp() {
        let res: Result<SnapshotHistory, _> = serde_json::from_str(
            r#"{"snapshots": [{"timestamp": "yesterday", "mart": "orders", "count": 10}]}"#,
        );
        assert!(res.is_err());
    }

    #[test]
    fn test_history_window_is_per_mart_and_time_ordered() {
        let history = SnapshotHistory {
            snapshots: vec![
                HistoryEntry { timestamp: ts(3), mart: "orders".into(), count: 30 },
                HistoryEntry { timestamp: ts(1), mart: "orders".into(), count: 10 },
                HistoryEntry { timestamp: ts(2), mart: "users".into(), count: 99 },
            ],
        };

        match history.baseline_for("orders") {
            Some(Baseline::Window(window)) => {
                let counts: Vec<u64> = window.iter().map(|s| s.count).collect();
                assert_eq!(counts, vec![10, 30]);
            }
            other => panic!("expected a window, got {:?}", other),
        }
        assert!(history.baseline_for("payments").is_none());
    }

    #[test]
    fn test_history_record_appends_with_one_run_timestamp() {
        let existing = SnapshotHistory {
            snapshots: vec![HistoryEntry { timestamp: ts(1), mart: "orders".into(), count: 10 }],
        };
        let run = [
            MetricSnapshot::row_count("orders", 12),
            MetricSnapshot::row_count("users", 5),
        ];
        let updated = SnapshotHistory::record(Some(existing), &run, ts(2), None).unwrap();
        assert_eq!(updated.snapshots.len(), 3);
        assert!(updated.snapshots[1..].iter().all(|e| e.timestamp == ts(2)));
    }

    #[test]
    fn test_prune_keeps_most_recent_per_mart() {
        let mut history = SnapshotHistory::default();
        for day in 1..=5 {
            history.snapshots.push(HistoryEntry { timestamp: ts(day), mart: "orders".into(), count: day as u64 });
            history.snapshots.push(HistoryEntry { timestamp: ts(day), mart: "users".into(), count: 100 + day as u64 });
        }
        history.prune(2);

        assert_eq!(history.snapshots.len(), 4);
        let orders: Vec<u64> = history
            .snapshots
            .iter()
            .filter(|e| e.mart == "orders")
            .map(|e| e.count)
            .collect();
        assert_eq!(orders, vec![4, 5]);
    }

    #[test]
    fn test_prune_follows_timestamps_not_file_order() {
        // Legacy files may hold entries out of chronological order
        let entry = |day, count| HistoryEntry { timestamp: ts(day), mart: "orders".into(), count };
        let mut history = SnapshotHistory {
            snapshots: vec![entry(3, 30), entry(1, 10), entry(4, 40), entry(2, 20)],
        };
        history.prune(2);

        let counts: Vec<u64> = history.snapshots.iter().map(|e| e.count).collect();
        assert_eq!(counts, vec![30, 40]);
    }

    #[test]
    fn test_timestamps_are_written_as_rfc3339() -> Result<()> {
        let entry = HistoryEntry { timestamp: ts(1), mart: "orders".into(), count: 1 };
        let json = serde_json::to_string(&entry)?;
        assert!(json.contains("2024-05-01T12:00:00.000000Z"));
        assert_eq!(iso8601::parse("2024-05-01T12:00:00.000000Z"), Some(ts(1)));
        Ok(())
    }
}
