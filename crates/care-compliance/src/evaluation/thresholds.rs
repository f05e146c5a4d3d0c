use super::error::{EvaluationError, ThresholdError};
use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::io::Read;
use std::path::Path;
use tracing::{info, warn};

/// Normal and critical bounds for one metric.
///
/// Values strictly outside `critical_low..=critical_high` are critical; values
/// strictly outside `low..=high` (but inside the critical band) are warnings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricThreshold {
    pub metric_key: String,
    pub low: f64,
    pub high: f64,
    pub critical_low: f64,
    pub critical_high: f64,
}

impl MetricThreshold {
    pub fn new(
        metric_key: impl Into<String>,
        low: f64,
        high: f64,
        critical_low: f64,
        critical_high: f64,
    ) -> Result<Self, ThresholdError> {
        let threshold = Self {
            metric_key: metric_key.into(),
            low,
            high,
            critical_low,
            critical_high,
        };
        threshold.validate()?;
        Ok(threshold)
    }

    pub fn validate(&self) -> Result<(), ThresholdError> {
        if self.metric_key.trim().is_empty() {
            return Err(ThresholdError::BlankMetric);
        }

        let bounds = [self.critical_low, self.low, self.high, self.critical_high];
        if bounds.iter().any(|bound| !bound.is_finite()) {
            return Err(self.invalid("bounds must be finite numbers"));
        }
        if self.critical_low > self.low {
            return Err(self.invalid(format!(
                "critical_low {} above low {}",
                self.critical_low, self.low
            )));
        }
        if self.low > self.high {
            return Err(self.invalid(format!("low {} above high {}", self.low, self.high)));
        }
        if self.high > self.critical_high {
            return Err(self.invalid(format!(
                "high {} above critical_high {}",
                self.high, self.critical_high
            )));
        }

        Ok(())
    }

    fn invalid(&self, detail: impl Into<String>) -> ThresholdError {
        ThresholdError::InvalidRange {
            metric: self.metric_key.clone(),
            detail: detail.into(),
        }
    }
}

/// Bounds as they appear in a JSON table keyed by metric name.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ThresholdBounds {
    low: f64,
    high: f64,
    critical_low: f64,
    critical_high: f64,
}

/// Entries of a JSON table in document order. Repeated keys are kept so the
/// registry can reject them instead of letting the last one win.
struct JsonTable(Vec<(String, ThresholdBounds)>);

impl<'de> Deserialize<'de> for JsonTable {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct TableVisitor;

        impl<'de> Visitor<'de> for TableVisitor {
            type Value = JsonTable;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("an object keyed by metric name")
            }

            fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut entries = Vec::with_capacity(map.size_hint().unwrap_or(0));
                while let Some(entry) = map.next_entry::<String, ThresholdBounds>()? {
                    entries.push(entry);
                }
                Ok(JsonTable(entries))
            }
        }

        deserializer.deserialize_map(TableVisitor)
    }
}

#[derive(Debug, Deserialize)]
struct ThresholdRow {
    metric: String,
    low: f64,
    high: f64,
    critical_low: f64,
    critical_high: f64,
}

/// Lookup table of metric ranges, injected into every evaluation.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ThresholdRegistry {
    thresholds: BTreeMap<String, MetricThreshold>,
}

impl ThresholdRegistry {
    /// Ranges used for elderly residents when a deployment supplies none.
    pub fn standard() -> Self {
        let table = [
            ("bloodPressureSystolic", 90.0, 140.0, 80.0, 180.0),
            ("bloodPressureDiastolic", 60.0, 90.0, 50.0, 120.0),
            ("heartRate", 60.0, 100.0, 50.0, 120.0),
            ("temperature", 97.0, 99.5, 95.0, 103.0),
            ("respiratoryRate", 12.0, 20.0, 8.0, 30.0),
            ("oxygenSaturation", 95.0, 100.0, 90.0, 100.0),
            ("bloodSugar", 70.0, 140.0, 50.0, 300.0),
        ];

        let thresholds = table
            .into_iter()
            .map(|(key, low, high, critical_low, critical_high)| {
                (
                    key.to_string(),
                    MetricThreshold {
                        metric_key: key.to_string(),
                        low,
                        high,
                        critical_low,
                        critical_high,
                    },
                )
            })
            .collect();

        Self { thresholds }
    }

    pub fn from_thresholds<I>(thresholds: I) -> Result<Self, ThresholdError>
    where
        I: IntoIterator<Item = MetricThreshold>,
    {
        let mut registry = Self::default();
        for threshold in thresholds {
            threshold.validate()?;
            if registry.thresholds.contains_key(&threshold.metric_key) {
                return Err(ThresholdError::DuplicateMetric {
                    metric: threshold.metric_key,
                });
            }
            registry
                .thresholds
                .insert(threshold.metric_key.clone(), threshold);
        }
        Ok(registry)
    }

    /// Reads a table with the header `metric,low,high,critical_low,critical_high`.
    pub fn from_csv_reader<R: Read>(reader: R) -> Result<Self, ThresholdError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .comment(Some(b'#'))
            .from_reader(reader);

        let mut thresholds = Vec::new();
        for row in csv_reader.deserialize::<ThresholdRow>() {
            let row = row?;
            thresholds.push(MetricThreshold {
                metric_key: row.metric,
                low: row.low,
                high: row.high,
                critical_low: row.critical_low,
                critical_high: row.critical_high,
            });
        }

        Self::from_thresholds(thresholds)
    }

    /// Reads a JSON object keyed by metric name, e.g.
    /// `{"heartRate": {"low": 60, "high": 100, "criticalLow": 50, "criticalHigh": 120}}`.
    pub fn from_json_reader<R: Read>(reader: R) -> Result<Self, ThresholdError> {
        let JsonTable(entries) = serde_json::from_reader(reader)?;
        Self::from_thresholds(entries.into_iter().map(|(metric_key, bounds)| {
            MetricThreshold {
                metric_key,
                low: bounds.low,
                high: bounds.high,
                critical_low: bounds.critical_low,
                critical_high: bounds.critical_high,
            }
        }))
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, ThresholdError> {
        let path = path.as_ref();
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();

        let load: fn(std::fs::File) -> Result<Self, ThresholdError> = match extension.as_str() {
            "csv" => Self::from_csv_reader,
            "json" => Self::from_json_reader,
            other => return Err(ThresholdError::UnsupportedFormat(other.to_string())),
        };
        let registry = load(std::fs::File::open(path)?)?;

        info!(
            path = %path.display(),
            metrics = registry.len(),
            "loaded threshold table"
        );
        Ok(registry)
    }

    /// Replaces (or adds) the range for one metric.
    pub fn with_override(mut self, threshold: MetricThreshold) -> Result<Self, ThresholdError> {
        threshold.validate()?;
        self.thresholds
            .insert(threshold.metric_key.clone(), threshold);
        Ok(self)
    }

    pub fn get(&self, metric_key: &str) -> Result<&MetricThreshold, EvaluationError> {
        self.thresholds.get(metric_key).ok_or_else(|| {
            warn!(metric = metric_key, "threshold lookup failed");
            EvaluationError::UnknownMetric {
                metric: metric_key.to_string(),
            }
        })
    }

    pub fn find(&self, metric_key: &str) -> Option<&MetricThreshold> {
        self.thresholds.get(metric_key)
    }

    pub fn contains(&self, metric_key: &str) -> bool {
        self.thresholds.contains_key(metric_key)
    }

    pub fn metrics(&self) -> impl Iterator<Item = &str> + '_ {
        self.thresholds.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &MetricThreshold> + '_ {
        self.thresholds.values()
    }

    pub fn len(&self) -> usize {
        self.thresholds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.thresholds.is_empty()
    }

    /// JSON form accepted by [`ThresholdRegistry::from_json_reader`].
    pub fn to_json_value(&self) -> serde_json::Value {
        let table: BTreeMap<&str, ThresholdBounds> = self
            .thresholds
            .iter()
            .map(|(key, threshold)| {
                (
                    key.as_str(),
                    ThresholdBounds {
                        low: threshold.low,
                        high: threshold.high,
                        critical_low: threshold.critical_low,
                        critical_high: threshold.critical_high,
                    },
                )
            })
            .collect();
        serde_json::to_value(table).unwrap_or(serde_json::Value::Null)
    }
}
