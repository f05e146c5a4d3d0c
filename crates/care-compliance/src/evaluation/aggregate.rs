use super::compound::combine;
use super::domain::{Assessment, Reading, ReportingPeriod, Status, VitalSign};
use super::error::EvaluationError;
use super::thresholds::ThresholdRegistry;
use serde::Serialize;
use std::collections::BTreeMap;

/// Rounds half away from zero to `decimals` places.
pub fn round_to(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    (value * factor).round() / factor
}

/// Per-metric count of graded readings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricTally {
    pub normal: usize,
    pub warning: usize,
    pub critical: usize,
    pub not_evaluated: usize,
}

impl MetricTally {
    pub fn record(&mut self, assessment: Assessment) {
        match assessment {
            Assessment::Evaluated(Status::Normal) => self.normal += 1,
            Assessment::Evaluated(Status::Warning) => self.warning += 1,
            Assessment::Evaluated(Status::Critical) => self.critical += 1,
            Assessment::NotEvaluated => self.not_evaluated += 1,
        }
    }

    pub fn count(&self, status: Status) -> usize {
        match status {
            Status::Normal => self.normal,
            Status::Warning => self.warning,
            Status::Critical => self.critical,
        }
    }

    /// Worst status seen for this metric; `Normal` when nothing was graded.
    pub fn worst(&self) -> Status {
        combine(
            Status::ordered()
                .into_iter()
                .filter(|status| self.count(*status) > 0),
        )
    }

    fn merge(&mut self, other: &MetricTally) {
        self.normal += other.normal;
        self.warning += other.warning;
        self.critical += other.critical;
        self.not_evaluated += other.not_evaluated;
    }
}

/// Running totals over a multiset of readings.
///
/// Values are kept per metric and summed in sorted order, so two aggregates
/// built from the same readings in different orders, or merged in different
/// groupings, report bit-identical averages.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReadingAggregate {
    values: BTreeMap<String, Vec<f64>>,
    tallies: BTreeMap<String, MetricTally>,
    reading_count: usize,
}

impl ReadingAggregate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds one reading. Fails only when the metric is graded but has no
    /// registered threshold.
    pub fn record(
        &mut self,
        reading: &Reading,
        registry: &ThresholdRegistry,
    ) -> Result<(), EvaluationError> {
        let value = reading.numeric_value();
        let assessment = registry.assess_charted(&reading.metric_key, value)?;

        let values = self.values.entry(reading.metric_key.clone()).or_default();
        if let Some(value) = value.filter(|value| value.is_finite()) {
            values.push(value);
        }

        if let Some(assessment) = assessment {
            self.tallies
                .entry(reading.metric_key.clone())
                .or_default()
                .record(assessment);
        }

        self.reading_count += 1;
        Ok(())
    }

    pub fn merge(mut self, other: ReadingAggregate) -> Self {
        for (key, values) in other.values {
            self.values.entry(key).or_default().extend(values);
        }
        for (key, tally) in other.tallies {
            self.tallies.entry(key).or_default().merge(&tally);
        }
        self.reading_count += other.reading_count;
        self
    }

    pub fn reading_count(&self) -> usize {
        self.reading_count
    }

    /// Mean of the numeric values for one metric; `None` when there are none.
    pub fn average(&self, metric_key: &str) -> Option<f64> {
        let values = self.values.get(metric_key)?;
        if values.is_empty() {
            return None;
        }

        let mut sorted = values.clone();
        sorted.sort_by(f64::total_cmp);
        let sum: f64 = sorted.iter().sum();
        Some(sum / sorted.len() as f64)
    }

    /// Averages for every vital sign plus any other metric seen, `None` where
    /// no value was charted.
    pub fn averages(&self) -> BTreeMap<String, Option<f64>> {
        let mut averages: BTreeMap<String, Option<f64>> = VitalSign::ordered()
            .into_iter()
            .map(|sign| (sign.key().to_string(), None))
            .collect();
        for key in self.values.keys() {
            averages.insert(key.clone(), self.average(key));
        }
        averages
    }

    /// Averages rounded for display: one decimal for temperature, whole numbers
    /// for the other vitals, one decimal for custom metrics.
    pub fn rounded_averages(&self) -> BTreeMap<String, Option<f64>> {
        self.averages()
            .into_iter()
            .map(|(key, average)| {
                let decimals = VitalSign::from_key(&key).map_or(1, VitalSign::display_precision);
                (key, average.map(|value| round_to(value, decimals)))
            })
            .collect()
    }

    pub fn tallies(&self) -> &BTreeMap<String, MetricTally> {
        &self.tallies
    }

    pub fn tally(&self, metric_key: &str) -> MetricTally {
        self.tallies.get(metric_key).copied().unwrap_or_default()
    }

    /// Graded readings per status across all metrics. Every status is present,
    /// zero-filled.
    pub fn status_counts(&self) -> BTreeMap<Status, usize> {
        Status::ordered()
            .into_iter()
            .map(|status| {
                let count = self.tallies.values().map(|tally| tally.count(status)).sum();
                (status, count)
            })
            .collect()
    }

    pub fn warning_count(&self) -> usize {
        self.tallies.values().map(|tally| tally.warning).sum()
    }

    pub fn critical_count(&self) -> usize {
        self.tallies.values().map(|tally| tally.critical).sum()
    }

    /// Single indicator for the whole collection.
    pub fn worst(&self) -> Status {
        combine(self.tallies.values().map(MetricTally::worst))
    }
}

/// Aggregates readings, keeping only those observed inside `period` when one
/// is given.
pub fn aggregate_readings<'a, I>(
    readings: I,
    registry: &ThresholdRegistry,
    period: Option<&ReportingPeriod>,
) -> Result<ReadingAggregate, EvaluationError>
where
    I: IntoIterator<Item = &'a Reading>,
{
    let mut aggregate = ReadingAggregate::new();
    for reading in readings {
        if period.map_or(true, |period| period.contains_timestamp(reading.observed_at)) {
            aggregate.record(reading, registry)?;
        }
    }
    Ok(aggregate)
}
