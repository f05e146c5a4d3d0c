use super::domain::{Assessment, ReadingValue, Status, VitalSign};
use super::error::EvaluationError;
use super::thresholds::{MetricThreshold, ThresholdRegistry};

/// Grades a reading against a range. Absent values are `Normal`; use
/// [`assess`] to tell them apart from genuinely normal readings.
pub fn classify(value: Option<f64>, threshold: &MetricThreshold) -> Status {
    assess(value, threshold).or_normal()
}

/// Grades a reading, reporting absent or NaN values as `NotEvaluated`.
pub fn assess(value: Option<f64>, threshold: &MetricThreshold) -> Assessment {
    let Some(value) = value.filter(|value| !value.is_nan()) else {
        return Assessment::NotEvaluated;
    };

    if value < threshold.critical_low || value > threshold.critical_high {
        Assessment::Evaluated(Status::Critical)
    } else if value < threshold.low || value > threshold.high {
        Assessment::Evaluated(Status::Warning)
    } else {
        Assessment::Evaluated(Status::Normal)
    }
}

/// [`classify`] for raw charted values, after numeric coercion.
pub fn classify_value(value: Option<&ReadingValue>, threshold: &MetricThreshold) -> Status {
    classify(value.and_then(ReadingValue::as_f64), threshold)
}

impl ThresholdRegistry {
    pub fn classify(&self, metric_key: &str, value: Option<f64>) -> Result<Status, EvaluationError> {
        Ok(classify(value, self.get(metric_key)?))
    }

    pub fn assess(
        &self,
        metric_key: &str,
        value: Option<f64>,
    ) -> Result<Assessment, EvaluationError> {
        Ok(assess(value, self.get(metric_key)?))
    }

    /// Like [`ThresholdRegistry::assess`], but metrics charted without a
    /// clinical range (weight, pain level) yield `None` when the table has no
    /// entry for them instead of failing the lookup.
    pub(crate) fn assess_charted(
        &self,
        metric_key: &str,
        value: Option<f64>,
    ) -> Result<Option<Assessment>, EvaluationError> {
        let optional = VitalSign::from_key(metric_key)
            .map(|sign| !sign.requires_threshold())
            .unwrap_or(false);

        match self.find(metric_key) {
            Some(threshold) => Ok(Some(assess(value, threshold))),
            None if optional => Ok(None),
            None => self.get(metric_key).map(|_| None),
        }
    }
}
