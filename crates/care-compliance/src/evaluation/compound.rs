use super::domain::{Assessment, Status};

/// Worst status present; `Normal` for an empty set.
///
/// A max-reduction, so grouping and input order never change the result.
pub fn combine<I>(statuses: I) -> Status
where
    I: IntoIterator<Item = Status>,
{
    statuses.into_iter().max().unwrap_or(Status::Normal)
}

/// Worst evaluated status, ignoring readings that were never taken. Only a set
/// with no evaluated member stays `NotEvaluated`.
pub fn combine_assessments<I>(assessments: I) -> Assessment
where
    I: IntoIterator<Item = Assessment>,
{
    assessments
        .into_iter()
        .max()
        .unwrap_or(Assessment::NotEvaluated)
}

impl Status {
    pub fn worst(self, other: Status) -> Status {
        self.max(other)
    }
}

impl FromIterator<Status> for Status {
    fn from_iter<I: IntoIterator<Item = Status>>(iter: I) -> Self {
        combine(iter)
    }
}
