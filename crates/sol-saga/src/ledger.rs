use std::time::Instant;

use crate::result::ErasedResult;

/// Outcome of one activity invocation that returned a result.
#[derive(Debug, Clone)]
pub struct ActivityRecord {
    sequence: usize,
    activity_name: String,
    result: ErasedResult,
    recorded_at: Instant,
}

impl ActivityRecord {
    /// Zero-based position of this record in the ledger.
    #[must_use]
    pub fn sequence(&self) -> usize {
        self.sequence
    }

    #[must_use]
    pub fn activity_name(&self) -> &str {
        &self.activity_name
    }

    #[must_use]
    pub fn result(&self) -> &ErasedResult {
        &self.result
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        self.result.is_success()
    }

    /// When the activity's result was appended.
    #[must_use]
    pub fn recorded_at(&self) -> Instant {
        self.recorded_at
    }
}

/// Append-only list of activity outcomes, in execution order.
///
/// Only the execution engine appends. Activities that returned an error
/// never get a record. Name lookups return the first match, since activity
/// names are not required to be unique.
#[derive(Debug, Default)]
pub struct ResultLedger {
    records: Vec<ActivityRecord>,
}

impl ResultLedger {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn append(&mut self, activity_name: &str, result: ErasedResult) {
        self.records.push(ActivityRecord {
            sequence: self.records.len(),
            activity_name: activity_name.to_string(),
            result,
            recorded_at: Instant::now(),
        });
    }

    #[must_use]
    pub fn records(&self) -> &[ActivityRecord] {
        &self.records
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ActivityRecord> {
        self.records.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// First record for the named activity.
    #[must_use]
    pub fn first_by_name(&self, activity_name: &str) -> Option<&ActivityRecord> {
        self.records
            .iter()
            .find(|record| record.activity_name == activity_name)
    }

    /// First record for the named activity with the given success flag.
    #[must_use]
    pub fn find(&self, activity_name: &str, success: bool) -> Option<&ActivityRecord> {
        self.records
            .iter()
            .find(|record| record.activity_name == activity_name && record.is_success() == success)
    }

    pub fn successes(&self) -> impl Iterator<Item = &ActivityRecord> {
        self.records.iter().filter(|record| record.is_success())
    }

    pub fn failures(&self) -> impl Iterator<Item = &ActivityRecord> {
        self.records.iter().filter(|record| !record.is_success())
    }

    /// One line per record, `✓` for business success and `✗` for failure.
    #[must_use]
    pub fn summary(&self) -> String {
        self.records
            .iter()
            .map(|record| {
                let marker = if record.is_success() { "✓" } else { "✗" };
                format!("{marker} {}", record.activity_name)
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl<'a> IntoIterator for &'a ResultLedger {
    type Item = &'a ActivityRecord;
    type IntoIter = std::slice::Iter<'a, ActivityRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}
