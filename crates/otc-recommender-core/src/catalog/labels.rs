//! Target label frequencies and rare-label collapsing.

use serde::{Deserialize, Serialize};

/// Sentinel for labels seen fewer than the minimum number of times.
pub const OTHER_LABEL: &str = "Other";

/// Default minimum count for a label to be reported as itself.
pub const DEFAULT_MIN_LABEL_COUNT: usize = 5;

/// Frequency counts of the target label column with a collapse threshold.
///
/// This is catalog-level reporting only; the classifier's own class labels
/// remain authoritative for predictions.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LabelSummary {
    /// (label, count) in first-seen order
    counts: Vec<(String, usize)>,
    min_count: usize,
}

impl LabelSummary {
    /// Count labels; blank labels are ignored.
    pub fn from_labels<'a, I>(labels: I, min_count: usize) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut counts: Vec<(String, usize)> = Vec::new();
        for label in labels {
            let label = label.trim();
            if label.is_empty() {
                continue;
            }
            match counts.iter_mut().find(|(l, _)| l == label) {
                Some((_, n)) => *n += 1,
                None => counts.push((label.to_string(), 1)),
            }
        }
        Self { counts, min_count }
    }

    /// Same counts with a different threshold.
    pub fn with_min_count(&self, min_count: usize) -> Self {
        Self {
            counts: self.counts.clone(),
            min_count,
        }
    }

    pub fn min_count(&self) -> usize {
        self.min_count
    }

    /// Raw (label, count) pairs in first-seen order.
    pub fn counts(&self) -> &[(String, usize)] {
        &self.counts
    }

    /// Occurrences of a raw label (0 if never seen).
    pub fn count(&self, label: &str) -> usize {
        self.counts
            .iter()
            .find(|(l, _)| l == label)
            .map(|(_, n)| *n)
            .unwrap_or(0)
    }

    /// Whether a raw label is reported as [`OTHER_LABEL`].
    ///
    /// Only labels present in the dataset can be rare. A label that never
    /// occurs (a classifier class missing from the history) is kept.
    pub fn is_collapsed(&self, label: &str) -> bool {
        let count = self.count(label);
        count > 0 && count < self.min_count
    }

    /// Reported label for a raw label. Unseen labels are returned unchanged.
    pub fn collapsed_label<'s>(&self, label: &'s str) -> &'s str {
        if self.is_collapsed(label) {
            OTHER_LABEL
        } else {
            label
        }
    }

    /// Raw labels that collapse into [`OTHER_LABEL`].
    pub fn collapsed(&self) -> Vec<&str> {
        self.counts
            .iter()
            .filter(|(_, n)| *n < self.min_count)
            .map(|(l, _)| l.as_str())
            .collect()
    }

    /// Distinct reported target classes in first-seen order.
    pub fn classes(&self) -> Vec<String> {
        let mut classes: Vec<String> = Vec::new();
        for (label, _) in &self.counts {
            let reported = self.collapsed_label(label);
            if !classes.iter().any(|c| c == reported) {
                classes.push(reported.to_string());
            }
        }
        classes
    }
}
