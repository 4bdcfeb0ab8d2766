//! Run statistics, owned by the pipeline for the length of one run.

use serde::Serialize;
use std::collections::hash_map::DefaultHasher;
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::hash::{Hash, Hasher};

use crate::hagaki::{DefectKind, FieldDefects, FieldKind, NormalizedRecord};

/// Row positions kept per missing field for the report.
pub const MISSING_SAMPLE_LIMIT: usize = 10;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FieldMissing {
    pub count: usize,
    /// First few row positions where the field was missing.
    pub sample_rows: Vec<usize>,
}

/// Emitted once per field after the scan.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldWarning {
    pub field: FieldKind,
    pub count: usize,
    pub percentage: f64,
}

impl fmt::Display for FieldWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Field '{}': {} missing values ({:.1}%)",
            self.field, self.count, self.percentage
        )
    }
}

#[derive(Debug, Clone, Default)]
pub struct RunStatistics {
    pub succeeded: usize,
    pub failed: usize,
    pub normalized_postal_codes: usize,
    pub malformed_postal_codes: usize,
    pub foreign_addresses: usize,
    /// Repeat occurrences of an address already seen in this run.
    pub duplicate_addresses: usize,
    missing: BTreeMap<FieldKind, FieldMissing>,
    seen_addresses: HashSet<u64>,
}

impl RunStatistics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records that reached a final outcome.
    pub fn total(&self) -> usize {
        self.succeeded + self.failed
    }

    pub fn record_success(&mut self) {
        self.succeeded += 1;
    }

    pub fn record_failure(&mut self) {
        self.failed += 1;
    }

    /// Fold one validated record's findings into the counters.
    pub fn record_defects(&mut self, record: &NormalizedRecord, defects: &FieldDefects) {
        for field in &record.defects {
            let entry = self.missing.entry(*field).or_default();
            entry.count += 1;
            if entry.sample_rows.len() < MISSING_SAMPLE_LIMIT {
                entry.sample_rows.push(record.position);
            }
        }

        if defects.has(FieldKind::PostalCode, DefectKind::Normalized) {
            self.normalized_postal_codes += 1;
        }
        if defects.has(FieldKind::PostalCode, DefectKind::Malformed) {
            self.malformed_postal_codes += 1;
        }
        if defects.has(FieldKind::Address, DefectKind::ForeignAddress) {
            self.foreign_addresses += 1;
        }

        if !record.is_substituted(FieldKind::Address) {
            let mut hasher = DefaultHasher::new();
            record.display_address().hash(&mut hasher);
            if !self.seen_addresses.insert(hasher.finish()) {
                self.duplicate_addresses += 1;
            }
        }
    }

    pub fn missing(&self, field: FieldKind) -> Option<&FieldMissing> {
        self.missing.get(&field)
    }

    pub fn missing_count(&self, field: FieldKind) -> usize {
        self.missing.get(&field).map_or(0, |m| m.count)
    }

    /// Percentage of processed records missing `field`.
    pub fn missing_rate(&self, field: FieldKind) -> f64 {
        percentage(self.missing_count(field), self.total())
    }

    pub fn success_rate(&self) -> f64 {
        percentage(self.succeeded, self.total())
    }

    /// One warning for each field whose missing count exceeds `threshold`.
    pub fn field_warnings(&self, threshold: usize) -> Vec<FieldWarning> {
        FieldKind::ALL
            .iter()
            .filter(|field| self.missing_count(**field) > threshold)
            .map(|field| FieldWarning {
                field: *field,
                count: self.missing_count(*field),
                percentage: self.missing_rate(*field),
            })
            .collect()
    }
}

fn percentage(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64 * 100.0
    }
}
