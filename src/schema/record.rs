//! Record types for normalized (long-format) trajectory data.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One of the three tracked entities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum EntityId {
    N0 = 0,
    N1 = 1,
    N2 = 2,
}

impl EntityId {
    /// All entities in id order.
    pub const ALL: [EntityId; 3] = [EntityId::N0, EntityId::N1, EntityId::N2];

    /// Number of tracked entities.
    pub const COUNT: usize = 3;

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "n{}", self.index())
    }
}

/// A single entity position at a single instant.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TidyRecord {
    pub timestamp: DateTime<Utc>,
    pub entity_id: EntityId,
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl TidyRecord {
    #[inline]
    pub fn position(&self) -> [f64; 3] {
        [self.x, self.y, self.z]
    }
}

/// Records sorted ascending by timestamp.
///
/// Sorting is stable, so records sharing a timestamp keep their source
/// row-then-entity order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TidySet {
    records: Vec<TidyRecord>,
}

impl TidySet {
    /// Build a set from records in arbitrary order.
    pub fn from_unsorted(mut records: Vec<TidyRecord>) -> Self {
        records.sort_by_key(|r| r.timestamp);
        Self { records }
    }

    /// Wrap records already known to be sorted by timestamp.
    pub(crate) fn from_sorted(records: Vec<TidyRecord>) -> Self {
        debug_assert!(records.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));
        Self { records }
    }

    pub fn records(&self) -> &[TidyRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, TidyRecord> {
        self.records.iter()
    }

    /// Earliest timestamp present.
    pub fn start(&self) -> Option<DateTime<Utc>> {
        self.records.first().map(|r| r.timestamp)
    }

    /// Latest timestamp present.
    pub fn end(&self) -> Option<DateTime<Utc>> {
        self.records.last().map(|r| r.timestamp)
    }
}

impl<'a> IntoIterator for &'a TidySet {
    type Item = &'a TidyRecord;
    type IntoIter = std::slice::Iter<'a, TidyRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

/// Closed time interval `[start, end]`.
///
/// `start <= end` is not enforced; an inverted window selects nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeWindow {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    #[inline]
    pub fn contains(&self, t: DateTime<Utc>) -> bool {
        self.start <= t && t <= self.end
    }
}

impl fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} to {}", self.start.to_rfc3339(), self.end.to_rfc3339())
    }
}
