//! Per-frame trajectory state.
//!
//! Trajectories are cumulative: the trajectory of an entity at frame `i` is a
//! prefix of its trajectory at every later frame. [`TrajectoryIndex`] stores
//! each entity's records once, so a frame is a binary search and a slice.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use super::error::PipelineError;
use crate::schema::{EntityId, TidyRecord, TidySet};

/// Draw state of one entity at one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameState<'a> {
    /// Records with timestamp at or before the frame time, oldest first. Never empty.
    pub trajectory: &'a [TidyRecord],
    /// Most recent record, i.e. the last element of `trajectory`.
    pub position: &'a TidyRecord,
}

impl<'a> FrameState<'a> {
    /// Build from a non-empty trajectory.
    pub fn from_trajectory(trajectory: &'a [TidyRecord]) -> Option<Self> {
        trajectory.last().map(|position| Self {
            trajectory,
            position,
        })
    }

    pub fn len(&self) -> usize {
        self.trajectory.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trajectory.is_empty()
    }
}

/// Entities drawn at a frame. Entities with no data yet are absent.
pub type FrameMap<'a> = BTreeMap<EntityId, FrameState<'a>>;

/// Per-entity time-sorted records, built once and shared read-only.
#[derive(Debug, Clone, Default)]
pub struct TrajectoryIndex {
    tracks: [Vec<TidyRecord>; 3],
}

impl TrajectoryIndex {
    pub fn new(set: &TidySet) -> Self {
        let mut tracks: [Vec<TidyRecord>; 3] = Default::default();
        for record in set {
            tracks[record.entity_id.index()].push(*record);
        }
        Self { tracks }
    }

    /// All records of one entity in timestamp order.
    pub fn track(&self, entity: EntityId) -> &[TidyRecord] {
        &self.tracks[entity.index()]
    }

    /// Trajectory of `entity` up to and including `t`.
    pub fn trajectory_at(&self, entity: EntityId, t: DateTime<Utc>) -> &[TidyRecord] {
        let track = self.track(entity);
        let end = track.partition_point(|r| r.timestamp <= t);
        &track[..end]
    }

    /// Draw state of every entity that has data at or before `t`.
    pub fn frame_at(&self, t: DateTime<Utc>) -> FrameMap<'_> {
        EntityId::ALL
            .iter()
            .filter_map(|&entity| {
                FrameState::from_trajectory(self.trajectory_at(entity, t)).map(|s| (entity, s))
            })
            .collect()
    }
}

/// Render frame `frame_index` of `timeline` from an index over the windowed set.
pub fn render_frame<'a>(
    index: &'a TrajectoryIndex,
    timeline: &[DateTime<Utc>],
    frame_index: usize,
) -> Result<FrameMap<'a>, PipelineError> {
    let t = timeline
        .get(frame_index)
        .ok_or(PipelineError::FrameOutOfRange {
            index: frame_index,
            frame_count: timeline.len(),
        })?;
    Ok(index.frame_at(*t))
}
