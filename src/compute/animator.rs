//! Windowed animation driver.

use chrono::{DateTime, Utc};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use super::bounds::BoundingBox;
use super::error::PipelineError;
use super::frame::{FrameMap, TrajectoryIndex, render_frame};
use super::window::{build_timeline, frame_delay_ms, select_window};
use crate::schema::{TidySet, TimeWindow};

/// Presentation parameters chosen by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaybackSettings {
    /// Frames per second. Zero is treated as one.
    pub fps: u32,
    /// Render resolution passed through to the sink.
    pub dpi: u32,
}

impl Default for PlaybackSettings {
    fn default() -> Self {
        Self { fps: 10, dpi: 150 }
    }
}

/// Everything a sink needs to set up before the first frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnimationPlan {
    pub window: TimeWindow,
    pub frame_count: usize,
    pub bounds: BoundingBox,
    pub fps: u32,
    pub delay_ms: u32,
    pub dpi: u32,
    pub title: String,
}

/// Consumer of a frame sequence, e.g. a renderer or a file encoder.
pub trait FrameSink {
    type Error;

    /// Called once before any frame.
    fn begin(&mut self, _plan: &AnimationPlan) -> Result<(), Self::Error> {
        Ok(())
    }

    /// Called for every frame in timeline order.
    fn draw_frame(
        &mut self,
        index: usize,
        timestamp: DateTime<Utc>,
        frame: &FrameMap<'_>,
    ) -> Result<(), Self::Error>;

    /// Called once after the last frame.
    fn finish(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

/// Frame-by-frame view of the records inside one time window.
///
/// Usage:
/// ```ignore
/// let animator = WindowedAnimator::new(&tidy, window)?;
/// println!("{} frames", animator.frame_count());
/// for (t, frame) in animator.frames() {
///     for (entity, state) in &frame {
///         // draw state.trajectory as a line and state.position as a marker
///     }
/// }
/// ```
#[derive(Debug, Clone)]
pub struct WindowedAnimator {
    window: TimeWindow,
    records: TidySet,
    timeline: Vec<DateTime<Utc>>,
    index: TrajectoryIndex,
    bounds: BoundingBox,
}

impl WindowedAnimator {
    /// Select `window` from `set` and index it for frame rendering.
    ///
    /// Fails with [`PipelineError::EmptyWindow`] when nothing falls inside.
    pub fn new(set: &TidySet, window: TimeWindow) -> Result<Self, PipelineError> {
        let records = select_window(set, &window);
        let bounds = BoundingBox::from_records(&records).ok_or(PipelineError::EmptyWindow {
            start: window.start,
            end: window.end,
        })?;
        let timeline = build_timeline(&records);
        let index = TrajectoryIndex::new(&records);

        log::debug!(
            "Window {}: {} of {} records, {} frames",
            window,
            records.len(),
            set.len(),
            timeline.len()
        );

        Ok(Self {
            window,
            records,
            timeline,
            index,
            bounds,
        })
    }

    pub fn window(&self) -> &TimeWindow {
        &self.window
    }

    /// The windowed records.
    pub fn records(&self) -> &TidySet {
        &self.records
    }

    /// Distinct timestamps, one per frame.
    pub fn timeline(&self) -> &[DateTime<Utc>] {
        &self.timeline
    }

    pub fn frame_count(&self) -> usize {
        self.timeline.len()
    }

    /// Fixed axis ranges for the whole animation.
    pub fn bounds(&self) -> &BoundingBox {
        &self.bounds
    }

    pub fn index(&self) -> &TrajectoryIndex {
        &self.index
    }

    /// Draw state of every entity at frame `frame_index`.
    pub fn render_frame(&self, frame_index: usize) -> Result<FrameMap<'_>, PipelineError> {
        render_frame(&self.index, &self.timeline, frame_index)
    }

    /// Iterate frames in timeline order.
    pub fn frames(&self) -> Frames<'_> {
        Frames {
            animator: self,
            current: 0,
        }
    }

    /// Render every frame on the rayon pool. Same result as collecting [`Self::frames`].
    pub fn render_all(&self) -> Vec<FrameMap<'_>> {
        self.timeline
            .par_iter()
            .map(|&t| self.index.frame_at(t))
            .collect()
    }

    /// Presentation plan for a sink.
    pub fn plan(&self, settings: &PlaybackSettings) -> AnimationPlan {
        AnimationPlan {
            window: self.window,
            frame_count: self.frame_count(),
            bounds: self.bounds,
            fps: settings.fps,
            delay_ms: frame_delay_ms(settings.fps),
            dpi: settings.dpi,
            title: format!("3D animation: {}", self.window),
        }
    }

    /// Hand the plan and then every frame, in order, to `sink`.
    pub fn play<S: FrameSink>(
        &self,
        sink: &mut S,
        settings: &PlaybackSettings,
    ) -> Result<(), S::Error> {
        sink.begin(&self.plan(settings))?;
        for (i, &t) in self.timeline.iter().enumerate() {
            sink.draw_frame(i, t, &self.index.frame_at(t))?;
        }
        sink.finish()
    }
}

/// Iterator over `(timestamp, frame)` pairs.
pub struct Frames<'a> {
    animator: &'a WindowedAnimator,
    current: usize,
}

impl<'a> Iterator for Frames<'a> {
    type Item = (DateTime<Utc>, FrameMap<'a>);

    fn next(&mut self) -> Option<Self::Item> {
        let t = *self.animator.timeline.get(self.current)?;
        self.current += 1;
        Some((t, self.animator.index.frame_at(t)))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.animator.frame_count() - self.current;
        (remaining, Some(remaining))
    }
}

impl<'a> ExactSizeIterator for Frames<'a> {}
