//! Animation recorder for capturing frame sequences.

use std::fs::File;
use std::io::{self, BufWriter, Seek, SeekFrom, Write};
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::format::{
    AnimationFlags, AnimationHeader, CompressionType, FrameIndex, compress_lz4, encode_frame,
};
use crate::compute::{AnimationPlan, FrameMap, FrameSink};
use crate::schema::{EntityId, TidyRecord};

fn default_frame_skip() -> u32 {
    1
}

/// Configuration for animation recording.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecorderConfig {
    /// Compression type to use.
    #[serde(default)]
    pub compression: CompressionType,
    /// Store only points appended since the previous recorded frame.
    #[serde(default)]
    pub delta_encoding: bool,
    /// Record every Nth frame (1 = every frame).
    #[serde(default = "default_frame_skip")]
    pub frame_skip: u32,
    /// Maximum frames to record (0 = unlimited).
    #[serde(default)]
    pub max_frames: u64,
}

impl Default for RecorderConfig {
    fn default() -> Self {
        Self {
            compression: CompressionType::None,
            delta_encoding: false,
            frame_skip: 1,
            max_frames: 0,
        }
    }
}

/// Animation recorder that captures frames to a file.
///
/// Usage:
/// ```ignore
/// let plan = animator.plan(&settings);
/// let mut recorder = AnimationRecorder::new("output.trja", &plan, Default::default())?;
/// animator.play(&mut recorder, &settings)?;
/// let stats = recorder.finalize()?;
/// ```
pub struct AnimationRecorder {
    writer: BufWriter<File>,
    header: AnimationHeader,
    frame_indices: Vec<FrameIndex>,
    config: RecorderConfig,
    frames_written: u64,
    step_counter: u32,
    /// Trajectory length per entity at the last recorded frame (delta encoding).
    recorded_lens: [usize; 3],
    /// Pre-allocated buffer for frame encoding.
    encode_buffer: Vec<u8>,
}

impl AnimationRecorder {
    /// Create a new animation recorder.
    pub fn new<P: AsRef<Path>>(
        path: P,
        plan: &AnimationPlan,
        config: RecorderConfig,
    ) -> io::Result<Self> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);

        let header = AnimationHeader {
            frame_count: 0, // Will be updated on finalize
            fps: plan.fps,
            delay_ms: plan.delay_ms,
            window: plan.window,
            bounds: plan.bounds,
            flags: AnimationFlags {
                compression: config.compression,
                delta_encoding: config.delta_encoding,
            },
        };

        // Write placeholder header
        header.write_to(&mut writer)?;

        Ok(Self {
            writer,
            header,
            frame_indices: Vec::with_capacity(plan.frame_count),
            config,
            frames_written: 0,
            step_counter: 0,
            recorded_lens: [0; 3],
            encode_buffer: Vec::new(),
        })
    }

    /// Record one frame.
    ///
    /// Returns true if frame was actually recorded (may skip frames based on config).
    pub fn record_frame(
        &mut self,
        timestamp: DateTime<Utc>,
        frame: &FrameMap<'_>,
    ) -> io::Result<bool> {
        self.step_counter += 1;

        // Check frame skip
        if self.step_counter < self.config.frame_skip {
            return Ok(false);
        }
        self.step_counter = 0;

        // Check max frames
        if self.config.max_frames > 0 && self.frames_written >= self.config.max_frames {
            return Ok(false);
        }

        let offset = self.writer.stream_position()?;

        let mut points: [&[TidyRecord]; 3] = [&[], &[], &[]];
        for entity in EntityId::ALL {
            let trajectory = frame.get(&entity).map_or(&[][..], |s| s.trajectory);
            let i = entity.index();
            points[i] = if self.header.flags.delta_encoding {
                let from = self.recorded_lens[i].min(trajectory.len());
                &trajectory[from..]
            } else {
                trajectory
            };
            self.recorded_lens[i] = trajectory.len();
        }
        encode_frame(timestamp, &points, &mut self.encode_buffer);

        let size = match self.header.flags.compression {
            CompressionType::None => {
                self.writer.write_all(&self.encode_buffer)?;
                self.encode_buffer.len()
            }
            CompressionType::Lz4 => {
                let compressed = compress_lz4(&self.encode_buffer);
                self.writer.write_all(&compressed)?;
                compressed.len()
            }
        };

        self.frame_indices.push(FrameIndex {
            offset,
            size: size as u64,
        });
        self.frames_written += 1;

        Ok(true)
    }

    /// Finalize the animation file.
    ///
    /// Writes frame index table and updates header with final frame count.
    pub fn finalize(mut self) -> io::Result<AnimationStats> {
        // Write frame index table at current position
        let index_offset = self.writer.stream_position()?;
        for index in &self.frame_indices {
            index.write_to(&mut self.writer)?;
        }

        // Update header with final frame count
        self.header.frame_count = self.frames_written;

        // Seek back and rewrite header
        self.writer.seek(SeekFrom::Start(0))?;
        self.header.write_to(&mut self.writer)?;

        // Flush and close
        self.writer.flush()?;

        let total_size =
            index_offset + self.frame_indices.len() as u64 * FrameIndex::SIZE as u64;

        Ok(AnimationStats {
            frame_count: self.frames_written,
            total_bytes: total_size,
            average_frame_size: if self.frames_written > 0 {
                index_offset.saturating_sub(AnimationHeader::SIZE as u64) / self.frames_written
            } else {
                0
            },
            compression: self.header.flags.compression,
        })
    }

    /// Get number of frames recorded so far.
    pub fn frames_written(&self) -> u64 {
        self.frames_written
    }
}

impl FrameSink for AnimationRecorder {
    type Error = io::Error;

    fn draw_frame(
        &mut self,
        _index: usize,
        timestamp: DateTime<Utc>,
        frame: &FrameMap<'_>,
    ) -> io::Result<()> {
        self.record_frame(timestamp, frame).map(|_| ())
    }
}

/// Statistics from recording session.
#[derive(Debug, Clone)]
pub struct AnimationStats {
    /// Total frames recorded.
    pub frame_count: u64,
    /// Total file size in bytes.
    pub total_bytes: u64,
    /// Average stored frame size.
    pub average_frame_size: u64,
    /// Compression used.
    pub compression: CompressionType,
}

impl std::fmt::Display for AnimationStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} frames, {} bytes total, {} bytes/frame avg ({:?} compression)",
            self.frame_count, self.total_bytes, self.average_frame_size, self.compression
        )
    }
}
