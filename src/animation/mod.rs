//! Animation recording and playback for trajectory frame sequences.
//!
//! The recorder is a [`FrameSink`](crate::compute::FrameSink): hand it to
//! [`WindowedAnimator::play`](crate::compute::WindowedAnimator::play) and every
//! frame's trajectories are written to disk for an external renderer or
//! encoder to pick up.
//!
//! # File Format
//!
//! The `.trja` (Trajectory Animation) format stores frames with optional
//! compression and delta encoding:
//!
//! ```text
//! Header (96 bytes):
//!   Magic: "TRJA" (4 bytes)
//!   Version: u16
//!   Flags: u16 (compression, delta encoding)
//!   Frame count: u64
//!   Frame rate: u32
//!   Frame delay (ms): u32
//!   Window start / end: i64 microseconds since epoch each
//!   Bounds: 6 x f64 (x_min, x_max, y_min, y_max, z_min, z_max)
//!   Reserved: 8 bytes
//!
//! Frame data (variable), optionally LZ4 compressed:
//!   Timestamp: i64 microseconds
//!   Per entity (3): point count u32, then points of (i64 us, f64 x, y, z)
//!
//! Frame index table (frame_count * 16 bytes, end of file):
//!   Offset: u64
//!   Stored size: u64
//! ```
//!
//! Without delta encoding each frame stores every entity's trajectory so far.
//! With it, a frame stores only the points appended since the previous
//! recorded frame, and the player accumulates them.

mod format;
mod player;
mod recorder;

pub use format::{
    ANIMATION_MAGIC, ANIMATION_VERSION, AnimationFlags, AnimationHeader, CompressionType,
    FrameIndex,
};
pub use player::{AnimationPlayer, FrameIterator, PlaybackFrame};
pub use recorder::{AnimationRecorder, AnimationStats, RecorderConfig};
