//! Trajectory animation - windowed 3D animation of three tracked entities.
//!
//! This crate reads wide-format position tables (one row per timestamp, with
//! `N0x .. N2z` coordinate columns), reshapes them into a time-sorted
//! long-format record set, restricts it to a time window, and produces the
//! cumulative per-frame trajectory of each entity.
//!
//! # Architecture
//!
//! The crate is split into three modules:
//!
//! - `schema`: Record types and run configuration
//! - `compute`: Table parsing, normalization, windowing and frame rendering
//! - `animation`: Recording frame sequences to `.trja` files and reading them back
//!
//! # Example
//!
//! ```rust,no_run
//! use trajectory_anim::{
//!     compute::{PlaybackSettings, RawTable, WindowedAnimator, normalize},
//!     schema::AnimationConfig,
//! };
//!
//! let table = RawTable::from_path("positions.csv", None)?;
//! let tidy = normalize(&table)?;
//!
//! // Default window: the last five minutes of data
//! let config = AnimationConfig::default();
//! let window = config.resolve_window(&tidy)?.expect("non-empty data");
//! let animator = WindowedAnimator::new(&tidy, window)?;
//!
//! for (t, frame) in animator.frames() {
//!     for (entity, state) in &frame {
//!         println!("{t} {entity}: {} points, at {:?}", state.len(), state.position.position());
//!     }
//! }
//!
//! let plan = animator.plan(&PlaybackSettings::default());
//! println!("{} frames, {} ms apart", plan.frame_count, plan.delay_ms);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod animation;
pub mod compute;
pub mod schema;

// Re-export commonly used types
pub use compute::{PipelineError, RawTable, WindowedAnimator, normalize};
pub use schema::{AnimationConfig, EntityId, TidyRecord, TidySet, TimeWindow};
