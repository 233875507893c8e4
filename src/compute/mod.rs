//! Compute module - Normalization, windowing and frame rendering.

mod animator;
mod bounds;
mod error;
mod frame;
mod normalize;
mod table;
mod time;
mod window;

pub use animator::*;
pub use bounds::*;
pub use error::*;
pub use frame::*;
pub use normalize::*;
pub use table::*;
pub use time::*;
pub use window::*;
