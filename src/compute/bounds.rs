//! Fixed axis ranges for a whole animation.

use serde::{Deserialize, Serialize};

use crate::schema::TidyRecord;

/// Axis-aligned bounds over every record of an animation.
///
/// Computed once over the entire windowed set so the viewport never rescales
/// between frames.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x_min: f64,
    pub x_max: f64,
    pub y_min: f64,
    pub y_max: f64,
    pub z_min: f64,
    pub z_max: f64,
}

impl BoundingBox {
    /// Bounds of a record slice, `None` when it is empty.
    pub fn from_records<'a, I>(records: I) -> Option<Self>
    where
        I: IntoIterator<Item = &'a TidyRecord>,
    {
        let mut iter = records.into_iter();
        let first = iter.next()?;
        let mut bounds = Self {
            x_min: first.x,
            x_max: first.x,
            y_min: first.y,
            y_max: first.y,
            z_min: first.z,
            z_max: first.z,
        };
        for r in iter {
            bounds.x_min = bounds.x_min.min(r.x);
            bounds.x_max = bounds.x_max.max(r.x);
            bounds.y_min = bounds.y_min.min(r.y);
            bounds.y_max = bounds.y_max.max(r.y);
            bounds.z_min = bounds.z_min.min(r.z);
            bounds.z_max = bounds.z_max.max(r.z);
        }
        Some(bounds)
    }

    /// As `[x_min, x_max, y_min, y_max, z_min, z_max]`.
    pub fn to_array(&self) -> [f64; 6] {
        [
            self.x_min, self.x_max, self.y_min, self.y_max, self.z_min, self.z_max,
        ]
    }

    pub fn from_array(v: [f64; 6]) -> Self {
        Self {
            x_min: v[0],
            x_max: v[1],
            y_min: v[2],
            y_max: v[3],
            z_min: v[4],
            z_max: v[5],
        }
    }

    /// Check that a point lies inside (inclusive).
    pub fn contains(&self, p: [f64; 3]) -> bool {
        (self.x_min..=self.x_max).contains(&p[0])
            && (self.y_min..=self.y_max).contains(&p[1])
            && (self.z_min..=self.z_max).contains(&p[2])
    }
}
