//! Bounding-box parameter for timelapse processing.
//!
//! Accepted on the wire as `[[x1, y1], [x2, y2]]` in pixel coordinates:
//! exactly two points, each exactly two non-negative integers.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::CoreError;

/// Number of points in a rectangle.
const POINT_COUNT: usize = 2;

/// Number of coordinates per point.
const COORD_COUNT: usize = 2;

/// A validated mask rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Value")]
pub struct MaskRect([[u32; COORD_COUNT]; POINT_COUNT]);

impl MaskRect {
    /// Build a rectangle from two already-valid points.
    pub fn new(first: [u32; 2], second: [u32; 2]) -> Self {
        Self([first, second])
    }

    /// Validate a raw JSON parameter.
    ///
    /// Fails with [`CoreError::InvalidMaskRect`] for anything that is not a
    /// two-element array of two-element arrays of integers >= 0.
    pub fn from_json(value: &Value) -> Result<Self, CoreError> {
        let points = value
            .as_array()
            .ok_or_else(|| invalid("expected an array of points"))?;
        if points.len() != POINT_COUNT {
            return Err(invalid(&format!(
                "expected exactly {POINT_COUNT} points, got {}",
                points.len()
            )));
        }

        let mut out = [[0u32; COORD_COUNT]; POINT_COUNT];
        for (i, point) in points.iter().enumerate() {
            let coords = point
                .as_array()
                .ok_or_else(|| invalid(&format!("point {i} is not an array")))?;
            if coords.len() != COORD_COUNT {
                return Err(invalid(&format!(
                    "point {i} must have exactly {COORD_COUNT} coordinates, got {}",
                    coords.len()
                )));
            }
            for (j, coord) in coords.iter().enumerate() {
                out[i][j] = coord
                    .as_u64()
                    .and_then(|c| u32::try_from(c).ok())
                    .ok_or_else(|| {
                        invalid(&format!(
                            "coordinate {j} of point {i} must be a non-negative integer, got {coord}"
                        ))
                    })?;
            }
        }

        Ok(Self(out))
    }

    /// The two corner points.
    pub fn points(&self) -> [[u32; 2]; 2] {
        self.0
    }

    /// Flattened `x1,y1,x2,y2` form passed to the container.
    pub fn to_arg(&self) -> String {
        self.0
            .iter()
            .flatten()
            .map(|c| c.to_string())
            .collect::<Vec<_>>()
            .join(",")
    }
}

impl TryFrom<Value> for MaskRect {
    type Error = CoreError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        Self::from_json(&value)
    }
}

fn invalid(msg: &str) -> CoreError {
    CoreError::InvalidMaskRect(msg.to_string())
}
