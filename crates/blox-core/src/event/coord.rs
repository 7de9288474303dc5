//! Geometry values carried by events, and the two-phase capture cell used by
//! move and resize events.
//!
//! Coordinates travel on the wire as rounded `"x,y"` strings; sub-pixel
//! precision is dropped at the boundary.

use crate::error::EventError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A workspace-space position.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Coordinate {
    pub x: f64,
    pub y: f64,
}

impl Coordinate {
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// The `"x,y"` wire form, rounded to whole units.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn to_wire(self) -> String {
        format!("{},{}", self.x.round() as i64, self.y.round() as i64)
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_wire())
    }
}

impl FromStr for Coordinate {
    type Err = EventError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || EventError::InvalidCoordinate(s.to_string());
        let (x, y) = s.split_once(',').ok_or_else(invalid)?;
        let x: f64 = x.trim().parse().map_err(|_| invalid())?;
        let y: f64 = y.trim().parse().map_err(|_| invalid())?;
        Ok(Self { x, y })
    }
}

impl Serialize for Coordinate {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_wire())
    }
}

impl<'de> Deserialize<'de> for Coordinate {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Width and height of a workspace comment.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    #[must_use]
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// State of a value that is only known after a gesture completes.
///
/// Move and resize events are built before the mutation (`Capturing`) and
/// completed by `record_new` once the final value is known (`Recorded`).
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Capture<T> {
    #[default]
    Capturing,
    Recorded(T),
}

impl<T> Capture<T> {
    #[must_use]
    pub const fn recorded(&self) -> Option<&T> {
        match self {
            Self::Capturing => None,
            Self::Recorded(value) => Some(value),
        }
    }

    #[must_use]
    pub const fn is_recorded(&self) -> bool {
        matches!(self, Self::Recorded(_))
    }

    pub fn record(&mut self, value: T) {
        *self = Self::Recorded(value);
    }
}

impl<T> From<Option<T>> for Capture<T> {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Capturing, Self::Recorded)
    }
}
