//! Per-component error enums (`spec.md` §7), `thiserror`-derived with
//! `#[from]` conversions so lower-level I/O errors convert into the
//! right stage's error type without manual `match`ing.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid config field `{field}`: {reason}")]
    InvalidValue {
        field: &'static str,
        reason: String,
    },
}

/// I/O failure surfaced by a reader collaborator (`spec.md` §6); the
/// crate never interprets the underlying cause, it only carries it.
#[derive(Debug, Error)]
#[error("input I/O error: {0}")]
pub struct InputIoError(pub String);

#[derive(Debug, Error)]
pub enum CropError {
    #[error(transparent)]
    Io(#[from] InputIoError),
    #[error("footprint `{0}` has a degenerate ring (fewer than 3 vertices)")]
    DegenerateFootprint(String),
}

#[derive(Debug, Clone, Error)]
pub enum ValidationError {
    #[error("mesh has non-planar face {face}: max point-to-plane distance {distance} exceeds tolerance")]
    NonPlanarFace { face: usize, distance: f64 },
    #[error("mesh is not closed: edge {0:?} is shared by {1} faces, expected 2")]
    NotClosed((usize, usize), usize),
    #[error("face {0} self-intersects")]
    SelfIntersection(usize),
    #[error("face {0} has inconsistent (inward-facing) orientation")]
    BadOrientation(usize),
}

/// The outcome states a single building can end up in, recorded by the
/// scheduler and used by the CLI to compute the exit code of `spec.md`
/// §6.
#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error("crop stage failed: {0}")]
    Crop(#[from] CropError),
    #[error("write stage failed: {0}")]
    Write(#[from] InputIoError),
}
