//! Ground elevation queries (`spec.md` §4.5): a constant fallback or an
//! interpolated surface built from ground samples.

pub mod delaunay;

use delaunay::Triangulation;

/// Selected at construction time and immutable afterwards.
pub enum ElevationProvider {
    /// `get(p)` returns `floor_elevation` everywhere; used when too few
    /// ground samples are available to triangulate.
    Constant { floor_elevation: f64 },
    /// Built from a Delaunay triangulation of ground samples.
    Interpolated { triangulation: Triangulation },
}

impl ElevationProvider {
    pub fn constant(floor_elevation: f64) -> Self {
        ElevationProvider::Constant { floor_elevation }
    }

    /// Builds an interpolated provider from `(x, y, z)` ground samples,
    /// falling back to a constant provider (the samples' mean Z) if
    /// there are too few points to triangulate.
    pub fn interpolated(samples: &[(f64, f64, f64)]) -> Self {
        match Triangulation::build(samples) {
            Some(triangulation) => ElevationProvider::Interpolated { triangulation },
            None => {
                let mean = if samples.is_empty() {
                    0.0
                } else {
                    samples.iter().map(|&(_, _, z)| z).sum::<f64>() / samples.len() as f64
                };
                ElevationProvider::Constant {
                    floor_elevation: mean,
                }
            }
        }
    }

    /// Ground elevation at `p` (`spec.md` §4.5): the constant value, or
    /// the triangulation's barycentric interpolation, falling back to
    /// the nearest vertex outside the convex hull.
    pub fn get(&self, p: [f64; 2]) -> f64 {
        match self {
            ElevationProvider::Constant { floor_elevation } => *floor_elevation,
            ElevationProvider::Interpolated { triangulation } => triangulation
                .interpolate(p)
                .unwrap_or_else(|| triangulation.nearest_vertex_z(p)),
        }
    }

    /// `q`-th percentile (0.0..=1.0) of the elevation distribution.
    pub fn get_percentile(&self, q: f64) -> f64 {
        match self {
            ElevationProvider::Constant { floor_elevation } => *floor_elevation,
            ElevationProvider::Interpolated { triangulation } => triangulation.percentile_z(q),
        }
    }
}
