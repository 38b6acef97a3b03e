//! A from-scratch incremental Delaunay triangulation over 2D ground
//! samples, used by the *Interpolated* elevation provider (`spec.md`
//! §4.5). No crate in the dependency stack provides one. Built by
//! Bowyer–Watson insertion against a super-triangle, which is then
//! discarded. Plain (unconstrained) Delaunay: footprint edges are not
//! enforced as triangulation edges (see `DESIGN.md`).

/// A triangulated set of 2D ground samples with a parallel Z value per
/// vertex.
#[derive(Debug, Clone)]
pub struct Triangulation {
    points: Vec<[f64; 2]>,
    z: Vec<f64>,
    triangles: Vec<[usize; 3]>,
}

impl Triangulation {
    /// Builds a Delaunay triangulation of `samples` (`(x, y, z)` triples).
    /// Returns `None` if fewer than 3 non-degenerate samples are given.
    pub fn build(samples: &[(f64, f64, f64)]) -> Option<Triangulation> {
        if samples.len() < 3 {
            return None;
        }
        let points: Vec<[f64; 2]> = samples.iter().map(|&(x, y, _)| [x, y]).collect();
        let z: Vec<f64> = samples.iter().map(|&(_, _, z)| z).collect();

        let (min, max) = bounds(&points);
        let dx = (max[0] - min[0]).max(1.0);
        let dy = (max[1] - min[1]).max(1.0);
        let d = dx.max(dy) * 20.0;
        let cx = (min[0] + max[0]) / 2.0;
        let cy = (min[1] + max[1]) / 2.0;
        let super_a = [cx - d, cy - d];
        let super_b = [cx + d, cy - d];
        let super_c = [cx, cy + d];

        let mut pts = points.clone();
        let super_idx = [pts.len(), pts.len() + 1, pts.len() + 2];
        pts.push(super_a);
        pts.push(super_b);
        pts.push(super_c);

        let mut triangles = vec![super_idx];

        for pi in 0..points.len() {
            insert_point(&mut triangles, &pts, pi);
        }

        triangles.retain(|t| !t.iter().any(|v| super_idx.contains(v)));

        if triangles.is_empty() {
            return None;
        }

        Some(Triangulation {
            points,
            z,
            triangles,
        })
    }

    pub fn vertex_count(&self) -> usize {
        self.points.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    /// Barycentric interpolation of Z at `p`, or `None` if `p` falls
    /// outside every triangle (i.e. outside the convex hull of the
    /// samples).
    pub fn interpolate(&self, p: [f64; 2]) -> Option<f64> {
        for t in &self.triangles {
            let (a, b, c) = (self.points[t[0]], self.points[t[1]], self.points[t[2]]);
            if let Some((u, v, w)) = barycentric(p, a, b, c) {
                return Some(u * self.z[t[0]] + v * self.z[t[1]] + w * self.z[t[2]]);
            }
        }
        None
    }

    /// Z of the nearest sample vertex, the fallback used outside the
    /// convex hull (`spec.md` §4.5).
    pub fn nearest_vertex_z(&self, p: [f64; 2]) -> f64 {
        let mut best = (f64::INFINITY, 0.0);
        for (i, v) in self.points.iter().enumerate() {
            let d = (v[0] - p[0]).powi(2) + (v[1] - p[1]).powi(2);
            if d < best.0 {
                best = (d, self.z[i]);
            }
        }
        best.1
    }

    /// `q`-th percentile (0.0..=1.0) of the triangulation's vertex Z
    /// values, per `spec.md` §4.5 `get_percentile`.
    pub fn percentile_z(&self, q: f64) -> f64 {
        let mut zs = self.z.clone();
        crate::geometry::point::percentile(&mut zs, q)
    }
}

fn bounds(points: &[[f64; 2]]) -> ([f64; 2], [f64; 2]) {
    let mut min = [f64::INFINITY, f64::INFINITY];
    let mut max = [f64::NEG_INFINITY, f64::NEG_INFINITY];
    for p in points {
        min[0] = min[0].min(p[0]);
        min[1] = min[1].min(p[1]);
        max[0] = max[0].max(p[0]);
        max[1] = max[1].max(p[1]);
    }
    (min, max)
}

fn circumcircle_contains(p: [f64; 2], a: [f64; 2], b: [f64; 2], c: [f64; 2]) -> bool {
    let ax = a[0] - p[0];
    let ay = a[1] - p[1];
    let bx = b[0] - p[0];
    let by = b[1] - p[1];
    let cx = c[0] - p[0];
    let cy = c[1] - p[1];

    let det = (ax * ax + ay * ay) * (bx * cy - cx * by)
        - (bx * bx + by * by) * (ax * cy - cx * ay)
        + (cx * cx + cy * cy) * (ax * by - bx * ay);

    // Orientation of (a, b, c) determines the sign convention for "inside".
    let orient = (b[0] - a[0]) * (c[1] - a[1]) - (b[1] - a[1]) * (c[0] - a[0]);
    if orient > 0.0 {
        det > 0.0
    } else {
        det < 0.0
    }
}

fn insert_point(triangles: &mut Vec<[usize; 3]>, pts: &[[f64; 2]], pi: usize) {
    let p = pts[pi];
    let mut bad = Vec::new();
    for (ti, t) in triangles.iter().enumerate() {
        if circumcircle_contains(p, pts[t[0]], pts[t[1]], pts[t[2]]) {
            bad.push(ti);
        }
    }
    if bad.is_empty() {
        return;
    }

    let mut boundary: Vec<(usize, usize)> = Vec::new();
    for &ti in &bad {
        let t = triangles[ti];
        for &(e0, e1) in &[(t[0], t[1]), (t[1], t[2]), (t[2], t[0])] {
            let shared = bad.iter().any(|&tj| {
                tj != ti && {
                    let other = triangles[tj];
                    other.contains(&e0) && other.contains(&e1)
                }
            });
            if !shared {
                boundary.push((e0, e1));
            }
        }
    }

    let mut kept = Vec::with_capacity(triangles.len() - bad.len());
    for (ti, t) in triangles.iter().enumerate() {
        if !bad.contains(&ti) {
            kept.push(*t);
        }
    }
    for (e0, e1) in boundary {
        kept.push([e0, e1, pi]);
    }
    *triangles = kept;
}

fn barycentric(p: [f64; 2], a: [f64; 2], b: [f64; 2], c: [f64; 2]) -> Option<(f64, f64, f64)> {
    let denom = (b[1] - c[1]) * (a[0] - c[0]) + (c[0] - b[0]) * (a[1] - c[1]);
    if denom.abs() < 1e-12 {
        return None;
    }
    let u = ((b[1] - c[1]) * (p[0] - c[0]) + (c[0] - b[0]) * (p[1] - c[1])) / denom;
    let v = ((c[1] - a[1]) * (p[0] - c[0]) + (a[0] - c[0]) * (p[1] - c[1])) / denom;
    let w = 1.0 - u - v;
    let eps = -1e-9;
    if u >= eps && v >= eps && w >= eps {
        Some((u, v, w))
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid_samples() -> Vec<(f64, f64, f64)> {
        let mut out = Vec::new();
        for y in 0..5 {
            for x in 0..5 {
                out.push((x as f64, y as f64, 10.0));
            }
        }
        out
    }

    #[test]
    fn builds_triangulation_over_grid() {
        let tri = Triangulation::build(&grid_samples()).unwrap();
        assert_eq!(tri.vertex_count(), 25);
        assert!(tri.triangle_count() > 0);
    }

    #[test]
    fn interpolates_flat_surface() {
        let tri = Triangulation::build(&grid_samples()).unwrap();
        let z = tri.interpolate([2.3, 2.7]).unwrap();
        assert!((z - 10.0).abs() < 1e-9);
    }

    #[test]
    fn outside_hull_falls_back_to_nearest() {
        let tri = Triangulation::build(&grid_samples()).unwrap();
        assert!(tri.interpolate([100.0, 100.0]).is_none());
        assert_eq!(tri.nearest_vertex_z([100.0, 100.0]), 10.0);
    }

    #[test]
    fn percentile_of_varying_samples() {
        let samples = vec![
            (0.0, 0.0, 1.0),
            (1.0, 0.0, 2.0),
            (0.0, 1.0, 3.0),
            (1.0, 1.0, 4.0),
        ];
        let tri = Triangulation::build(&samples).unwrap();
        assert_eq!(tri.percentile_z(0.5), 2.5);
    }

    #[test]
    fn too_few_samples_returns_none() {
        assert!(Triangulation::build(&[(0.0, 0.0, 1.0), (1.0, 0.0, 1.0)]).is_none());
    }
}
