//! Plane detection by region growing (`spec.md` §4.6 step 1): roof-class
//! points are clustered into planar regions, each cluster seeded from the
//! highest not-yet-assigned point, grown to neighbours within
//! `tol_planarity_d2p` of the cluster's current best-fit plane.

use crate::geometry::plane::Plane;
use nalgebra::Point3;
use std::collections::HashMap;

pub struct PlaneCluster {
    pub plane: Plane,
    pub points: Vec<Point3<f64>>,
}

/// `neighbor_radius` bounds how far region growing looks for the next
/// candidate point; in practice the crop's raster cell size.
pub fn detect_planes(
    points: &[Point3<f64>],
    tol_d2p: f64,
    tol_normals_deg: f64,
    neighbor_radius: f64,
) -> Vec<PlaneCluster> {
    if points.len() < 3 {
        return Vec::new();
    }

    let mut grid: HashMap<(i64, i64), Vec<usize>> = HashMap::new();
    for (i, p) in points.iter().enumerate() {
        grid.entry(cell_of(p, neighbor_radius)).or_default().push(i);
    }

    let mut order: Vec<usize> = (0..points.len()).collect();
    order.sort_by(|&a, &b| points[b].z.partial_cmp(&points[a].z).unwrap());

    let mut assigned = vec![false; points.len()];
    let mut clusters = Vec::new();

    for &seed in &order {
        if assigned[seed] {
            continue;
        }
        let mut cluster = vec![seed];
        assigned[seed] = true;
        let mut frontier = vec![seed];
        let mut current_plane: Option<Plane> = None;

        while let Some(p_idx) = frontier.pop() {
            for neighbor in neighbors(&grid, &points[p_idx], neighbor_radius) {
                if assigned[neighbor] {
                    continue;
                }
                let candidate = points[neighbor];
                let accept = match &current_plane {
                    None => true,
                    Some(plane) => plane.signed_distance(candidate).abs() <= tol_d2p,
                };
                if !accept {
                    continue;
                }
                assigned[neighbor] = true;
                cluster.push(neighbor);
                frontier.push(neighbor);

                if cluster.len() >= 3 && cluster.len() % 5 == 0 {
                    let cluster_points: Vec<Point3<f64>> =
                        cluster.iter().map(|&i| points[i]).collect();
                    if let Some(refit) = Plane::fit(&cluster_points) {
                        let drifted = current_plane
                            .as_ref()
                            .map(|old| old.angle_degrees(&refit) > tol_normals_deg)
                            .unwrap_or(false);
                        if !drifted {
                            current_plane = Some(refit);
                        }
                    }
                } else if current_plane.is_none() && cluster.len() >= 3 {
                    let cluster_points: Vec<Point3<f64>> =
                        cluster.iter().map(|&i| points[i]).collect();
                    current_plane = Plane::fit(&cluster_points);
                }
            }
        }

        if cluster.len() < 3 {
            continue;
        }
        let cluster_points: Vec<Point3<f64>> = cluster.iter().map(|&i| points[i]).collect();
        if let Some(plane) = Plane::fit(&cluster_points) {
            clusters.push(PlaneCluster {
                plane,
                points: cluster_points,
            });
        }
    }

    clusters
}

fn cell_of(p: &Point3<f64>, radius: f64) -> (i64, i64) {
    let r = radius.max(1e-6);
    ((p.x / r).floor() as i64, (p.y / r).floor() as i64)
}

fn neighbors(grid: &HashMap<(i64, i64), Vec<usize>>, p: &Point3<f64>, radius: f64) -> Vec<usize> {
    let (cx, cy) = cell_of(p, radius);
    let mut out = Vec::new();
    for dx in -1..=1 {
        for dy in -1..=1 {
            if let Some(idxs) = grid.get(&(cx + dx, cy + dy)) {
                out.extend(idxs.iter().copied());
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flat_grid(z: f64) -> Vec<Point3<f64>> {
        let mut out = Vec::new();
        for x in 0..10 {
            for y in 0..10 {
                out.push(Point3::new(x as f64, y as f64, z));
            }
        }
        out
    }

    #[test]
    fn single_flat_surface_yields_one_cluster() {
        let points = flat_grid(5.0);
        let clusters = detect_planes(&points, 0.01, 20.0, 1.5);
        assert_eq!(clusters.len(), 1);
        assert_eq!(clusters[0].points.len(), points.len());
    }

    #[test]
    fn two_disjoint_roof_slopes_yield_two_clusters() {
        let mut points = flat_grid(5.0);
        let mut other = Vec::new();
        for x in 20..30 {
            for y in 0..10 {
                other.push(Point3::new(x as f64, y as f64, 8.0));
            }
        }
        points.extend(other);
        let clusters = detect_planes(&points, 0.01, 20.0, 1.5);
        assert_eq!(clusters.len(), 2);
    }

    #[test]
    fn too_few_points_yields_no_clusters() {
        let points = vec![Point3::new(0.0, 0.0, 1.0), Point3::new(1.0, 0.0, 1.0)];
        assert!(detect_planes(&points, 0.01, 20.0, 1.5).is_empty());
    }
}
