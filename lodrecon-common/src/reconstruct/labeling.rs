//! Label assignment by iterated conditional modes (`spec.md` §4.6 step
//! 3), an approximation of the named graph-cut energy minimisation (see
//! the Open Questions resolution in the expanded spec): repeatedly
//! relabel each inside-footprint face to its locally cheapest label
//! until no face changes, tie-broken by lower plane index.

use crate::reconstruct::arrangement::Arrangement;

const MAX_PASSES: usize = 50;

/// `labels[i]` is `Some(plane_index)` for every inside-footprint face,
/// `None` for faces outside the footprint.
pub fn assign_labels(arrangement: &Arrangement, plane_count: usize, boundary_penalty: f64) -> Vec<Option<usize>> {
    if plane_count == 0 {
        return vec![None; arrangement.faces.len()];
    }

    let mut labels: Vec<Option<usize>> = arrangement
        .faces
        .iter()
        .map(|f| {
            if !f.inside_footprint {
                None
            } else {
                Some(best_unary_label(&f.rms_by_plane, plane_count))
            }
        })
        .collect();

    for _ in 0..MAX_PASSES {
        let mut changed = false;
        for face_idx in 0..arrangement.faces.len() {
            if labels[face_idx].is_none() {
                continue;
            }
            let face = &arrangement.faces[face_idx];
            let neighbors = arrangement.neighbors(face_idx);
            let mut best_label = labels[face_idx].unwrap();
            let mut best_cost = cost_of(face, &labels, &neighbors, best_label, boundary_penalty);
            for candidate in 0..plane_count {
                let cost = cost_of(face, &labels, &neighbors, candidate, boundary_penalty);
                if cost < best_cost - 1e-12 {
                    best_cost = cost;
                    best_label = candidate;
                }
            }
            if best_label != labels[face_idx].unwrap() {
                labels[face_idx] = Some(best_label);
                changed = true;
            }
        }
        if !changed {
            break;
        }
    }

    labels
}

fn unary_cost(rms_by_plane: &[f64], label: usize) -> f64 {
    rms_by_plane.get(label).copied().unwrap_or(0.0)
}

fn best_unary_label(rms_by_plane: &[f64], plane_count: usize) -> usize {
    (0..plane_count)
        .min_by(|&a, &b| {
            unary_cost(rms_by_plane, a)
                .partial_cmp(&unary_cost(rms_by_plane, b))
                .unwrap()
        })
        .unwrap_or(0)
}

fn cost_of(
    face: &crate::reconstruct::arrangement::Face,
    labels: &[Option<usize>],
    neighbors: &[usize],
    label: usize,
    boundary_penalty: f64,
) -> f64 {
    let unary = unary_cost(&face.rms_by_plane, label);
    let pairwise: f64 = neighbors
        .iter()
        .filter_map(|&n| labels[n])
        .filter(|&nl| nl != label)
        .count() as f64
        * boundary_penalty;
    unary + pairwise
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::bounding_box::Aabb2;
    use crate::geometry::ring::LinearRing;
    use crate::point_in_polygon::PointInPolygon;
    use crate::reconstruct::arrangement;

    #[test]
    fn zero_planes_labels_nothing() {
        let bbox = Aabb2::new([0.0, 0.0], [2.0, 2.0]);
        let ring = LinearRing::new(vec![[0.0, 0.0], [2.0, 0.0], [2.0, 2.0], [0.0, 2.0]]);
        let pip = PointInPolygon::build(&ring);
        let arr = arrangement::build(&bbox, 1.0, &pip, &[], &[]).unwrap();
        let labels = assign_labels(&arr, 0, 1.0);
        assert!(labels.iter().all(|l| l.is_none()));
    }

    #[test]
    fn face_with_clear_evidence_picks_best_plane() {
        let bbox = Aabb2::new([0.0, 0.0], [1.0, 1.0]);
        let ring = LinearRing::new(vec![[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]]);
        let pip = PointInPolygon::build(&ring);
        let mut arr = arrangement::build(&bbox, 1.0, &pip, &[], &[]).unwrap();
        arr.faces[0].rms_by_plane = vec![0.5, 0.01];
        let labels = assign_labels(&arr, 2, 1.0);
        assert_eq!(labels[0], Some(1));
    }
}
