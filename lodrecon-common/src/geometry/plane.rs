use nalgebra::{Point3, Vector3};

/// An (infinite) plane in Hessian normal form: `normal . p == b`.
#[derive(Debug, Clone)]
pub struct Plane {
    pub normal: Vector3<f64>,
    pub b: f64,
}

impl Plane {
    /// Least-squares best-fit plane through a point cloud, via the
    /// centroid + covariance-matrix eigenvector method (normal is the
    /// eigenvector of smallest eigenvalue).
    pub fn fit(points: &[Point3<f64>]) -> Option<Self> {
        if points.len() < 3 {
            return None;
        }
        let n = points.len() as f64;
        let centroid = points.iter().fold(Vector3::zeros(), |acc, p| acc + p.coords) / n;
        let mut cov = nalgebra::Matrix3::zeros();
        for p in points {
            let d = p.coords - centroid;
            cov += d * d.transpose();
        }
        let eigen = cov.symmetric_eigen();
        let (min_idx, _) = eigen
            .eigenvalues
            .iter()
            .enumerate()
            .min_by(|(_, a), (_, b)| a.partial_cmp(b).unwrap())?;
        let mut normal = eigen.eigenvectors.column(min_idx).into_owned();
        if normal.z < 0.0 {
            normal = -normal;
        }
        let normal = normal.normalize();
        let b = normal.dot(&centroid);
        Some(Plane { normal, b })
    }

    pub fn signed_distance(&self, p: Point3<f64>) -> f64 {
        self.normal.dot(&p.coords) - self.b
    }

    /// The angle, in degrees, between this plane's normal and `other`'s.
    pub fn angle_degrees(&self, other: &Plane) -> f64 {
        let cos = self.normal.dot(&other.normal).clamp(-1.0, 1.0);
        cos.acos().to_degrees()
    }

    /// Evaluates the plane's height at a given (x, y), assuming the plane
    /// is not vertical (`normal.z != 0`).
    pub fn z_at(&self, x: f64, y: f64) -> f64 {
        (self.b - self.normal.x * x - self.normal.y * y) / self.normal.z
    }

    /// Root-mean-square point-to-plane distance over the supporting points.
    pub fn rms_error(&self, points: &[Point3<f64>]) -> f64 {
        if points.is_empty() {
            return 0.0;
        }
        let sum_sq: f64 = points
            .iter()
            .map(|p| self.signed_distance(*p).powi(2))
            .sum();
        (sum_sq / points.len() as f64).sqrt()
    }
}

#[cfg(test)]
mod tests {
    use nalgebra::Point3;

    use crate::geometry::plane::Plane;

    #[test]
    fn fit_recovers_a_flat_horizontal_roof() {
        let points = vec![
            Point3::new(0.0, 0.0, 2.5),
            Point3::new(1.0, 0.0, 2.5),
            Point3::new(0.0, 1.0, 2.5),
            Point3::new(1.0, 1.0, 2.5),
        ];
        let plane = Plane::fit(&points).unwrap();
        assert!((plane.z_at(0.3, 0.7) - 2.5).abs() < 1e-9);
        assert!(plane.rms_error(&points) < 1e-9);
        assert!(plane.signed_distance(Point3::new(0.5, 0.5, 3.5)).abs() > 0.9);
    }

    #[test]
    fn fit_needs_at_least_three_points() {
        assert!(Plane::fit(&[Point3::new(0.0, 0.0, 0.0), Point3::new(1.0, 0.0, 0.0)]).is_none());
    }

    #[test]
    fn angle_degrees_is_zero_for_parallel_planes() {
        let a = Plane::fit(&[
            Point3::new(0.0, 0.0, 1.0),
            Point3::new(1.0, 0.0, 1.0),
            Point3::new(0.0, 1.0, 1.0),
        ])
        .unwrap();
        let b = Plane::fit(&[
            Point3::new(0.0, 0.0, 4.0),
            Point3::new(1.0, 0.0, 4.0),
            Point3::new(0.0, 1.0, 4.0),
        ])
        .unwrap();
        assert!(a.angle_degrees(&b) < 1e-6);
    }
}
