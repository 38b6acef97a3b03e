//! The batch scheduler (`spec.md` §4.8, C8): a bounded-queue pipeline of
//! worker pools for crop -> reconstruct -> validate -> write, with
//! cooperative cancellation, per-building timeouts, and an advisory
//! memory cap on outstanding crop data, built around a
//! `crossbeam-channel` worker-pool pattern with plain `std::thread::spawn`
//! pools rather than a long-lived-server thread manager (see `DESIGN.md`).

mod pipeline;

use crate::config::Config;
use crate::elevation::ElevationProvider;
use crate::error::SchedulerError;
use crate::footprint::FootprintHandle;
use crate::io::{MeshWriter, PointCloudReader};
use crate::model::BuildingResult;
use crate::source::SourceIndex;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

/// How a single building's run through the pipeline ended.
#[derive(Debug)]
pub enum BuildingOutcome {
    Succeeded(BuildingResult),
    /// The cropper found no usable coverage (`spec.md` §7: not a
    /// failure).
    NoData { reason: String },
    Timeout { stage: &'static str },
    Cancelled,
    Failed(SchedulerError),
}

impl BuildingOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, BuildingOutcome::Succeeded(_) | BuildingOutcome::NoData { .. })
    }
}

/// Per-building outcomes for a completed (or cancelled) run, keyed by
/// footprint id (`spec.md` §7, exit-code mapping).
#[derive(Debug, Default)]
pub struct SchedulerReport {
    pub outcomes: Vec<(String, BuildingOutcome)>,
}

impl SchedulerReport {
    pub fn any_cancelled(&self) -> bool {
        self.outcomes.iter().any(|(_, o)| matches!(o, BuildingOutcome::Cancelled))
    }

    pub fn any_failed(&self) -> bool {
        self.outcomes
            .iter()
            .any(|(_, o)| matches!(o, BuildingOutcome::Failed(_) | BuildingOutcome::Timeout { .. }))
    }

    /// A building that went through the whole pipeline but whose mesh
    /// carries validation errors still counts as a partial failure
    /// (`spec.md` §7) even though it isn't a [`BuildingOutcome::Failed`].
    pub fn any_invalid(&self) -> bool {
        self.outcomes
            .iter()
            .any(|(_, o)| matches!(o, BuildingOutcome::Succeeded(r) if !r.is_valid()))
    }

    /// `spec.md` §6 exit codes: 0 success, 4 partial failure, 5
    /// cancelled. Codes 2 and 3 (config / input I/O) are decided by the
    /// caller before a batch ever starts.
    pub fn exit_code(&self) -> i32 {
        if self.any_cancelled() {
            5
        } else if self.any_failed() || self.any_invalid() {
            4
        } else {
            0
        }
    }
}

/// Runs the full batch over `footprints`, returning once every building
/// has either finished or the run was cancelled. `cancel` may be flipped
/// from another thread to stop the run early; `config.fatal_at_any_building`
/// makes the pipeline stop dequeueing new work as soon as one building
/// fails rather than draining the rest of the queue.
pub fn run_batch(
    sources: SourceIndex,
    footprints: Vec<FootprintHandle>,
    reader: Arc<dyn PointCloudReader>,
    writer: Arc<dyn MeshWriter>,
    elevation: Arc<ElevationProvider>,
    config: Arc<Config>,
    target_date: Option<i32>,
    cancel: Arc<AtomicBool>,
) -> SchedulerReport {
    pipeline::run(sources, footprints, reader, writer, elevation, config, target_date, cancel)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::InputIoError;
    use crate::footprint::Footprint;
    use crate::geometry::mesh::Mesh;
    use crate::geometry::point::{classification, PointCollection};
    use crate::geometry::ring::LinearRing;
    use crate::source::PointCloudSource;
    use nalgebra::Point3;
    use std::collections::HashMap;
    use std::sync::atomic::Ordering;
    use std::sync::Mutex;

    struct GridReader;
    impl PointCloudReader for GridReader {
        fn read_points(&self, _location: &str, min: [f64; 2], max: [f64; 2]) -> Result<PointCollection, InputIoError> {
            let mut pc = PointCollection::new();
            let mut x = min[0];
            while x <= max[0] {
                let mut y = min[1];
                while y <= max[1] {
                    pc.push(Point3::new(x, y, 5.0), classification::BUILDING, 0);
                    pc.push(Point3::new(x, y, 0.0), classification::GROUND, 0);
                    y += 0.5;
                }
                x += 0.5;
            }
            Ok(pc)
        }
    }

    struct NullReader;
    impl PointCloudReader for NullReader {
        fn read_points(&self, _location: &str, _min: [f64; 2], _max: [f64; 2]) -> Result<PointCollection, InputIoError> {
            Ok(PointCollection::new())
        }
    }

    struct CollectingWriter {
        written: Mutex<Vec<String>>,
    }
    impl MeshWriter for CollectingWriter {
        fn write_mesh(&self, id: &str, _mesh: &Mesh, _attributes: &HashMap<String, String>) -> Result<(), InputIoError> {
            self.written.lock().unwrap().push(id.to_string());
            Ok(())
        }
    }

    fn square(id: &str) -> FootprintHandle {
        let ring = LinearRing::new(vec![[0.0, 0.0], [4.0, 0.0], [4.0, 4.0], [0.0, 4.0]]);
        Arc::new(Footprint::new(id, ring))
    }

    fn sources() -> SourceIndex {
        Arc::new(vec![PointCloudSource::new("a", "a.csv")])
    }

    #[test]
    fn batch_of_buildings_all_succeed() {
        let footprints = vec![square("b1"), square("b2"), square("b3")];
        let writer = Arc::new(CollectingWriter { written: Mutex::new(Vec::new()) });
        let report = run_batch(
            sources(),
            footprints,
            Arc::new(GridReader),
            writer.clone(),
            Arc::new(ElevationProvider::constant(0.0)),
            Arc::new(Config::default()),
            None,
            Arc::new(AtomicBool::new(false)),
        );
        assert_eq!(report.outcomes.len(), 3);
        assert_eq!(report.exit_code(), 0);
        assert_eq!(writer.written.lock().unwrap().len(), 3);
    }

    #[test]
    fn buildings_with_no_coverage_report_nodata_not_failure() {
        let footprints = vec![square("empty-1")];
        let writer = Arc::new(CollectingWriter { written: Mutex::new(Vec::new()) });
        let report = run_batch(
            sources(),
            footprints,
            Arc::new(NullReader),
            writer,
            Arc::new(ElevationProvider::constant(0.0)),
            Arc::new(Config::default()),
            None,
            Arc::new(AtomicBool::new(false)),
        );
        assert_eq!(report.outcomes.len(), 1);
        assert!(matches!(report.outcomes[0].1, BuildingOutcome::NoData { .. }));
        assert_eq!(report.exit_code(), 0);
    }

    #[test]
    fn cancelling_before_run_marks_everything_cancelled() {
        let footprints = vec![square("b1"), square("b2")];
        let writer = Arc::new(CollectingWriter { written: Mutex::new(Vec::new()) });
        let cancel = Arc::new(AtomicBool::new(false));
        cancel.store(true, Ordering::SeqCst);
        let report = run_batch(
            sources(),
            footprints,
            Arc::new(GridReader),
            writer,
            Arc::new(ElevationProvider::constant(0.0)),
            Arc::new(Config::default()),
            None,
            cancel,
        );
        assert_eq!(report.exit_code(), 5);
        assert!(report.outcomes.iter().all(|(_, o)| matches!(o, BuildingOutcome::Cancelled)));
    }
}
