//! Worker-pool wiring for [`super::run_batch`]: one `crossbeam-channel`
//! bounded queue between each pair of adjacent stages, one
//! `std::thread::spawn` pool per stage, and a shared results sink.

use super::BuildingOutcome;
use crate::config::Config;
use crate::crop;
use crate::elevation::ElevationProvider;
use crate::error::SchedulerError;
use crate::footprint::FootprintHandle;
use crate::io::{MeshWriter, PointCloudReader};
use crate::model::{BuildingCrop, BuildingMesh, BuildingResult, CropOutcome};
use crate::reconstruct;
use crate::source::SourceIndex;
use crate::validate;
use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

const POLL_INTERVAL: Duration = Duration::from_millis(100);
const MEMORY_BACKOFF: Duration = Duration::from_millis(5);

/// Rough per-building memory estimate backing the advisory cap
/// (`spec.md` §4.8): point coordinates plus the per-point classification
/// and quality bytes.
fn estimate_bytes(crop: &BuildingCrop) -> usize {
    crop.points.len() * (std::mem::size_of::<nalgebra::Point3<f64>>() + 2)
}

type Results = Arc<Mutex<Vec<(String, BuildingOutcome)>>>;

fn push(results: &Results, id: String, outcome: BuildingOutcome) {
    results.lock().unwrap().push((id, outcome));
}

/// Runs `f` on a helper thread, returning `None` if it doesn't finish
/// within `timeout`. A timed-out unit of work is abandoned, not killed:
/// it keeps running to completion on its own thread, its result simply
/// arrives too late to matter (`spec.md` §4.8, per-building timeout).
fn run_with_timeout<T, F>(timeout: Duration, f: F) -> Option<T>
where
    T: Send + 'static,
    F: FnOnce() -> T + Send + 'static,
{
    let (tx, rx) = bounded(1);
    thread::spawn(move || {
        let _ = tx.send(f());
    });
    rx.recv_timeout(timeout).ok()
}

#[allow(clippy::too_many_arguments)]
pub fn run(
    sources: SourceIndex,
    footprints: Vec<FootprintHandle>,
    reader: Arc<dyn PointCloudReader>,
    writer: Arc<dyn MeshWriter>,
    elevation: Arc<ElevationProvider>,
    config: Arc<Config>,
    target_date: Option<i32>,
    cancel: Arc<AtomicBool>,
) -> super::SchedulerReport {
    let cap = config.queue_capacity;
    let (crop_tx, crop_rx) = bounded::<FootprintHandle>(cap);
    let (recon_tx, recon_rx) = bounded::<BuildingCrop>(cap);
    let (valid_tx, valid_rx) = bounded::<BuildingMesh>(cap);
    let (write_tx, write_rx) = bounded::<BuildingResult>(cap);

    let results: Results = Arc::new(Mutex::new(Vec::with_capacity(footprints.len())));
    let memory_bytes = Arc::new(AtomicUsize::new(0));

    let mut handles = Vec::new();

    for _ in 0..config.crop_workers {
        let crop_rx = crop_rx.clone();
        let recon_tx = recon_tx.clone();
        let sources = sources.clone();
        let reader = reader.clone();
        let config = config.clone();
        let cancel = cancel.clone();
        let memory_bytes = memory_bytes.clone();
        let results = results.clone();
        handles.push(thread::spawn(move || {
            crop_worker(crop_rx, recon_tx, sources, reader, config, target_date, cancel, memory_bytes, results)
        }));
    }
    drop(recon_tx);

    for _ in 0..config.reconstruct_workers {
        let recon_rx = recon_rx.clone();
        let valid_tx = valid_tx.clone();
        let elevation = elevation.clone();
        let config = config.clone();
        let cancel = cancel.clone();
        let memory_bytes = memory_bytes.clone();
        let results = results.clone();
        handles.push(thread::spawn(move || {
            reconstruct_worker(recon_rx, valid_tx, elevation, config, cancel, memory_bytes, results)
        }));
    }
    drop(valid_tx);

    for _ in 0..config.validate_workers {
        let valid_rx = valid_rx.clone();
        let write_tx = write_tx.clone();
        let config = config.clone();
        let cancel = cancel.clone();
        let results = results.clone();
        handles.push(thread::spawn(move || validate_worker(valid_rx, write_tx, config, cancel, results)));
    }
    drop(write_tx);

    // One write worker: `MeshWriter` implementations are free to be
    // internally non-reentrant, and sinks (a file, a GeoPackage
    // transaction) are usually cheaper serialized than fanned out.
    {
        let writer = writer.clone();
        let cancel = cancel.clone();
        let fatal = config.fatal_at_any_building;
        let results = results.clone();
        handles.push(thread::spawn(move || write_worker(write_rx, writer, cancel, fatal, results)));
    }

    for footprint in footprints {
        if cancel.load(Ordering::Relaxed) {
            push(&results, footprint.id.clone(), BuildingOutcome::Cancelled);
            continue;
        }
        if crop_tx.send(footprint).is_err() {
            break;
        }
    }
    drop(crop_tx);

    for handle in handles {
        let _ = handle.join();
    }

    let outcomes = Arc::try_unwrap(results).unwrap().into_inner().unwrap();
    super::SchedulerReport { outcomes }
}

#[allow(clippy::too_many_arguments)]
fn crop_worker(
    crop_rx: Receiver<FootprintHandle>,
    recon_tx: Sender<BuildingCrop>,
    sources: SourceIndex,
    reader: Arc<dyn PointCloudReader>,
    config: Arc<Config>,
    target_date: Option<i32>,
    cancel: Arc<AtomicBool>,
    memory_bytes: Arc<AtomicUsize>,
    results: Results,
) {
    let timeout = Duration::from_secs_f32(config.per_building_timeout_s.max(0.0));
    loop {
        if cancel.load(Ordering::Relaxed) {
            break;
        }
        if memory_bytes.load(Ordering::Relaxed) > config.memory_cap_bytes as usize {
            thread::sleep(MEMORY_BACKOFF);
            continue;
        }
        let footprint = match crop_rx.recv_timeout(POLL_INTERVAL) {
            Ok(f) => f,
            Err(RecvTimeoutError::Timeout) => continue,
            Err(RecvTimeoutError::Disconnected) => break,
        };
        let id = footprint.id.clone();
        if cancel.load(Ordering::Relaxed) {
            push(&results, id, BuildingOutcome::Cancelled);
            continue;
        }

        let outcome = run_with_timeout(timeout, {
            let sources = sources.clone();
            let reader = reader.clone();
            let config = config.clone();
            move || crop::crop_building(&sources, reader.as_ref(), &footprint, target_date, &config)
        });

        match outcome {
            Some(Ok(CropOutcome::Cropped(crop))) => {
                memory_bytes.fetch_add(estimate_bytes(&crop), Ordering::Relaxed);
                if recon_tx.send(crop).is_err() {
                    break;
                }
            }
            Some(Ok(CropOutcome::NoData { reason, .. })) => {
                push(&results, id, BuildingOutcome::NoData { reason });
            }
            Some(Err(e)) => {
                push(&results, id, BuildingOutcome::Failed(SchedulerError::Crop(e)));
            }
            None => {
                push(&results, id, BuildingOutcome::Timeout { stage: "crop" });
            }
        }
    }
}

fn reconstruct_worker(
    recon_rx: Receiver<BuildingCrop>,
    valid_tx: Sender<BuildingMesh>,
    elevation: Arc<ElevationProvider>,
    config: Arc<Config>,
    cancel: Arc<AtomicBool>,
    memory_bytes: Arc<AtomicUsize>,
    results: Results,
) {
    let timeout = Duration::from_secs_f32(config.per_building_timeout_s.max(0.0));
    loop {
        let crop = match recon_rx.recv_timeout(POLL_INTERVAL) {
            Ok(c) => c,
            Err(RecvTimeoutError::Timeout) => {
                if cancel.load(Ordering::Relaxed) {
                    break;
                }
                continue;
            }
            Err(RecvTimeoutError::Disconnected) => break,
        };
        let id = crop.footprint.id.clone();
        let freed = estimate_bytes(&crop);

        if cancel.load(Ordering::Relaxed) {
            memory_bytes.fetch_sub(freed, Ordering::Relaxed);
            push(&results, id, BuildingOutcome::Cancelled);
            continue;
        }

        let inner_cancel = cancel.clone();
        let result = run_with_timeout(timeout, {
            let elevation = elevation.clone();
            let config = config.clone();
            move || reconstruct::reconstruct(&crop, &elevation, &config, &inner_cancel)
        });
        memory_bytes.fetch_sub(freed, Ordering::Relaxed);

        match result {
            Some(Some(mesh)) => {
                if valid_tx.send(mesh).is_err() {
                    break;
                }
            }
            Some(None) => push(&results, id, BuildingOutcome::Cancelled),
            None => push(&results, id, BuildingOutcome::Timeout { stage: "reconstruct" }),
        }
    }
}

fn validate_worker(
    valid_rx: Receiver<BuildingMesh>,
    write_tx: Sender<BuildingResult>,
    config: Arc<Config>,
    cancel: Arc<AtomicBool>,
    results: Results,
) {
    let timeout = Duration::from_secs_f32(config.per_building_timeout_s.max(0.0));
    loop {
        let building_mesh = match valid_rx.recv_timeout(POLL_INTERVAL) {
            Ok(m) => m,
            Err(RecvTimeoutError::Timeout) => {
                if cancel.load(Ordering::Relaxed) {
                    break;
                }
                continue;
            }
            Err(RecvTimeoutError::Disconnected) => break,
        };
        let id = building_mesh.footprint.id.clone();
        if cancel.load(Ordering::Relaxed) {
            push(&results, id, BuildingOutcome::Cancelled);
            continue;
        }

        let tol_d2p = config.tol_planarity_d2p as f64;
        let tol_normals = config.tol_planarity_normals as f64;
        let result = run_with_timeout(timeout, {
            let id = id.clone();
            move || validate::validate_mesh(&id, &building_mesh.mesh, tol_d2p, tol_normals)
        });

        match result {
            Some(r) => {
                if write_tx.send(r).is_err() {
                    break;
                }
            }
            None => push(&results, id, BuildingOutcome::Timeout { stage: "validate" }),
        }
    }
}

fn write_worker(
    write_rx: Receiver<BuildingResult>,
    writer: Arc<dyn MeshWriter>,
    cancel: Arc<AtomicBool>,
    fatal_at_any_building: bool,
    results: Results,
) {
    loop {
        let result = match write_rx.recv_timeout(POLL_INTERVAL) {
            Ok(r) => r,
            Err(RecvTimeoutError::Timeout) => {
                if cancel.load(Ordering::Relaxed) {
                    break;
                }
                continue;
            }
            Err(RecvTimeoutError::Disconnected) => break,
        };
        let id = result.footprint_id.clone();
        if cancel.load(Ordering::Relaxed) {
            push(&results, id, BuildingOutcome::Cancelled);
            continue;
        }

        let mut attributes = HashMap::new();
        if !result.is_valid() {
            let joined = result.errors.iter().map(ToString::to_string).collect::<Vec<_>>().join("; ");
            attributes.insert("validation_errors".to_string(), joined);
        }

        match writer.write_mesh(&id, &result.mesh, &attributes) {
            Ok(()) => {
                let invalid = !result.is_valid();
                push(&results, id, BuildingOutcome::Succeeded(result));
                if invalid && fatal_at_any_building {
                    cancel.store(true, Ordering::Relaxed);
                }
            }
            Err(e) => {
                push(&results, id, BuildingOutcome::Failed(SchedulerError::Write(e)));
                if fatal_at_any_building {
                    cancel.store(true, Ordering::Relaxed);
                }
            }
        }
    }
}
