#![deny(unused_must_use)]

mod adapters;
mod cli;
mod config_io;

use crate::cli::{Command, LodreconOptions, RunOptions};
use clap::Parser;
use human_panic::setup_panic;
use lodrecon_common::elevation::ElevationProvider;
use lodrecon_common::io::{FootprintReader, MeshWriter, PointCloudReader};
use lodrecon_common::scheduler::{self, BuildingOutcome};
use std::process::ExitCode;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

fn main() -> ExitCode {
    setup_panic!();
    let args = LodreconOptions::parse();
    // unwrap: will only fail if the logger is already initialized, which it clearly is not
    simple_logger::init_with_level(args.log_level).unwrap();

    let code = match args.command {
        Command::InitConfig(opts) => match config_io::write_default(&opts.path) {
            Ok(()) => {
                log::info!("wrote default configuration to {}", opts.path.display());
                0
            }
            Err(e) => {
                log::error!("{e:#}");
                2
            }
        },
        Command::Run(opts) => run(opts),
    };
    ExitCode::from(code)
}

fn run(opts: RunOptions) -> u8 {
    let config = match config_io::load(opts.config.as_deref()) {
        Ok(c) => c,
        Err(e) => {
            log::error!("invalid configuration: {e:#}");
            return 2;
        }
    };
    if let Err(e) = config.validate() {
        log::error!("invalid configuration: {e}");
        return 2;
    }

    let sources = match adapters::csv_adapter::read_sources(&opts.sources) {
        Ok(s) => s,
        Err(e) => {
            log::error!("failed to read sources: {e}");
            return 3;
        }
    };
    let footprint_reader = adapters::csv_adapter::CsvFootprintReader::new(opts.footprints.clone());
    let footprints = match footprint_reader.read_footprints() {
        Ok(f) => f,
        Err(e) => {
            log::error!("failed to read footprints: {e}");
            return 3;
        }
    };
    if let Err(e) = std::fs::create_dir_all(&opts.out) {
        log::error!("failed to create output directory {}: {e}", opts.out.display());
        return 3;
    }

    log::info!("loaded {} source(s) and {} footprint(s)", sources.len(), footprints.len());

    let ground_samples = adapters::csv_adapter::collect_ground_samples(&sources, &opts.points_dir);
    let elevation = Arc::new(ElevationProvider::interpolated(&ground_samples));

    let reader: Arc<dyn PointCloudReader> = Arc::new(adapters::csv_adapter::CsvPointCloudReader::new(opts.points_dir.clone()));
    let writer: Arc<dyn MeshWriter> = Arc::new(adapters::obj_adapter::ObjMeshWriter::new(opts.out.clone()));
    let cancel = Arc::new(AtomicBool::new(false));

    let report = scheduler::run_batch(
        Arc::new(sources),
        footprints.into_iter().map(Arc::new).collect(),
        reader,
        writer,
        elevation,
        Arc::new(config),
        opts.target_date,
        cancel,
    );

    let mut failed = 0;
    let mut no_data = 0;
    let mut succeeded = 0;
    for (id, outcome) in &report.outcomes {
        match outcome {
            BuildingOutcome::Succeeded(r) if r.is_valid() => {
                succeeded += 1;
                log::info!("{id}: reconstructed");
            }
            BuildingOutcome::Succeeded(r) => {
                succeeded += 1;
                log::warn!("{id}: reconstructed with {} validation error(s)", r.errors.len());
            }
            BuildingOutcome::NoData { reason } => {
                no_data += 1;
                log::warn!("{id}: no usable coverage ({reason})");
            }
            BuildingOutcome::Timeout { stage } => {
                failed += 1;
                log::error!("{id}: timed out in the {stage} stage");
            }
            BuildingOutcome::Cancelled => {
                log::warn!("{id}: cancelled");
            }
            BuildingOutcome::Failed(e) => {
                failed += 1;
                log::error!("{id}: {e}");
            }
        }
    }
    log::info!("{succeeded} succeeded, {no_data} with no data, {failed} failed, out of {} total", report.outcomes.len());

    report.exit_code() as u8
}
