use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Reconstructs level-of-detail building meshes from lidar point clouds
/// and 2D footprints.
#[derive(Debug, Parser)]
pub struct LodreconOptions {
    /// Verbosity of the command line output.
    #[clap(long, default_value = "info")]
    pub log_level: log::Level,

    #[clap(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Writes a configuration file populated with the default options.
    InitConfig(InitConfigOptions),

    /// Runs the batch reconstruction pipeline over a set of footprints.
    Run(RunOptions),
}

#[derive(Args, Debug)]
pub struct InitConfigOptions {
    /// File the default configuration is written to. The extension
    /// (`.toml` or `.json`) selects the format.
    #[clap(default_value = "lodrecon.json", hide_default_value = true)]
    pub path: PathBuf,
}

#[derive(Args, Debug)]
pub struct RunOptions {
    /// CSV file listing the footprints to reconstruct (columns: id,
    /// force_low_lod, construction_year, ring).
    #[clap(long)]
    pub footprints: PathBuf,

    /// CSV file listing the point-cloud sources to crop against (columns:
    /// name, location, quality, acquisition_year, ground_class,
    /// building_class, force_low_lod, select_only_for_date).
    #[clap(long)]
    pub sources: PathBuf,

    /// Directory the sources' `location` column is resolved against.
    #[clap(long, default_value = ".")]
    pub points_dir: PathBuf,

    /// Directory meshes are written into, one `<footprint-id>.obj` per
    /// building.
    #[clap(long)]
    pub out: PathBuf,

    /// Configuration file (`.toml` or `.json`). Options it doesn't name
    /// keep their defaults.
    #[clap(long)]
    pub config: Option<PathBuf>,

    /// Restricts date-selectable sources to this acquisition year
    /// (`spec.md` §4.4 step 4).
    #[clap(long)]
    pub target_date: Option<i32>,
}
