#![deny(unused_must_use)]

pub mod config;
pub mod crop;
pub mod elevation;
pub mod error;
pub mod footprint;
pub mod geometry;
pub mod io;
pub mod model;
pub mod point_in_polygon;
pub mod reconstruct;
pub mod scheduler;
pub mod source;
pub mod spatial_index;
pub mod validate;

pub use nalgebra;
