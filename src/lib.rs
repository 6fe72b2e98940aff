//! Footprint placement and pin numbering for test-pad boards.
//!
//! This crate places footprints (ordered pad templates) onto a two-sided
//! board, generates anchor-defined pad grids, merges new pins into existing
//! components and keeps the placed pads in a channel-keyed store with
//! snapshot undo/redo.
//!
//! The binary `padplace` exposes grid generation and placement as JSON.

pub mod config;
pub mod duplicate;
pub mod editor;
pub mod error;
pub mod geometry;
pub mod grid;
pub mod model;
pub mod normalize;
pub mod pad_code;
pub mod parts;

pub use error::{Error, Result};
