//! Export module
//!
//! Muxes recorded chunk bundles into Matroska files by piping raw frames
//! into an external ffmpeg process.

pub mod mkv;

pub use mkv::{mux_chunk_to_mkv, ExportError};
