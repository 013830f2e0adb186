//! Atlas Recorder
//!
//! Chunked depth-camera recording plus the packaging pipeline that builds
//! and stages the `atlas_recorder` artifact:
//! - `recipe` / `packaging`: the declarative package recipe, its target OS
//!   guard, external build tool delegation, and artifact staging
//! - `device` / `recorder` / `writer`: the capture engine writing rolling
//!   chunk bundles
//! - `export`: chunk to Matroska muxing via ffmpeg

pub mod cli;
pub mod device;
pub mod export;
pub mod packaging;
pub mod recipe;
pub mod recorder;
pub mod writer;
