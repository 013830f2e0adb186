//! Command-line interface definitions

use crate::device::{ColorResolution, DepthMode, FramesPerSecond, WiredSyncMode};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "atlas-recorder",
    version,
    about = "Chunked depth-camera recorder and packaging pipeline"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Record depth/color/IMU streams into rolling chunk files
    Record(RecordArgs),

    /// Export a recorded chunk to a Matroska file
    Export(ExportArgs),

    /// Run the packaging pipeline (guard, build, install, stage)
    Package(PackageArgs),

    /// Inspect or scaffold the package recipe
    Recipe {
        #[command(subcommand)]
        action: RecipeAction,
    },
}

#[derive(Args)]
pub struct RecordArgs {
    /// Device index to open
    #[arg(long, default_value_t = 0)]
    pub device: u8,

    /// Base chunk file name; the chunk counter is spliced in before the
    /// extension
    #[arg(long, default_value = "capture.rec")]
    pub output: String,

    /// Directory chunks are written into
    #[arg(long, default_value = ".")]
    pub output_dir: PathBuf,

    /// Maximum chunk length in seconds
    #[arg(long, default_value_t = 300)]
    pub block_length: u64,

    /// Disable the IMU track
    #[arg(long)]
    pub no_imu: bool,

    /// Camera frame rate
    #[arg(long, value_enum, default_value = "30")]
    pub fps: FramesPerSecond,

    /// Manual exposure in microseconds (auto when omitted)
    #[arg(long)]
    pub exposure: Option<i32>,

    /// Manual sensor gain (auto when omitted)
    #[arg(long)]
    pub gain: Option<i32>,

    /// Color camera resolution
    #[arg(long, value_enum, default_value = "r1080p")]
    pub color_resolution: ColorResolution,

    /// Depth sensor mode
    #[arg(long, value_enum, default_value = "nfov-unbinned")]
    pub depth_mode: DepthMode,

    /// External synchronization mode
    #[arg(long, value_enum, default_value = "standalone")]
    pub sync_mode: WiredSyncMode,

    /// Use the simulated camera backend
    #[arg(long)]
    pub simulate: bool,
}

#[derive(Args)]
pub struct ExportArgs {
    /// Chunk directory to mux
    pub chunk: PathBuf,

    /// Output file (defaults to the chunk name with an .mkv extension)
    #[arg(long)]
    pub output: Option<PathBuf>,
}

#[derive(Args)]
pub struct PackageArgs {
    /// Recipe file (defaults to the built-in atlas_recorder recipe)
    #[arg(long)]
    pub recipe: Option<PathBuf>,

    /// Directory holding the exported sources
    #[arg(long, default_value = ".")]
    pub source_dir: PathBuf,

    /// Out-of-tree build directory
    #[arg(long, default_value = "build")]
    pub build_dir: PathBuf,

    /// Install prefix handed to the build tool
    #[arg(long, default_value = "install")]
    pub install_dir: PathBuf,

    /// Root under which dependency packages were unpacked
    #[arg(long, default_value = "packages")]
    pub package_root: PathBuf,

    /// Root of the consumer-visible staging layout
    #[arg(long, default_value = "stage")]
    pub stage_dir: PathBuf,

    /// Target OS override (defaults to the host OS)
    #[arg(long)]
    pub target_os: Option<String>,
}

#[derive(Subcommand)]
pub enum RecipeAction {
    /// Print the effective recipe as TOML
    Show {
        /// Recipe file (defaults to the built-in recipe)
        #[arg(long)]
        recipe: Option<PathBuf>,
    },

    /// Write the built-in recipe to a file
    Init {
        /// Destination path
        #[arg(long, default_value = "recipe.toml")]
        path: PathBuf,
    },
}
