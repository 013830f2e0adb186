//! atlas-recorder binary entry point

use anyhow::Result;
use atlas_recorder::cli::{Cli, Command, ExportArgs, PackageArgs, RecipeAction, RecordArgs};
use atlas_recorder::device::{self, ColorControls, DeviceConfig, Exposure, Gain};
use atlas_recorder::packaging::{self, PackageOptions, TargetOs};
use atlas_recorder::recipe::{self, Recipe};
use atlas_recorder::recorder::{Recorder, RecordingEvent, RecordingOptions};
use atlas_recorder::{export, writer};
use clap::Parser;
use std::sync::atomic::Ordering;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing/logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "atlas_recorder=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Record(args) => cmd_record(args).await,
        Command::Export(args) => cmd_export(args),
        Command::Package(args) => cmd_package(args),
        Command::Recipe { action } => cmd_recipe(action),
    }
}

async fn cmd_record(args: RecordArgs) -> Result<()> {
    let options = RecordingOptions {
        device_index: args.device,
        base_filename: args.output.clone(),
        output_dir: args.output_dir.clone(),
        max_block_secs: args.block_length,
        record_imu: !args.no_imu,
        controls: ColorControls {
            exposure: args.exposure.map_or(Exposure::Auto, Exposure::Manual),
            gain: args.gain.map_or(Gain::Auto, Gain::Manual),
        },
        config: DeviceConfig {
            camera_fps: args.fps,
            color_resolution: args.color_resolution,
            depth_mode: args.depth_mode,
            wired_sync_mode: args.sync_mode,
        },
    };

    let camera = device::open(args.device, args.simulate)?;
    let recorder = Recorder::new(options);

    // Ctrl-C requests a clean stop; the engine flushes the current chunk.
    let stop = recorder.stop_handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Stopping recording...");
            stop.store(true, Ordering::SeqCst);
        }
    });

    let mut events = recorder.subscribe();
    tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            match event {
                RecordingEvent::Started => {
                    tracing::info!("Press Ctrl-C to stop recording");
                }
                RecordingEvent::ChunkCreated(name) => tracing::info!("Created file: {}", name),
                RecordingEvent::ChunkSaved(name) => tracing::info!("Saved {}", name),
                RecordingEvent::Error(message) => tracing::error!("{}", message),
                RecordingEvent::Stopped => {}
            }
        }
    });

    let summary = recorder.run(camera).await?;
    println!("{}", serde_json::to_string_pretty(&summary)?);

    Ok(())
}

fn cmd_export(args: ExportArgs) -> Result<()> {
    let output = args
        .output
        .unwrap_or_else(|| args.chunk.with_extension("mkv"));

    let meta = writer::read_meta(&args.chunk)?;
    tracing::info!(
        "Exporting chunk {} of recording {}",
        meta.chunk_index,
        meta.recording_id
    );

    export::mux_chunk_to_mkv(&args.chunk, &output)?;
    println!("{}", output.display());

    Ok(())
}

fn cmd_package(args: PackageArgs) -> Result<()> {
    let recipe = recipe::load_or_builtin(args.recipe.as_deref())?;

    let options = PackageOptions {
        source_dir: args.source_dir,
        build_dir: args.build_dir,
        install_dir: args.install_dir,
        package_root: args.package_root,
        stage_dir: args.stage_dir,
        target_os: args
            .target_os
            .as_deref()
            .map_or_else(TargetOs::host, TargetOs::from),
    };

    let report = packaging::package(&recipe, &options)?;
    println!("{}", serde_json::to_string_pretty(&report)?);

    Ok(())
}

fn cmd_recipe(action: RecipeAction) -> Result<()> {
    match action {
        RecipeAction::Show { recipe: path } => {
            let recipe = recipe::load_or_builtin(path.as_deref())?;
            print!("{}", toml::to_string_pretty(&recipe)?);
        }
        RecipeAction::Init { path } => {
            recipe::write_recipe(&Recipe::atlas_recorder(), &path)?;
            tracing::info!("Wrote {}", path.display());
        }
    }
    Ok(())
}
