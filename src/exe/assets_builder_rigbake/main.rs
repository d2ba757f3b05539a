mod core;

use crate::core::{output_path, run_batch, BakeJob, ScanSources};
use assets_rigbake::{AnimationFile, DecodeError, ModelFile, ModelFlags};
use bake_rigbake::{BakeConfig, BakeMode};
use clap::{Parser, Subcommand};
use nab_rigbake::app::{set_panic_hook, AppRun, ExitReason};
use nab_rigbake::TomlWrite;
use std::error::Error;
use std::fs::{self, File};
use std::io::BufReader;
use std::path::{Path, PathBuf};

#[derive(Debug, Subcommand)]
pub enum CliCommands
{
    #[clap(about = "Bake every importable file in a directory")]
    Bake
    {
        #[arg(long, value_enum, default_value_t)]
        mode: BakeMode,

        #[arg(long, default_value = "import")]
        input: PathBuf,

        #[arg(long, default_value = "export")]
        output: PathBuf,

        /// TOML overrides on top of the mode's preset
        #[arg(long)]
        config: Option<PathBuf>,

        /// Worker threads, defaults to the available parallelism
        #[arg(long)]
        jobs: Option<usize>,
    },
    #[clap(about = "Print a summary of baked files")]
    Inspect
    {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    #[clap(about = "Print the default config of a mode")]
    Config
    {
        #[arg(long, value_enum, default_value_t)]
        mode: BakeMode,
    },
}

#[derive(Debug, Parser)]
struct CliArgs
{
    #[command(subcommand)]
    command: CliCommands,
}

fn load_config(mode: BakeMode, path: Option<&Path>) -> Result<BakeConfig, Box<dyn Error>>
{
    let preset = BakeConfig::preset(mode);
    match path
    {
        None => Ok(preset),
        Some(p) =>
        {
            let mut fin = File::open(p)?;
            BakeConfig::load_over(&preset, &mut fin)
        }
    }
}

fn bake(mode: BakeMode, input: &Path, output: &Path, config: Option<&Path>, jobs: Option<usize>) -> Result<ExitReason, Box<dyn Error>>
{
    let config = load_config(mode, config)?;
    log::debug!("Bake config: {config:?}");
    fs::create_dir_all(output)?;

    let mut bake_jobs = Vec::new();
    let mut failed_scans = 0;
    for source in ScanSources::new(input)?
    {
        match source
        {
            Ok(source) => bake_jobs.push(BakeJob
            {
                destination: output_path(output, &source),
                source,
            }),
            Err(err) =>
            {
                log::error!("Failed to scan {input:?}: {err}");
                failed_scans += 1;
            }
        }
    }
    if bake_jobs.is_empty()
    {
        log::warn!("No importable files in {input:?}");
    }

    let worker_count = jobs.unwrap_or_else(|| std::thread::available_parallelism().map_or(1, |n| n.get()));
    let summary = run_batch(bake_jobs, mode, config, worker_count)?;
    log::info!("Baked {} files, {} with nothing to write, {} failed, {} issues",
        summary.written,
        summary.skipped,
        summary.failed + failed_scans,
        summary.issues);

    Ok(match summary.failed + failed_scans
    {
        0 => ExitReason::NormalExit,
        _ => ExitReason::PartialFailure,
    })
}

fn inspect(path: &Path) -> Result<(), Box<dyn Error>>
{
    let mut magic = [0u8; 4];
    {
        use std::io::Read;
        File::open(path)?.read_exact(&mut magic)?;
    }
    let mut fin = BufReader::new(File::open(path)?);

    if magic == ModelFile::MAGIC
    {
        let model = ModelFile::decode(&mut fin)?;
        println!("{path:?}: model v{} flags={:#x}{}{}{}",
            model.version,
            model.flags.0,
            if model.flags.contains(ModelFlags::HAS_SKELETON) { " skeleton" } else { "" },
            if model.flags.contains(ModelFlags::SKINNED) { " skinned" } else { "" },
            if model.flags.contains(ModelFlags::MIRRORED) { " mirrored" } else { "" });
        for (i, bone) in model.bones.iter().enumerate()
        {
            println!("  bone {i} {:?} parent={}", bone.name, bone.parent_index);
        }
        for (i, material) in model.materials.iter().enumerate()
        {
            println!("  material {i} {:?} diffuse={:?} normal={:?}", material.name, material.diffuse_texture_name, material.normal_texture_name);
        }
        for sub_mesh in &model.sub_meshes
        {
            println!("  sub-mesh {:?} material={} vertices={} triangles={}",
                sub_mesh.mesh_name,
                sub_mesh.material_index,
                sub_mesh.vertices.len(),
                sub_mesh.indices.len() / 3);
        }
    }
    else if magic == AnimationFile::MAGIC
    {
        let clip = AnimationFile::decode(&mut fin)?;
        println!("{path:?}: clip {:?} v{} duration={}", clip.clip_name, clip.version, clip.duration);
        for track in &clip.tracks
        {
            println!("  track {:?} keys={} end={}",
                track.bone_name,
                track.keys.len(),
                track.keys.last().map(|k| k.time).unwrap_or_default());
        }
    }
    else
    {
        return Err(Box::new(DecodeError::BadMagic { expected: ModelFile::MAGIC, found: magic }));
    }
    Ok(())
}

fn main() -> ExitReason
{
    let app_run = AppRun::<CliArgs>::startup("Rig Baker", env!("CARGO_PKG_VERSION"));
    set_panic_hook(false);

    let exit_reason = match &app_run.args.command
    {
        CliCommands::Bake { mode, input, output, config, jobs } =>
        {
            match bake(*mode, input, output, config.as_deref(), *jobs)
            {
                Ok(reason) => reason,
                Err(err) =>
                {
                    log::error!("Bake failed: {err}");
                    ExitReason::InvalidArgs
                }
            }
        }
        CliCommands::Inspect { files } =>
        {
            let mut reason = ExitReason::NormalExit;
            for file in files
            {
                if let Err(err) = inspect(file)
                {
                    log::error!("Failed to inspect {file:?}: {err}");
                    reason = ExitReason::PartialFailure;
                }
            }
            reason
        }
        CliCommands::Config { mode } =>
        {
            let mut stdout = std::io::stdout();
            match BakeConfig::preset(*mode).save(true, &mut stdout)
            {
                Ok(()) => ExitReason::NormalExit,
                Err(err) =>
                {
                    log::error!("Failed to write config: {err}");
                    ExitReason::InvalidArgs
                }
            }
        }
    };

    app_run.set_exit_reason(exit_reason);
    exit_reason
}
