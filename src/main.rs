use std::env;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::Result;
use log::{LevelFilter, debug, info, error, warn};
use env_logger::Builder;
use virsequel::cli::{self, Arguments};
use virsequel::config::batch::BatchConfig;
use virsequel::config::defs::{AlignMode, PipelineError, RunConfig};
use virsequel::pipelines::batch::run_batch;
use virsequel::pipelines::virsequel::Virsequel;
use virsequel::utils::command::ProcessRunner;
use virsequel::utils::file::ReadPair;
use virsequel::utils::system::{detect_cores_and_load, detect_ram, thread_oversubscription};


#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let run_start = Instant::now();

    let args = cli::parse();

    let log_level = if args.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    Builder::new()
        .filter_level(log_level)
        .format(|buf, record| {
            writeln!(
                buf,
                "[{}] {}: {}",
                chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
                record.level(),
                record.args()
            )
        })
        .init();

    println!("\n-------------\n Virsequel\n-------------\n");

    let dir = env::current_dir()?;
    info!("The current directory is {:?}", dir);

    let (physical_cores, cpu_load) = detect_cores_and_load().await;
    debug!("Detected {} physical cores; CPU load {}%", physical_cores, cpu_load);
    let (total_ram, available_ram) = detect_ram();
    debug!("Available RAM: {} bytes (~{} GiB)", available_ram, available_ram / 1_073_741_824);
    debug!("Total RAM: {} bytes (~{} GiB)", total_ram, total_ram / 1_073_741_824);

    let result = match &args.config {
        Some(config_path) => batch_run(&args, Path::new(config_path), physical_cores).await,
        None => single_run(&args, physical_cores).await,
    };

    if let Err(e) = result {
        error!("Pipeline failed: {} at {} milliseconds.", e, run_start.elapsed().as_millis());
        std::process::exit(1);
    }

    println!("Run complete: {} milliseconds.", run_start.elapsed().as_millis());
    Ok(())
}


fn required_arg<'a>(value: &'a Option<String>, flag: &str) -> Result<&'a str, PipelineError> {
    value
        .as_deref()
        .ok_or_else(|| PipelineError::MissingConfigField(flag.to_string()))
}


fn warn_threads(threads: usize, physical_cores: usize) {
    if let Some(msg) = thread_oversubscription(threads, physical_cores) {
        warn!("{}", msg);
    }
}


/// Runs one sample given on the command line.
///
/// # Arguments
/// * `args` - Parsed command-line arguments.
/// * `physical_cores` - Detected core count, for the thread warning.
///
/// # Returns
/// Result<(), PipelineError>
async fn single_run(args: &Arguments, physical_cores: usize) -> Result<(), PipelineError> {
    let reads = ReadPair::new(
        PathBuf::from(required_arg(&args.read_1, "--read_1")?),
        PathBuf::from(required_arg(&args.read_2, "--read_2")?),
    );
    let config = RunConfig::new(
        PathBuf::from(required_arg(&args.adapter, "--adapter")?),
        PathBuf::from(required_arg(&args.output, "--output")?),
        args.threads,
        args.database.clone(),
        AlignMode::from_blastn_flag(args.blastn),
        PathBuf::from(&args.log_dir),
    );
    warn_threads(config.threads, physical_cores);

    let runner = ProcessRunner;
    let pipeline = Virsequel::new(reads, &config, &runner)?;
    info!("Logging sample {} to {}", pipeline.paths().sample_id, pipeline.log_path().display());
    let report = pipeline.run_pipeline().await?;

    if report.all_skipped() {
        info!("All stages for {} were already complete", report.sample_id);
    }
    Ok(())
}


/// Runs every sample listed in a batch configuration file.
///
/// # Arguments
/// * `args` - Parsed command-line arguments; fallbacks for optional config fields.
/// * `config_path` - Batch TOML file.
/// * `physical_cores` - Detected core count, for the thread warning.
///
/// # Returns
/// Result<(), PipelineError>
async fn batch_run(args: &Arguments, config_path: &Path, physical_cores: usize) -> Result<(), PipelineError> {
    info!("Reading batch configuration from {}", config_path.display());
    let batch = BatchConfig::from_file(config_path)?;
    batch.validate()?;

    let samples = batch.read_pairs()?;
    let config = batch.run_config(
        args.threads,
        args.database.clone(),
        args.blastn,
        PathBuf::from(&args.log_dir),
    )?;
    warn_threads(config.threads, physical_cores);
    info!("{} samples queued; alignment with {} against {}", samples.len(), config.align_mode.tool(), config.database);

    let runner = ProcessRunner;
    let report = run_batch(&samples, &config, &runner, args.keep_going).await?;
    report.ensure_success()
}
