use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use crate::config::defs::{PipelineError, RunConfig, BBDUK_TAG, METASPADES_TAG};
use crate::utils::command::{check_outputs, generate_cli, ToolCommand, ToolRunner};
use crate::utils::file::{validate_fastq_extension, ReadPair, SamplePaths};
use crate::utils::logging::SampleLog;


#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Trimming,
    Assembly,
    Alignment,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Trimming => "trimming",
            Stage::Assembly => "assembly",
            Stage::Alignment => "alignment",
        };
        write!(f, "{}", name)
    }
}

/// How a stage was satisfied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageOutcome {
    /// The tool ran and produced its outputs.
    Completed,
    /// The stage's output already existed; nothing was run.
    Skipped,
}

#[derive(Debug, Clone)]
pub struct PipelineReport {
    pub sample_id: String,
    pub trimming: StageOutcome,
    pub assembly: StageOutcome,
    pub alignment: StageOutcome,
    pub log_path: PathBuf,
}

impl PipelineReport {
    pub fn all_skipped(&self) -> bool {
        [self.trimming, self.assembly, self.alignment]
            .iter()
            .all(|outcome| *outcome == StageOutcome::Skipped)
    }
}


/// Trim -> assemble -> align driver for one sample.
pub struct Virsequel<'a, R: ToolRunner> {
    config: &'a RunConfig,
    runner: &'a R,
    paths: SamplePaths,
    log: SampleLog,
}

impl<'a, R: ToolRunner> Virsequel<'a, R> {
    /// Resolves the sample's paths and opens its log.
    ///
    /// # Arguments
    ///
    /// * `reads` - Forward and reverse reads.
    /// * `config` - Run settings.
    /// * `runner` - Executes the external tools.
    ///
    /// # Returns
    /// Virsequel ready to run.
    pub fn new(reads: ReadPair, config: &'a RunConfig, runner: &'a R) -> Result<Self, PipelineError> {
        let paths = SamplePaths::new(&reads, &config.out_dir)?;
        let log = SampleLog::open(&config.log_dir, &paths.sample_id)?;
        Ok(Virsequel {
            config,
            runner,
            paths,
            log,
        })
    }

    pub fn paths(&self) -> &SamplePaths {
        &self.paths
    }

    pub fn log_path(&self) -> &Path {
        self.log.path()
    }

    /// Adapter and quality trimming with bbduk.
    /// Both reads must carry a FASTQ extension; nothing is run otherwise.
    pub async fn trimming(&mut self) -> Result<StageOutcome, PipelineError> {
        for read in [&self.paths.reads.read_1, &self.paths.reads.read_2] {
            if let Err(e) = validate_fastq_extension(read) {
                self.log.error(format!("Error: input files must be in fastq format: {}", read.display()));
                return Err(e);
            }
        }

        fs::create_dir_all(&self.paths.trim_dir)?;
        self.log.info(format!(
            "Trimming sample {} with bbduk and saving files to {}",
            self.paths.sample_id,
            self.paths.trim_dir.display()
        ));

        let command = generate_cli(BBDUK_TAG, self.config, &self.paths)?;
        let done = self.paths.trimmed_1.clone();
        self.run_stage(Stage::Trimming, command, &done).await
    }

    /// metaSPAdes assembly of the trimmed reads.
    pub async fn assembly(&mut self) -> Result<StageOutcome, PipelineError> {
        fs::create_dir_all(&self.paths.assembly_dir)?;
        self.log.info(format!(
            "Assembling sample {} with metaspades and saving files to {}",
            self.paths.sample_id,
            self.paths.assembly_dir.display()
        ));

        let command = generate_cli(METASPADES_TAG, self.config, &self.paths)?;
        let done = self.paths.contigs.clone();
        self.run_stage(Stage::Assembly, command, &done).await
    }

    /// Classifies the contigs with blastn or DIAMOND blastx, per the run's alignment mode.
    pub async fn blast(&mut self) -> Result<StageOutcome, PipelineError> {
        let tool = self.config.align_mode.tool();
        fs::create_dir_all(&self.paths.blast_dir)?;
        self.log.info(format!(
            "Aligning contigs of sample {} with {} against {} and saving results to {}",
            self.paths.sample_id,
            tool,
            self.config.database,
            self.paths.blast_dir.display()
        ));

        let command = generate_cli(tool, self.config, &self.paths)?;
        let done = self.paths.blast_results(self.config.align_mode).to_path_buf();
        self.run_stage(Stage::Alignment, command, &done).await
    }

    async fn run_stage(
        &mut self,
        stage: Stage,
        command: ToolCommand,
        done: &Path,
    ) -> Result<StageOutcome, PipelineError> {
        if done.is_file() {
            self.log.info(format!(
                "{} output for {} already exists ({}). Skipping.",
                stage,
                self.paths.sample_id,
                done.display()
            ));
            return Ok(StageOutcome::Skipped);
        }

        let runner = self.runner;
        match runner.presence_check(command.tool).await {
            Ok(version) => self.log.info(format!("Found {}: {}", command.tool, version)),
            Err(e) => {
                self.log.error(e.to_string());
                return Err(e);
            }
        }

        self.log.info(format!("Running command: {}", command));
        match runner.run(&command).await {
            Ok(output) => {
                if !output.stdout.is_empty() {
                    log::debug!("{} stdout:\n{}", command.tool, output.stdout);
                }
                if !output.stderr.is_empty() {
                    log::debug!("{} stderr:\n{}", command.tool, output.stderr);
                }
            }
            Err(e) => {
                self.log.error(format!("Error while running command: {}", command));
                match &e {
                    PipelineError::ToolExecution { stderr, .. } => {
                        self.log.error(format!("Error message: {}", stderr.trim_end()))
                    }
                    other => self.log.error(format!("Error message: {}", other)),
                }
                return Err(e);
            }
        }

        if let Err(e) = check_outputs(&command) {
            self.log.error(e.to_string());
            return Err(e);
        }

        self.log.info(format!("Finished {} for sample {}", stage, self.paths.sample_id));
        Ok(StageOutcome::Completed)
    }

    async fn run_stages(&mut self) -> Result<(StageOutcome, StageOutcome, StageOutcome), PipelineError> {
        let trimming = self.trimming().await?;
        let assembly = self.assembly().await?;
        let alignment = self.blast().await?;
        Ok((trimming, assembly, alignment))
    }

    /// Runs trimming, assembly and alignment in order. The first failure ends the sample's run;
    /// outputs of finished stages stay on disk and are skipped next time.
    pub async fn run_pipeline(mut self) -> Result<PipelineReport, PipelineError> {
        self.log.info(format!(
            "Starting pipeline for sample {} (R1: {}, R2: {}, output: {})",
            self.paths.sample_id,
            self.paths.reads.read_1.display(),
            self.paths.reads.read_2.display(),
            self.config.out_dir.display()
        ));

        match self.run_stages().await {
            Ok((trimming, assembly, alignment)) => {
                self.log.info(format!("Pipeline finished for sample {}", self.paths.sample_id));
                let Virsequel { paths, log, .. } = self;
                let log_path = log.path().to_path_buf();
                log.close()?;
                Ok(PipelineReport {
                    sample_id: paths.sample_id,
                    trimming,
                    assembly,
                    alignment,
                    log_path,
                })
            }
            Err(e) => {
                self.log.error(format!("Pipeline failed for sample {}: {}", self.paths.sample_id, e));
                Err(e)
            }
        }
    }
}
