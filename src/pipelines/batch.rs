use log::{error, info};
use crate::config::defs::{PipelineError, RunConfig};
use crate::pipelines::virsequel::{PipelineReport, Virsequel};
use crate::utils::command::ToolRunner;
use crate::utils::file::ReadPair;


#[derive(Debug, Default)]
pub struct BatchReport {
    pub completed: Vec<PipelineReport>,
    /// (forward read, error) for each sample that failed.
    pub failed: Vec<(String, String)>,
}

impl BatchReport {
    pub fn total(&self) -> usize {
        self.completed.len() + self.failed.len()
    }

    /// Err(BatchFailed) if any sample failed.
    pub fn ensure_success(&self) -> Result<(), PipelineError> {
        if self.failed.is_empty() {
            Ok(())
        } else {
            Err(PipelineError::BatchFailed {
                failed: self.failed.len(),
                total: self.total(),
            })
        }
    }
}


/// Runs the pipeline for each sample in turn.
///
/// # Arguments
///
/// * `samples` - Read pairs, processed in order.
/// * `config` - Run settings shared by all samples.
/// * `runner` - Executes the external tools.
/// * `keep_going` - Record a failing sample and move on instead of aborting the batch.
///
/// # Returns
/// BatchReport; without `keep_going` the first sample error is returned instead.
pub async fn run_batch<R: ToolRunner>(
    samples: &[ReadPair],
    config: &RunConfig,
    runner: &R,
    keep_going: bool,
) -> Result<BatchReport, PipelineError> {
    let total = samples.len();
    let mut report = BatchReport::default();

    for (i, reads) in samples.iter().enumerate() {
        info!("Sample {} of {}: {}", i + 1, total, reads.read_1.display());

        let outcome = match Virsequel::new(reads.clone(), config, runner) {
            Ok(pipeline) => pipeline.run_pipeline().await,
            Err(e) => Err(e),
        };

        match outcome {
            Ok(sample_report) => report.completed.push(sample_report),
            Err(e) if keep_going => {
                error!("Sample {} failed: {}. Continuing with the next sample.", reads.read_1.display(), e);
                report.failed.push((reads.read_1.display().to_string(), e.to_string()));
            }
            Err(e) => return Err(e),
        }
    }

    if report.failed.is_empty() {
        info!("All {} samples finished", total);
    } else {
        error!("{} of {} samples failed:", report.failed.len(), total);
        for (sample, err) in &report.failed {
            error!("  {}: {}", sample, err);
        }
    }
    Ok(report)
}
