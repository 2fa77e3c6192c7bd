// src/utils/logging.rs: per-sample log file
use std::fs::{self, File, OpenOptions};
use std::io::{LineWriter, Write};
use std::path::{Path, PathBuf};
use log::Level;
use crate::config::defs::{PipelineError, LOG_TIMESTAMP_FORMAT};


/// Log sink for one sample's run, handed to every stage.
///
/// Lines go to `{log_dir}/{timestamp}.{sample_id}.log` and are echoed to the console logger.
/// The file is flushed by `close`, or on drop when a stage bails out early.
pub struct SampleLog {
    sample_id: String,
    path: PathBuf,
    writer: LineWriter<File>,
}

impl SampleLog {
    /// Opens (or appends to) the sample's log file, creating `log_dir` if needed.
    ///
    /// # Arguments
    ///
    /// * `log_dir` - Directory holding the logs.
    /// * `sample_id` - Sample the log belongs to.
    ///
    /// # Returns
    /// SampleLog
    pub fn open(log_dir: &Path, sample_id: &str) -> Result<Self, PipelineError> {
        fs::create_dir_all(log_dir)?;
        let timestamp = chrono::Local::now().format(LOG_TIMESTAMP_FORMAT);
        let path = log_dir.join(format!("{}.{}.log", timestamp, sample_id));
        let file = OpenOptions::new().create(true).append(true).open(&path)?;

        Ok(SampleLog {
            sample_id: sample_id.to_string(),
            path,
            writer: LineWriter::new(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn info(&mut self, msg: impl AsRef<str>) {
        self.write_line(Level::Info, msg.as_ref());
    }

    pub fn error(&mut self, msg: impl AsRef<str>) {
        self.write_line(Level::Error, msg.as_ref());
    }

    fn write_line(&mut self, level: Level, msg: &str) {
        log::log!(level, "[{}] {}", self.sample_id, msg);

        let now = chrono::Local::now().format("%Y-%m-%d %H:%M:%S,%3f");
        if let Err(e) = writeln!(self.writer, "{} - {} - {}", now, level.as_str().to_uppercase(), msg) {
            log::warn!("Failed to write to {}: {}", self.path.display(), e);
        }
    }

    /// Flushes and closes the log.
    pub fn close(mut self) -> Result<(), PipelineError> {
        self.writer.flush()?;
        Ok(())
    }
}

impl Drop for SampleLog {
    fn drop(&mut self) {
        let _ = self.writer.flush();
    }
}
