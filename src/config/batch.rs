// src/config/batch.rs: batch-mode configuration file
use std::fs;
use std::path::{Path, PathBuf};
use serde::Deserialize;
use crate::config::defs::{AlignMode, PipelineError, RunConfig};
use crate::utils::file::ReadPair;

/// Contents of a batch configuration file.
///
/// ```toml
/// samples = "sample1_R1.fastq.gz,sample2_R1.fastq.gz"
/// adapters = "adapters.fa"
/// output = "out"
/// reads_dir = "raw"     # optional, prefixed to each sample
/// threads = 16          # optional
/// database = "nr.dmnd"  # optional
/// blastn = false        # optional
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BatchConfig {
    pub samples: Option<String>,
    pub adapters: Option<String>,
    pub output: Option<String>,
    pub reads_dir: Option<String>,
    pub threads: Option<usize>,
    pub database: Option<String>,
    pub blastn: Option<bool>,
}

impl BatchConfig {
    pub fn from_file(path: &Path) -> Result<Self, PipelineError> {
        let contents = fs::read_to_string(path)?;
        Self::parse(&contents)
            .map_err(|e| PipelineError::InvalidConfig(format!("{}: {}", path.display(), e)))
    }

    pub fn parse(contents: &str) -> Result<Self, PipelineError> {
        toml::from_str(contents).map_err(|e| PipelineError::InvalidConfig(e.to_string()))
    }

    /// Checks that every required field is present.
    pub fn validate(&self) -> Result<(), PipelineError> {
        self.sample_names()?;
        required(&self.adapters, "adapters")?;
        required(&self.output, "output")?;
        Ok(())
    }

    /// Comma-separated forward reads, trimmed, empties dropped.
    pub fn sample_names(&self) -> Result<Vec<String>, PipelineError> {
        let raw = required(&self.samples, "samples")?;
        let names: Vec<String> = raw
            .split(',')
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect();
        if names.is_empty() {
            return Err(PipelineError::MissingConfigField("samples".to_string()));
        }
        Ok(names)
    }

    /// Resolves each sample to its read pair. Fails on the first sample lacking an `_R1` tag,
    /// before any sample is processed.
    pub fn read_pairs(&self) -> Result<Vec<ReadPair>, PipelineError> {
        self.sample_names()?
            .into_iter()
            .map(|name| {
                let read_1 = match &self.reads_dir {
                    Some(dir) => Path::new(dir).join(&name),
                    None => PathBuf::from(&name),
                };
                ReadPair::from_forward(read_1)
            })
            .collect()
    }

    /// Builds the run settings; values absent from the file come from the command line.
    ///
    /// # Arguments
    ///
    /// * `threads` - Fallback thread count.
    /// * `database` - Fallback database.
    /// * `blastn` - Fallback alignment mode flag.
    /// * `log_dir` - Directory for per-sample logs.
    ///
    /// # Returns
    /// RunConfig
    pub fn run_config(
        &self,
        threads: usize,
        database: Option<String>,
        blastn: bool,
        log_dir: PathBuf,
    ) -> Result<RunConfig, PipelineError> {
        let adapters = required(&self.adapters, "adapters")?;
        let output = required(&self.output, "output")?;
        let align_mode = AlignMode::from_blastn_flag(self.blastn.unwrap_or(blastn));

        Ok(RunConfig::new(
            PathBuf::from(adapters),
            PathBuf::from(output),
            self.threads.unwrap_or(threads),
            self.database.clone().or(database),
            align_mode,
            log_dir,
        ))
    }
}


fn required<'a>(field: &'a Option<String>, name: &str) -> Result<&'a str, PipelineError> {
    match field.as_deref().map(str::trim) {
        Some(value) if !value.is_empty() => Ok(value),
        _ => Err(PipelineError::MissingConfigField(name.to_string())),
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_config() {
        let config = BatchConfig::parse(
            r#"
            samples = "a_R1.fastq.gz, b_R1.fq ,"
            adapters = "adapters.fa"
            output = "out"
            reads_dir = "raw"
            threads = 4
            blastn = true
            "#,
        )
        .unwrap();
        config.validate().unwrap();

        let pairs = config.read_pairs().unwrap();
        assert_eq!(pairs.len(), 2);
        assert_eq!(pairs[0].read_1, PathBuf::from("raw/a_R1.fastq.gz"));
        assert_eq!(pairs[0].read_2, PathBuf::from("raw/a_R2.fastq.gz"));
        assert_eq!(pairs[1].read_2, PathBuf::from("raw/b_R2.fq"));

        let run = config.run_config(8, None, false, PathBuf::from("logs")).unwrap();
        assert_eq!(run.threads, 4);
        assert_eq!(run.align_mode, AlignMode::Nucleotide);
        assert_eq!(run.database, "nt");
    }

    #[test]
    fn file_database_beats_command_line() {
        let base = "samples = \"a_R1.fq\"\nadapters = \"ad.fa\"\noutput = \"o\"\n";

        let config = BatchConfig::parse(&format!("{}database = \"file_db\"\n", base)).unwrap();
        let run = config.run_config(8, Some("cli_db".to_string()), false, PathBuf::from("logs")).unwrap();
        assert_eq!(run.database, "file_db");

        let config = BatchConfig::parse(base).unwrap();
        let run = config.run_config(8, Some("cli_db".to_string()), false, PathBuf::from("logs")).unwrap();
        assert_eq!(run.database, "cli_db");
        assert_eq!(run.align_mode, AlignMode::Translated);
    }

    #[test]
    fn missing_fields_are_named() {
        let config = BatchConfig::parse("samples = \"a_R1.fq\"\nadapters = \"ad.fa\"\n").unwrap();
        match config.validate() {
            Err(PipelineError::MissingConfigField(field)) => assert_eq!(field, "output"),
            other => panic!("unexpected: {:?}", other),
        }

        let config = BatchConfig::parse("samples = \" , \"\nadapters = \"ad.fa\"\noutput = \"o\"\n").unwrap();
        assert!(matches!(config.validate(), Err(PipelineError::MissingConfigField(f)) if f == "samples"));
    }

    #[test]
    fn sample_without_r1_is_rejected() {
        let config = BatchConfig::parse(
            "samples = \"a_R1.fq,b_1.fq\"\nadapters = \"ad.fa\"\noutput = \"o\"\n",
        )
        .unwrap();
        assert!(matches!(config.read_pairs(), Err(PipelineError::MissingR1Tag(_))));
    }

    #[test]
    fn malformed_toml_is_invalid_config() {
        assert!(matches!(BatchConfig::parse("samples = ["), Err(PipelineError::InvalidConfig(_))));
    }
}
