use std::io;
use std::path::PathBuf;
use lazy_static::lazy_static;
use std::collections::HashMap;
use thiserror::Error;

// External software
pub const BBDUK_TAG: &str = "bbduk.sh";
pub const METASPADES_TAG: &str = "metaspades.py";
pub const BLASTN_TAG: &str = "blastn";
pub const DIAMOND_TAG: &str = "diamond";


lazy_static! {
    /// Arguments that make each tool print its version and exit.
    pub static ref TOOL_VERSION_ARGS: HashMap<&'static str, &'static [&'static str]> = {
        let mut m: HashMap<&'static str, &'static [&'static str]> = HashMap::new();
        m.insert(BBDUK_TAG, &["--version"]);
        m.insert(METASPADES_TAG, &["--version"]);
        m.insert(BLASTN_TAG, &["-version"]);
        m.insert(DIAMOND_TAG, &["version"]);
        m
    };
}

// Static Filenames
pub const LOG_DIR: &str = "logs";
pub const LOG_TIMESTAMP_FORMAT: &str = "%Y-%m-%d_%H-%M";
pub const TRIMMED_READS_DIR: &str = "trimmed_reads";
pub const ASSEMBLIES_DIR: &str = "assemblies";
pub const BLAST_RESULTS_DIR: &str = "blast_results";
pub const TRIMMED_SUFFIX: &str = ".trim.fastq.gz";
pub const STATS_SUFFIX: &str = ".stats.txt";
pub const SPADES_SUFFIX: &str = "_spades";
pub const CONTIGS_FILE: &str = "contigs.fasta";
pub const BLASTN_RESULTS_SUFFIX: &str = ".blastn.results";
pub const BLASTX_RESULTS_SUFFIX: &str = ".blastx.results";

// Read naming
pub const FASTQ_EXTS: &[&'static str] = &[".fastq.gz", ".fq.gz", ".fastq", ".fq"];
pub const FASTQ_STEM_EXTS: &[&'static str] = &[".fastq", ".fq"];
pub const R1_TAG: &str = "_R1";
pub const R2_TAG: &str = "_R2";


// Static Parameters

pub const DEFAULT_THREADS: usize = 8;
pub const DEFAULT_NT_DB: &str = "nt";
pub const DEFAULT_NR_DB: &str = "nr";

pub const BBDUK_MAX_HEAP: &str = "-Xmx2g";
pub const BBDUK_KTRIM: &str = "r";
pub const BBDUK_K: usize = 23;
pub const BBDUK_MINK: usize = 11;
pub const BBDUK_HDIST: usize = 1;
pub const BBDUK_QTRIM: &str = "rl";
pub const BBDUK_TRIMQ: usize = 10;
pub const BBDUK_MAQ: usize = 10;
pub const BBDUK_MINLEN: usize = 50;

pub const SPADES_THREADS: usize = 8;
pub const SPADES_MEMORY_GB: usize = 58;
pub const SPADES_KMERS: &[usize] = &[21, 31, 41, 51, 61, 71, 81, 91, 101];

pub const ALIGN_THREADS: usize = 8;
pub const ALIGN_MAX_TARGET_SEQS: usize = 1;
pub const ALIGN_MAX_HSPS: usize = 1;
pub const BLASTN_OUTFMT: &[&'static str] = &[
    "6", "qseqid", "sseqid", "pident", "length", "mismatch", "gapopen", "qstart", "qend",
    "sstart", "send", "evalue", "bitscore", "staxids", "sscinames", "sskingdoms", "stitle",
];
pub const DIAMOND_OUTFMT: &[&'static str] = &[
    "6", "qseqid", "sseqid", "pident", "length", "mismatch", "gapopen", "evalue", "bitscore",
    "staxids", "sscinames", "sphylums", "stitle",
];


/// Which aligner classifies the assembled contigs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AlignMode {
    /// blastn against a nucleotide database.
    Nucleotide,
    /// DIAMOND blastx against a protein database.
    #[default]
    Translated,
}

impl AlignMode {
    pub fn from_blastn_flag(blastn: bool) -> Self {
        if blastn { AlignMode::Nucleotide } else { AlignMode::Translated }
    }

    pub fn tool(&self) -> &'static str {
        match self {
            AlignMode::Nucleotide => BLASTN_TAG,
            AlignMode::Translated => DIAMOND_TAG,
        }
    }

    pub fn default_database(&self) -> &'static str {
        match self {
            AlignMode::Nucleotide => DEFAULT_NT_DB,
            AlignMode::Translated => DEFAULT_NR_DB,
        }
    }
}


/// Settings shared by every sample of a run.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub adapters: PathBuf,
    pub out_dir: PathBuf,
    pub threads: usize,
    pub database: String,
    pub align_mode: AlignMode,
    pub log_dir: PathBuf,
}

impl RunConfig {
    /// Builds a config, falling back to the mode's named reference when no database is given.
    pub fn new(
        adapters: PathBuf,
        out_dir: PathBuf,
        threads: usize,
        database: Option<String>,
        align_mode: AlignMode,
        log_dir: PathBuf,
    ) -> Self {
        let database = database.unwrap_or_else(|| align_mode.default_database().to_string());
        RunConfig {
            adapters,
            out_dir,
            threads,
            database,
            align_mode,
            log_dir,
        }
    }
}


#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Input files must be in fastq format: {path} (expected one of {:?})", FASTQ_EXTS)]
    InvalidReadExtension { path: String },

    #[error("Forward read {0} has no _R1 tag; cannot derive the reverse read")]
    MissingR1Tag(String),

    #[error("Invalid path: {0}")]
    InvalidPath(String),

    #[error("Missing required configuration field: {0}")]
    MissingConfigField(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Failed to spawn {tool}: {error}. Is {tool} installed?")]
    ToolNotFound { tool: String, error: String },

    #[error("{tool} failed with exit code {code:?}")]
    ToolExecution {
        tool: String,
        code: Option<i32>,
        stderr: String,
    },

    #[error("{tool} exited cleanly but did not write {path}")]
    MissingOutput { tool: String, path: String },

    #[error("IO error: {0}")]
    IOError(#[from] io::Error),

    #[error("{failed} of {total} samples failed")]
    BatchFailed { failed: usize, total: usize },
}
