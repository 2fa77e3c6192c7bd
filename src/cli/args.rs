use clap::Parser;
use crate::config::defs::{DEFAULT_THREADS, LOG_DIR};

#[derive(Parser, Debug, Clone, Default)]
#[command(name = "virsequel", version, about = "Identify viral sequences in RNA-seq data: trim, assemble, classify contigs")]
pub struct Arguments {

    #[arg(short = '1', long = "read_1", required_unless_present = "config", help = "Forward reads (.fastq/.fq, optionally .gz)")]
    pub read_1: Option<String>,

    #[arg(short = '2', long = "read_2", required_unless_present = "config", help = "Reverse reads (.fastq/.fq, optionally .gz)")]
    pub read_2: Option<String>,

    #[arg(short = 'a', long = "adapter", required_unless_present = "config", help = "Adapter reference for bbduk trimming")]
    pub adapter: Option<String>,

    #[arg(short = 'o', long = "output", required_unless_present = "config", help = "Output directory")]
    pub output: Option<String>,

    #[arg(short = 't', long, default_value_t = DEFAULT_THREADS, help = "Threads for bbduk")]
    pub threads: usize,

    #[arg(short = 'd', long = "db", help = "Alignment database. Defaults to nt with --blastn, nr otherwise")]
    pub database: Option<String>,

    #[arg(long, default_value_t = false, help = "Align contigs with blastn instead of DIAMOND blastx")]
    pub blastn: bool,

    #[arg(short = 'c', long, conflicts_with_all = ["read_1", "read_2", "adapter", "output"], help = "Batch mode: TOML file listing samples and run settings")]
    pub config: Option<String>,

    #[arg(long, default_value_t = false, requires = "config", help = "Batch mode: keep processing samples after one fails")]
    pub keep_going: bool,

    #[arg(long, default_value = LOG_DIR, help = "Directory for per-sample log files")]
    pub log_dir: String,

    #[arg(short = 'v', long = "verbose", action)]
    pub verbose: bool,
}
