use std::path::{Path, PathBuf};
use crate::config::defs::{
    AlignMode, PipelineError, ASSEMBLIES_DIR, BLASTN_RESULTS_SUFFIX, BLASTX_RESULTS_SUFFIX,
    BLAST_RESULTS_DIR, CONTIGS_FILE, FASTQ_EXTS, FASTQ_STEM_EXTS, R1_TAG, R2_TAG, SPADES_SUFFIX,
    STATS_SUFFIX, TRIMMED_READS_DIR, TRIMMED_SUFFIX,
};


/// Forward and reverse reads of one paired-end sample.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadPair {
    pub read_1: PathBuf,
    pub read_2: PathBuf,
}

impl ReadPair {
    pub fn new(read_1: PathBuf, read_2: PathBuf) -> Self {
        ReadPair { read_1, read_2 }
    }

    /// Pairs a forward read with the reverse read named by the `_R1` -> `_R2` convention.
    pub fn from_forward(read_1: PathBuf) -> Result<Self, PipelineError> {
        let read_2 = reverse_read_path(&read_1)?;
        Ok(ReadPair { read_1, read_2 })
    }
}


fn file_name_str(path: &Path) -> Result<&str, PipelineError> {
    path.file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| PipelineError::InvalidPath(path.display().to_string()))
}


/// True when the path ends in one of the accepted FASTQ extensions.
pub fn has_fastq_extension(path: &Path) -> bool {
    match path.to_str() {
        Some(p) => FASTQ_EXTS.iter().any(|ext| p.ends_with(ext)),
        None => false,
    }
}


/// Rejects reads that are not FASTQ or gzipped FASTQ.
///
/// # Arguments
///
/// * `path` - Read file to check.
///
/// # Returns
/// Result<()>; InvalidReadExtension when the extension is not recognized.
pub fn validate_fastq_extension(path: &Path) -> Result<(), PipelineError> {
    if has_fastq_extension(path) {
        Ok(())
    } else {
        Err(PipelineError::InvalidReadExtension {
            path: path.display().to_string(),
        })
    }
}


/// Removes a recognized FASTQ extension from a file name.
/// Names without one lose only their final extension.
pub fn strip_fastq_extension(file_name: &str) -> &str {
    for ext in FASTQ_EXTS {
        if let Some(stem) = file_name.strip_suffix(ext) {
            return stem;
        }
    }
    match file_name.rfind('.') {
        Some(idx) if idx > 0 => &file_name[..idx],
        _ => file_name,
    }
}


/// Derives the sample identifier from the forward read.
///
/// The final extension is dropped, then any `.fastq` / `.fq` remnant, then a trailing `_R1`.
/// `sample1_R1.fastq.gz` becomes `sample1`.
///
/// # Arguments
///
/// * `read_1` - Forward read path.
///
/// # Returns
/// Result<String> sample identifier.
pub fn sample_id(read_1: &Path) -> Result<String, PipelineError> {
    let stem = read_1
        .file_stem()
        .and_then(|stem| stem.to_str())
        .ok_or_else(|| PipelineError::InvalidPath(read_1.display().to_string()))?;

    let mut id = stem;
    for ext in FASTQ_STEM_EXTS {
        if let Some(trimmed) = id.strip_suffix(ext) {
            id = trimmed;
            break;
        }
    }
    let id = id.strip_suffix(R1_TAG).unwrap_or(id);

    if id.is_empty() {
        return Err(PipelineError::InvalidPath(format!(
            "{} does not yield a sample name",
            read_1.display()
        )));
    }
    Ok(id.to_string())
}


/// Builds the reverse read path by replacing the last `_R1` in the file name with `_R2`.
///
/// # Arguments
///
/// * `read_1` - Forward read path.
///
/// # Returns
/// Result<PathBuf>; MissingR1Tag if the file name carries no `_R1`.
pub fn reverse_read_path(read_1: &Path) -> Result<PathBuf, PipelineError> {
    let file_name = file_name_str(read_1)?;
    let idx = file_name
        .rfind(R1_TAG)
        .ok_or_else(|| PipelineError::MissingR1Tag(read_1.display().to_string()))?;

    let mut reverse = String::with_capacity(file_name.len());
    reverse.push_str(&file_name[..idx]);
    reverse.push_str(R2_TAG);
    reverse.push_str(&file_name[idx + R1_TAG.len()..]);
    Ok(read_1.with_file_name(reverse))
}


/// Every file a sample's stages read or write, derived once from `(read_1, read_2, out_dir)`.
/// A stage's inputs are the previous stage's outputs taken from this table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SamplePaths {
    pub sample_id: String,
    pub reads: ReadPair,
    pub trim_dir: PathBuf,
    pub trimmed_1: PathBuf,
    pub trimmed_2: PathBuf,
    pub trim_stats: PathBuf,
    pub assembly_dir: PathBuf,
    pub spades_dir: PathBuf,
    pub contigs: PathBuf,
    pub blast_dir: PathBuf,
    pub blastn_results: PathBuf,
    pub blastx_results: PathBuf,
}

impl SamplePaths {
    pub fn new(reads: &ReadPair, out_dir: &Path) -> Result<Self, PipelineError> {
        let sample_id = sample_id(&reads.read_1)?;

        let trim_dir = out_dir.join(TRIMMED_READS_DIR);
        let trimmed_1 = trim_dir.join(trimmed_read_name(&reads.read_1)?);
        let trimmed_2 = trim_dir.join(trimmed_read_name(&reads.read_2)?);
        let trim_stats = trim_dir.join(format!("{}{}", sample_id, STATS_SUFFIX));

        let assembly_dir = out_dir.join(ASSEMBLIES_DIR);
        let spades_dir = assembly_dir.join(format!("{}{}", sample_id, SPADES_SUFFIX));
        let contigs = spades_dir.join(CONTIGS_FILE);

        let blast_dir = out_dir.join(BLAST_RESULTS_DIR);
        let blastn_results = blast_dir.join(format!("{}{}", sample_id, BLASTN_RESULTS_SUFFIX));
        let blastx_results = blast_dir.join(format!("{}{}", sample_id, BLASTX_RESULTS_SUFFIX));

        Ok(SamplePaths {
            sample_id,
            reads: reads.clone(),
            trim_dir,
            trimmed_1,
            trimmed_2,
            trim_stats,
            assembly_dir,
            spades_dir,
            contigs,
            blast_dir,
            blastn_results,
            blastx_results,
        })
    }

    pub fn blast_results(&self, mode: AlignMode) -> &Path {
        match mode {
            AlignMode::Nucleotide => &self.blastn_results,
            AlignMode::Translated => &self.blastx_results,
        }
    }
}


fn trimmed_read_name(read: &Path) -> Result<String, PipelineError> {
    let file_name = file_name_str(read)?;
    Ok(format!("{}{}", strip_fastq_extension(file_name), TRIMMED_SUFFIX))
}
