/// Functions and structs for building and running external tool command lines

use std::fmt;
use std::path::PathBuf;
use std::process::Stdio;
use tokio::process::Command;
use crate::config::defs::{
    PipelineError, RunConfig, BBDUK_TAG, BLASTN_TAG, DIAMOND_TAG, METASPADES_TAG, TOOL_VERSION_ARGS,
};
use crate::utils::file::SamplePaths;


/// A fully rendered external tool invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolCommand {
    pub tool: &'static str,
    pub args: Vec<String>,
    /// Files the tool must have written once it exits cleanly.
    pub outputs: Vec<PathBuf>,
}

impl fmt::Display for ToolCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.tool)?;
        for arg in &self.args {
            if arg.contains(char::is_whitespace) {
                write!(f, " \"{}\"", arg)?;
            } else {
                write!(f, " {}", arg)?;
            }
        }
        Ok(())
    }
}


/// Captured output of a tool that exited with status 0.
#[derive(Debug, Clone, Default)]
pub struct ToolOutput {
    pub stdout: String,
    pub stderr: String,
}


/// Runs external tools to completion, one at a time.
#[allow(async_fn_in_trait)]
pub trait ToolRunner {
    /// Confirms the tool can be launched and returns its version line.
    async fn presence_check(&self, tool: &str) -> Result<String, PipelineError>;

    /// Runs the command, waiting for it to exit.
    /// A non-zero exit is returned as `PipelineError::ToolExecution` with the captured stderr.
    async fn run(&self, command: &ToolCommand) -> Result<ToolOutput, PipelineError>;
}


/// Runs tools as child processes found on `PATH`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessRunner;

impl ToolRunner for ProcessRunner {
    async fn presence_check(&self, tool: &str) -> Result<String, PipelineError> {
        let version_args = TOOL_VERSION_ARGS
            .get(tool)
            .ok_or_else(|| PipelineError::InvalidConfig(format!("Unknown tool: {}", tool)))?;

        let output = Command::new(tool)
            .args(version_args.iter())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| PipelineError::ToolNotFound {
                tool: tool.to_string(),
                error: e.to_string(),
            })?;

        // Some tools print their version on stderr.
        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);
        let version = stdout
            .lines()
            .chain(stderr.lines())
            .map(str::trim)
            .find(|line| !line.is_empty())
            .unwrap_or("unknown version")
            .to_string();
        Ok(version)
    }

    async fn run(&self, command: &ToolCommand) -> Result<ToolOutput, PipelineError> {
        let output = Command::new(command.tool)
            .args(&command.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| PipelineError::ToolNotFound {
                tool: command.tool.to_string(),
                error: e.to_string(),
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();

        if !output.status.success() {
            return Err(PipelineError::ToolExecution {
                tool: command.tool.to_string(),
                code: output.status.code(),
                stderr,
            });
        }
        Ok(ToolOutput { stdout, stderr })
    }
}


/// Fails if a cleanly exited tool left any declared output missing.
pub fn check_outputs(command: &ToolCommand) -> Result<(), PipelineError> {
    match command.outputs.iter().find(|path| !path.is_file()) {
        Some(missing) => Err(PipelineError::MissingOutput {
            tool: command.tool.to_string(),
            path: missing.display().to_string(),
        }),
        None => Ok(()),
    }
}


pub mod bbduk {
    use crate::config::defs::{
        RunConfig, BBDUK_HDIST, BBDUK_K, BBDUK_KTRIM, BBDUK_MAQ, BBDUK_MAX_HEAP, BBDUK_MINK,
        BBDUK_MINLEN, BBDUK_QTRIM, BBDUK_TRIMQ,
    };
    use crate::utils::file::SamplePaths;

    pub fn arg_generator(config: &RunConfig, paths: &SamplePaths) -> Vec<String> {
        let mut args_vec: Vec<String> = Vec::new();
        args_vec.push(BBDUK_MAX_HEAP.to_string());
        args_vec.push(format!("in1={}", paths.reads.read_1.display()));
        args_vec.push(format!("in2={}", paths.reads.read_2.display()));
        args_vec.push(format!("out1={}", paths.trimmed_1.display()));
        args_vec.push(format!("out2={}", paths.trimmed_2.display()));
        args_vec.push(format!("stats={}", paths.trim_stats.display()));
        args_vec.push(format!("ref={}", config.adapters.display()));
        args_vec.push(format!("ktrim={}", BBDUK_KTRIM));
        args_vec.push(format!("k={}", BBDUK_K));
        args_vec.push(format!("mink={}", BBDUK_MINK));
        args_vec.push(format!("hdist={}", BBDUK_HDIST));
        args_vec.push(format!("qtrim={}", BBDUK_QTRIM));
        args_vec.push(format!("trimq={}", BBDUK_TRIMQ));
        args_vec.push(format!("maq={}", BBDUK_MAQ));
        args_vec.push(format!("minlen={}", BBDUK_MINLEN));
        args_vec.push(format!("threads={}", config.threads));
        args_vec.push("tpe".to_string());
        args_vec.push("tbo".to_string());
        args_vec
    }
}

pub mod metaspades {
    use crate::config::defs::{SPADES_KMERS, SPADES_MEMORY_GB, SPADES_THREADS};
    use crate::utils::file::SamplePaths;

    pub fn arg_generator(paths: &SamplePaths) -> Vec<String> {
        let kmers: Vec<String> = SPADES_KMERS.iter().map(|k| k.to_string()).collect();

        let mut args_vec: Vec<String> = Vec::new();
        args_vec.push("-1".to_string());
        args_vec.push(paths.trimmed_1.display().to_string());
        args_vec.push("-2".to_string());
        args_vec.push(paths.trimmed_2.display().to_string());
        args_vec.push("--only-assembler".to_string());
        args_vec.push("-t".to_string());
        args_vec.push(SPADES_THREADS.to_string());
        args_vec.push("-m".to_string());
        args_vec.push(SPADES_MEMORY_GB.to_string());
        args_vec.push("-k".to_string());
        args_vec.push(kmers.join(","));
        args_vec.push("-o".to_string());
        args_vec.push(paths.spades_dir.display().to_string());
        args_vec
    }
}

pub mod blastn {
    use crate::config::defs::{
        RunConfig, ALIGN_MAX_HSPS, ALIGN_MAX_TARGET_SEQS, ALIGN_THREADS, BLASTN_OUTFMT,
    };
    use crate::utils::file::SamplePaths;

    pub fn arg_generator(config: &RunConfig, paths: &SamplePaths) -> Vec<String> {
        let mut args_vec: Vec<String> = Vec::new();
        args_vec.push("-query".to_string());
        args_vec.push(paths.contigs.display().to_string());
        args_vec.push("-db".to_string());
        args_vec.push(config.database.clone());
        args_vec.push("-out".to_string());
        args_vec.push(paths.blastn_results.display().to_string());
        // blastn takes the whole format string as one argument
        args_vec.push("-outfmt".to_string());
        args_vec.push(BLASTN_OUTFMT.join(" "));
        args_vec.push("-max_target_seqs".to_string());
        args_vec.push(ALIGN_MAX_TARGET_SEQS.to_string());
        args_vec.push("-max_hsps".to_string());
        args_vec.push(ALIGN_MAX_HSPS.to_string());
        args_vec.push("-num_threads".to_string());
        args_vec.push(ALIGN_THREADS.to_string());
        args_vec
    }
}

pub mod diamond {
    use crate::config::defs::{
        RunConfig, ALIGN_MAX_HSPS, ALIGN_MAX_TARGET_SEQS, ALIGN_THREADS, DIAMOND_OUTFMT,
    };
    use crate::utils::file::SamplePaths;

    pub fn arg_generator(config: &RunConfig, paths: &SamplePaths) -> Vec<String> {
        let mut args_vec: Vec<String> = Vec::new();
        args_vec.push("blastx".to_string());
        args_vec.push("-q".to_string());
        args_vec.push(paths.contigs.display().to_string());
        args_vec.push("-d".to_string());
        args_vec.push(config.database.clone());
        args_vec.push("-o".to_string());
        args_vec.push(paths.blastx_results.display().to_string());
        args_vec.push("--outfmt".to_string());
        args_vec.extend(DIAMOND_OUTFMT.iter().map(|field| field.to_string()));
        args_vec.push("--sensitive".to_string());
        args_vec.push("--max-target-seqs".to_string());
        args_vec.push(ALIGN_MAX_TARGET_SEQS.to_string());
        args_vec.push("--max-hsps".to_string());
        args_vec.push(ALIGN_MAX_HSPS.to_string());
        args_vec.push("--threads".to_string());
        args_vec.push(ALIGN_THREADS.to_string());
        args_vec
    }
}


/// Builds the command line for one pipeline tool.
///
/// # Arguments
///
/// * `tool` - Tool tag from config::defs.
/// * `config` - Run settings.
/// * `paths` - The sample's path table.
///
/// # Returns
/// ToolCommand with the tool's declared outputs.
pub fn generate_cli(
    tool: &str,
    config: &RunConfig,
    paths: &SamplePaths,
) -> Result<ToolCommand, PipelineError> {
    let command = match tool {
        BBDUK_TAG => ToolCommand {
            tool: BBDUK_TAG,
            args: bbduk::arg_generator(config, paths),
            outputs: vec![paths.trimmed_1.clone(), paths.trimmed_2.clone()],
        },
        METASPADES_TAG => ToolCommand {
            tool: METASPADES_TAG,
            args: metaspades::arg_generator(paths),
            outputs: vec![paths.contigs.clone()],
        },
        BLASTN_TAG => ToolCommand {
            tool: BLASTN_TAG,
            args: blastn::arg_generator(config, paths),
            outputs: vec![paths.blastn_results.clone()],
        },
        DIAMOND_TAG => ToolCommand {
            tool: DIAMOND_TAG,
            args: diamond::arg_generator(config, paths),
            outputs: vec![paths.blastx_results.clone()],
        },
        _ => return Err(PipelineError::InvalidConfig(format!("Unknown tool: {}", tool))),
    };

    Ok(command)
}


#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use crate::config::defs::AlignMode;
    use crate::utils::file::ReadPair;

    fn fixture(mode: AlignMode) -> (RunConfig, SamplePaths) {
        let config = RunConfig::new(
            PathBuf::from("adapters.fa"),
            PathBuf::from("out"),
            12,
            None,
            mode,
            PathBuf::from("logs"),
        );
        let reads = ReadPair::new(
            PathBuf::from("sample1_R1.fastq.gz"),
            PathBuf::from("sample1_R2.fastq.gz"),
        );
        let paths = SamplePaths::new(&reads, Path::new("out")).unwrap();
        (config, paths)
    }

    #[test]
    fn bbduk_fixed_parameters() {
        let (config, paths) = fixture(AlignMode::Translated);
        let cmd = generate_cli(BBDUK_TAG, &config, &paths).unwrap();
        for expected in [
            "ref=adapters.fa", "ktrim=r", "k=23", "mink=11", "hdist=1", "qtrim=rl",
            "trimq=10", "maq=10", "minlen=50", "threads=12", "tpe", "tbo",
            "out1=out/trimmed_reads/sample1_R1.trim.fastq.gz",
            "stats=out/trimmed_reads/sample1.stats.txt",
        ] {
            assert!(cmd.args.iter().any(|a| a == expected), "missing {}", expected);
        }
    }

    #[test]
    fn metaspades_kmer_ladder() {
        let (config, paths) = fixture(AlignMode::Translated);
        let cmd = generate_cli(METASPADES_TAG, &config, &paths).unwrap();
        let k = cmd.args.iter().position(|a| a == "-k").unwrap();
        assert_eq!(cmd.args[k + 1], "21,31,41,51,61,71,81,91,101");
        assert!(cmd.args.iter().any(|a| a == "--only-assembler"));
        assert_eq!(cmd.args.last().unwrap(), "out/assemblies/sample1_spades");
        assert_eq!(cmd.outputs, vec![PathBuf::from("out/assemblies/sample1_spades/contigs.fasta")]);
    }

    #[test]
    fn aligners_report_best_hit_only() {
        let (config, paths) = fixture(AlignMode::Nucleotide);
        let blastn = generate_cli(BLASTN_TAG, &config, &paths).unwrap();
        let rendered = blastn.to_string();
        assert!(rendered.contains("-max_target_seqs 1 -max_hsps 1"));
        assert!(rendered.contains("-db nt"));
        assert!(rendered.contains("\"6 qseqid sseqid"));
        assert!(rendered.contains("sskingdoms stitle\""));

        let (config, paths) = fixture(AlignMode::Translated);
        let diamond = generate_cli(DIAMOND_TAG, &config, &paths).unwrap();
        assert_eq!(diamond.args[0], "blastx");
        assert!(diamond.args.iter().any(|a| a == "--sensitive"));
        assert!(diamond.to_string().contains("--max-target-seqs 1 --max-hsps 1"));
        assert!(diamond.to_string().contains("-d nr"));
        assert_eq!(diamond.outputs, vec![PathBuf::from("out/blast_results/sample1.blastx.results")]);
    }

    #[test]
    fn unknown_tool_is_rejected() {
        let (config, paths) = fixture(AlignMode::Translated);
        assert!(generate_cli("bowtie2", &config, &paths).is_err());
    }

    #[tokio::test]
    async fn missing_binary_is_tool_not_found() {
        let cmd = ToolCommand {
            tool: "virsequel-no-such-tool",
            args: vec![],
            outputs: vec![],
        };
        let err = ProcessRunner.run(&cmd).await.unwrap_err();
        assert!(matches!(err, PipelineError::ToolNotFound { .. }));
    }

    #[tokio::test]
    async fn nonzero_exit_carries_code_and_stderr() {
        let cmd = ToolCommand {
            tool: "sh",
            args: vec!["-c".to_string(), "echo boom >&2; exit 3".to_string()],
            outputs: vec![],
        };
        match ProcessRunner.run(&cmd).await {
            Err(PipelineError::ToolExecution { tool, code, stderr }) => {
                assert_eq!(tool, "sh");
                assert_eq!(code, Some(3));
                assert!(stderr.contains("boom"), "{}", stderr);
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[tokio::test]
    async fn clean_exit_captures_stdout() {
        let cmd = ToolCommand {
            tool: "sh",
            args: vec!["-c".to_string(), "echo contigs written".to_string()],
            outputs: vec![],
        };
        let output = ProcessRunner.run(&cmd).await.unwrap();
        assert_eq!(output.stdout.trim_end(), "contigs written");
        assert!(output.stderr.is_empty());
    }

    #[test]
    fn explicit_database_replaces_mode_default() {
        let config = RunConfig::new(
            PathBuf::from("adapters.fa"),
            PathBuf::from("out"),
            8,
            Some("custom.dmnd".to_string()),
            AlignMode::Translated,
            PathBuf::from("logs"),
        );
        let (_, paths) = fixture(AlignMode::Translated);
        let diamond = generate_cli(DIAMOND_TAG, &config, &paths).unwrap();
        let d = diamond.args.iter().position(|a| a == "-d").unwrap();
        assert_eq!(diamond.args[d + 1], "custom.dmnd");
        assert!(!diamond.args.iter().any(|a| a == "nr"));
    }
}
