#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use virsequel::config::defs::{AlignMode, PipelineError, RunConfig};
use virsequel::utils::command::{ToolCommand, ToolOutput, ToolRunner};
use virsequel::utils::file::ReadPair;


/// Stands in for the external tools: records every call and writes each declared output.
#[derive(Default)]
pub struct RecordingRunner {
    pub checks: Mutex<Vec<String>>,
    pub commands: Mutex<Vec<ToolCommand>>,
    /// Fail this tool, optionally only when an argument contains the needle.
    pub fail: Option<(&'static str, Option<String>)>,
    pub write_outputs: bool,
}

impl RecordingRunner {
    pub fn new() -> Self {
        RecordingRunner {
            write_outputs: true,
            ..Default::default()
        }
    }

    pub fn failing(tool: &'static str, needle: Option<&str>) -> Self {
        RecordingRunner {
            fail: Some((tool, needle.map(String::from))),
            write_outputs: true,
            ..Default::default()
        }
    }

    pub fn silent() -> Self {
        RecordingRunner::default()
    }

    pub fn commands(&self) -> Vec<ToolCommand> {
        self.commands.lock().unwrap().clone()
    }

    pub fn tools_run(&self) -> Vec<&'static str> {
        self.commands().iter().map(|c| c.tool).collect()
    }

    /// Presence checks plus tool runs.
    pub fn subprocess_count(&self) -> usize {
        self.checks.lock().unwrap().len() + self.commands.lock().unwrap().len()
    }

    fn should_fail(&self, command: &ToolCommand) -> bool {
        match &self.fail {
            Some((tool, needle)) if *tool == command.tool => match needle {
                Some(needle) => command.args.iter().any(|a| a.contains(needle.as_str())),
                None => true,
            },
            _ => false,
        }
    }
}

impl ToolRunner for RecordingRunner {
    async fn presence_check(&self, tool: &str) -> Result<String, PipelineError> {
        self.checks.lock().unwrap().push(tool.to_string());
        Ok(format!("{} v0.0-test", tool))
    }

    async fn run(&self, command: &ToolCommand) -> Result<ToolOutput, PipelineError> {
        self.commands.lock().unwrap().push(command.clone());

        if self.should_fail(command) {
            return Err(PipelineError::ToolExecution {
                tool: command.tool.to_string(),
                code: Some(1),
                stderr: "simulated failure: out of memory".to_string(),
            });
        }

        if self.write_outputs {
            for output in &command.outputs {
                if let Some(parent) = output.parent() {
                    fs::create_dir_all(parent).unwrap();
                }
                fs::write(output, format!("{} output for {}\n", command.tool, output.display())).unwrap();
            }
        }
        Ok(ToolOutput::default())
    }
}


pub fn reads_in(dir: &Path, sample: &str) -> ReadPair {
    ReadPair::new(
        dir.join(format!("{}_R1.fastq.gz", sample)),
        dir.join(format!("{}_R2.fastq.gz", sample)),
    )
}

pub fn run_config(root: &Path, mode: AlignMode) -> RunConfig {
    RunConfig::new(
        root.join("adapters.fa"),
        root.join("out"),
        8,
        None,
        mode,
        root.join("logs"),
    )
}

pub fn log_files(root: &Path) -> Vec<PathBuf> {
    match fs::read_dir(root.join("logs")) {
        Ok(entries) => entries.filter_map(|e| e.ok()).map(|e| e.path()).collect(),
        Err(_) => Vec::new(),
    }
}

pub fn arg_after<'a>(command: &'a ToolCommand, flag: &str) -> &'a str {
    let idx = command.args.iter().position(|a| a == flag).unwrap();
    &command.args[idx + 1]
}
