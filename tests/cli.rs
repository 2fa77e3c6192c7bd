use std::fs;
use std::process::Command;
use anyhow::Result;


fn virsequel() -> Command {
    Command::new(env!("CARGO_BIN_EXE_virsequel"))
}


#[test]
fn test_bam_input_exits_with_status_1() -> Result<()> {
    let root = tempfile::tempdir()?;
    let output = virsequel()
        .current_dir(root.path())
        .args(["-1", "sample1_R1.bam", "-2", "sample1_R2.bam", "-a", "adapters.fa", "-o", "out"])
        .output()?;

    assert_eq!(output.status.code(), Some(1));
    assert!(!root.path().join("out/trimmed_reads").exists());

    let logs: Vec<_> = fs::read_dir(root.path().join("logs"))?.collect();
    assert_eq!(logs.len(), 1);
    Ok(())
}


#[test]
fn test_batch_config_missing_field_exits_with_status_1() -> Result<()> {
    let root = tempfile::tempdir()?;
    fs::write(
        root.path().join("batch.toml"),
        "samples = \"s1_R1.fastq.gz,s2_R1.fastq.gz\"\nadapters = \"adapters.fa\"\n",
    )?;

    let output = virsequel()
        .current_dir(root.path())
        .args(["--config", "batch.toml"])
        .output()?;

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Missing required configuration field: output"), "{}", stderr);
    Ok(())
}


#[test]
fn test_batch_sample_without_r1_exits_with_status_1() -> Result<()> {
    let root = tempfile::tempdir()?;
    fs::write(
        root.path().join("batch.toml"),
        "samples = \"s1_1.fastq.gz\"\nadapters = \"adapters.fa\"\noutput = \"out\"\n",
    )?;

    let output = virsequel()
        .current_dir(root.path())
        .args(["-c", "batch.toml"])
        .output()?;

    assert_eq!(output.status.code(), Some(1));
    assert!(!root.path().join("logs").exists());
    Ok(())
}


#[test]
fn test_missing_required_flags_is_a_usage_error() -> Result<()> {
    let output = virsequel().args(["-1", "s_R1.fastq.gz"]).output()?;
    assert!(!output.status.success());
    Ok(())
}
