use anyhow::Result;
use std::process::Command;
use tempfile::TempDir;

fn binary() -> Command {
    Command::new(env!("CARGO_BIN_EXE_persian-mcq"))
}

#[test]
fn test_unsupported_model_exits_before_reading_input() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let input = temp_dir.path().join("input.csv");
    let output = temp_dir.path().join("output.csv");

    let result = binary()
        .args(["--model-name", "PMCQ-Qwen2-7b", "--input-file"])
        .arg(&input)
        .arg("--output-file")
        .arg(&output)
        .output()?;

    assert!(!result.status.success());
    assert_eq!(result.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&result.stderr);
    assert!(stderr.contains("PMCQ-Qwen2-7b"));
    assert!(stderr.contains("PMCQ-Gemma2-9b"));
    assert!(!output.exists());
    Ok(())
}

#[test]
fn test_invalid_temperature_exits_before_loading() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let output = temp_dir.path().join("output.csv");

    let result = binary()
        .args([
            "--model-name",
            "PMCQ-Mistral-7B",
            "--input-file",
            "rows.csv",
            "--temperature=-2",
        ])
        .arg("--output-file")
        .arg(&output)
        .output()?;

    assert_eq!(result.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&result.stderr).contains("temperature"));
    assert!(!output.exists());
    Ok(())
}

#[test]
fn test_help_lists_model_names() -> Result<()> {
    let result = binary().arg("--help").output()?;

    assert!(result.status.success());
    let stdout = String::from_utf8_lossy(&result.stdout);
    for name in ["PMCQ-Gemma2-9b", "PMCQ-Llama3.1-8b", "PMCQ-Mistral-7B"] {
        assert!(stdout.contains(name), "missing {} in help", name);
    }
    assert!(stdout.contains("--output-file"));
    Ok(())
}
