use std::fs;
use std::process::Command;
use tempfile::TempDir;

fn usescope() -> Command {
    Command::new(env!("CARGO_BIN_EXE_usescope"))
}

#[test]
fn test_fold_then_render() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let raw = dir.path().join("out.stacks");
    let folded = dir.path().join("out.folded");
    let svg = dir.path().join("out.svg");
    fs::write(&raw, "\n  app`main+0x2\n  app`leaf+0x1\n  4\n").unwrap();

    let status = usescope()
        .args(["-q", "fold", "--format", "dtrace"])
        .arg(&raw)
        .arg("--output")
        .arg(&folded)
        .status()
        .expect("Failed to run usescope");
    assert!(status.success());
    assert_eq!(fs::read_to_string(&folded).unwrap(), "main;leaf 4\n");

    let status = usescope()
        .args(["-q", "render"])
        .arg(&folded)
        .arg("--output")
        .arg(&svg)
        .args(["--title", "CLI <test>", "--color", "mem"])
        .status()
        .expect("Failed to run usescope");
    assert!(status.success());

    let svg = fs::read_to_string(&svg).unwrap();
    assert!(svg.contains("CLI &lt;test&gt;"));
    assert!(svg.contains("<title>leaf (4 samples, 100.0%)</title>"));
}

#[test]
fn test_fold_writes_stdout_by_default() {
    let dir = TempDir::new().unwrap();
    let raw = dir.path().join("perf.txt");
    fs::write(&raw, "app 1 [000] 1.0: cpu-clock:\n\t  1 f+0x1 (/a)\n\t  2 g+0x2 (/a)\n\n").unwrap();

    let output = usescope().args(["fold", "-f", "perf"]).arg(&raw).output().unwrap();
    assert!(output.status.success());
    assert_eq!(String::from_utf8_lossy(&output.stdout), "g;f 1\n");
}

#[test]
fn test_render_empty_input_fails() {
    let dir = TempDir::new().unwrap();
    let folded = dir.path().join("empty.folded");
    let svg = dir.path().join("empty.svg");
    fs::write(&folded, "").unwrap();

    let output = usescope()
        .arg("render")
        .arg(&folded)
        .arg("--output")
        .arg(&svg)
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("no samples"));
    assert!(!svg.exists());
}

#[test]
fn test_unknown_color_is_usage_error() {
    let output = usescope().args(["render", "--color", "neon"]).output().unwrap();
    assert_eq!(output.status.code(), Some(2));
}
