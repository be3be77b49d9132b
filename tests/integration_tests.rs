use std::io::Write;
use std::process::{Command, Stdio};

use tempfile::TempDir;

fn ktally_cmd() -> Command {
    Command::new(env!("CARGO_BIN_EXE_ktally"))
}

fn write_file(dir: &TempDir, name: &str, body: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, body).expect("Failed to write file");
    path
}

#[test]
fn cli_help_flag() {
    let output = ktally_cmd()
        .arg("--help")
        .output()
        .expect("Failed to execute");
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("ktally"));
    assert!(stdout.contains("k-mer"));
}

#[test]
fn cli_version_flag() {
    let output = ktally_cmd()
        .arg("--version")
        .output()
        .expect("Failed to execute");
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn cli_missing_subcommand() {
    let output = ktally_cmd().output().expect("Failed to execute");
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Usage") || stderr.contains("required"));
}

#[test]
fn cli_count_reads_stdin_by_default() {
    let mut child = ktally_cmd()
        .args(["count", "-k", "4", "--quiet"])
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("Failed to spawn");

    child
        .stdin
        .as_mut()
        .unwrap()
        .write_all(b">seq\nTTTTTTTTTTTTTTT\n")
        .expect("Failed to write to stdin");

    let output = child.wait_with_output().expect("Failed to wait");
    assert!(output.status.success());
    assert_eq!(String::from_utf8_lossy(&output.stdout), "AAAA\t12\n");
}

#[test]
fn cli_count_short_stdin_is_empty_but_ok() {
    let mut child = ktally_cmd()
        .args(["count", "-k", "5", "--quiet", "-"])
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("Failed to spawn");

    child
        .stdin
        .as_mut()
        .unwrap()
        .write_all(b">seq\nACGT\n")
        .expect("Failed to write to stdin");

    let output = child.wait_with_output().expect("Failed to wait");
    assert!(output.status.success());
    assert!(output.stdout.is_empty());
}

#[test]
fn cli_count_k_zero_is_rejected() {
    let output = ktally_cmd()
        .args(["count", "-k", "0", "tests/fixtures/simple.fa"])
        .output()
        .expect("Failed to execute");
    assert!(!output.status.success());
}

#[test]
fn cli_count_k_not_a_number_is_rejected() {
    let output = ktally_cmd()
        .args(["count", "-k", "abc", "tests/fixtures/simple.fa"])
        .output()
        .expect("Failed to execute");
    assert!(!output.status.success());
}

#[test]
fn cli_count_nonexistent_file_fails_with_error() {
    let output = ktally_cmd()
        .args(["count", "-k", "5", "/nonexistent/path/to/file.fa"])
        .output()
        .expect("Failed to execute");
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("error:"));
}

#[test]
fn cli_count_default_rendering_is_tsv() {
    let output = ktally_cmd()
        .args(["count", "-k", "3", "--quiet", "tests/fixtures/simple.fa"])
        .output()
        .expect("Failed to execute");
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains('\t'));
    assert!(!stdout.contains('>'));
}

#[test]
fn cli_count_fasta_rendering() {
    let output = ktally_cmd()
        .args([
            "count",
            "-k",
            "3",
            "--quiet",
            "--output-format",
            "fasta",
            "tests/fixtures/simple.fa",
        ])
        .output()
        .expect("Failed to execute");
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains('>'));
}

#[test]
fn cli_count_json_rendering_parses() {
    let output = ktally_cmd()
        .args([
            "count",
            "-k",
            "3",
            "--quiet",
            "--output-format",
            "json",
            "tests/fixtures/simple.fa",
        ])
        .output()
        .expect("Failed to execute");
    assert!(output.status.success());

    let parsed: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("JSON output should parse");
    let entries = parsed.as_array().expect("JSON output should be an array");
    assert!(!entries.is_empty());
    assert!(entries[0]["kmer"].is_string());
    assert!(entries[0]["count"].is_u64());
}

#[test]
fn cli_count_min_occs_filters() {
    let unfiltered = ktally_cmd()
        .args(["count", "-k", "3", "--quiet", "tests/fixtures/simple.fa"])
        .output()
        .expect("Failed to execute");
    let baseline = String::from_utf8_lossy(&unfiltered.stdout).lines().count();

    let filtered = ktally_cmd()
        .args([
            "count",
            "-k",
            "3",
            "--quiet",
            "--min-occs",
            "1000",
            "tests/fixtures/simple.fa",
        ])
        .output()
        .expect("Failed to execute");
    let remaining = String::from_utf8_lossy(&filtered.stdout).lines().count();

    assert!(baseline > 0, "Test fixture should produce k-mers");
    assert_eq!(remaining, 0, "High min-occs should drop every k-mer");
}

#[test]
fn cli_count_single_strand_keeps_orientation() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let fasta = write_file(&dir, "t.fa", ">s\nTTTTT\n");

    let output = ktally_cmd()
        .args(["count", "-k", "4", "--quiet", "--single-strand"])
        .arg(&fasta)
        .output()
        .expect("Failed to execute");
    assert!(output.status.success());
    assert_eq!(String::from_utf8_lossy(&output.stdout), "TTTT\t2\n");
}

#[test]
fn cli_quiet_flag_suppresses_stderr() {
    let normal = ktally_cmd()
        .args(["count", "-k", "3", "tests/fixtures/simple.fa"])
        .output()
        .expect("Failed to execute");
    let quiet = ktally_cmd()
        .args(["count", "-k", "3", "--quiet", "tests/fixtures/simple.fa"])
        .output()
        .expect("Failed to execute");

    assert!(normal.status.success());
    assert!(quiet.status.success());
    assert!(
        quiet.stderr.is_empty(),
        "Quiet mode should not produce stderr"
    );
    assert!(
        !normal.stderr.is_empty(),
        "Normal mode should produce info on stderr"
    );
}

#[test]
fn cli_build_then_dump_roundtrip() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let fasta = write_file(&dir, "seqs.fa", ">s1\nAAAAAAAAAAAAAAA\n");
    let db = dir.path().join("counts.ktab");

    let build = ktally_cmd()
        .args(["build", "-k", "4", "--quiet", "-o"])
        .arg(&db)
        .arg(&fasta)
        .output()
        .expect("Failed to execute");
    assert!(build.status.success(), "build failed: {build:?}");
    assert!(db.exists());

    let dump = ktally_cmd()
        .args(["dump", "--quiet"])
        .arg(&db)
        .output()
        .expect("Failed to execute");
    assert!(dump.status.success());
    assert_eq!(String::from_utf8_lossy(&dump.stdout), "AAAA\t12\n");
}

#[test]
fn cli_build_combines_multiple_inputs() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let first = write_file(&dir, "a.fa", ">s\nACG\n");
    let second = write_file(&dir, "b.fa", ">s\nACG\n");
    let db = dir.path().join("counts.ktab");

    let build = ktally_cmd()
        .args(["build", "-k", "3", "--quiet", "-o"])
        .arg(&db)
        .arg(&first)
        .arg(&second)
        .output()
        .expect("Failed to execute");
    assert!(build.status.success());

    let dump = ktally_cmd()
        .args(["dump", "--quiet"])
        .arg(&db)
        .output()
        .expect("Failed to execute");
    assert_eq!(String::from_utf8_lossy(&dump.stdout), "ACG\t2\n");
}

/// Builds a k=4 canonical database over ACGTACGTACGT, whose distinct
/// canonical k-mers are ACGT, CGTA, and GTAC.
fn build_reference_db(dir: &TempDir) -> std::path::PathBuf {
    let fasta = write_file(dir, "ref.fa", ">r\nACGTACGTACGT\n");
    let db = dir.path().join("ref.ktab");

    let build = ktally_cmd()
        .args(["build", "-k", "4", "--quiet", "-o"])
        .arg(&db)
        .arg(&fasta)
        .output()
        .expect("Failed to execute");
    assert!(build.status.success(), "build failed: {build:?}");
    db
}

#[test]
fn cli_filter_min_occs_keeps_matching_reads() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let db = build_reference_db(&dir);
    let kept = dir.path().join("kept.fq");

    // read1 shares 3 distinct database k-mers, read3 shares 2 (ACGT and
    // CGTA), read2 shares none.
    let filter = ktally_cmd()
        .args(["filter", "--quiet", "--read-min-occs", "1", "-o"])
        .arg(&kept)
        .arg(&db)
        .arg("tests/fixtures/reads.fq")
        .output()
        .expect("Failed to execute");
    assert!(filter.status.success(), "filter failed: {filter:?}");

    let out = std::fs::read_to_string(&kept).expect("Failed to read output");
    assert!(out.contains("@read1"));
    assert!(out.contains("@read3"));
    assert!(!out.contains("@read2"));
    // Quality lines survive the round trip.
    assert!(out.contains("IIIIIIIIIIII"));
}

#[test]
fn cli_filter_max_occs_zero_keeps_only_non_matching_reads() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let db = build_reference_db(&dir);
    let kept = dir.path().join("kept.fq");

    let filter = ktally_cmd()
        .args(["filter", "--quiet", "--read-max-occs", "0", "-o"])
        .arg(&kept)
        .arg(&db)
        .arg("tests/fixtures/reads.fq")
        .output()
        .expect("Failed to execute");
    assert!(filter.status.success(), "filter failed: {filter:?}");

    let out = std::fs::read_to_string(&kept).expect("Failed to read output");
    assert!(out.contains("@read2"));
    assert!(!out.contains("@read1"));
    assert!(!out.contains("@read3"));
}

#[test]
fn cli_filter_fraction_threshold_resolves_per_read() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let db = build_reference_db(&dir);
    let kept = dir.path().join("kept.fq");

    // 0.25 of a 12-base read resolves to 3 distinct k-mers, which only
    // read1 reaches.
    let filter = ktally_cmd()
        .args(["filter", "--quiet", "--read-min-occs", "0.25", "-o"])
        .arg(&kept)
        .arg(&db)
        .arg("tests/fixtures/reads.fq")
        .output()
        .expect("Failed to execute");
    assert!(filter.status.success(), "filter failed: {filter:?}");

    let out = std::fs::read_to_string(&kept).expect("Failed to read output");
    assert!(out.contains("@read1"));
    assert!(!out.contains("@read2"));
    assert!(!out.contains("@read3"));
}

#[test]
fn cli_dump_rejects_corrupt_db() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let bogus = write_file(&dir, "bogus.ktab", "this is not a database");

    let output = ktally_cmd()
        .args(["dump", "--quiet"])
        .arg(&bogus)
        .output()
        .expect("Failed to execute");
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("error:"));
}

#[test]
fn cli_build_then_histo() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let fasta = write_file(&dir, "seqs.fa", ">s1\nAAAAA\n>s2\nGATTACA\n");
    let db = dir.path().join("counts.ktab");

    let build = ktally_cmd()
        .args(["build", "-k", "3", "--quiet", "--single-strand", "-o"])
        .arg(&db)
        .arg(&fasta)
        .output()
        .expect("Failed to execute");
    assert!(build.status.success());

    let histo = ktally_cmd()
        .args(["histo"])
        .arg(&db)
        .output()
        .expect("Failed to execute");
    assert!(histo.status.success());
    // Five 3-mers occur once and AAA occurs three times.
    assert_eq!(String::from_utf8_lossy(&histo.stdout), "1\t5\n3\t1\n");
}

#[test]
fn cli_histo_stats_go_to_stderr() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let fasta = write_file(&dir, "seqs.fa", ">s\nAAAAA\n");
    let db = dir.path().join("counts.ktab");

    ktally_cmd()
        .args(["build", "-k", "3", "--quiet", "-o"])
        .arg(&db)
        .arg(&fasta)
        .output()
        .expect("Failed to execute");

    let histo = ktally_cmd()
        .args(["histo", "--stats"])
        .arg(&db)
        .output()
        .expect("Failed to execute");
    assert!(histo.status.success());
    let stderr = String::from_utf8_lossy(&histo.stderr);
    assert!(stderr.contains("stats"));
    // Data channel stays machine-readable.
    assert_eq!(String::from_utf8_lossy(&histo.stdout), "3\t1\n");
}
