//! Lines-of-code report using cloc

use std::path::PathBuf;

use anyhow::Result;
use serde::Deserialize;

use crate::config::Configuration;
use crate::error::NomdevError;
use crate::exec::{Invocation, Runner};

/// cloc's JSON report, written to the project root
pub const REPORT_FILE: &str = ".loc.json";

/// Files cloc skipped, only recorded in verbose runs
pub const IGNORED_LOG: &str = ".cloc_ignored.log";

#[derive(Debug, Deserialize)]
struct ClocReport {
    #[serde(rename = "SUM")]
    sum: ClocSum,
}

#[derive(Debug, Deserialize)]
struct ClocSum {
    code: u64,
}

pub fn report_path(config: &Configuration) -> PathBuf {
    config.project_root.join(REPORT_FILE)
}

pub fn cloc_invocation(config: &Configuration) -> Invocation {
    let root = &config.project_root;

    let mut invocation = Invocation::new("cloc").arg("--quiet");
    if config.verbose {
        invocation = invocation.arg(format!("--ignored={}", root.join(IGNORED_LOG).display()));
    }

    invocation
        .arg(format!("--out={}", report_path(config).display()))
        .arg("--json")
        .arg(format!(
            "--exclude-dir={}",
            config.project.loc.exclude_dirs.join(",")
        ))
        .arg(root.display().to_string())
        .purpose("counting lines of code")
}

/// Extract `SUM.code` from a cloc JSON report
pub fn parse_report(content: &str) -> Option<u64> {
    serde_json::from_str::<ClocReport>(content)
        .ok()
        .map(|report| report.sum.code)
}

/// Run cloc and print the total lines of code. Returns `None` under dry-run.
pub fn execute(config: &Configuration, runner: &dyn Runner) -> Result<Option<u64>> {
    runner.run(&cloc_invocation(config))?;

    if runner.dry_run() {
        return Ok(None);
    }

    let path = report_path(config);
    let content = std::fs::read_to_string(&path).map_err(|_| NomdevError::Report {
        action: "open".to_string(),
        path: path.clone(),
    })?;

    let code = parse_report(&content).ok_or_else(|| NomdevError::Report {
        action: "parse".to_string(),
        path,
    })?;

    // cloc leaves its progress line behind even with --quiet
    println!();
    println!("{}", code);

    Ok(Some(code))
}
