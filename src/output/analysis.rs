//! Analysis persistence
//!
//! Every run writes `<stem>.json` holding the serialized outcome. A
//! completed analysis also gets `<stem>.md` containing the summary text.

use crate::analysis::AnalysisOutcome;
use crate::config::OutputConfig;
use std::fs::{self, File};
use std::io::Write;
use std::path::PathBuf;

/// Files written for one analysis
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisFiles {
    pub json: PathBuf,
    /// Absent when the analysis failed
    pub markdown: Option<PathBuf>,
}

/// Writes `outcome` into the configured output directory
///
/// # Arguments
///
/// * `output` - Output directory and analysis file stem
/// * `outcome` - The analysis result to persist
pub fn write_analysis(output: &OutputConfig, outcome: &AnalysisOutcome) -> std::io::Result<AnalysisFiles> {
    let directory = PathBuf::from(&output.directory);
    fs::create_dir_all(&directory)?;

    let json_path = directory.join(format!("{}.json", output.analysis_file));
    let json = serde_json::to_string_pretty(outcome)?;
    fs::write(&json_path, json)?;
    tracing::info!("Analysis saved to {}", json_path.display());

    let markdown = match outcome.summary() {
        Some(summary) => {
            let md_path = directory.join(format!("{}.md", output.analysis_file));
            let mut file = File::create(&md_path)?;
            file.write_all(summary.as_bytes())?;
            tracing::info!("Summary saved to {}", md_path.display());
            Some(md_path)
        }
        None => None,
    };

    Ok(AnalysisFiles {
        json: json_path,
        markdown,
    })
}
