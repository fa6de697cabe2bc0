use super::CliError;
use anyhow::Context;
use globset::{Glob, GlobMatcher};
use specular_core::setup::ExperimentSetup;
use std::fs;
use std::path::Path;

pub(super) fn load_setup(path: &Path) -> Result<ExperimentSetup, CliError> {
    let source = fs::read_to_string(path)
        .with_context(|| format!("failed to read setup file '{}'", path.display()))?;
    let setup = ExperimentSetup::from_json_str(&source)
        .map_err(|error| CliError::Compute(error.into()))?;
    setup
        .validate()
        .map_err(|error| CliError::Compute(error.into()))?;
    Ok(setup)
}

pub(super) fn contrast_matcher(pattern: Option<&str>) -> Result<Option<GlobMatcher>, CliError> {
    let Some(pattern) = pattern else {
        return Ok(None);
    };
    let glob = Glob::new(pattern).map_err(|error| {
        CliError::Usage(format!("invalid contrast pattern '{pattern}': {error}"))
    })?;
    Ok(Some(glob.compile_matcher()))
}

/// Scientific rendering with a signed two-digit exponent, so repeated runs
/// produce byte-identical artifacts.
pub(super) fn format_scientific_f64(value: f64) -> String {
    let rendered = format!("{value:.12e}");
    match rendered.split_once('e') {
        Some((mantissa, exponent)) => {
            let (sign, digits) = match exponent.strip_prefix('-') {
                Some(digits) => ('-', digits),
                None => ('+', exponent),
            };
            format!("{mantissa}e{sign}{digits:0>2}")
        }
        None => rendered,
    }
}

pub(super) fn normalize_text_artifact(content: &str) -> String {
    let mut normalized = content.replace("\r\n", "\n").replace('\r', "\n");
    if !normalized.is_empty() && !normalized.ends_with('\n') {
        normalized.push('\n');
    }
    normalized
}

pub(super) fn write_text_artifact(path: &Path, content: &str) -> std::io::Result<()> {
    fs::write(path, normalize_text_artifact(content))
}

/// Filesystem-safe stem derived from a contrast name.
pub(super) fn artifact_file_stem(name: &str) -> String {
    let stem: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                '-'
            }
        })
        .collect();
    let trimmed = stem.trim_matches('-');
    if trimmed.is_empty() {
        "contrast".to_string()
    } else {
        trimmed.to_string()
    }
}
