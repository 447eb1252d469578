//! Configuration loading and parsing

use anyhow::{Context, Result};
use callback_drop_analyzer::AnalyzerConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Main application configuration (loaded from config.toml)
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AppConfig {
    #[serde(default)]
    pub input: InputConfig,
    #[serde(default)]
    pub analyzer: AnalyzerConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct InputConfig {
    /// JSON trace dump to analyze
    pub trace: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct OutputConfig {
    #[serde(default)]
    pub format: OutputFormat,
    #[serde(default)]
    pub report: ReportKind,
    /// Output file (default: stdout)
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Txt,
    Json,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ReportKind {
    /// Dropped-messages summary only
    Summary,
    /// Per-callback duration reports only
    Individual,
    #[default]
    All,
}

impl ReportKind {
    pub fn includes_summary(self) -> bool {
        matches!(self, ReportKind::Summary | ReportKind::All)
    }

    pub fn includes_individual(self) -> bool {
        matches!(self, ReportKind::Individual | ReportKind::All)
    }
}

/// Load configuration from a TOML file
pub fn load_config(path: &Path) -> Result<AppConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let config: AppConfig = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    config
        .analyzer
        .validate()
        .with_context(|| format!("Invalid analyzer settings in {:?}", path))?;

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_config_deserialization() {
        let toml_content = r#"
            [input]
            trace = "run.json"

            [analyzer]
            downstream_count_threshold = 500
            reference_callback = "node_RearLidarDriver"

            [output]
            format = "json"
            report = "summary"
        "#;

        let config: AppConfig = toml::from_str(toml_content).unwrap();
        assert_eq!(config.input.trace, Some(PathBuf::from("run.json")));
        assert_eq!(config.analyzer.downstream_count_threshold, 500);
        assert_eq!(config.analyzer.reference_callback, "node_RearLidarDriver");
        assert_eq!(config.analyzer.histogram_bins, 10);
        assert_eq!(config.output.format, OutputFormat::Json);
        assert_eq!(config.output.report, ReportKind::Summary);
        assert!(config.output.path.is_none());
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config: AppConfig = toml::from_str("").unwrap();
        assert!(config.input.trace.is_none());
        assert_eq!(config.analyzer, AnalyzerConfig::default());
        assert_eq!(config.output.report, ReportKind::All);
    }

    #[test]
    fn test_load_config_rejects_invalid_analyzer() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[analyzer]\nhistogram_bins = 0").unwrap();

        let err = load_config(file.path()).unwrap_err();
        assert!(format!("{:#}", err).contains("histogram_bins"));
    }

    #[test]
    fn test_load_config_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[output]\nformat = \"txt\"\nreport = \"individual\"").unwrap();

        let config = load_config(file.path()).unwrap();
        assert!(config.output.report.includes_individual());
        assert!(!config.output.report.includes_summary());
    }
}
