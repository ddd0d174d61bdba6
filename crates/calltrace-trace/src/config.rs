use std::env;
use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;

use tracing_subscriber::EnvFilter;

use crate::stream::StreamWriter;
use crate::writer::TraceWriteError;

pub const OUTPUT_ENV: &str = "CALLTRACE_OUTPUT";
pub const LOG_ENV: &str = "CALLTRACE_LOG";

/// Run-time settings of a traced process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceConfig {
    /// Trace file path. Environment variable: `CALLTRACE_OUTPUT`.
    pub output: PathBuf,
    /// Log filter (tracing-subscriber EnvFilter syntax). Environment variable: `CALLTRACE_LOG`.
    pub log_filter: String,
}

impl TraceConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let output = lookup(OUTPUT_ENV)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(default_output);
        let log_filter = lookup(LOG_ENV)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| "warn".to_string());
        Self { output, log_filter }
    }

    /// Installs a global `fmt` subscriber. Does nothing when one is already installed.
    pub fn init_logging(&self) {
        let filter = EnvFilter::try_new(&self.log_filter).unwrap_or_else(|_| EnvFilter::new("warn"));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .try_init();
    }

    pub fn open_writer(&self) -> Result<StreamWriter<BufWriter<File>>, TraceWriteError> {
        let file = File::create(&self.output)?;
        tracing::info!(path = %self.output.display(), "writing trace");
        StreamWriter::new(BufWriter::new(file))
    }
}

/// `<executable stem>.trace` in the working directory.
fn default_output() -> PathBuf {
    let stem = env::current_exe()
        .ok()
        .and_then(|exe| exe.file_stem().map(|s| s.to_string_lossy().into_owned()))
        .unwrap_or_else(|| "calltrace".to_string());
    PathBuf::from(format!("{stem}.trace"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_values_win() {
        let config = TraceConfig::from_lookup(|key| match key {
            OUTPUT_ENV => Some("/tmp/app.trace".into()),
            LOG_ENV => Some("debug".into()),
            _ => None,
        });
        assert_eq!(config.output, PathBuf::from("/tmp/app.trace"));
        assert_eq!(config.log_filter, "debug");
    }

    #[test]
    fn blank_values_fall_back_to_defaults() {
        let config = TraceConfig::from_lookup(|_| Some("  ".into()));
        assert!(config.output.to_string_lossy().ends_with(".trace"));
        assert_eq!(config.log_filter, "warn");
    }
}
