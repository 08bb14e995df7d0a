//! Shared helper functions for CLI commands
//!
//! This module contains utility functions that are used across multiple
//! command modules to avoid code duplication.

use console::style;
use miette::{IntoDiagnostic, Result};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::cli::GlobalOpts;
use crate::core::config::Config;
use crate::core::store::FileOutcomeStore;

/// Effective configuration with the global `--store` flag applied
pub fn load_config(global: &GlobalOpts) -> Config {
    let mut config = Config::load();
    if let Some(store) = &global.store {
        config.store_path = Some(store.clone());
    }
    config
}

/// Open the outcome store named by the configuration
pub fn open_store(config: &Config) -> Result<FileOutcomeStore> {
    match &config.store_path {
        Some(path) => Ok(FileOutcomeStore::new(path)),
        None => FileOutcomeStore::default_location()
            .ok_or_else(|| miette::miette!("Could not determine a data directory; pass --store")),
    }
}

/// Write to a file, or stdout when no path is given
pub fn write_output(content: &str, output_path: Option<&Path>, quiet: bool) -> Result<()> {
    match output_path {
        Some(path) => {
            let file = File::create(path).into_diagnostic()?;
            let mut writer = BufWriter::new(file);
            writer.write_all(content.as_bytes()).into_diagnostic()?;
            writer.flush().into_diagnostic()?;
            if !quiet {
                println!(
                    "{} Written to {}",
                    style("✓").green(),
                    style(path.display()).cyan()
                );
            }
        }
        None => print!("{}", content),
    }
    Ok(())
}

/// Truncate a string to max_len characters, adding "..." if truncated
pub fn truncate_str(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// Display form of a path relative to the working directory when possible
pub fn display_path(path: &Path) -> PathBuf {
    std::env::current_dir()
        .ok()
        .and_then(|cwd| path.strip_prefix(cwd).ok().map(Path::to_path_buf))
        .unwrap_or_else(|| path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::OutputFormat;
    use tempfile::TempDir;

    fn global(store: Option<PathBuf>) -> GlobalOpts {
        GlobalOpts {
            format: OutputFormat::Auto,
            quiet: true,
            verbose: false,
            store,
        }
    }

    #[test]
    fn test_truncate_str() {
        assert_eq!(truncate_str("hello", 10), "hello");
        assert_eq!(truncate_str("hello world", 8), "hello...");
        assert_eq!(truncate_str("hi", 2), "hi");
        assert_eq!(truncate_str("ééééé", 4), "é...");
    }

    #[test]
    fn test_store_flag_overrides_config() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("outcome.json");
        let config = load_config(&global(Some(path.clone())));
        let store = open_store(&config).unwrap();
        assert_eq!(store.path(), path.as_path());
    }

    #[test]
    fn test_write_output_to_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("out.txt");
        write_output("line\n", Some(&path), true).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "line\n");
    }
}
