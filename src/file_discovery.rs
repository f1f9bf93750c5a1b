use anyhow::{Context, Result};
use glob::glob;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Where import text comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputSource {
    Stdin,
    File(PathBuf),
}

/// Resolves import arguments (paths, directories, glob patterns, `-`) to input sources
#[derive(Debug, Default)]
pub struct FileDiscovery;

impl FileDiscovery {
    pub fn new() -> Self {
        Self
    }

    /// Expand every argument, keeping first-seen order and dropping repeats
    pub fn resolve_inputs(&self, inputs: &[String]) -> Result<Vec<InputSource>> {
        let mut sources = Vec::new();
        let mut seen_files = HashSet::new();

        for input in inputs {
            if input == "-" {
                if !sources.contains(&InputSource::Stdin) {
                    sources.push(InputSource::Stdin);
                }
                continue;
            }

            for path in self.expand(input)? {
                if seen_files.insert(path.clone()) {
                    sources.push(InputSource::File(path));
                }
            }
        }

        debug!(count = sources.len(), "Resolved import inputs");
        Ok(sources)
    }

    fn expand(&self, input: &str) -> Result<Vec<PathBuf>> {
        let path = Path::new(input);

        if path.is_dir() {
            return self.find_data_files(path);
        }
        if path.is_file() {
            return Ok(vec![path.to_path_buf()]);
        }

        let mut matches: Vec<PathBuf> = glob(input)
            .with_context(|| format!("Invalid glob pattern: {}", input))?
            .flatten()
            .filter(|p| p.is_file())
            .collect();

        if matches.is_empty() {
            anyhow::bail!("No input files found for '{}'", input);
        }

        matches.sort();
        Ok(matches)
    }

    /// `.csv` and `.txt` files directly inside a directory, sorted by name
    pub fn find_data_files(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        let mut files = Vec::new();

        for extension in ["csv", "txt"] {
            let pattern = dir.join(format!("*.{}", extension));
            let entries = glob(&pattern.to_string_lossy())
                .with_context(|| format!("Invalid directory path: {}", dir.display()))?;
            files.extend(entries.flatten().filter(|p| p.is_file()));
        }

        if files.is_empty() {
            anyhow::bail!("No .csv or .txt files in {}", dir.display());
        }

        files.sort();
        Ok(files)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_resolve_directory_and_glob() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("b.csv"), "x").unwrap();
        fs::write(dir.path().join("a.txt"), "x").unwrap();
        fs::write(dir.path().join("skip.json"), "x").unwrap();

        let discovery = FileDiscovery::new();
        let from_dir = discovery
            .resolve_inputs(&[dir.path().display().to_string()])
            .unwrap();
        assert_eq!(from_dir.len(), 2);

        let pattern = dir.path().join("*.csv").display().to_string();
        let from_glob = discovery.resolve_inputs(&[pattern.clone(), pattern]).unwrap();
        assert_eq!(from_glob, vec![InputSource::File(dir.path().join("b.csv"))]);
    }

    #[test]
    fn test_stdin_and_missing_inputs() {
        let discovery = FileDiscovery::new();
        assert_eq!(
            discovery.resolve_inputs(&["-".to_string()]).unwrap(),
            vec![InputSource::Stdin]
        );
        assert!(discovery
            .resolve_inputs(&["/definitely/not/here/*.csv".to_string()])
            .is_err());
    }
}
