//! Expand CLI path arguments into a list of notebook files.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use regex::Regex;
use tracing::{debug, instrument};

use nbcheck_shared::{DiscoveryConfig, NbcheckError, Result};

/// Compiled discovery settings.
#[derive(Debug, Clone)]
pub struct DiscoveryOptions {
    /// Glob evaluated relative to each directory argument.
    pub pattern: String,
    /// Paths matching any of these are skipped during directory expansion.
    pub exclude: Vec<Regex>,
}

impl DiscoveryOptions {
    pub fn from_config(config: &DiscoveryConfig) -> Result<Self> {
        let exclude = config
            .exclude
            .iter()
            .map(|p| {
                Regex::new(p).map_err(|e| {
                    NbcheckError::config(format!("invalid discovery.exclude pattern '{p}': {e}"))
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            pattern: config.pattern.clone(),
            exclude,
        })
    }

    /// Only the part of `path` below `dir` is matched, so the directory the
    /// user named can never exclude itself.
    fn is_excluded(&self, dir: &Path, path: &Path) -> bool {
        let relative = path.strip_prefix(dir).unwrap_or(path);
        let s = relative.to_string_lossy();
        self.exclude.iter().any(|re| re.is_match(&s))
    }
}

/// Resolve files and directories to notebook paths.
///
/// Anything that is not a directory is kept exactly as given, even if it does
/// not exist; loading it later reports the failure for that notebook alone.
/// Directories are expanded with the glob, filtered by the exclude list and
/// sorted. The first occurrence of a path wins.
#[instrument(skip_all, fields(inputs = inputs.len()))]
pub fn discover_notebooks(inputs: &[PathBuf], options: &DiscoveryOptions) -> Result<Vec<PathBuf>> {
    let mut seen = HashSet::new();
    let mut notebooks = Vec::new();

    for input in inputs {
        let found = if input.is_dir() {
            expand_dir(input, options)?
        } else {
            vec![input.clone()]
        };

        for path in found {
            if seen.insert(path.clone()) {
                notebooks.push(path);
            }
        }
    }

    debug!(count = notebooks.len(), "notebooks discovered");
    Ok(notebooks)
}

fn expand_dir(dir: &Path, options: &DiscoveryOptions) -> Result<Vec<PathBuf>> {
    // The directory is literal; only the configured pattern may glob.
    let escaped = glob::Pattern::escape(&dir.to_string_lossy());
    let pattern = Path::new(&escaped).join(&options.pattern);
    let pattern = pattern.to_string_lossy();

    let entries = glob::glob(&pattern).map_err(|e| {
        NbcheckError::config(format!("invalid discovery.pattern '{}': {e}", options.pattern))
    })?;

    let mut found = Vec::new();
    for entry in entries {
        let path = entry.map_err(|e| {
            let path = e.path().to_path_buf();
            NbcheckError::io(path, e.into_error())
        })?;
        if path.is_file() && !options.is_excluded(dir, &path) {
            found.push(path);
        }
    }
    found.sort();

    if found.is_empty() {
        return Err(NbcheckError::validation(format!(
            "no notebooks matching '{}' under {}",
            options.pattern,
            dir.display()
        )));
    }
    Ok(found)
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    fn options() -> DiscoveryOptions {
        DiscoveryOptions::from_config(&DiscoveryConfig::default()).expect("default options")
    }

    fn touch(path: &Path) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "{}").unwrap();
    }

    #[test]
    fn expands_directories_sorted_without_checkpoints() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        touch(&root.join("W1D2/student/W1D2_Tutorial2.ipynb"));
        touch(&root.join("W1D2/student/W1D2_Tutorial1.ipynb"));
        touch(&root.join("W1D2/.ipynb_checkpoints/W1D2_Tutorial1-checkpoint.ipynb"));
        touch(&root.join("W1D2/README.md"));

        let found = discover_notebooks(&[root.to_path_buf()], &options()).expect("discover");
        assert_eq!(
            found,
            vec![
                root.join("W1D2/student/W1D2_Tutorial1.ipynb"),
                root.join("W1D2/student/W1D2_Tutorial2.ipynb"),
            ]
        );
    }

    #[test]
    fn files_pass_through_and_dedup() {
        let dir = tempfile::tempdir().unwrap();
        let nb = dir.path().join("a.ipynb");
        touch(&nb);

        let found = discover_notebooks(&[nb.clone(), dir.path().to_path_buf()], &options())
            .expect("discover");
        assert_eq!(found, vec![nb]);
    }

    #[test]
    fn missing_file_is_passed_through() {
        let missing = PathBuf::from("/no/such/notebook.ipynb");
        let found = discover_notebooks(&[missing.clone()], &options()).expect("discover");
        assert_eq!(found, vec![missing]);
    }

    #[test]
    fn directory_names_with_glob_metacharacters_are_literal() {
        let dir = tempfile::tempdir().unwrap();
        let draft = dir.path().join("W1D2[draft]");
        touch(&draft.join("T1.ipynb"));

        let found = discover_notebooks(&[draft.clone()], &options()).expect("discover");
        assert_eq!(found, vec![draft.join("T1.ipynb")]);
    }

    #[test]
    fn excludes_only_apply_below_the_given_directory() {
        let dir = tempfile::tempdir().unwrap();
        let checkpoints = dir.path().join(".ipynb_checkpoints");
        touch(&checkpoints.join("T1-checkpoint.ipynb"));
        touch(&checkpoints.join("nested/.ipynb_checkpoints/T1-checkpoint.ipynb"));

        let found = discover_notebooks(&[checkpoints.clone()], &options()).expect("discover");
        assert_eq!(found, vec![checkpoints.join("T1-checkpoint.ipynb")]);
    }

    #[test]
    fn empty_directory_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let err = discover_notebooks(&[dir.path().to_path_buf()], &options()).unwrap_err();
        assert!(err.to_string().contains("no notebooks matching"));
    }

    #[test]
    fn bad_exclude_regex_is_config_error() {
        let config = DiscoveryConfig {
            pattern: "**/*.ipynb".into(),
            exclude: vec!["(".into()],
        };
        let err = DiscoveryOptions::from_config(&config).unwrap_err();
        assert!(matches!(err, NbcheckError::Config { .. }));
    }
}
