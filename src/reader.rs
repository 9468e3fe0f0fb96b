//! Loads the bytes of a compilation unit's files.

use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;
use thiserror::Error;
use tracing::trace;

/// Path to raw contents; keys are unique.
pub type SourceSet = BTreeMap<PathBuf, Vec<u8>>;

#[derive(Debug, Error)]
#[error("{}: {source}", path.display())]
pub struct ReadError {
    pub path: PathBuf,
    #[source]
    pub source: std::io::Error,
}

/// Read every path. Unreadable files are returned as errors and left out of
/// the set; the rest are still read.
pub fn read_sources(paths: &[PathBuf]) -> (SourceSet, Vec<ReadError>) {
    let mut files = SourceSet::new();
    let mut errors = Vec::new();
    for path in paths {
        if files.contains_key(path) {
            continue;
        }
        match fs::read(path) {
            Ok(bytes) => {
                trace!(file = %path.display(), bytes = bytes.len(), "read source");
                files.insert(path.clone(), bytes);
            }
            Err(source) => errors.push(ReadError {
                path: path.clone(),
                source,
            }),
        }
    }
    (files, errors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_read_errors_do_not_abort_batch() {
        let dir = tempdir().unwrap();
        let a = dir.path().join("a.go");
        let b = dir.path().join("b.go");
        let missing = dir.path().join("missing.go");
        fs::write(&a, "package a\n").unwrap();
        fs::write(&b, "package a\n\nvar x = 1\n").unwrap();

        let (files, errors) = read_sources(&[a.clone(), missing.clone(), b.clone(), a.clone()]);
        assert_eq!(files.len(), 2);
        assert_eq!(files[&a], b"package a\n");
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].path, missing);
        assert!(errors[0].to_string().starts_with(&missing.display().to_string()));
    }
}
