use anyhow::{anyhow, Context, Result};
use glob::glob;
use std::{
    fs,
    path::{Path, PathBuf},
};

/// Expand input arguments into a sorted list of files.
/// Each argument may be a file, a directory or a glob pattern.
pub fn collect_inputs(patterns: &[PathBuf], recursive: bool) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for pattern in patterns {
        // Existing paths are taken literally, names may contain glob metacharacters
        let matches: Vec<PathBuf> = if fs::metadata(pattern).is_ok() {
            vec![pattern.clone()]
        } else {
            let pattern_str = pattern.display().to_string();
            glob(&pattern_str)
                .map_err(|e| anyhow!("Invalid input pattern {pattern_str}: {e}"))?
                .filter_map(|entry| entry.ok())
                .collect()
        };

        if matches.is_empty() {
            return Err(anyhow!("No inputs match {}", pattern.display()));
        }

        for path in matches {
            if path.is_dir() {
                read_dir_files(&path, recursive, &mut files)?;
            } else {
                files.push(path);
            }
        }
    }

    files.sort();
    files.dedup();
    debug!("Collected {} inputs", files.len());
    Ok(files)
}

fn read_dir_files(dir: &Path, recursive: bool, files: &mut Vec<PathBuf>) -> Result<()> {
    let entries =
        fs::read_dir(dir).with_context(|| format!("Could not read directory {}", dir.display()))?;
    for entry in entries {
        let path = entry?.path();
        if path.is_file() {
            files.push(path);
        } else if recursive && path.is_dir() {
            read_dir_files(&path, recursive, files)?;
        }
    }
    Ok(())
}
