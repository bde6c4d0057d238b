use crate::CoreError;
use glob::{MatchOptions, Pattern};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Write `content` to `dest` through a temp file in the same directory, so a
/// crash never leaves a half-written file behind.
pub fn write_atomic(dest: &Path, content: &[u8]) -> Result<(), std::io::Error> {
    let dir = dest
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map_or_else(|| PathBuf::from("."), Path::to_path_buf);
    fs::create_dir_all(&dir)?;
    let mut tmp = NamedTempFile::new_in(&dir)?;
    tmp.write_all(content)?;
    tmp.as_file().sync_all()?;
    tmp.persist(dest).map_err(|e| e.error)?;
    Ok(())
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CopyMode {
    /// Recreate the folder structure below `src` inside `dst`.
    pub keep_path: bool,
    pub ignore_case: bool,
}

/// Copy every file below `src` whose file name matches `pattern` into `dst`.
///
/// Returns the destination paths in sorted order. A missing `src` copies
/// nothing.
pub fn copy_matching(
    src: &Path,
    pattern: &str,
    dst: &Path,
    mode: CopyMode,
) -> Result<Vec<PathBuf>, CoreError> {
    let pattern = Pattern::new(pattern)?;
    let options = MatchOptions {
        case_sensitive: !mode.ignore_case,
        require_literal_separator: false,
        require_literal_leading_dot: false,
    };

    if !src.is_dir() {
        tracing::debug!("copy source {} does not exist, nothing to copy", src.display());
        return Ok(Vec::new());
    }

    let mut files = Vec::new();
    collect_files(src, &mut files)?;
    files.sort();

    let mut copied = Vec::new();
    for file in files {
        let Some(name) = file.file_name() else {
            continue;
        };
        if !pattern.matches_with(&name.to_string_lossy(), options) {
            continue;
        }
        let target = if mode.keep_path {
            dst.join(file.strip_prefix(src).unwrap_or(&file))
        } else {
            dst.join(name)
        };
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::copy(&file, &target)?;
        tracing::debug!("copied {} -> {}", file.display(), target.display());
        copied.push(target);
    }
    Ok(copied)
}

fn collect_files(dir: &Path, out: &mut Vec<PathBuf>) -> Result<(), std::io::Error> {
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if entry.file_type()?.is_dir() {
            collect_files(&path, out)?;
        } else if path.is_file() {
            out.push(path);
        }
    }
    Ok(())
}
