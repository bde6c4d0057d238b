//! Removal of a link library from the `SYSTEM_LIBS` lists in generated
//! `*-data.cmake` files.
//!
//! Dependency data files carry lines such as
//!
//! ```cmake
//! set(fmt_SYSTEM_LIBS_RELEASE m stdc++ pthread)
//! ```
//!
//! When the C++ runtime is linked statically, the `stdc++` entry drags the
//! shared runtime back in. Only whole tokens inside those assignments are
//! removed; everything else in the file is left byte-identical.

use crate::files::write_atomic;
use crate::CoreError;
use regex::Regex;
use serde::Serialize;
use std::borrow::Cow;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use tracing::{debug, info, warn};

static SYSTEM_LIBS_SET: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(set\(\s*[\w.+:-]*_SYSTEM_LIBS(?:_[A-Z]+)?)(\s[^)]*)\)")
        .expect("valid SYSTEM_LIBS pattern")
});

static WORD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\S+").expect("valid word pattern"));

/// Remove every whitespace-delimited `token` from the bodies of
/// `set(<name>_SYSTEM_LIBS[_<CONFIG>] ...)` statements.
///
/// Returns the input unchanged (borrowed) when there is nothing to remove.
pub fn strip_system_lib<'a>(content: &'a str, token: &str) -> Cow<'a, str> {
    let mut out: Option<String> = None;
    let mut last = 0;

    for caps in SYSTEM_LIBS_SET.captures_iter(content) {
        let Some(body) = caps.get(2) else {
            continue;
        };
        let Some(stripped) = strip_token(body.as_str(), token) else {
            continue;
        };
        let buf = out.get_or_insert_with(|| String::with_capacity(content.len()));
        buf.push_str(&content[last..body.start()]);
        buf.push_str(&stripped);
        last = body.end();
    }

    match out {
        None => Cow::Borrowed(content),
        Some(mut buf) => {
            buf.push_str(&content[last..]);
            Cow::Owned(buf)
        }
    }
}

/// Drop the characters of each exact `token` occurrence, keeping the
/// whitespace around it.
fn strip_token(body: &str, token: &str) -> Option<String> {
    let mut out = String::with_capacity(body.len());
    let mut last = 0;
    for word in WORD.find_iter(body) {
        if word.as_str() == token {
            out.push_str(&body[last..word.start()]);
            last = word.end();
        }
    }
    if last == 0 {
        return None;
    }
    out.push_str(&body[last..]);
    Some(out)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PatchFailure {
    pub path: PathBuf,
    pub error: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PatchReport {
    pub scanned: usize,
    pub patched: Vec<PathBuf>,
    pub failed: Vec<PatchFailure>,
}

/// Strip `token` from the `SYSTEM_LIBS` lists of every file in `dir` that
/// matches one of `patterns`.
///
/// A file is rewritten only when its content changes. Per-file read and
/// write failures are logged and collected; they never abort the batch.
/// Only an invalid glob pattern is an error.
pub fn patch_system_libs(
    dir: &Path,
    patterns: &[String],
    token: &str,
) -> Result<PatchReport, CoreError> {
    let escaped_dir = glob::Pattern::escape(&dir.to_string_lossy());
    let mut report = PatchReport::default();
    let mut files = BTreeSet::new();

    for pattern in patterns {
        let full = format!("{escaped_dir}/{pattern}");
        for entry in glob::glob(&full)? {
            match entry {
                Ok(path) if path.is_file() => {
                    files.insert(path);
                }
                Ok(_) => {}
                Err(e) => {
                    warn!("could not inspect {}: {}", e.path().display(), e.error());
                    report.failed.push(PatchFailure {
                        path: e.path().to_path_buf(),
                        error: e.error().to_string(),
                    });
                }
            }
        }
    }

    if files.is_empty() {
        debug!("no CMake data files in {}", dir.display());
        return Ok(report);
    }

    for path in files {
        report.scanned += 1;
        match patch_file(&path, token) {
            Ok(true) => {
                info!(
                    "patched {} - removed {token} from SYSTEM_LIBS",
                    path.display()
                );
                report.patched.push(path);
            }
            Ok(false) => debug!("{} needs no patching", path.display()),
            Err(e) => {
                warn!("could not patch {}: {e}", path.display());
                report.failed.push(PatchFailure {
                    path,
                    error: e.to_string(),
                });
            }
        }
    }

    if !report.patched.is_empty() {
        info!("patched {} CMake data file(s)", report.patched.len());
    }
    Ok(report)
}

fn patch_file(path: &Path, token: &str) -> Result<bool, std::io::Error> {
    let content = std::fs::read_to_string(path)?;
    match strip_system_lib(&content, token) {
        Cow::Borrowed(_) => Ok(false),
        Cow::Owned(patched) => {
            write_atomic(path, patched.as_bytes())?;
            Ok(true)
        }
    }
}
