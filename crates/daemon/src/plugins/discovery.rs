// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Plugin discovery: scanning search paths for packaged candidates.

use compressarr_core::{PluginId, PluginManifest};
use std::collections::HashSet;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};

/// Manifest file every plugin package carries.
pub const MANIFEST_FILE: &str = "package.json";

/// A validated plugin candidate found on disk.
#[derive(Debug, Clone)]
pub struct Candidate {
    pub id: PluginId,
    pub path: PathBuf,
    pub manifest: PluginManifest,
}

/// Assemble the plugin search paths.
///
/// Union of: the `plugins` directory next to the host binary, the
/// OS-standard global install paths, every entry of
/// `$COMPRESSARR_PLUGIN_PATH`, and the optional user-supplied extra path.
pub fn search_paths(extra: Option<&Path>) -> Vec<PathBuf> {
    let mut paths = Vec::new();
    if let Ok(exe) = std::env::current_exe() {
        if let Some(dir) = exe.parent() {
            paths.push(dir.join("plugins"));
        }
    }
    #[cfg(unix)]
    {
        paths.push(PathBuf::from("/usr/local/lib/compressarr"));
        paths.push(PathBuf::from("/usr/lib/compressarr"));
    }
    #[cfg(windows)]
    {
        if let Ok(appdata) = std::env::var("APPDATA") {
            paths.push(PathBuf::from(appdata).join("compressarr").join("plugins"));
        }
    }
    if let Ok(joined) = std::env::var("COMPRESSARR_PLUGIN_PATH") {
        paths.extend(std::env::split_paths(&joined));
    }
    if let Some(extra) = extra {
        paths.push(extra.to_path_buf());
    }
    paths
}

/// Scan search paths for plugin candidates.
///
/// A path that itself contains a manifest is treated as a single plugin;
/// otherwise each immediate child directory is considered, with `@scope`
/// directories expanded one level. Packages whose name does not match the
/// plugin pattern are ignored; candidates that look like plugins but fail
/// validation are logged and skipped. Duplicate directories are visited
/// once.
pub fn discover(paths: &[PathBuf]) -> Vec<Candidate> {
    let mut seen = HashSet::new();
    let mut candidates = Vec::new();
    for path in paths {
        let Ok(root) = std::fs::canonicalize(path) else { continue };
        if !seen.insert(root.clone()) {
            continue;
        }
        scan_root(&root, &mut candidates);
    }
    candidates
}

fn scan_root(root: &Path, out: &mut Vec<Candidate>) {
    if root.join(MANIFEST_FILE).is_file() {
        out.extend(candidate_from_dir(root));
        return;
    }
    for child in child_dirs(root) {
        let scoped = child
            .file_name()
            .and_then(OsStr::to_str)
            .map(|name| name.starts_with('@'))
            .unwrap_or(false);
        if scoped {
            for inner in child_dirs(&child) {
                out.extend(candidate_from_dir(&inner));
            }
        } else {
            out.extend(candidate_from_dir(&child));
        }
    }
}

fn child_dirs(dir: &Path) -> Vec<PathBuf> {
    let Ok(entries) = std::fs::read_dir(dir) else { return Vec::new() };
    let mut dirs: Vec<PathBuf> =
        entries.flatten().map(|entry| entry.path()).filter(|path| path.is_dir()).collect();
    dirs.sort();
    dirs
}

fn candidate_from_dir(dir: &Path) -> Option<Candidate> {
    let manifest_path = dir.join(MANIFEST_FILE);
    let data = std::fs::read_to_string(&manifest_path).ok()?;
    let mut manifest: PluginManifest = match serde_json::from_str(&data) {
        Ok(manifest) => manifest,
        Err(err) => {
            tracing::warn!(
                path = %manifest_path.display(),
                error = %err,
                "unreadable package manifest; skipping"
            );
            return None;
        }
    };
    // Ordinary packages (name outside the plugin pattern) are not ours.
    PluginId::parse(&manifest.name).ok()?;
    match manifest.validate() {
        Ok(id) => Some(Candidate { id, path: dir.to_path_buf(), manifest }),
        Err(err) => {
            tracing::warn!(path = %dir.display(), error = %err, "invalid plugin candidate; skipping");
            None
        }
    }
}

#[cfg(test)]
#[path = "discovery_tests.rs"]
mod tests;
