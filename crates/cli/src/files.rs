//! Filesystem helpers for the batch commands.

use anyhow::{bail, Context, Result};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use topicdeck_core::navigation::FolderMove;
use walkdir::{DirEntry, WalkDir};

/// Compiler by-products removed after each build.
pub const AUXILIARY_EXTENSIONS: [&str; 6] = ["aux", "log", "nav", "out", "snm", "toc"];

/// Directories never descended into when scanning for references.
const SKIPPED_DIRS: [&str; 3] = [".git", "target", "node_modules"];

/// Remove compiler by-products from `dir`. Returns how many were removed.
pub fn clean_auxiliary(dir: &Path) -> Result<usize> {
    let mut removed = 0;
    for entry in
        fs::read_dir(dir).with_context(|| format!("Failed to read {}", dir.display()))?
    {
        let path = entry?.path();
        if path.is_file() && has_extension(&path, &AUXILIARY_EXTENSIONS) {
            fs::remove_file(&path)
                .with_context(|| format!("Failed to remove {}", path.display()))?;
            removed += 1;
        }
    }
    log::debug!("Removed {} auxiliary files from {}", removed, dir.display());
    Ok(removed)
}

/// Apply folder renames under `root` in order. A move whose source is
/// missing is skipped with a warning. The whole sequence is checked before
/// the first rename, so a move onto an existing folder aborts with nothing
/// moved. Returns how many moves ran.
pub fn apply_moves(root: &Path, moves: &[FolderMove]) -> Result<usize> {
    let runnable = check_moves(root, moves)?;
    for mv in &runnable {
        let from = root.join(&mv.from);
        let to = root.join(&mv.to);
        fs::rename(&from, &to)
            .with_context(|| format!("Failed to move {} to {}", from.display(), to.display()))?;
        log::info!("Moved {} -> {}", mv.from, mv.to);
    }
    Ok(runnable.len())
}

/// Replay `moves` against the folders under `root` without touching them.
/// Returns the moves that will run, or an error if one would overwrite.
fn check_moves<'a>(root: &Path, moves: &'a [FolderMove]) -> Result<Vec<&'a FolderMove>> {
    let mut present: HashMap<&str, bool> = HashMap::new();
    let mut runnable = Vec::new();

    for mv in moves {
        let from_present = *present
            .entry(mv.from.as_str())
            .or_insert_with(|| root.join(&mv.from).exists());
        if !from_present {
            log::warn!("Skipping {}: folder not found", root.join(&mv.from).display());
            continue;
        }

        let to_present = *present
            .entry(mv.to.as_str())
            .or_insert_with(|| root.join(&mv.to).exists());
        if to_present {
            bail!("Refusing to overwrite {}", root.join(&mv.to).display());
        }

        present.insert(mv.from.as_str(), false);
        present.insert(mv.to.as_str(), true);
        runnable.push(mv);
    }

    Ok(runnable)
}

/// All regular files under `root` with one of `extensions`, sorted.
/// Symbolic links are not followed.
pub fn find_files(root: &Path, extensions: &[String]) -> Result<Vec<PathBuf>> {
    let mut found = Vec::new();

    let walker = WalkDir::new(root)
        .follow_links(false)
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !is_skipped_dir(e));

    for entry in walker {
        let entry = entry.with_context(|| format!("Failed to scan {}", root.display()))?;
        if entry.file_type().is_file() && has_extension(entry.path(), extensions) {
            found.push(entry.into_path());
        }
    }

    found.sort();
    Ok(found)
}

fn is_skipped_dir(entry: &DirEntry) -> bool {
    entry.file_type().is_dir()
        && entry
            .file_name()
            .to_str()
            .is_some_and(|name| SKIPPED_DIRS.contains(&name))
}

fn has_extension<S: AsRef<str>>(path: &Path, extensions: &[S]) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| extensions.iter().any(|x| x.as_ref().eq_ignore_ascii_case(ext)))
}

/// Write `content` to `path`, creating parent directories.
pub fn write_output(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create output directory: {}", parent.display())
            })?;
        }
    }
    fs::write(path, content).with_context(|| format!("Failed to write to {}", path.display()))
}
