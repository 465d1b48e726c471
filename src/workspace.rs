//! Source tree scanning.

use std::path::PathBuf;

use ignore::WalkBuilder;
use thiserror::Error;

use crate::config::FileMatcher;
use crate::extract::ExtractorKind;

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("Source root '{}' is not a directory", .0.display())]
    MissingRoot(PathBuf),
}

/// A parseable file found under a platform's source root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub path: PathBuf,
    /// Path relative to the source root, used for pattern matching and logs.
    pub relative_path: PathBuf,
    pub parser: ExtractorKind,
    /// Whether the file's pairs feed the platform mapping.
    pub is_mapping: bool,
}

/// Lists the parseable files under the matcher's source root, sorted by path.
///
/// Honors `.gitignore`. Files without a registered parser are skipped.
///
/// # Errors
/// Returns error if the source root does not exist.
pub fn scan_source_files(matcher: &FileMatcher) -> Result<Vec<SourceFile>, ScanError> {
    let root = matcher.source_root();
    if !root.is_dir() {
        return Err(ScanError::MissingRoot(root.to_path_buf()));
    }

    let mut found_files = Vec::new();
    for result in WalkBuilder::new(root)
        .hidden(false)
        .git_ignore(true)
        .git_global(true)
        .git_exclude(true)
        .follow_links(false)
        .filter_entry(|entry| entry.file_name() != ".git")
        .sort_by_file_name(|a, b| a.cmp(b))
        .build()
    {
        let entry = match result {
            Ok(entry) => entry,
            Err(err) => {
                tracing::debug!(?err, "Failed to read directory entry");
                continue;
            }
        };

        if !entry.file_type().is_some_and(|ft| ft.is_file()) {
            continue;
        }

        let path = entry.path();
        let Ok(relative_path) = path.strip_prefix(root) else {
            continue;
        };
        if !matcher.is_source_file_relative(relative_path) {
            continue;
        }
        let Some(parser) = matcher.parser_for(path) else {
            continue;
        };

        found_files.push(SourceFile {
            path: path.to_path_buf(),
            relative_path: relative_path.to_path_buf(),
            parser,
            is_mapping: matcher.is_mapping_file_relative(relative_path),
        });
    }

    tracing::debug!(root = %root.display(), files = found_files.len(), "Scanned source tree");
    Ok(found_files)
}
