//! File pattern matcher for one platform's source tree.

use std::path::{
    Path,
    PathBuf,
};

use globset::{
    Glob,
    GlobSet,
    GlobSetBuilder,
};

use super::PlatformSettings;
use crate::extract::ExtractorKind;

#[derive(Debug, thiserror::Error)]
pub enum MatcherError {
    #[error("Invalid include pattern '{pattern}': {source}")]
    InvalidIncludePattern {
        pattern: String,
        #[source]
        source: globset::Error,
    },

    #[error("Invalid exclude pattern '{pattern}': {source}")]
    InvalidExcludePattern {
        pattern: String,
        #[source]
        source: globset::Error,
    },

    #[error("Invalid mapping pattern '{pattern}': {source}")]
    InvalidMappingPattern {
        pattern: String,
        #[source]
        source: globset::Error,
    },

    #[error("Failed to build glob set: {0}")]
    GlobSetBuild(#[from] globset::Error),
}

/// Matches files under a platform's source root against its patterns.
#[derive(Debug, Clone)]
pub struct FileMatcher {
    source_root: PathBuf,
    include_set: GlobSet,
    exclude_set: GlobSet,
    mapping_set: GlobSet,
    parsers_by_extension: Vec<(String, ExtractorKind)>,
}

impl FileMatcher {
    /// Creates a new matcher from platform settings.
    pub fn new(source_root: PathBuf, settings: &PlatformSettings) -> Result<Self, MatcherError> {
        let include_set = Self::build_glob_set(&settings.include_patterns, |pattern, source| {
            MatcherError::InvalidIncludePattern { pattern, source }
        })?;

        let exclude_set = Self::build_glob_set(&settings.exclude_patterns, |pattern, source| {
            MatcherError::InvalidExcludePattern { pattern, source }
        })?;

        let mapping_set = Self::build_glob_set(&settings.mapping_patterns, |pattern, source| {
            MatcherError::InvalidMappingPattern { pattern, source }
        })?;

        let parsers_by_extension = settings
            .parsers_by_extension
            .iter()
            .map(|(extension, kind)| (extension.trim_start_matches('.').to_string(), *kind))
            .collect();

        Ok(Self { source_root, include_set, exclude_set, mapping_set, parsers_by_extension })
    }

    fn build_glob_set<F>(patterns: &[String], make_error: F) -> Result<GlobSet, MatcherError>
    where
        F: Fn(String, globset::Error) -> MatcherError,
    {
        let mut builder = GlobSetBuilder::new();
        for pattern in patterns {
            let glob = Glob::new(pattern).map_err(|e| make_error(pattern.clone(), e))?;
            builder.add(glob);
        }
        Ok(builder.build()?)
    }

    #[must_use]
    pub fn source_root(&self) -> &Path {
        &self.source_root
    }

    /// Returns true if the path matches `includePatterns` but not `excludePatterns`.
    ///
    /// The path must be absolute and under the source root.
    #[must_use]
    pub fn is_source_file(&self, absolute_path: &Path) -> bool {
        let Some(relative_path) = absolute_path.strip_prefix(&self.source_root).ok() else {
            return false;
        };

        self.is_source_file_relative(relative_path)
    }

    /// Returns true if the path matches `includePatterns` but not `excludePatterns`.
    ///
    /// The path must be relative to the source root.
    #[must_use]
    pub fn is_source_file_relative(&self, relative_path: &Path) -> bool {
        self.include_set.is_match(relative_path) && !self.exclude_set.is_match(relative_path)
    }

    /// Returns true if the source file also matches `mappingPatterns`.
    ///
    /// The path must be relative to the source root.
    #[must_use]
    pub fn is_mapping_file_relative(&self, relative_path: &Path) -> bool {
        self.is_source_file_relative(relative_path) && self.mapping_set.is_match(relative_path)
    }

    /// Extractor registered for the path's extension, compared case-insensitively.
    #[must_use]
    pub fn parser_for(&self, path: &Path) -> Option<ExtractorKind> {
        let extension = path.extension()?.to_str()?;
        self.parsers_by_extension
            .iter()
            .find(|(registered, _)| registered.eq_ignore_ascii_case(extension))
            .map(|(_, kind)| *kind)
    }
}
