//! Per-platform sync run.
//!
//! Each platform goes through: scan, extract, store sync, translation file
//! update, localized resource generation and finally save + commit. A
//! failing platform is reverted and the run moves on to the next one.

use std::collections::HashSet;
use std::fs;
use std::path::{
    Path,
    PathBuf,
};

use indexmap::IndexMap;
use thiserror::Error;

use crate::config::{
    ConfigManager,
    FileMatcher,
    MatcherError,
    PlatformSettings,
};
use crate::extract::{
    ExtractError,
    decode_text,
};
use crate::mapping::{
    StringMapping,
    filter_string,
};
use crate::placeholder::{
    denormalize,
    normalize,
    restore_params_to_translations,
};
use crate::report::{
    PlatformOutcome,
    PlatformStatus,
    RunReport,
};
use crate::store::{
    NativeTranslation,
    SqliteStore,
    StoreError,
};
use crate::translation::{
    TranslationFileError,
    TranslationRecord,
    load_translation_file,
    mark_untranslated,
    save_translation_file,
};
use crate::vcs::{
    Vcs,
    VcsError,
    VcsKind,
};
use crate::workspace::{
    ScanError,
    SourceFile,
    scan_source_files,
};

/// Errors that abort one platform.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error(transparent)]
    Matcher(#[from] MatcherError),
    #[error(transparent)]
    Scan(#[from] ScanError),
    #[error(transparent)]
    Extract(#[from] ExtractError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    TranslationFile(#[from] TranslationFileError),
    #[error(transparent)]
    Vcs(#[from] VcsError),
    #[error("No translation file configured for '{0}'")]
    NoTranslationFile(String),
    #[error("'{}' has no translated strings", .0.display())]
    NoTranslations(PathBuf),
}

/// Command-line switches that change how a run behaves.
#[derive(Debug, Clone, Copy, Default)]
pub struct RunOptions {
    /// Ignore the configured VCS and touch files only.
    pub no_vcs: bool,
    /// Commit and push once a platform succeeds.
    pub commit_vcs: bool,
}

/// What was read out of a platform's source tree.
#[derive(Debug, Default)]
struct Extraction {
    /// Referenced string → first file it was seen in.
    strings: IndexMap<String, String>,
    /// All mapping files combined.
    mapping: StringMapping,
    mapping_files: Vec<(SourceFile, StringMapping)>,
}

/// Repositories touched by a run: the working root and the translations
/// directory. They may be the same repository.
#[derive(Debug)]
struct Repositories {
    source: Box<dyn Vcs>,
    translations: Box<dyn Vcs>,
}

impl Repositories {
    fn revert_all(&self) -> Vec<VcsError> {
        [&self.source, &self.translations]
            .into_iter()
            .filter_map(|vcs| vcs.revert_all().err())
            .collect()
    }
}

#[derive(Debug)]
pub struct Pipeline<'a> {
    config: &'a ConfigManager,
    options: RunOptions,
}

impl<'a> Pipeline<'a> {
    #[must_use]
    pub const fn new(config: &'a ConfigManager, options: RunOptions) -> Self {
        Self { config, options }
    }

    fn vcs_kind(&self) -> VcsKind {
        if self.options.no_vcs { VcsKind::None } else { self.config.get_settings().vcs }
    }

    /// Processes `queue` in order and reports what happened.
    pub fn run(&self, queue: &[String]) -> RunReport {
        let mut report = RunReport::new();
        let kind = self.vcs_kind();
        let repositories = Repositories {
            source: kind.create(self.config.root()),
            translations: kind.create(&self.config.translations_dir()),
        };

        for name in queue {
            let mut outcome = PlatformOutcome {
                platform: name.clone(),
                status: PlatformStatus::Failed,
                stats: None,
                purged: 0,
            };

            let Some(platform) = self.config.platform(name) else {
                report.error(name, format!("Platform '{name}' is not configured"));
                report.record_outcome(outcome);
                continue;
            };

            tracing::info!(platform = %name, "Processing platform");
            match self.run_platform(name, platform, &repositories, &mut report, &mut outcome) {
                Ok(()) => {
                    outcome.status = PlatformStatus::Succeeded;
                    tracing::info!(platform = %name, "Platform done");
                }
                Err(err) => {
                    report.error(name, format!("Aborting platform: {err}"));
                    for revert_err in repositories.revert_all() {
                        report.error(name, format!("Failed to revert changes: {revert_err}"));
                    }
                }
            }
            report.record_outcome(outcome);
        }

        report
    }

    fn run_platform(
        &self,
        name: &str,
        platform: &PlatformSettings,
        repositories: &Repositories,
        report: &mut RunReport,
        outcome: &mut PlatformOutcome,
    ) -> Result<(), PipelineError> {
        let settings = self.config.get_settings();
        let source_root = self.config.source_root(platform);
        let matcher = FileMatcher::new(source_root.clone(), platform)?;
        let language_codes: Vec<&str> = settings
            .output_languages
            .iter()
            .map(|language| self.config.language_code(language).unwrap_or(language))
            .collect();
        let files =
            without_localized_output(scan_source_files(&matcher)?, &source_root, platform, &language_codes);

        let mut extraction = extract(&files)?;
        let ignored: HashSet<String> = settings
            .strings_to_ignore
            .iter()
            .map(|string| normalize(&filter_string(string)).0)
            .collect();
        let removed = extraction.mapping.remove_ignored(&ignored);
        extraction.strings.retain(|string, _| !ignored.contains(&normalize(string).0));
        tracing::info!(
            platform = %name,
            files = files.len(),
            strings = extraction.strings.len(),
            mapped = extraction.mapping.len(),
            ignored = removed,
            "Extracted strings"
        );

        check_mapping(name, &extraction, report);

        let database_path = self.config.database_path();
        let mut store = SqliteStore::open(&database_path)?;
        if database_path.exists() {
            repositories.translations.add_file(&database_path)?;
        }
        let stats = store
            .write_string_mapping_for_platform(name, &extraction.mapping.get_string_mapping_dict())?;
        outcome.stats = Some(stats);
        outcome.purged = store.remove_old_unmapped_strings(settings.retention_days)?;

        let natives = store.get_native_translations_for_platform(name)?;
        let all_natives: HashSet<String> = store.get_all_native_translations()?.into_iter().collect();

        let mut records = Vec::with_capacity(settings.output_languages.len());
        for language in &settings.output_languages {
            let record =
                self.update_translation_file(name, language, &natives, &all_natives, repositories, report)?;
            records.push((language, record));
        }

        for (language, record) in &records {
            self.create_localized_resources(
                language,
                record,
                &natives,
                &source_root,
                platform,
                &extraction.mapping_files,
                repositories.source.as_ref(),
            )?;
        }

        store.save()?;
        repositories.translations.add_file(&database_path)?;

        if self.options.commit_vcs {
            let message = format!("Update {name} translations");
            for vcs in [&repositories.source, &repositories.translations] {
                if vcs.commit(&message)? {
                    vcs.upload()?;
                }
            }
        }

        Ok(())
    }

    /// Brings one language's translation file in line with the platform's
    /// native strings and returns the written record.
    fn update_translation_file(
        &self,
        name: &str,
        language: &str,
        natives: &[NativeTranslation],
        all_natives: &HashSet<String>,
        repositories: &Repositories,
        report: &mut RunReport,
    ) -> Result<TranslationRecord, PipelineError> {
        let settings = self.config.get_settings();
        let path = self
            .config
            .translation_file_path(language)
            .ok_or_else(|| PipelineError::NoTranslationFile(language.to_string()))?;
        let format = settings.translation_format.create();
        let metadata = self.config.translation_metadata(language);

        let mut record = load_translation_file(format.as_ref(), &path, metadata.clone())?;
        record.metadata = metadata;

        let projected = record.get_translation_dict();
        let mut added = 0;
        for native in natives {
            if !projected.contains_key(&native.canonical) {
                record.add_translation(&native.canonical, None);
                added += 1;
            }
        }

        let stale: Vec<String> = record
            .untranslated_keys()
            .into_iter()
            .filter(|key| !all_natives.contains(*key))
            .map(str::to_string)
            .collect();
        for key in &stale {
            record.delete_translation(key);
        }

        if settings.abort_if_no_translations && !record.has_translations() {
            return Err(PipelineError::NoTranslations(path));
        }

        save_translation_file(format.as_ref(), &record, &path)?;
        repositories.translations.add_file(&path)?;
        tracing::info!(
            platform = %name,
            language,
            path = %path.display(),
            added,
            removed = stale.len(),
            "Updated translation file"
        );

        let platform_strings: HashSet<&str> =
            natives.iter().map(|native| native.canonical.as_str()).collect();
        for key in record.untranslated_keys() {
            if platform_strings.contains(key) {
                report.warn(name, format!("'{key}' has no {language} translation"));
            }
        }

        Ok(record)
    }

    /// Writes one localized copy of every mapping file.
    #[allow(clippy::too_many_arguments)]
    fn create_localized_resources(
        &self,
        language: &str,
        record: &TranslationRecord,
        natives: &[NativeTranslation],
        source_root: &Path,
        platform: &PlatformSettings,
        mapping_files: &[(SourceFile, StringMapping)],
        vcs: &dyn Vcs,
    ) -> Result<(), PipelineError> {
        let mut translations = record.get_translation_dict();
        if self.config.get_settings().mark_untranslated {
            translations = mark_untranslated(translations);
        }
        let originals: Vec<String> = natives.iter().map(NativeTranslation::original).collect();
        let translations =
            restore_params_to_translations(&originals, &translations);
        let language_code = self.config.language_code(language).unwrap_or(language);

        for (file, mapping) in mapping_files {
            let localized: IndexMap<String, Option<String>> = mapping
                .iter()
                .map(|(key, value)| {
                    (key.to_string(), value.map(|value| localize(&translations, value)))
                })
                .collect();

            let Some(file_name) = file.path.file_name() else {
                continue;
            };
            let output_path =
                output_dir(source_root, platform, file).join(language_code).join(file_name);

            let content = file.parser.create().write_mapping(&localized)?;
            write_file(&output_path, &content)?;
            vcs.add_file(&output_path)?;
            tracing::debug!(language, path = %output_path.display(), "Wrote localized resource");
        }

        Ok(())
    }
}

/// Directory whose `<languageCode>/` subdirectories receive the localized
/// copies of `file`.
fn output_dir(source_root: &Path, platform: &PlatformSettings, file: &SourceFile) -> PathBuf {
    match &platform.localization_output_dir {
        Some(dir) => source_root.join(dir),
        None => file.path.parent().map_or_else(|| source_root.to_path_buf(), Path::to_path_buf),
    }
}

/// Drops files that a previous run wrote as localized resources, so their
/// translated text is never read back as native strings.
fn without_localized_output(
    files: Vec<SourceFile>,
    source_root: &Path,
    platform: &PlatformSettings,
    language_codes: &[&str],
) -> Vec<SourceFile> {
    let output_dirs: HashSet<PathBuf> = files
        .iter()
        .filter(|file| file.is_mapping)
        .flat_map(|file| {
            let base = output_dir(source_root, platform, file);
            language_codes.iter().map(move |code| base.join(code))
        })
        .collect();

    files
        .into_iter()
        .filter(|file| {
            let generated = output_dirs.iter().any(|dir| file.path.starts_with(dir));
            if generated {
                tracing::debug!(path = %file.relative_path.display(), "Skipping localized output");
            }
            !generated
        })
        .collect()
}

/// Reads every scanned file: referenced strings from all of them, mappings
/// from the mapping files.
fn extract(files: &[SourceFile]) -> Result<Extraction, PipelineError> {
    let mut extraction = Extraction::default();

    for file in files {
        let bytes = fs::read(&file.path)
            .map_err(|source| ExtractError::Io { path: file.path.clone(), source })?;
        let content = decode_text(&bytes);
        let source_name = file.relative_path.to_string_lossy().into_owned();
        let extractor = file.parser.create();

        for string in extractor.extract_strings(&source_name, &content)? {
            extraction.strings.entry(string).or_insert_with(|| source_name.clone());
        }

        if file.is_mapping {
            let mapping = extractor.extract_mapping(&source_name, &content)?;
            extraction.mapping.combine_with(&mapping);
            extraction.mapping_files.push((file.clone(), mapping));
        }
    }

    Ok(extraction)
}

/// Warns about referenced strings without a mapping and about values lost
/// to duplicate keys.
fn check_mapping(name: &str, extraction: &Extraction, report: &mut RunReport) {
    for (string, source) in &extraction.strings {
        if !extraction.mapping.contains_key(string) {
            report.warn(name, format!("No mapping for '{string}' (found in {source})"));
        }
    }

    for key in extraction.mapping.conflicting_keys() {
        let kept = extraction.mapping.get_string(key).unwrap_or_default();
        let files = extraction.mapping.get_filenames(key).join(", ");
        report.warn(name, format!("Conflicting values for '{key}' in {files}; keeping '{kept}'"));
    }
}

/// Translation of a native string, or the string itself when untranslated.
fn localize(translations: &IndexMap<String, Option<String>>, value: &str) -> String {
    if let Some(Some(translation)) = translations.get(value) {
        return translation.clone();
    }
    let (canonical, params) = normalize(value);
    match translations.get(&canonical) {
        Some(Some(translation)) => denormalize(translation, &params),
        _ => value.to_string(),
    }
}

fn write_file(path: &Path, content: &str) -> Result<(), ExtractError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .map_err(|source| ExtractError::Io { path: parent.to_path_buf(), source })?;
    }
    fs::write(path, content).map_err(|source| ExtractError::Io { path: path.to_path_buf(), source })
}
