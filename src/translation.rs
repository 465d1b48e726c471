//! Per-language translation records and the files that persist them.
/// Translation file load/save helpers
mod file;
/// Translation file format trait and registry
mod format;
/// JSON translation file format
mod json;
/// In-memory translation record
mod record;
/// XLIFF translation file format
mod xlf;

pub use file::{
    load_translation_file,
    save_translation_file,
};
pub use format::{
    TranslationFileError,
    TranslationFormat,
    TranslationFormatKind,
};
pub use json::JsonFormat;
pub use record::{
    ELLIPSIS,
    THREE_DOTS,
    TranslationMetadata,
    TranslationRecord,
    mark_untranslated,
    strip_ellipsis,
};
pub use xlf::XlfFormat;
