//! JSON translation files.
//!
//! ```json
//! {
//!   "language": "French",
//!   "languageCode": "fr-FR",
//!   ...
//!   "strings": { "Open": "Ouvrir", "Close": null }
//! }
//! ```

use indexmap::IndexMap;
use serde::{
    Deserialize,
    Serialize,
};

use super::format::{
    TranslationFileError,
    TranslationFormat,
    entries_for_writing,
};
use super::record::{
    TranslationMetadata,
    TranslationRecord,
};

#[derive(Debug, Deserialize, Serialize)]
struct TranslationDocument {
    #[serde(flatten)]
    metadata: TranslationMetadata,
    #[serde(default)]
    strings: IndexMap<String, Option<String>>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct JsonFormat;

impl TranslationFormat for JsonFormat {
    fn read(
        &self,
        origin: &str,
        content: &str,
        record: &mut TranslationRecord,
    ) -> Result<(), TranslationFileError> {
        let document: TranslationDocument = serde_json::from_str(content)
            .map_err(|source| TranslationFileError::Parse { origin: origin.to_string(), source })?;

        if document.strings.is_empty() {
            return Err(TranslationFileError::Empty(origin.to_string()));
        }

        record.metadata = document.metadata;
        for (native, translation) in document.strings {
            record.add_translation(&native, translation);
        }

        Ok(())
    }

    fn write(&self, record: &TranslationRecord) -> Result<String, TranslationFileError> {
        let strings = entries_for_writing(record)
            .into_iter()
            .map(|(native, translation)| (native.to_string(), translation.map(str::to_string)))
            .collect();

        let document = TranslationDocument { metadata: record.metadata.clone(), strings };
        let mut content =
            serde_json::to_string_pretty(&document).map_err(TranslationFileError::Serialize)?;
        content.push('\n');
        Ok(content)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use googletest::prelude::*;

    use super::*;

    #[googletest::test]
    fn write_orders_untranslated_first() {
        let mut record = TranslationRecord::new(TranslationMetadata {
            language: "French".to_string(),
            language_code: "fr-FR".to_string(),
            ..TranslationMetadata::default()
        });
        record.add_translation("Open", Some("Ouvrir".to_string()));
        record.add_translation("Zoom", None);
        record.add_translation("Close", Some("Fermer".to_string()));
        record.add_translation("Apply", None);
        record.add_translation("  ", None);

        let content = JsonFormat.write(&record).unwrap();
        let value: serde_json::Value = serde_json::from_str(&content).unwrap();
        let keys: Vec<&str> =
            value["strings"].as_object().unwrap().keys().map(String::as_str).collect();

        expect_that!(keys, elements_are![eq(&"Apply"), eq(&"Zoom"), eq(&"Close"), eq(&"Open")]);
        expect_that!(value["languageCode"].as_str(), some(eq("fr-FR")));
        expect_that!(content.ends_with('\n'), eq(true));
    }

    #[googletest::test]
    fn read_restores_written_record() {
        let mut record = TranslationRecord::new(TranslationMetadata::default());
        record.add_translation("Open {0}", Some("Ouvrir {0}".to_string()));
        record.add_translation("Close", None);
        let content = JsonFormat.write(&record).unwrap();

        let mut loaded = TranslationRecord::new(TranslationMetadata::default());
        JsonFormat.read("fr.json", &content, &mut loaded).unwrap();

        expect_that!(loaded.get_translation("Open {0}"), some(eq("Ouvrir {0}")));
        expect_that!(loaded.untranslated_keys(), elements_are![eq(&"Close")]);
    }

    #[googletest::test]
    fn read_takes_metadata_from_document() {
        let mut record = TranslationRecord::default();

        JsonFormat
            .read("fr.json", r#"{"languageCode": "fr-FR", "strings": {"Open": null}}"#, &mut record)
            .unwrap();

        expect_that!(record.metadata.language_code, eq("fr-FR"));
    }

    #[googletest::test]
    fn read_rejects_empty_strings() {
        let mut record = TranslationRecord::default();

        let result = JsonFormat.read("fr.json", r#"{"language": "French", "strings": {}}"#, &mut record);

        assert!(matches!(result, Err(TranslationFileError::Empty(origin)) if origin == "fr.json"));
    }

    #[googletest::test]
    fn read_reports_malformed_content() {
        let mut record = TranslationRecord::default();

        let result = JsonFormat.read("fr.json", "{ not json", &mut record);

        assert!(matches!(result, Err(TranslationFileError::Parse { .. })));
    }
}
