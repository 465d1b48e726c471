//! XLIFF 1.2 translation files.
//!
//! ```xml
//! <xliff version="1.2">
//!   <file source-language="en" target-language="French" product-name="Widget" ...>
//!     <header><phase-group><phase company-name="..." contact-email="..."/></phase-group></header>
//!     <body>
//!       <group resname="Widget">
//!         <trans-unit id="1" restype="string">
//!           <source xml:lang="en">Open</source>
//!           <target>Ouvrir</target>
//!         </trans-unit>
//!       </group>
//!     </body>
//!   </file>
//! </xliff>
//! ```
//!
//! An empty `<target/>` marks an untranslated string.

use std::fmt::Write as _;

use quick_xml::Reader;
use quick_xml::escape::escape;
use quick_xml::events::{
    BytesStart,
    Event,
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
use crate::placeholder::normalize;

#[derive(Debug, Clone, Copy, Default)]
pub struct XlfFormat;

/// Element whose text is being collected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Source,
    Target,
}

/// A `trans-unit` being read.
#[derive(Debug, Default)]
struct TransUnit {
    source: Option<String>,
    target: Option<String>,
}

impl TransUnit {
    fn slot(&mut self, field: Field) -> &mut Option<String> {
        match field {
            Field::Source => &mut self.source,
            Field::Target => &mut self.target,
        }
    }
}

/// Copies the header attributes of `element` into `metadata`.
fn read_header(
    element: &BytesStart<'_>,
    metadata: &mut TranslationMetadata,
) -> Result<(), quick_xml::Error> {
    for attribute in element.attributes() {
        let attribute = attribute?;
        let value = attribute.unescape_value()?.into_owned();
        match attribute.key.as_ref() {
            b"target-language" => metadata.language = value,
            b"source-language" => metadata.source_language = value,
            b"product-name" => metadata.product_name = value,
            b"company-name" => metadata.company_name = value,
            b"contact-email" => metadata.contact_email = value,
            _ => {}
        }
    }
    Ok(())
}

/// Parses every `trans-unit` with both a source and a target.
fn read_units(
    content: &str,
    metadata: &mut TranslationMetadata,
) -> Result<Vec<(String, Option<String>)>, quick_xml::Error> {
    let mut reader = Reader::from_str(content);
    let mut units = Vec::new();
    let mut unit: Option<TransUnit> = None;
    let mut field: Option<Field> = None;

    loop {
        match reader.read_event()? {
            Event::Start(element) => match element.name().as_ref() {
                b"file" | b"phase" => read_header(&element, metadata)?,
                b"trans-unit" => unit = Some(TransUnit::default()),
                b"source" | b"target" => {
                    if let Some(unit) = unit.as_mut() {
                        let opened =
                            if element.name().as_ref() == b"source" { Field::Source } else { Field::Target };
                        *unit.slot(opened) = Some(String::new());
                        field = Some(opened);
                    }
                }
                _ => {}
            },
            Event::Empty(element) => match element.name().as_ref() {
                b"file" | b"phase" => read_header(&element, metadata)?,
                b"source" => {
                    if let Some(unit) = unit.as_mut() {
                        unit.source = Some(String::new());
                    }
                }
                b"target" => {
                    if let Some(unit) = unit.as_mut() {
                        unit.target = Some(String::new());
                    }
                }
                _ => {}
            },
            Event::Text(text) => {
                if let (Some(unit), Some(field)) = (unit.as_mut(), field)
                    && let Some(slot) = unit.slot(field).as_mut()
                {
                    slot.push_str(&text.unescape()?);
                }
            }
            Event::CData(data) => {
                if let (Some(unit), Some(field)) = (unit.as_mut(), field)
                    && let Some(slot) = unit.slot(field).as_mut()
                {
                    slot.push_str(&data.decode()?);
                }
            }
            Event::End(element) => match element.name().as_ref() {
                b"source" | b"target" => field = None,
                b"trans-unit" => {
                    if let Some(TransUnit { source: Some(source), target: Some(target) }) = unit.take() {
                        units.push((source, Some(target).filter(|target| !target.is_empty())));
                    }
                }
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(units)
}

impl TranslationFormat for XlfFormat {
    fn read(
        &self,
        origin: &str,
        content: &str,
        record: &mut TranslationRecord,
    ) -> Result<(), TranslationFileError> {
        let mut metadata = record.metadata.clone();
        let units = read_units(content, &mut metadata)
            .map_err(|source| TranslationFileError::Xml { origin: origin.to_string(), source })?;

        if units.is_empty() {
            return Err(TranslationFileError::Empty(origin.to_string()));
        }

        record.metadata = metadata;
        for (source, target) in units {
            record.add_translation(&source, target);
        }

        Ok(())
    }

    fn write(&self, record: &TranslationRecord) -> Result<String, TranslationFileError> {
        let metadata = &record.metadata;
        let source_language = escape(metadata.source_language.as_str());
        let product_name = escape(metadata.product_name.as_str());

        let mut output = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
        output.push_str("<xliff version=\"1.2\" xmlns=\"urn:oasis:names:tc:xliff:document:1.2\">\n");
        let _ = writeln!(
            output,
            "  <file original=\"{product_name}\" datatype=\"plaintext\" source-language=\"{source_language}\" \
             target-language=\"{}\" product-name=\"{product_name}\">",
            escape(metadata.language.as_str()),
        );
        output.push_str("    <header>\n      <phase-group>\n");
        let _ = writeln!(
            output,
            "        <phase phase-name=\"translation\" process-name=\"translation\" \
             company-name=\"{}\" contact-email=\"{}\"/>",
            escape(metadata.company_name.as_str()),
            escape(metadata.contact_email.as_str()),
        );
        output.push_str("      </phase-group>\n    </header>\n    <body>\n");
        let _ = writeln!(output, "      <group resname=\"{product_name}\">");

        for (id, (native, translation)) in entries_for_writing(record).into_iter().enumerate() {
            let (canonical, _) = normalize(native);
            let _ = writeln!(output, "        <trans-unit id=\"{}\" restype=\"string\">", id + 1);
            let _ = writeln!(
                output,
                "          <source xml:lang=\"{source_language}\">{}</source>",
                escape(canonical.as_str()),
            );
            match translation {
                Some(translation) => {
                    let _ = writeln!(output, "          <target>{}</target>", escape(translation));
                }
                None => output.push_str("          <target/>\n"),
            }
            output.push_str("        </trans-unit>\n");
        }

        output.push_str("      </group>\n    </body>\n  </file>\n</xliff>\n");
        Ok(output)
    }
}
