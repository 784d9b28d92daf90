//! Info dictionary handling for merged output.
//!
//! The merged document gets a fresh Info dictionary carrying the caller's
//! title, author, subject and keywords plus the `Producer` entry. No dates are
//! written, so merging the same snapshot twice yields identical bytes.

use crate::config::Metadata;
use lopdf::{Dictionary, Document, Object, StringFormat};

/// Value written to the `Producer` entry.
pub const PRODUCER: &str = "pdfcollate";

/// Manager for the output Info dictionary.
#[derive(Debug, Default, Clone, Copy)]
pub struct MetadataManager;

impl MetadataManager {
    /// Create a new metadata manager.
    pub fn new() -> Self {
        Self
    }

    /// Write `metadata` into the document's Info dictionary.
    ///
    /// The dictionary is created when missing. Fields left `None` are not
    /// touched. `Producer` is always set.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// # use pdfcollate::merge::metadata::MetadataManager;
    /// # use pdfcollate::config::Metadata;
    /// # use lopdf::Document;
    /// # fn example(mut doc: Document) {
    /// let metadata = Metadata::new(Some("Quarterly report".to_string()), None, None, None);
    /// MetadataManager::new().set_metadata(&mut doc, &metadata);
    /// # }
    /// ```
    pub fn set_metadata(&self, doc: &mut Document, metadata: &Metadata) {
        let info_id = match doc.trailer.get(b"Info").and_then(|i| i.as_reference()) {
            Ok(id) => id,
            Err(_) => {
                let id = doc.new_object_id();
                doc.trailer.set("Info", Object::Reference(id));
                id
            }
        };

        let mut info = match doc.get_object(info_id) {
            Ok(Object::Dictionary(dict)) => dict.clone(),
            _ => Dictionary::new(),
        };

        let fields = [
            ("Title", &metadata.title),
            ("Author", &metadata.author),
            ("Subject", &metadata.subject),
            ("Keywords", &metadata.keywords),
        ];
        for (key, value) in fields {
            if let Some(value) = value {
                info.set(key, text(value));
            }
        }
        info.set("Producer", text(PRODUCER));

        doc.objects.insert(info_id, Object::Dictionary(info));
    }

    /// Read title, author, subject and keywords back from a document.
    pub fn get_metadata(&self, doc: &Document) -> Metadata {
        let Some(info) = Self::info_dict(doc) else {
            return Metadata::default();
        };

        Metadata::new(
            Self::get_string_field(info, b"Title"),
            Self::get_string_field(info, b"Author"),
            Self::get_string_field(info, b"Subject"),
            Self::get_string_field(info, b"Keywords"),
        )
    }

    /// The `Producer` entry, if any.
    pub fn producer(&self, doc: &Document) -> Option<String> {
        Self::info_dict(doc).and_then(|info| Self::get_string_field(info, b"Producer"))
    }

    fn info_dict(doc: &Document) -> Option<&Dictionary> {
        let info_id = doc
            .trailer
            .get(b"Info")
            .and_then(|i| i.as_reference())
            .ok()?;
        match doc.get_object(info_id) {
            Ok(Object::Dictionary(dict)) => Some(dict),
            _ => None,
        }
    }

    fn get_string_field(dict: &Dictionary, key: &[u8]) -> Option<String> {
        match dict.get(key) {
            Ok(Object::String(bytes, _)) => String::from_utf8(bytes.clone()).ok(),
            _ => None,
        }
    }
}

fn text(value: &str) -> Object {
    Object::String(value.as_bytes().to_vec(), StringFormat::Literal)
}
