// crates/dataprep-core/src/atom.rs
// ============================================================================
// Module: CMIS AtomPub Codec
// Description: AtomPub service documents, entries, and feeds.
// Purpose: Decode and encode the XML documents of the CMIS AtomPub binding.
// Dependencies: base64, quick-xml
// ============================================================================

//! ## Overview
//! The AtomPub binding wraps every repository object in an `atom:entry` whose
//! `cmis:properties` element carries one typed property element per property
//! id. Decoding is event driven and only keeps the four properties a
//! [`CmisObject`] needs. Feeds signal further pages with a `next` link.
//! Invariants:
//! - Entries nested inside another entry are skipped; only top-level entries
//!   of a feed are returned.
//! - Text written into request entries is XML-escaped.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::borrow::Cow;
use std::fmt::Display;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use quick_xml::Reader;
use quick_xml::escape::escape;
use quick_xml::events::BytesStart;
use quick_xml::events::Event;

use crate::cmis::BaseType;
use crate::cmis::CmisObject;
use crate::cmis::RepositoryInfo;
use crate::error::DataPrepError;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Content type of an AtomPub entry posted to a children collection.
pub(crate) const ATOM_ENTRY_CONTENT_TYPE: &str = "application/atom+xml;type=entry";

/// Namespace declarations shared by request entries.
const ENTRY_NAMESPACES: &str = concat!(
    "xmlns:atom=\"http://www.w3.org/2005/Atom\" ",
    "xmlns:cmis=\"http://docs.oasis-open.org/ns/cmis/core/200908/\" ",
    "xmlns:cmisra=\"http://docs.oasis-open.org/ns/cmis/restatom/200908/\""
);

// ============================================================================
// SECTION: Decoding
// ============================================================================

/// Objects decoded from one AtomPub feed page.
#[derive(Debug, Default)]
pub(crate) struct AtomFeed {
    /// Top-level entries in document order.
    pub(crate) objects: Vec<CmisObject>,
    /// True when the feed links to a next page.
    pub(crate) has_more_items: bool,
}

/// Properties collected while an entry is open.
#[derive(Debug, Default)]
struct EntryProperties {
    /// `cmis:objectId`.
    object_id: Option<String>,
    /// `cmis:name`.
    name: String,
    /// `cmis:baseTypeId`.
    base_type_id: String,
    /// `cmis:objectTypeId`.
    object_type_id: String,
}

impl EntryProperties {
    /// Records one property value; unknown property ids are ignored.
    fn set(&mut self, property_id: &str, value: String) {
        match property_id {
            "cmis:objectId" => self.object_id = Some(value),
            "cmis:name" => self.name = value,
            "cmis:baseTypeId" => self.base_type_id = value,
            "cmis:objectTypeId" => self.object_type_id = value,
            _ => {}
        }
    }

    /// Converts the collected properties into a [`CmisObject`].
    fn into_object(self) -> Result<CmisObject, DataPrepError> {
        let id = self
            .object_id
            .ok_or_else(|| DataPrepError::Protocol("atom entry without cmis:objectId".to_string()))?;
        Ok(CmisObject {
            base_type: BaseType::from_type_id(&self.base_type_id),
            id,
            name: self.name,
            object_type_id: self.object_type_id,
        })
    }
}

/// Maps XML and encoding failures onto protocol errors.
fn xml_error(err: impl Display) -> DataPrepError {
    DataPrepError::Protocol(format!("invalid atom document: {err}"))
}

/// Opens a trimming reader over a UTF-8 body.
fn reader(body: &[u8]) -> Result<Reader<&[u8]>, DataPrepError> {
    std::str::from_utf8(body).map_err(xml_error)?;
    let mut reader = Reader::from_reader(body);
    reader.config_mut().trim_text(true);
    Ok(reader)
}

/// Returns the `propertyDefinitionId` attribute of a property element.
fn definition_id(tag: &BytesStart<'_>) -> Result<Option<String>, DataPrepError> {
    tag.try_get_attribute("propertyDefinitionId")
        .map_err(xml_error)?
        .map(|attribute| attribute.unescape_value().map(Cow::into_owned).map_err(xml_error))
        .transpose()
}

/// Returns true when the element is `<link rel="next">`.
fn is_next_link(tag: &BytesStart<'_>) -> Result<bool, DataPrepError> {
    if tag.local_name().as_ref() != b"link" {
        return Ok(false);
    }
    let rel = tag.try_get_attribute("rel").map_err(xml_error)?;
    match rel {
        Some(attribute) => Ok(attribute.unescape_value().map_err(xml_error)? == "next"),
        None => Ok(false),
    }
}

/// Returns true for typed property elements (`propertyId`, `propertyString`, ...).
fn is_property_element(local_name: &[u8]) -> bool {
    local_name.starts_with(b"property") && local_name != b"properties"
}

/// Decodes every top-level entry of a feed or a single entry document.
///
/// # Errors
///
/// Returns [`DataPrepError::Protocol`] for malformed XML or entries without
/// an object id.
pub(crate) fn parse_feed(body: &[u8]) -> Result<AtomFeed, DataPrepError> {
    let mut reader = reader(body)?;
    let mut buf = Vec::new();
    let mut feed = AtomFeed::default();
    let mut open_entries: Vec<EntryProperties> = Vec::new();
    let mut property: Option<String> = None;
    let mut in_value = false;
    loop {
        match reader.read_event_into(&mut buf).map_err(xml_error)? {
            Event::Start(tag) => {
                let local_name = tag.local_name();
                match local_name.as_ref() {
                    b"entry" => open_entries.push(EntryProperties::default()),
                    b"value" => in_value = property.is_some(),
                    name if is_property_element(name) => property = definition_id(&tag)?,
                    _ => {
                        if open_entries.is_empty() && is_next_link(&tag)? {
                            feed.has_more_items = true;
                        }
                    }
                }
            }
            Event::Empty(tag) => {
                if open_entries.is_empty() && is_next_link(&tag)? {
                    feed.has_more_items = true;
                }
            }
            Event::Text(text) => {
                if in_value
                    && let (Some(property_id), Some(entry)) =
                        (property.as_deref(), open_entries.last_mut())
                {
                    entry.set(property_id, text.unescape().map_err(xml_error)?.into_owned());
                }
            }
            Event::End(tag) => {
                let local_name = tag.local_name();
                match local_name.as_ref() {
                    b"entry" => {
                        if let Some(entry) = open_entries.pop()
                            && open_entries.is_empty()
                        {
                            feed.objects.push(entry.into_object()?);
                        }
                    }
                    b"value" => in_value = false,
                    name if is_property_element(name) => property = None,
                    _ => {}
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }
    Ok(feed)
}

/// Decodes a single entry document.
///
/// # Errors
///
/// Returns [`DataPrepError::Protocol`] when the document holds no entry.
pub(crate) fn parse_entry(body: &[u8]) -> Result<CmisObject, DataPrepError> {
    parse_feed(body)?
        .objects
        .into_iter()
        .next()
        .ok_or_else(|| DataPrepError::Protocol("atom document holds no entry".to_string()))
}

/// Service document fields captured during decoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ServiceField {
    /// `cmis:repositoryId`.
    RepositoryId,
    /// `cmis:rootFolderId`.
    RootFolderId,
}

/// Reads the first repository from an AtomPub service document.
///
/// # Errors
///
/// Returns [`DataPrepError::Protocol`] when the document lists no repository.
pub(crate) fn parse_service_document(body: &[u8]) -> Result<RepositoryInfo, DataPrepError> {
    let mut reader = reader(body)?;
    let mut buf = Vec::new();
    let mut field: Option<ServiceField> = None;
    let mut repository_id: Option<String> = None;
    let mut root_folder_id: Option<String> = None;
    loop {
        match reader.read_event_into(&mut buf).map_err(xml_error)? {
            Event::Start(tag) => {
                field = match tag.local_name().as_ref() {
                    b"repositoryId" => Some(ServiceField::RepositoryId),
                    b"rootFolderId" => Some(ServiceField::RootFolderId),
                    _ => None,
                };
            }
            Event::Text(text) => {
                let slot = match field {
                    Some(ServiceField::RepositoryId) => Some(&mut repository_id),
                    Some(ServiceField::RootFolderId) => Some(&mut root_folder_id),
                    None => None,
                };
                if let Some(slot) = slot
                    && slot.is_none()
                {
                    *slot = Some(text.unescape().map_err(xml_error)?.into_owned());
                }
            }
            Event::End(_) => field = None,
            Event::Eof => break,
            _ => {}
        }
        if repository_id.is_some() && root_folder_id.is_some() {
            break;
        }
        buf.clear();
    }
    match (repository_id, root_folder_id) {
        (Some(id), Some(root_folder_id)) => Ok(RepositoryInfo {
            id,
            root_folder_id,
        }),
        _ => Err(DataPrepError::Protocol("server exposes no cmis repository".to_string())),
    }
}

// ============================================================================
// SECTION: Encoding
// ============================================================================

/// Renders the `cmisra:object` block naming the type and display name.
fn object_block(object_type_id: &str, name: &str) -> String {
    format!(
        "<cmisra:object><cmis:properties>\
         <cmis:propertyId propertyDefinitionId=\"cmis:objectTypeId\"><cmis:value>{object_type_id}</cmis:value></cmis:propertyId>\
         <cmis:propertyString propertyDefinitionId=\"cmis:name\"><cmis:value>{name}</cmis:value></cmis:propertyString>\
         </cmis:properties></cmisra:object>",
        name = escape(name),
    )
}

/// Builds the entry posted to create a folder.
pub(crate) fn folder_entry(name: &str) -> String {
    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\
         <atom:entry {ENTRY_NAMESPACES}><atom:title>{title}</atom:title>{object}</atom:entry>",
        title = escape(name),
        object = object_block("cmis:folder", name),
    )
}

/// Builds the entry posted to create a document with inline base64 content.
pub(crate) fn document_entry(name: &str, mime_type: &str, content: &[u8]) -> String {
    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\
         <atom:entry {ENTRY_NAMESPACES}><atom:title>{title}</atom:title>\
         <cmisra:content><cmisra:mediatype>{mime_type}</cmisra:mediatype>\
         <cmisra:base64>{content}</cmisra:base64></cmisra:content>{object}</atom:entry>",
        title = escape(name),
        mime_type = escape(mime_type),
        content = BASE64.encode(content),
        object = object_block("cmis:document", name),
    )
}
