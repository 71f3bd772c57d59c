//! Request parsing for the ILS XML dialect.
//!
//! ILS versions disagree on element names (`is_secure` or `secure`, `tag_id`
//! or `barcode`) and on where `reader_ip` lives. Every field is therefore
//! described as an ordered list of candidate paths, and [`first_text`]
//! returns the value of the first path present in the document.
//!
//! Requests may or may not be wrapped in an `<rfid>` root; paths are
//! relative to `<rfid>` when it is present and to the document otherwise.
//!
//! # Examples
//!
//! ```
//! use tagbridge_ils::parser::parse_set_security_payload;
//!
//! let request = parse_set_security_payload(
//!     "<rfid><barcode>31234</barcode><is_secure>true</is_secure>\
//!      <security><reader_ip>10.0.0.5</reader_ip></security></rfid>",
//! )
//! .unwrap();
//!
//! assert_eq!(request.barcode.as_deref(), Some("31234"));
//! assert_eq!(request.secure, Some(true));
//! assert_eq!(request.reader_ip.as_deref(), Some("10.0.0.5"));
//! ```

use crate::error::Result;
use crate::types::{DesiredItemState, IlsTag, ItemUpdateRequest, SecurityRequest};
use roxmltree::{Document, Node};

/// Element names leading from a context node to a field.
pub type FieldPath = &'static [&'static str];

/// Where `reader_ip` may appear, most specific dialect first.
pub const READER_IP_PATHS: &[FieldPath] = &[
    &["reader_ip"],
    &["readerIp"],
    &["security", "reader_ip"],
    &["items", "reader_ip"],
    &["item", "reader_ip"],
    &["update", "reader_ip"],
    &["updateItem", "reader_ip"],
];

const BARCODE_PATHS: &[FieldPath] = &[&["barcode"]];

const SECURE_PATHS: &[FieldPath] = &[&["is_secure"], &["secure"]];

const SECURITY_BARCODE_PATHS: &[FieldPath] =
    &[&["barcode"], &["security", "barcode"], &["item", "barcode"]];

const SECURITY_SECURE_PATHS: &[FieldPath] = &[
    &["is_secure"],
    &["secure"],
    &["security", "is_secure"],
    &["security", "secure"],
    &["item", "is_secure"],
    &["item", "secure"],
];

const TAG_BARCODE_PATHS: &[FieldPath] = &[&["tag_id"], &["barcode"]];
const PART_NUMBER_PATHS: &[FieldPath] = &[&["part_num"], &["partNumber"]];
const MATERIAL_TYPE_PATHS: &[FieldPath] = &[&["material_type"], &["materialType"]];
const LIBRARY_PATHS: &[FieldPath] = &[&["library"]];
const LOCATION_PATHS: &[FieldPath] = &[&["location"]];

fn child<'a, 'input>(node: Node<'a, 'input>, name: &str) -> Option<Node<'a, 'input>> {
    node.children()
        .find(|child| child.is_element() && child.has_tag_name(name))
}

fn children<'a, 'input>(
    node: Node<'a, 'input>,
    name: &'static str,
) -> impl Iterator<Item = Node<'a, 'input>> {
    node.children()
        .filter(move |child| child.is_element() && child.has_tag_name(name))
}

fn text_of(node: Node<'_, '_>) -> Option<String> {
    node.text()
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(str::to_string)
}

/// Trimmed text of the first candidate path present under `node`.
///
/// Empty elements count as absent.
pub fn first_text(node: Node<'_, '_>, paths: &[FieldPath]) -> Option<String> {
    paths.iter().find_map(|path| {
        path.iter()
            .try_fold(node, |current, name| child(current, name))
            .and_then(text_of)
    })
}

/// `true`/`false` in any case; anything else is absent.
fn parse_bool(text: &str) -> Option<bool> {
    if text.eq_ignore_ascii_case("true") {
        Some(true)
    } else if text.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}

/// Node that field paths are relative to.
fn payload<'a, 'input>(document: &'a Document<'input>) -> Node<'a, 'input> {
    let root = document.root_element();
    if root.has_tag_name("rfid") {
        root
    } else {
        document.root()
    }
}

fn reader_ip(document: &Document<'_>) -> Option<String> {
    first_text(payload(document), READER_IP_PATHS)
        .or_else(|| first_text(document.root(), READER_IP_PATHS))
}

fn parse_tag(node: Node<'_, '_>) -> IlsTag {
    let defaults = IlsTag::default();

    IlsTag {
        barcode: first_text(node, TAG_BARCODE_PATHS).unwrap_or_default(),
        part_number: first_text(node, PART_NUMBER_PATHS)
            .and_then(|value| value.parse().ok())
            .unwrap_or(defaults.part_number),
        material_type: first_text(node, MATERIAL_TYPE_PATHS).unwrap_or(defaults.material_type),
        library: first_text(node, LIBRARY_PATHS).unwrap_or_default(),
        location: first_text(node, LOCATION_PATHS).unwrap_or_default(),
    }
}

/// Tag nodes of an item: `tags/tag`, a lone `tags` element, or `rfidtag`.
fn tag_nodes<'a, 'input>(item: Node<'a, 'input>) -> Vec<Node<'a, 'input>> {
    if let Some(tags) = child(item, "tags") {
        let nested: Vec<_> = children(tags, "tag").collect();
        if !nested.is_empty() {
            return nested;
        }
        if tags.children().any(|node| node.is_element()) {
            return vec![tags];
        }
    }

    children(item, "rfidtag").collect()
}

fn parse_item(node: Node<'_, '_>) -> DesiredItemState {
    DesiredItemState {
        barcode: first_text(node, BARCODE_PATHS).unwrap_or_default(),
        secure: first_text(node, SECURE_PATHS).and_then(|value| parse_bool(&value)),
        tags: tag_nodes(node).into_iter().map(parse_tag).collect(),
    }
}

/// Parse a `setSecurity` request.
///
/// # Errors
///
/// Returns [`ProtocolError::MalformedXml`](crate::ProtocolError::MalformedXml)
/// if the body is not well-formed. Missing fields are reported as `None`.
pub fn parse_set_security_payload(xml: &str) -> Result<SecurityRequest> {
    let document = Document::parse(xml)?;
    let root = payload(&document);

    Ok(SecurityRequest {
        reader_ip: reader_ip(&document),
        barcode: first_text(root, SECURITY_BARCODE_PATHS),
        secure: first_text(root, SECURITY_SECURE_PATHS).and_then(|value| parse_bool(&value)),
    })
}

/// Root-level `barcode` and secure flag read as a single item.
fn root_item_update(document: &Document<'_>) -> ItemUpdateRequest {
    let root = payload(document);

    ItemUpdateRequest {
        reader_ip: reader_ip(document),
        items: first_text(root, BARCODE_PATHS)
            .map(|barcode| DesiredItemState {
                barcode,
                secure: first_text(root, SECURE_PATHS).and_then(|value| parse_bool(&value)),
                tags: Vec::new(),
            })
            .into_iter()
            .collect(),
    }
}

/// Parse an `itemUpdate` request.
///
/// Items are read from `items/item`, or from bare `item` elements. A body
/// with no item elements but a root-level `barcode` is read as one item.
///
/// # Errors
///
/// Returns [`ProtocolError::MalformedXml`](crate::ProtocolError::MalformedXml)
/// if the body is not well-formed.
pub fn parse_item_update_payload(xml: &str) -> Result<ItemUpdateRequest> {
    let document = Document::parse(xml)?;
    let root = payload(&document);

    let item_nodes: Vec<_> = match child(root, "items") {
        Some(container) => children(container, "item").collect(),
        None => children(root, "item").collect(),
    };

    if item_nodes.is_empty() {
        return Ok(root_item_update(&document));
    }

    Ok(ItemUpdateRequest {
        reader_ip: reader_ip(&document),
        items: item_nodes.into_iter().map(parse_item).collect(),
    })
}
