//! Response envelopes in the ILS XML dialect.
//!
//! Every response is an `<rfid>` document:
//!
//! - listings: `<rfid><items><item>...</item></items></rfid>`
//! - command results: `<rfid><success>true</success></rfid>`
//! - errors: `<rfid><ExceptionDetail><Message>...</Message></ExceptionDetail></rfid>`

use crate::types::IlsItem;
use std::fmt::Display;

const DECLARATION: &str = r#"<?xml version="1.0" encoding="UTF-8"?>"#;

/// Minimal element writer; empty elements are written self-closing.
struct XmlWriter {
    out: String,
}

impl XmlWriter {
    fn new() -> Self {
        Self {
            out: String::from(DECLARATION),
        }
    }

    fn open(&mut self, name: &str) -> &mut Self {
        self.out.push('<');
        self.out.push_str(name);
        self.out.push('>');
        self
    }

    fn close(&mut self, name: &str) -> &mut Self {
        self.out.push_str("</");
        self.out.push_str(name);
        self.out.push('>');
        self
    }

    fn element(&mut self, name: &str, value: impl Display) -> &mut Self {
        let text = value.to_string();
        if text.is_empty() {
            self.out.push('<');
            self.out.push_str(name);
            self.out.push_str("/>");
            return self;
        }

        self.open(name);
        escape_into(&mut self.out, &text);
        self.close(name)
    }

    fn finish(self) -> String {
        self.out
    }
}

fn escape_into(out: &mut String, text: &str) {
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(ch),
        }
    }
}

/// Listing of the items on a reader.
///
/// # Examples
///
/// ```
/// use tagbridge_hardware::TagReading;
/// use tagbridge_ils::{IlsItem, builder::build_get_items_response};
///
/// let item = IlsItem::from_tag(&TagReading::new("RFID002"));
/// let xml = build_get_items_response(&[item]);
///
/// assert!(xml.contains("<barcode>RFID002</barcode>"));
/// assert!(xml.contains("<is_secure>false</is_secure>"));
/// ```
pub fn build_get_items_response(items: &[IlsItem]) -> String {
    let mut xml = XmlWriter::new();
    xml.open("rfid").open("items");

    for item in items {
        xml.open("item")
            .element("barcode", &item.barcode)
            .element("is_secure", item.secure)
            .element("is_complete", item.is_complete)
            .element("total_num_of_parts", item.total_num_of_parts)
            .open("tags");

        for tag in &item.tags {
            xml.open("tag")
                .element("tag_id", &tag.barcode)
                .element("part_num", tag.part_number)
                .element("material_type", &tag.material_type)
                .element("library", &tag.library)
                .element("location", &tag.location)
                .close("tag");
        }

        xml.close("tags").close("item");
    }

    xml.close("items").close("rfid");
    xml.finish()
}

/// Result of a command.
pub fn build_success_response(success: bool) -> String {
    let mut xml = XmlWriter::new();
    xml.open("rfid").element("success", success).close("rfid");
    xml.finish()
}

/// Error envelope carrying a human-readable message.
pub fn build_error_response(message: &str) -> String {
    let mut xml = XmlWriter::new();
    xml.open("rfid")
        .open("ExceptionDetail")
        .element("Message", message)
        .close("ExceptionDetail")
        .close("rfid");
    xml.finish()
}
