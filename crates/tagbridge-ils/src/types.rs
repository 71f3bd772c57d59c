//! Items and commands as the ILS describes them.

use tagbridge_core::constants::DEFAULT_MATERIAL_TYPE;
use tagbridge_hardware::TagReading;

/// Library assigned to items listed from a reader.
pub const LISTING_LIBRARY: &str = "LIB1";

/// Location assigned to items listed from a reader.
pub const LISTING_LOCATION: &str = "LOC1";

/// One physical part of an item, as carried in `<tags><tag>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IlsTag {
    pub barcode: String,
    pub part_number: u32,
    pub material_type: String,
    pub library: String,
    pub location: String,
}

impl Default for IlsTag {
    fn default() -> Self {
        Self {
            barcode: String::new(),
            part_number: 1,
            material_type: DEFAULT_MATERIAL_TYPE.to_string(),
            library: String::new(),
            location: String::new(),
        }
    }
}

/// An item in a `getItems` listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IlsItem {
    pub barcode: String,
    pub secure: bool,
    pub is_complete: bool,
    pub total_num_of_parts: u32,
    pub tags: Vec<IlsTag>,
}

impl IlsItem {
    /// Describe a tag on the reader as a one-part library item.
    ///
    /// The barcode is the tag's media id when it has one, otherwise its EPC.
    pub fn from_tag(tag: &TagReading) -> Self {
        let barcode = tag.media_id.clone().unwrap_or_else(|| tag.id.clone());
        let material_type = tag
            .tag_type
            .clone()
            .filter(|kind| !kind.is_empty())
            .unwrap_or_else(|| DEFAULT_MATERIAL_TYPE.to_string());

        Self {
            barcode: barcode.clone(),
            secure: tag.secured.unwrap_or(false),
            is_complete: true,
            total_num_of_parts: 1,
            tags: vec![IlsTag {
                barcode,
                part_number: 1,
                material_type,
                library: LISTING_LIBRARY.to_string(),
                location: LISTING_LOCATION.to_string(),
            }],
        }
    }
}

/// Desired state of one item.
///
/// `secure` is `None` when the request carried no security flag, which is
/// different from an explicit `false`: an absent flag leaves the tag's
/// security bit alone.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DesiredItemState {
    pub barcode: String,
    pub secure: Option<bool>,
    pub tags: Vec<IlsTag>,
}

impl DesiredItemState {
    /// Whether the request explicitly set the security flag.
    pub fn secure_provided(&self) -> bool {
        self.secure.is_some()
    }
}

/// Parsed `setSecurity` request.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SecurityRequest {
    pub reader_ip: Option<String>,
    pub barcode: Option<String>,
    pub secure: Option<bool>,
}

/// Parsed `itemUpdate` request.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ItemUpdateRequest {
    pub reader_ip: Option<String>,
    pub items: Vec<DesiredItemState>,
}
