//! Record types shared by the crawler, the ledger, the normalizer and the sync dispatcher
//!
//! Field names on the serialized forms follow the ledger and ingestion formats already in
//! use downstream, so existing ledgers load unchanged.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Sentinel stored for any text field the page did not provide
pub const NOT_AVAILABLE: &str = "N/A";

fn not_available() -> String {
    NOT_AVAILABLE.to_string()
}

/// Lightweight summary scraped from one search-results card
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingStub {
    pub title: String,
    pub subtitle: String,
    pub price_text: String,
    /// Absolute URL of the listing's detail page; the dedup key
    pub detail_url: String,
}

/// Expected label set of one detail-page section
///
/// `fields` maps the label text shown on the page to the key stored in the record.
#[derive(Debug, Clone, Copy)]
pub struct SectionSpec {
    pub name: &'static str,
    /// Element id wrapping the section's definition list
    pub anchor_id: &'static str,
    pub fields: &'static [(&'static str, &'static str)],
}

impl SectionSpec {
    /// Returns the record keys of this section in declaration order
    pub fn keys(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.fields.iter().map(|(_, key)| *key)
    }

    /// Maps a page label to its record key, if the label is expected
    pub fn key_for_label(&self, label: &str) -> Option<&'static str> {
        self.fields
            .iter()
            .find(|(page_label, _)| *page_label == label)
            .map(|(_, key)| *key)
    }
}

pub const BASIC_DATA: SectionSpec = SectionSpec {
    name: "Basic_Data",
    anchor_id: "basic-details-section",
    fields: &[
        ("Body type", "Body_type"),
        ("Vehicle type", "Vehicle_type"),
        ("Drivetrain", "Drivetrain"),
        ("Seats", "Seats"),
        ("Doors", "Doors"),
        ("Country version", "Country_version"),
        ("Offer Number", "Offer_Number"),
        ("Model code", "Model_Code"),
    ],
};

pub const VEHICLE_HISTORY: SectionSpec = SectionSpec {
    name: "Vehicle_History",
    anchor_id: "listing-history-section",
    fields: &[
        ("Mileage", "Mileage"),
        ("First registration", "First_registration"),
        ("Previous owner", "Previous_owner"),
        ("Full service history", "Full_service_history"),
        ("General inspection", "General_inspection"),
    ],
};

pub const TECHNICAL_DATA: SectionSpec = SectionSpec {
    name: "Technical_Data",
    anchor_id: "technical-details-section",
    fields: &[
        ("Power", "Power"),
        ("Gearbox", "Gearbox"),
        ("Engine size", "Engine_size"),
        ("Cylinders", "Cylinders"),
        ("Gears", "Gears"),
        ("Empty weight", "Empty_weight"),
    ],
};

pub const ENERGY_CONSUMPTION: SectionSpec = SectionSpec {
    name: "Energy_Consumption",
    anchor_id: "environment-details-section",
    fields: &[
        ("Emission class", "Emission_class"),
        ("Fuel type", "Fuel_type"),
        ("Fuel consumption", "Fuel_consumption"),
        ("CO₂-emissions", "CO₂_emissions"),
    ],
};

pub const COLOUR_AND_UPHOLSTERY: SectionSpec = SectionSpec {
    name: "Colour_and_Upholstery",
    anchor_id: "color-section",
    fields: &[
        ("Colour", "Colour"),
        ("Paint", "Paint"),
        ("Manufacturer colour", "Manufacturer_colour"),
        ("Upholstery colour", "Upholstery_colour"),
        ("Upholstery", "Upholstery"),
    ],
};

/// All detail sections, in extraction order
pub const ALL_SECTIONS: [SectionSpec; 5] = [
    BASIC_DATA,
    VEHICLE_HISTORY,
    TECHNICAL_DATA,
    ENERGY_CONSUMPTION,
    COLOUR_AND_UPHOLSTERY,
];

/// Closed label-to-value mapping of one section
///
/// A map built with [`SectionMap::seeded`] holds exactly the section's expected keys; [`SectionMap::fill`]
/// can only overwrite keys that are already present.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SectionMap(BTreeMap<String, String>);

impl SectionMap {
    /// Creates a map with every expected key set to the sentinel
    pub fn seeded(spec: &SectionSpec) -> Self {
        Self(spec.keys().map(|key| (key.to_string(), not_available())).collect())
    }

    /// Seeds the expected keys, then takes every stored pair whose key is expected
    pub fn closed(spec: &SectionSpec, stored: BTreeMap<String, String>) -> Self {
        let mut map = Self::seeded(spec);
        for (key, value) in stored {
            if !map.fill(&key, value) {
                tracing::debug!("Dropping unexpected {} label '{}'", spec.name, key);
            }
        }
        map
    }

    /// Overwrites an expected key; returns false for keys outside the set
    pub fn fill(&mut self, key: &str, value: impl Into<String>) -> bool {
        match self.0.get_mut(key) {
            Some(slot) => {
                *slot = value.into();
                true
            }
            None => false,
        }
    }

    /// Returns the stored value, treating the sentinel and blanks as missing
    pub fn value(&self, key: &str) -> Option<&str> {
        self.0
            .get(key)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty() && *v != NOT_AVAILABLE)
    }

    /// Returns the stored value including the sentinel
    pub fn raw(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// The five structured sections of a detail page
///
/// Deserialization rebuilds every map over its expected key set: stored labels outside the set
/// are dropped and missing ones come back as the sentinel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "StoredSections")]
pub struct Sections {
    #[serde(rename = "Basic_Data")]
    pub basic_data: SectionMap,
    #[serde(rename = "Vehicle_History")]
    pub vehicle_history: SectionMap,
    #[serde(rename = "Technical_Data")]
    pub technical_data: SectionMap,
    #[serde(rename = "Energy_Consumption")]
    pub energy_consumption: SectionMap,
    #[serde(rename = "Colour_and_Upholstery")]
    pub colour_and_upholstery: SectionMap,
}

/// Section maps as found in a ledger file, possibly partial or carrying extra labels
#[derive(Deserialize)]
struct StoredSections {
    #[serde(rename = "Basic_Data", default)]
    basic_data: BTreeMap<String, String>,
    #[serde(rename = "Vehicle_History", default)]
    vehicle_history: BTreeMap<String, String>,
    #[serde(rename = "Technical_Data", default)]
    technical_data: BTreeMap<String, String>,
    #[serde(rename = "Energy_Consumption", default)]
    energy_consumption: BTreeMap<String, String>,
    #[serde(rename = "Colour_and_Upholstery", default)]
    colour_and_upholstery: BTreeMap<String, String>,
}

impl From<StoredSections> for Sections {
    fn from(stored: StoredSections) -> Self {
        Self {
            basic_data: SectionMap::closed(&BASIC_DATA, stored.basic_data),
            vehicle_history: SectionMap::closed(&VEHICLE_HISTORY, stored.vehicle_history),
            technical_data: SectionMap::closed(&TECHNICAL_DATA, stored.technical_data),
            energy_consumption: SectionMap::closed(&ENERGY_CONSUMPTION, stored.energy_consumption),
            colour_and_upholstery: SectionMap::closed(
                &COLOUR_AND_UPHOLSTERY,
                stored.colour_and_upholstery,
            ),
        }
    }
}

impl Default for Sections {
    fn default() -> Self {
        Self::seeded()
    }
}

impl Sections {
    /// Sections with every expected key seeded to the sentinel
    pub fn seeded() -> Self {
        Self {
            basic_data: SectionMap::seeded(&BASIC_DATA),
            vehicle_history: SectionMap::seeded(&VEHICLE_HISTORY),
            technical_data: SectionMap::seeded(&TECHNICAL_DATA),
            energy_consumption: SectionMap::seeded(&ENERGY_CONSUMPTION),
            colour_and_upholstery: SectionMap::seeded(&COLOUR_AND_UPHOLSTERY),
        }
    }

    /// Returns the map belonging to a section spec
    pub fn section_mut(&mut self, spec: &SectionSpec) -> Option<&mut SectionMap> {
        match spec.name {
            "Basic_Data" => Some(&mut self.basic_data),
            "Vehicle_History" => Some(&mut self.vehicle_history),
            "Technical_Data" => Some(&mut self.technical_data),
            "Energy_Consumption" => Some(&mut self.energy_consumption),
            "Colour_and_Upholstery" => Some(&mut self.colour_and_upholstery),
            _ => None,
        }
    }
}

/// Seller block of a detail page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SellerInfo {
    #[serde(default = "not_available")]
    pub company_name: String,
    #[serde(default = "not_available")]
    pub contact_name: String,
    #[serde(default = "not_available")]
    pub location: String,
    #[serde(rename = "phone", default)]
    pub phones: Vec<String>,
}

impl Default for SellerInfo {
    fn default() -> Self {
        Self {
            company_name: not_available(),
            contact_name: not_available(),
            location: not_available(),
            phones: Vec::new(),
        }
    }
}

/// Fully scraped listing, as appended to the ledger
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetailRecord {
    #[serde(rename = "car_title", default = "not_available")]
    pub title: String,
    #[serde(rename = "car_subtitle", default = "not_available")]
    pub subtitle: String,
    #[serde(rename = "details_url")]
    pub detail_url: String,
    #[serde(rename = "price", default = "not_available")]
    pub price_text: String,
    #[serde(rename = "all_images", default)]
    pub images: Vec<String>,
    #[serde(flatten)]
    pub sections: Sections,
    #[serde(default)]
    pub seller_info: SellerInfo,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scraped_at: Option<DateTime<Utc>>,
}

impl DetailRecord {
    /// Starts a record from its listing stub, with seeded sections and no images
    pub fn from_stub(stub: &ListingStub) -> Self {
        Self {
            title: stub.title.clone(),
            subtitle: stub.subtitle.clone(),
            detail_url: stub.detail_url.clone(),
            price_text: stub.price_text.clone(),
            images: Vec::new(),
            sections: Sections::seeded(),
            seller_info: SellerInfo::default(),
            scraped_at: Some(Utc::now()),
        }
    }
}

/// Normalized fuel classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FuelType {
    Diesel,
    Petrol,
    Electric,
    Hybrid,
    Other,
}

impl FuelType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Diesel => "diesel",
            Self::Petrol => "petrol",
            Self::Electric => "electric",
            Self::Hybrid => "hybrid",
            Self::Other => "other",
        }
    }
}

impl fmt::Display for FuelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Typed projection of a detail record, as sent downstream
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedRecord {
    pub title: String,
    pub subtitle: String,
    pub url: String,

    pub price_numeric: Option<u64>,
    pub mileage_numeric: Option<u64>,
    pub year_numeric: Option<i32>,
    pub power_kw: Option<u32>,

    pub brand: Option<String>,
    pub fuel_type: FuelType,

    pub gearbox: Option<String>,
    pub first_registration: Option<String>,
    pub seats: Option<u8>,
    pub doors: Option<u8>,

    pub images: Vec<String>,
    pub image_count: usize,
    pub seller_info: SellerInfo,
    pub raw_data: Sections,

    pub scraped_at: Option<DateTime<Utc>>,
    pub source: String,
    pub data_version: String,

    /// Set once the record passed the validation gate
    ///
    /// A rejected projection never leaves `Normalizer::normalize` as a `NormalizedRecord`: the
    /// caller gets the `RejectionReason` instead, and the review queue keeps it with the raw
    /// record. Only `Normalizer::project` yields records with this flag unset.
    pub valid: bool,
}
