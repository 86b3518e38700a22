//! Typed shape of a vehicle record and its owned sub-entities.

use serde::{Deserialize, Serialize};

use crate::error::{Result, ToolError};
use crate::schema;

/// Identifier assigned to a record or a child item. Kept as an opaque string
/// so it can travel through spreadsheet cells untouched.
pub type RecordId = String;

/// A closed enumeration whose members travel as fixed snake_case strings.
pub trait ClosedSet: Sized + Copy + 'static {
    /// Field name reported when parsing fails.
    const FIELD: &'static str;
    /// Every member, in declaration order.
    const ALL: &'static [Self];

    /// Wire representation of the member.
    fn as_str(self) -> &'static str;

    /// Parses the wire representation back into a member.
    fn parse(value: &str) -> Result<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|member| member.as_str() == value)
            .ok_or_else(|| ToolError::InvalidValue {
                field: Self::FIELD.to_string(),
                value: value.to_string(),
            })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Condition {
    Km0,
    Used,
    New,
}

impl ClosedSet for Condition {
    const FIELD: &'static str = "condition";
    const ALL: &'static [Self] = &[Self::Km0, Self::Used, Self::New];

    fn as_str(self) -> &'static str {
        match self {
            Self::Km0 => "km0",
            Self::Used => "used",
            Self::New => "new",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FuelType {
    Benzina,
    Diesel,
    Gpl,
    Metano,
    IbridoFull,
    IbridoPlugIn,
    MildHybrid,
    Elettrico,
}

impl ClosedSet for FuelType {
    const FIELD: &'static str = "fuel_type";
    const ALL: &'static [Self] = &[
        Self::Benzina,
        Self::Diesel,
        Self::Gpl,
        Self::Metano,
        Self::IbridoFull,
        Self::IbridoPlugIn,
        Self::MildHybrid,
        Self::Elettrico,
    ];

    fn as_str(self) -> &'static str {
        match self {
            Self::Benzina => "benzina",
            Self::Diesel => "diesel",
            Self::Gpl => "gpl",
            Self::Metano => "metano",
            Self::IbridoFull => "ibrido_full",
            Self::IbridoPlugIn => "ibrido_plug_in",
            Self::MildHybrid => "mild_hybrid",
            Self::Elettrico => "elettrico",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Transmission {
    Manual,
    Automatic,
    Cvt,
    DualClutch,
    SingleSpeed,
}

impl ClosedSet for Transmission {
    const FIELD: &'static str = "transmission";
    const ALL: &'static [Self] = &[
        Self::Manual,
        Self::Automatic,
        Self::Cvt,
        Self::DualClutch,
        Self::SingleSpeed,
    ];

    fn as_str(self) -> &'static str {
        match self {
            Self::Manual => "manual",
            Self::Automatic => "automatic",
            Self::Cvt => "cvt",
            Self::DualClutch => "dual_clutch",
            Self::SingleSpeed => "single_speed",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    VisibleOrderable,
    VisibleRequestable,
    Hidden,
    UrlOnly,
}

impl ClosedSet for Visibility {
    const FIELD: &'static str = "visibility";
    const ALL: &'static [Self] = &[
        Self::VisibleOrderable,
        Self::VisibleRequestable,
        Self::Hidden,
        Self::UrlOnly,
    ];

    fn as_str(self) -> &'static str {
        match self {
            Self::VisibleOrderable => "visible_orderable",
            Self::VisibleRequestable => "visible_requestable",
            Self::Hidden => "hidden",
            Self::UrlOnly => "url_only",
        }
    }
}

/// Tire-season category offered as an option on a vehicle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TireLabel {
    AllSeason,
    SummerWinter,
    Winter,
    Summer,
}

impl ClosedSet for TireLabel {
    const FIELD: &'static str = "label";
    const ALL: &'static [Self] = &[
        Self::AllSeason,
        Self::SummerWinter,
        Self::Winter,
        Self::Summer,
    ];

    fn as_str(self) -> &'static str {
        match self {
            Self::AllSeason => "all_season",
            Self::SummerWinter => "summer_winter",
            Self::Winter => "winter",
            Self::Summer => "summer",
        }
    }
}

/// Serde adapter mapping the empty string to `None` for optional closed sets.
mod optional_choice {
    use serde::{Deserialize, Deserializer, Serializer};

    use super::ClosedSet;

    pub fn serialize<S, T>(value: &Option<T>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
        T: ClosedSet,
    {
        serializer.serialize_str(value.map(ClosedSet::as_str).unwrap_or(""))
    }

    pub fn deserialize<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
    where
        D: Deserializer<'de>,
        T: ClosedSet,
    {
        let raw = String::deserialize(deserializer)?;
        parse_optional(&raw).map_err(serde::de::Error::custom)
    }

    pub fn parse_optional<T: ClosedSet>(raw: &str) -> crate::error::Result<Option<T>> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            Ok(None)
        } else {
            T::parse(trimmed).map(Some)
        }
    }
}

/// Vehicle attributes. Everything numeric-looking is kept as the user typed
/// it; only the enumerated fields are typed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VehicleInfo {
    pub brand: String,
    pub model: String,
    pub trim: String,
    #[serde(with = "optional_choice")]
    pub condition: Option<Condition>,
    pub category: String,
    pub registration_date: String,
    pub kilometers: String,
    pub url: String,
    pub configuration_url: String,
    pub engine_size: String,
    #[serde(with = "optional_choice")]
    pub fuel_type: Option<FuelType>,
    #[serde(with = "optional_choice")]
    pub transmission: Option<Transmission>,
    pub power_kw: String,
    pub power_cv: String,
    pub seats: String,
    pub doors: String,
    pub status: String,
    #[serde(with = "optional_choice")]
    pub visibility: Option<Visibility>,
    pub images: String,
    pub exterior_color: String,
    pub interior_color: String,
    pub wheels: String,
    pub pair_to_save_daily: String,
    pub standard_equipment: String,
}

fn choice_str<T: ClosedSet>(value: Option<T>) -> &'static str {
    value.map(ClosedSet::as_str).unwrap_or("")
}

impl VehicleInfo {
    /// Field values in [`schema::VEHICLE_FIELDS`] order, verbatim.
    pub fn values(&self) -> [&str; schema::VEHICLE_FIELDS.len()] {
        [
            &self.brand,
            &self.model,
            &self.trim,
            choice_str(self.condition),
            &self.category,
            &self.registration_date,
            &self.kilometers,
            &self.url,
            &self.configuration_url,
            &self.engine_size,
            choice_str(self.fuel_type),
            choice_str(self.transmission),
            &self.power_kw,
            &self.power_cv,
            &self.seats,
            &self.doors,
            &self.status,
            choice_str(self.visibility),
            &self.images,
            &self.exterior_color,
            &self.interior_color,
            &self.wheels,
            &self.pair_to_save_daily,
            &self.standard_equipment,
        ]
    }

    /// Field name/value pairs in registry order.
    pub fn fields(&self) -> impl Iterator<Item = (&'static str, &str)> {
        schema::VEHICLE_FIELDS.into_iter().zip(self.values())
    }

    /// Assigns a field by its column name.
    pub fn set(&mut self, field: &str, value: &str) -> Result<()> {
        let value = value.to_string();
        match field {
            "brand" => self.brand = value,
            "model" => self.model = value,
            "trim" => self.trim = value,
            "condition" => self.condition = optional_choice::parse_optional(&value)?,
            "category" => self.category = value,
            "registration_date" => self.registration_date = value,
            "kilometers" => self.kilometers = value,
            "url" => self.url = value,
            "configuration_url" => self.configuration_url = value,
            "engine_size" => self.engine_size = value,
            "fuel_type" => self.fuel_type = optional_choice::parse_optional(&value)?,
            "transmission" => self.transmission = optional_choice::parse_optional(&value)?,
            "power_kw" => self.power_kw = value,
            "power_cv" => self.power_cv = value,
            "seats" => self.seats = value,
            "doors" => self.doors = value,
            "status" => self.status = value,
            "visibility" => self.visibility = optional_choice::parse_optional(&value)?,
            "images" => self.images = value,
            "exterior_color" => self.exterior_color = value,
            "interior_color" => self.interior_color = value,
            "wheels" => self.wheels = value,
            "pair_to_save_daily" => self.pair_to_save_daily = value,
            "standard_equipment" => self.standard_equipment = value,
            other => {
                return Err(ToolError::InvalidValue {
                    field: "vehicle field".to_string(),
                    value: other.to_string(),
                });
            }
        }
        Ok(())
    }
}

/// Financing duration bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum TermKey {
    #[serde(rename = "3y")]
    Short,
    #[serde(rename = "4y")]
    Medium,
    #[serde(rename = "5y")]
    Long,
}

impl ClosedSet for TermKey {
    const FIELD: &'static str = "term";
    const ALL: &'static [Self] = &[Self::Short, Self::Medium, Self::Long];

    fn as_str(self) -> &'static str {
        match self {
            Self::Short => "3y",
            Self::Medium => "4y",
            Self::Long => "5y",
        }
    }
}

/// One min/max pair at a fixed position inside a term.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricingRateRange {
    pub label: String,
    pub min: String,
    pub max: String,
}

impl PricingRateRange {
    /// Blank tier at the given 1-based position.
    pub fn blank(position: usize) -> Self {
        Self {
            label: format!("rate_{position}"),
            min: String::new(),
            max: String::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PricingTerm {
    pub monthly_avg: String,
    pub final_min: String,
    pub final_max: String,
    pub down_min: String,
    pub down_max: String,
    pub rates: Vec<PricingRateRange>,
}

impl PricingTerm {
    /// Blank term with `rate_count` blank tiers.
    pub fn blank(rate_count: usize) -> Self {
        Self {
            rates: (1..=rate_count).map(PricingRateRange::blank).collect(),
            ..Self::default()
        }
    }

    /// Scalar values in [`schema::PRICING_SCALAR_FIELDS`] order.
    pub fn scalar_values(&self) -> [&str; schema::PRICING_SCALAR_FIELDS.len()] {
        [
            &self.monthly_avg,
            &self.final_min,
            &self.final_max,
            &self.down_min,
            &self.down_max,
        ]
    }

    /// Assigns a scalar field by its column name.
    pub fn set_scalar(&mut self, field: &str, value: &str) -> Result<()> {
        let slot = match field {
            "monthly_avg" => &mut self.monthly_avg,
            "final_min" => &mut self.final_min,
            "final_max" => &mut self.final_max,
            "down_min" => &mut self.down_min,
            "down_max" => &mut self.down_max,
            other => {
                return Err(ToolError::InvalidValue {
                    field: "pricing field".to_string(),
                    value: other.to_string(),
                });
            }
        };
        *slot = value.to_string();
        Ok(())
    }
}

/// Pricing for all three terms. Every key is always present.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricingTable {
    #[serde(rename = "3y")]
    pub short: PricingTerm,
    #[serde(rename = "4y")]
    pub medium: PricingTerm,
    #[serde(rename = "5y")]
    pub long: PricingTerm,
}

impl Default for PricingTable {
    fn default() -> Self {
        Self::empty()
    }
}

impl PricingTable {
    /// All-blank table with the registered number of tiers per term.
    pub fn empty() -> Self {
        let blank = |key| PricingTerm::blank(schema::term_metadata(key).rate_count);
        Self {
            short: blank(TermKey::Short),
            medium: blank(TermKey::Medium),
            long: blank(TermKey::Long),
        }
    }

    pub fn term(&self, key: TermKey) -> &PricingTerm {
        match key {
            TermKey::Short => &self.short,
            TermKey::Medium => &self.medium,
            TermKey::Long => &self.long,
        }
    }

    pub fn term_mut(&mut self, key: TermKey) -> &mut PricingTerm {
        match key {
            TermKey::Short => &mut self.short,
            TermKey::Medium => &mut self.medium,
            TermKey::Long => &mut self.long,
        }
    }

    /// Terms in short → medium → long order.
    pub fn iter(&self) -> impl Iterator<Item = (TermKey, &PricingTerm)> {
        TermKey::ALL.iter().map(move |key| (*key, self.term(*key)))
    }

    /// Checks every term against the registered tier count.
    pub fn validate(&self) -> Result<()> {
        for (key, term) in self.iter() {
            let expected = schema::term_metadata(key).rate_count;
            if term.rates.len() != expected {
                return Err(ToolError::MalformedPricing {
                    term: key.as_str().to_string(),
                    expected,
                    found: term.rates.len(),
                });
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessoryItem {
    pub id: RecordId,
    pub name: String,
    pub price: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TireOption {
    pub id: RecordId,
    pub label: TireLabel,
    pub price: String,
}

/// A complete vehicle: attributes, pricing and the owned child lists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VehicleRecord {
    pub id: RecordId,
    pub vehicle: VehicleInfo,
    pub pricing: PricingTable,
    pub accessories: Vec<AccessoryItem>,
    pub tires: Vec<TireOption>,
}
