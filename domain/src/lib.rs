//! Domain library for the Partnerships admin tool.
//!
//! Holds the partnership types, the ports (traits) the core talks through,
//! and the error definitions. The record store, validator, and persistence
//! adapter live in their own modules. Keep concrete storage backends outside
//! this crate, apart from the in-memory slot used by tests and demos.

use std::fmt::{Display, Formatter};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::validate::ValidationErrors;

pub use crate::draft::PartnershipDraft;

/// Opaque identifier of a partnership record. Never reassigned once created.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PartnershipId(String);

impl PartnershipId {
    pub fn new<S: Into<String>>(s: S) -> Result<Self, CoreError> {
        let val = s.into();
        if val.trim().is_empty() {
            return Err(CoreError::InvalidId);
        }
        Ok(Self(val))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for PartnershipId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Billing currency of a partnership.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Currency {
    #[default]
    #[serde(rename = "USD")]
    Usd,
    #[serde(rename = "EUR")]
    Eur,
    #[serde(rename = "GBP")]
    Gbp,
}

impl Currency {
    pub const ALL: [Currency; 3] = [Currency::Usd, Currency::Eur, Currency::Gbp];

    pub fn as_str(&self) -> &'static str {
        match self {
            Currency::Usd => "USD",
            Currency::Eur => "EUR",
            Currency::Gbp => "GBP",
        }
    }

    /// Exact, case-sensitive match against the persisted codes.
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.as_str() == s)
    }
}

impl Display for Currency {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Portal features a partnership can enable. The option list is fixed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Feature {
    #[serde(rename = "Flights_FromTo")]
    FlightsFromTo,
    #[serde(rename = "Flights_ByDistance")]
    FlightsByDistance,
    #[serde(rename = "Flights_Upload")]
    FlightsUpload,
    Carbon,
    EmissionsDashboard,
    EmissionCompensate,
    #[serde(rename = "EmissionCompensate_Flights")]
    EmissionCompensateFlights,
    #[serde(rename = "EmissionCompensate_AirFreight")]
    EmissionCompensateAirFreight,
}

impl Feature {
    pub const ALL: [Feature; 8] = [
        Feature::FlightsFromTo,
        Feature::FlightsByDistance,
        Feature::FlightsUpload,
        Feature::Carbon,
        Feature::EmissionsDashboard,
        Feature::EmissionCompensate,
        Feature::EmissionCompensateFlights,
        Feature::EmissionCompensateAirFreight,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Feature::FlightsFromTo => "Flights_FromTo",
            Feature::FlightsByDistance => "Flights_ByDistance",
            Feature::FlightsUpload => "Flights_Upload",
            Feature::Carbon => "Carbon",
            Feature::EmissionsDashboard => "EmissionsDashboard",
            Feature::EmissionCompensate => "EmissionCompensate",
            Feature::EmissionCompensateFlights => "EmissionCompensate_Flights",
            Feature::EmissionCompensateAirFreight => "EmissionCompensate_AirFreight",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.as_str() == s)
    }
}

/// Milliseconds since UNIX_EPOCH. Stored as a plain JSON number.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(u64);

impl Timestamp {
    pub fn from_millis(ms: u64) -> Self {
        Self(ms)
    }

    /// Truncates to whole milliseconds; times before the epoch clamp to 0.
    pub fn from_system_time(t: SystemTime) -> Self {
        let ms = t
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0);
        Self(ms)
    }

    pub fn as_millis(&self) -> u64 {
        self.0
    }

    pub fn as_secs(&self) -> u64 {
        self.0 / 1000
    }
}

/// A partnership configuration entry: billing and portal settings of one
/// business partner.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartnershipRecord {
    pub id: PartnershipId,
    pub name: String,
    pub currency: Currency,
    pub portal_url: String,
    pub features: Vec<Feature>,
    pub item_fee_percent: f64,
    pub instant_billing: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<Timestamp>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_update: Option<Timestamp>,
}

impl PartnershipRecord {
    /// A record with default settings: USD, no features, 0% fee, no instant billing.
    pub fn new(id: PartnershipId, created_at: Timestamp) -> Self {
        Self {
            id,
            name: String::new(),
            currency: Currency::default(),
            portal_url: String::new(),
            features: Vec::new(),
            item_fee_percent: 0.0,
            instant_billing: false,
            created_at: Some(created_at),
            last_update: None,
        }
    }

    /// True for a freshly created placeholder the user never filled in.
    pub fn is_blank_placeholder(&self) -> bool {
        self.name.trim().is_empty() && self.portal_url.trim().is_empty()
    }

    pub fn has_feature(&self, feature: Feature) -> bool {
        self.features.contains(&feature)
    }

    /// Case-insensitive substring match across name, currency, and portal URL.
    /// `needle` must already be lowercased.
    pub(crate) fn matches_lowercase(&self, needle: &str) -> bool {
        self.name.to_lowercase().contains(needle)
            || self.currency.as_str().to_lowercase().contains(needle)
            || self.portal_url.to_lowercase().contains(needle)
    }
}

/// Partial input for creating a record. Unset fields take the defaults.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct NewPartnership {
    pub name: Option<String>,
    pub currency: Option<Currency>,
    pub portal_url: Option<String>,
    pub features: Option<Vec<Feature>>,
    pub item_fee_percent: Option<f64>,
    pub instant_billing: Option<bool>,
}

/// Time source abstraction to make code testable.
pub trait Clock: Send + Sync {
    fn now(&self) -> SystemTime;
}

/// Wall-clock time.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> SystemTime {
        SystemTime::now()
    }
}

/// Id generator interface; `seq` increases on every call made by the store.
pub trait IdGenerator: Send + Sync {
    fn next_id(&self, now: Timestamp, seq: u64) -> PartnershipId;
}

/// Port for the single durable key-value slot holding the serialized
/// record sequence.
pub trait SlotStorage {
    /// Raw slot contents, or `None` when nothing has been written yet.
    fn read(&self) -> Result<Option<String>, CoreError>;
    /// Overwrite the slot with `contents`.
    fn write(&self, contents: &str) -> Result<(), CoreError>;
}

impl<S: SlotStorage + ?Sized> SlotStorage for &S {
    fn read(&self) -> Result<Option<String>, CoreError> {
        (**self).read()
    }

    fn write(&self, contents: &str) -> Result<(), CoreError> {
        (**self).write(contents)
    }
}

impl<S: SlotStorage + ?Sized> SlotStorage for Box<S> {
    fn read(&self) -> Result<Option<String>, CoreError> {
        (**self).read()
    }

    fn write(&self, contents: &str) -> Result<(), CoreError> {
        (**self).write(contents)
    }
}

/// Core domain errors.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("validation failed: {0}")]
    Validation(ValidationErrors),
    #[error("invalid partnership id")]
    InvalidId,
    #[error("not found")]
    NotFound,
    #[error("resource already exists")]
    AlreadyExists,
    #[error("storage error: {0}")]
    Storage(String),
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for CoreError {
    fn from(err: serde_json::Error) -> Self {
        CoreError::Serialization(err.to_string())
    }
}

/// Return a short about/version line for the binary to print.
pub fn about() -> String {
    let pkg = env!("CARGO_PKG_NAME");
    let ver = env!("CARGO_PKG_VERSION");
    format!("{} v{} - partnerships core loaded", pkg, ver)
}

pub mod adapters;
pub mod draft;
pub mod id;
pub mod persist;
pub mod seeds;
pub mod session;
pub mod store;
pub mod validate;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partnership_id_rejects_blank() {
        assert!(PartnershipId::new("abc").is_ok());
        assert!(matches!(PartnershipId::new("  "), Err(CoreError::InvalidId)));
    }

    #[test]
    fn currency_parse_is_exact() {
        assert_eq!(Currency::parse("EUR"), Some(Currency::Eur));
        assert_eq!(Currency::parse("eur"), None);
        assert_eq!(Currency::parse("JPY"), None);
        assert_eq!(Currency::default(), Currency::Usd);
    }

    #[test]
    fn feature_names_match_persisted_form() {
        for f in Feature::ALL {
            let json = serde_json::to_string(&f).unwrap();
            assert_eq!(json, format!("\"{}\"", f.as_str()));
            assert_eq!(Feature::parse(f.as_str()), Some(f));
        }
    }

    #[test]
    fn record_serializes_camel_case() {
        let mut rec = PartnershipRecord::new(
            PartnershipId::new("p1").unwrap(),
            Timestamp::from_millis(1_000),
        );
        rec.portal_url = "https://x.io".into();
        rec.features = vec![Feature::Carbon];
        let v = serde_json::to_value(&rec).unwrap();
        assert_eq!(v["portalUrl"], "https://x.io");
        assert_eq!(v["itemFeePercent"], 0.0);
        assert_eq!(v["instantBilling"], false);
        assert_eq!(v["createdAt"], 1_000);
        assert!(v.get("lastUpdate").is_none());
        assert_eq!(v["features"][0], "Carbon");
    }

    #[test]
    fn timestamp_truncates_to_millis() {
        let t = UNIX_EPOCH + std::time::Duration::from_micros(1_500_700);
        assert_eq!(Timestamp::from_system_time(t).as_millis(), 1_500);
        assert_eq!(Timestamp::from_millis(2_999).as_secs(), 2);
    }

    #[test]
    fn blank_placeholder_detection() {
        let mut rec = PartnershipRecord::new(
            PartnershipId::new("p1").unwrap(),
            Timestamp::from_millis(0),
        );
        assert!(rec.is_blank_placeholder());
        rec.name = "Acme".into();
        assert!(!rec.is_blank_placeholder());
    }
}
