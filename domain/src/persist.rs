//! Persistence adapter: moves the record sequence in and out of a durable
//! slot, repairing malformed entries on the way in.
//!
//! Nothing here fails past its boundary. A missing or unreadable slot yields
//! the seed records, and a failed write is logged and dropped.

use std::collections::HashSet;

use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::seeds::seed_partnerships;
use crate::{
    CoreError, Currency, Feature, PartnershipId, PartnershipRecord, SlotStorage, Timestamp,
};

/// Name shown for stored records that lost theirs.
pub const UNTITLED: &str = "Untitled";

/// Loads and saves the full record sequence through a [`SlotStorage`].
pub struct SlotPersistence<S: SlotStorage> {
    slot: S,
}

impl<S: SlotStorage> SlotPersistence<S> {
    pub fn new(slot: S) -> Self {
        Self { slot }
    }

    /// Read the stored sequence, falling back to the seeds when the slot is
    /// empty, unreadable, unparsable, or not a JSON array.
    pub fn load(&self) -> Vec<PartnershipRecord> {
        let raw = match self.slot.read() {
            Ok(Some(raw)) if !raw.trim().is_empty() => raw,
            Ok(_) => {
                debug!("partnership slot empty, using seed data");
                return seed_partnerships();
            }
            Err(e) => {
                warn!(error = %e, "failed to read partnership slot, using seed data");
                return seed_partnerships();
            }
        };
        match decode(&raw) {
            Ok(records) => {
                debug!(count = records.len(), "loaded partnerships");
                records
            }
            Err(e) => {
                warn!(error = %e, "failed to load partnerships, using seed data");
                seed_partnerships()
            }
        }
    }

    /// Serialize and write the full sequence, overwriting the slot. Failures
    /// are logged at warn level and swallowed.
    pub fn save(&self, records: &[PartnershipRecord]) {
        let result = encode(records).and_then(|json| self.slot.write(&json));
        match result {
            Ok(()) => debug!(count = records.len(), "saved partnerships"),
            Err(e) => warn!(error = %e, "failed to save partnerships"),
        }
    }
}

/// Compact JSON array in the persisted shape.
pub fn encode(records: &[PartnershipRecord]) -> Result<String, CoreError> {
    Ok(serde_json::to_string(records)?)
}

/// Pretty-printed JSON array in the persisted shape.
pub fn encode_pretty(records: &[PartnershipRecord]) -> Result<String, CoreError> {
    Ok(serde_json::to_string_pretty(records)?)
}

/// Parse slot contents. Any JSON array is accepted and repaired element by
/// element; other payloads are an error. Ids come out unique: a repeated id
/// is replaced by a free `local-<index>` variant.
pub fn decode(raw: &str) -> Result<Vec<PartnershipRecord>, CoreError> {
    match serde_json::from_str::<Value>(raw)? {
        Value::Array(items) => {
            let mut seen = HashSet::with_capacity(items.len());
            let mut records = Vec::with_capacity(items.len());
            for (idx, item) in items.iter().enumerate() {
                let mut rec = repair_record(idx, item);
                if seen.contains(rec.id.as_str()) {
                    let fresh = free_local_id(idx, &seen);
                    warn!(id = %rec.id, replacement = %fresh, "duplicate partnership id repaired");
                    rec.id = fresh;
                }
                seen.insert(rec.id.as_str().to_string());
                records.push(rec);
            }
            Ok(records)
        }
        other => Err(CoreError::Serialization(format!(
            "expected a JSON array, found {}",
            json_kind(&other)
        ))),
    }
}

/// Apply the per-field defaulting table to one stored element. Non-object
/// elements are treated as having every field missing.
pub fn repair_record(index: usize, item: &Value) -> PartnershipRecord {
    let empty = Map::new();
    let obj = item.as_object().unwrap_or(&empty);
    PartnershipRecord {
        id: repair_id(obj.get("id"), index),
        name: repair_name(obj.get("name")),
        currency: repair_currency(obj.get("currency")),
        portal_url: repair_portal_url(obj.get("portalUrl")),
        features: repair_features(obj.get("features")),
        item_fee_percent: repair_fee(obj.get("itemFeePercent")),
        instant_billing: repair_instant_billing(obj.get("instantBilling")),
        created_at: repair_timestamp(obj.get("createdAt")),
        last_update: repair_timestamp(obj.get("lastUpdate")),
    }
}

/// Non-empty string, else `local-<index>`.
fn repair_id(v: Option<&Value>, index: usize) -> PartnershipId {
    v.and_then(Value::as_str)
        .and_then(|s| PartnershipId::new(s).ok())
        .unwrap_or_else(|| PartnershipId(format!("local-{}", index)))
}

/// `local-<index>`, or `local-<index>-<n>` with the smallest free `n`.
fn free_local_id(index: usize, seen: &HashSet<String>) -> PartnershipId {
    let base = format!("local-{}", index);
    if !seen.contains(&base) {
        return PartnershipId(base);
    }
    let mut n = 1u64;
    loop {
        let candidate = format!("{}-{}", base, n);
        if !seen.contains(&candidate) {
            return PartnershipId(candidate);
        }
        n += 1;
    }
}

/// Non-empty string, else "Untitled".
fn repair_name(v: Option<&Value>) -> String {
    match v.and_then(Value::as_str) {
        Some(s) if !s.is_empty() => s.to_string(),
        _ => UNTITLED.to_string(),
    }
}

/// Known currency code, else USD.
fn repair_currency(v: Option<&Value>) -> Currency {
    v.and_then(Value::as_str)
        .and_then(Currency::parse)
        .unwrap_or_default()
}

/// String, else empty.
fn repair_portal_url(v: Option<&Value>) -> String {
    v.and_then(Value::as_str).unwrap_or_default().to_string()
}

/// Array of recognized feature names, deduplicated in first-seen order.
/// Anything else becomes the empty set.
fn repair_features(v: Option<&Value>) -> Vec<Feature> {
    let Some(items) = v.and_then(Value::as_array) else {
        return Vec::new();
    };
    let mut out = Vec::with_capacity(items.len());
    for f in items.iter().filter_map(Value::as_str).filter_map(Feature::parse) {
        if !out.contains(&f) {
            out.push(f);
        }
    }
    out
}

/// JSON number, else 0.
fn repair_fee(v: Option<&Value>) -> f64 {
    v.and_then(Value::as_f64)
        .filter(|f| f.is_finite())
        .unwrap_or(0.0)
}

/// Boolean coercion: zero, empty string, null, and missing are false;
/// other numbers, strings, arrays, and objects are true.
fn repair_instant_billing(v: Option<&Value>) -> bool {
    match v {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Array(_)) | Some(Value::Object(_)) => true,
    }
}

/// Non-negative integer millis, else absent.
fn repair_timestamp(v: Option<&Value>) -> Option<Timestamp> {
    v.and_then(Value::as_u64).map(Timestamp::from_millis)
}

fn json_kind(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory_slot::InMemorySlot;
    use serde_json::json;

    struct BrokenSlot;
    impl SlotStorage for BrokenSlot {
        fn read(&self) -> Result<Option<String>, CoreError> {
            Err(CoreError::Storage("disk on fire".into()))
        }
        fn write(&self, _contents: &str) -> Result<(), CoreError> {
            Err(CoreError::Storage("quota exceeded".into()))
        }
    }

    fn seed_ids(records: &[PartnershipRecord]) -> Vec<&str> {
        records.iter().map(|r| r.id.as_str()).collect()
    }

    #[test]
    fn empty_slot_loads_seeds() {
        let p = SlotPersistence::new(InMemorySlot::new());
        assert_eq!(
            seed_ids(&p.load()),
            ["6555e6ac2f08325dca9b5e6c", "682fa8c19340de8ea5338e8a"]
        );
    }

    #[test]
    fn corrupt_or_non_array_payload_loads_seeds() {
        for raw in ["{not json", "{\"id\":\"x\"}", "42", "null", "\"[]\"", "   "] {
            let p = SlotPersistence::new(InMemorySlot::with_contents(raw));
            assert_eq!(p.load(), seed_partnerships(), "payload {raw:?}");
        }
    }

    #[test]
    fn unreadable_slot_loads_seeds_and_write_failure_is_swallowed() {
        let p = SlotPersistence::new(BrokenSlot);
        assert_eq!(p.load(), seed_partnerships());
        p.save(&seed_partnerships());
    }

    #[test]
    fn empty_array_is_respected() {
        let p = SlotPersistence::new(InMemorySlot::with_contents("[]"));
        assert!(p.load().is_empty());
    }

    #[test]
    fn repairs_each_field() {
        let raw = json!([
            {
                "id": 17,
                "currency": "JPY",
                "features": "Carbon",
                "itemFeePercent": "12",
                "instantBilling": "yes"
            },
            {
                "id": "",
                "name": "",
                "portalUrl": 5,
                "features": ["Carbon", "Unknown", "Carbon", 3, "EmissionsDashboard"],
                "itemFeePercent": 7.5,
                "instantBilling": 0,
                "createdAt": 1700000000000u64,
                "lastUpdate": -4
            },
            "not an object"
        ])
        .to_string();
        let recs = decode(&raw).unwrap();
        assert_eq!(recs.len(), 3);

        assert_eq!(recs[0].id.as_str(), "local-0");
        assert_eq!(recs[0].name, UNTITLED);
        assert_eq!(recs[0].currency, Currency::Usd);
        assert_eq!(recs[0].portal_url, "");
        assert!(recs[0].features.is_empty());
        assert_eq!(recs[0].item_fee_percent, 0.0);
        assert!(recs[0].instant_billing);
        assert_eq!(recs[0].created_at, None);

        assert_eq!(recs[1].id.as_str(), "local-1");
        assert_eq!(recs[1].name, UNTITLED);
        assert_eq!(recs[1].portal_url, "");
        assert_eq!(recs[1].features, vec![Feature::Carbon, Feature::EmissionsDashboard]);
        assert_eq!(recs[1].item_fee_percent, 7.5);
        assert!(!recs[1].instant_billing);
        assert_eq!(recs[1].created_at, Some(Timestamp::from_millis(1_700_000_000_000)));
        assert_eq!(recs[1].last_update, None);

        assert_eq!(recs[2].id.as_str(), "local-2");
        assert_eq!(recs[2].name, UNTITLED);
    }

    #[test]
    fn repeated_ids_are_made_unique() {
        let raw = json!([
            {"id": "local-1", "name": "Keep me"},
            {"name": "Repaired"},
            {"id": "dup", "name": "First"},
            {"id": "dup", "name": "Second"},
            {"id": "local-4"},
            {"id": "local-4"}
        ])
        .to_string();
        let recs = decode(&raw).unwrap();
        let ids: Vec<_> = recs.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(
            ids,
            ["local-1", "local-1-1", "dup", "local-3", "local-4", "local-5"]
        );
        assert_eq!(recs[1].name, "Repaired");
        assert_eq!(recs[3].name, "Second");
    }

    #[test]
    fn instant_billing_coercion_table() {
        let cases = [
            (json!(true), true),
            (json!(false), false),
            (json!(1), true),
            (json!(0), false),
            (json!(0.0), false),
            (json!(""), false),
            (json!("false"), true),
            (json!(null), false),
            (json!([]), true),
            (json!({}), true),
        ];
        for (v, want) in cases {
            assert_eq!(repair_instant_billing(Some(&v)), want, "value {v}");
        }
        assert!(!repair_instant_billing(None));
    }

    #[test]
    fn save_then_load_round_trips() {
        let slot = InMemorySlot::new();
        let p = SlotPersistence::new(&slot);
        let mut records = seed_partnerships();
        records[1].created_at = Some(Timestamp::from_millis(1_000));
        records[1].last_update = Some(Timestamp::from_millis(2_000));
        records[0].currency = Currency::Gbp;
        records[0].item_fee_percent = 39.430133835633676;
        records[1].item_fee_percent = 18.233521453552402;
        p.save(&records);

        let first = p.load();
        assert_eq!(first, records);
        p.save(&first);
        assert_eq!(p.load(), first);
    }

    #[test]
    fn save_writes_camel_case_array() {
        let slot = InMemorySlot::new();
        SlotPersistence::new(&slot).save(&seed_partnerships());
        let raw = slot.contents().unwrap();
        let v: Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(v[0]["portalUrl"], "https://cdemo.test.portal.chooose.today");
        assert_eq!(v[1]["instantBilling"], true);
        assert_eq!(v[0]["features"][0], "Flights_FromTo");
    }

    #[test]
    fn pretty_export_is_valid_json() {
        let out = encode_pretty(&seed_partnerships()).unwrap();
        assert!(out.contains('\n'));
        assert_eq!(decode(&out).unwrap(), seed_partnerships());
    }
}
