//! Editable, not-yet-committed copies of partnership records.

use crate::validate::{coerce_fee, validate, ValidationErrors};
use crate::{Currency, Feature, PartnershipRecord, Timestamp};

/// A form-shaped copy of a record. Inputs are held the way the user typed
/// them; conversion back to a record happens only after validation.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PartnershipDraft {
    pub name: String,
    pub currency: String,
    pub portal_url: String,
    pub features: Vec<Feature>,
    /// Raw fee text; coerced to a number when committed.
    pub item_fee_percent: String,
    pub instant_billing: bool,
}

impl PartnershipDraft {
    /// Enable or disable a feature, keeping the list free of duplicates.
    pub fn toggle_feature(&mut self, feature: Feature, on: bool) {
        let present = self.features.contains(&feature);
        if on && !present {
            self.features.push(feature);
        } else if !on && present {
            self.features.retain(|f| *f != feature);
        }
    }

    /// Validate and fold the draft onto `base`, producing the record to
    /// store. `id` and `created_at` come from `base`; `last_update` is `now`.
    pub fn commit(
        &self,
        base: &PartnershipRecord,
        now: Timestamp,
    ) -> Result<PartnershipRecord, ValidationErrors> {
        validate(self).into_result()?;

        // Both already parsed in `validate`.
        let currency = Currency::parse(&self.currency).unwrap_or(base.currency);
        let item_fee_percent = coerce_fee(&self.item_fee_percent).unwrap_or(base.item_fee_percent);

        Ok(PartnershipRecord {
            id: base.id.clone(),
            name: self.name.trim().to_string(),
            currency,
            portal_url: self.portal_url.clone(),
            features: self.features.clone(),
            item_fee_percent,
            instant_billing: self.instant_billing,
            created_at: base.created_at,
            last_update: Some(now),
        })
    }
}

impl From<&PartnershipRecord> for PartnershipDraft {
    fn from(rec: &PartnershipRecord) -> Self {
        Self {
            name: rec.name.clone(),
            currency: rec.currency.as_str().to_string(),
            portal_url: rec.portal_url.clone(),
            features: rec.features.clone(),
            item_fee_percent: rec.item_fee_percent.to_string(),
            instant_billing: rec.instant_billing,
        }
    }
}
