use tracing::debug;

use crate::persist::{encode_pretty, SlotPersistence};
use crate::{
    Clock, CoreError, IdGenerator, NewPartnership, PartnershipId, PartnershipRecord, SlotStorage,
    Timestamp,
};

/// Owner of the canonical, ordered partnership sequence.
///
/// Callers only ever receive copies of records. Every mutation is flushed to
/// the persistence adapter before the call returns, so the slot always holds
/// the post-mutation state.
pub struct RecordStore<S: SlotStorage, C: Clock, G: IdGenerator> {
    records: Vec<PartnershipRecord>,
    persistence: SlotPersistence<S>,
    clock: C,
    ids: G,
    next_seq: u64,
}

impl<S: SlotStorage, C: Clock, G: IdGenerator> RecordStore<S, C, G> {
    /// Open a store over `slot`, loading (or seeding) its contents.
    pub fn open(slot: S, clock: C, ids: G) -> Self {
        let persistence = SlotPersistence::new(slot);
        let records = persistence.load();
        Self {
            records,
            persistence,
            clock,
            ids,
            next_seq: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub(crate) fn now(&self) -> Timestamp {
        Timestamp::from_system_time(self.clock.now())
    }

    /// All records, newest creations first.
    pub fn list(&self) -> Vec<PartnershipRecord> {
        self.records.clone()
    }

    pub fn find(&self, id: &PartnershipId) -> Option<PartnershipRecord> {
        self.records.iter().find(|r| &r.id == id).cloned()
    }

    pub fn contains(&self, id: &PartnershipId) -> bool {
        self.records.iter().any(|r| &r.id == id)
    }

    /// Records whose name, currency, or portal URL contains `query`, ignoring
    /// case, in store order. A blank query returns everything.
    pub fn filter(&self, query: &str) -> Vec<PartnershipRecord> {
        let q = query.trim().to_lowercase();
        if q.is_empty() {
            return self.list();
        }
        self.records
            .iter()
            .filter(|r| r.matches_lowercase(&q))
            .cloned()
            .collect()
    }

    fn reserve_id(&mut self, now: Timestamp) -> Result<PartnershipId, CoreError> {
        // Bounded retry on the unlikely collision.
        for _ in 0..100 {
            let seq = self.next_seq;
            self.next_seq += 1;
            let id = self.ids.next_id(now, seq);
            if !self.contains(&id) {
                return Ok(id);
            }
        }
        Err(CoreError::AlreadyExists)
    }

    /// Insert a new record at the front. Unset fields take defaults; the
    /// input is not validated, so blank placeholders are accepted.
    pub fn create(&mut self, input: NewPartnership) -> Result<PartnershipRecord, CoreError> {
        let now = self.now();
        let id = self.reserve_id(now)?;
        let mut rec = PartnershipRecord::new(id, now);
        if let Some(name) = input.name {
            rec.name = name;
        }
        if let Some(currency) = input.currency {
            rec.currency = currency;
        }
        if let Some(url) = input.portal_url {
            rec.portal_url = url;
        }
        if let Some(features) = input.features {
            for f in features {
                if !rec.features.contains(&f) {
                    rec.features.push(f);
                }
            }
        }
        if let Some(fee) = input.item_fee_percent {
            rec.item_fee_percent = fee;
        }
        if let Some(instant) = input.instant_billing {
            rec.instant_billing = instant;
        }

        self.records.insert(0, rec.clone());
        debug!(id = %rec.id, "created partnership");
        self.flush();
        Ok(rec)
    }

    /// Replace the record with `id` wholesale. The stored id is always `id`,
    /// whatever `record.id` says. No validation happens here.
    pub fn update(
        &mut self,
        id: &PartnershipId,
        mut record: PartnershipRecord,
    ) -> Result<PartnershipRecord, CoreError> {
        let slot = self
            .records
            .iter_mut()
            .find(|r| &r.id == id)
            .ok_or(CoreError::NotFound)?;
        record.id = id.clone();
        *slot = record.clone();
        debug!(id = %id, "updated partnership");
        self.flush();
        Ok(record)
    }

    /// Remove the record with `id`. Returns whether anything was removed;
    /// a missing id is not an error.
    pub fn delete(&mut self, id: &PartnershipId) -> bool {
        let before = self.records.len();
        self.records.retain(|r| &r.id != id);
        let removed = self.records.len() != before;
        if removed {
            debug!(id = %id, "deleted partnership");
            self.flush();
        }
        removed
    }

    /// Write the current sequence to the slot.
    pub fn flush(&self) {
        self.persistence.save(&self.records);
    }

    /// Pretty JSON of the whole sequence, in the persisted shape.
    pub fn export_json(&self) -> Result<String, CoreError> {
        encode_pretty(&self.records)
    }
}
