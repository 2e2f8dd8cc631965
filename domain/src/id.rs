//! Record id generation.

use crate::{IdGenerator, PartnershipId, Timestamp};

const TAG_MASK: u64 = 0xff_ffff_ffff;
const SEQ_MASK: u64 = 0xff_ffff;

/// Generates 24-char lowercase hex ids in the same shape as the seed ids:
/// 8 hex digits of epoch seconds, 10 of a per-generator tag, 6 of the
/// sequence number. Deterministic w.r.t. `(now, seq)` for a given tag.
#[derive(Clone, Copy, Debug)]
pub struct ObjectIdGenerator {
    tag: u64,
}

impl ObjectIdGenerator {
    pub fn new(tag: u64) -> Self {
        Self { tag: tag & TAG_MASK }
    }

    /// Tag derived from the process id and the sub-second part of `now`, so
    /// two processes sharing a slot do not mint the same ids.
    pub fn for_process(now: std::time::SystemTime) -> Self {
        let nanos = now
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| u64::from(d.subsec_nanos()))
            .unwrap_or(0);
        Self::new((u64::from(std::process::id()) << 30) ^ nanos)
    }
}

/// Encode the three id components as fixed-width lowercase hex.
pub fn encode_object_id(secs: u64, tag: u64, seq: u64) -> String {
    format!(
        "{:08x}{:010x}{:06x}",
        secs & 0xffff_ffff,
        tag & TAG_MASK,
        seq & SEQ_MASK
    )
}

impl IdGenerator for ObjectIdGenerator {
    fn next_id(&self, now: Timestamp, seq: u64) -> PartnershipId {
        // Always 24 hex chars, so never blank.
        PartnershipId(encode_object_id(now.as_secs(), self.tag, seq))
    }
}
