//! Modal, one-record-at-a-time editing on top of the record store.
//!
//! An open session holds a draft copy; the stored record is untouched until
//! the draft is saved, and saving always runs the validator.

use tracing::debug;

use crate::store::RecordStore;
use crate::validate::ValidationErrors;
use crate::{
    Clock, CoreError, IdGenerator, NewPartnership, PartnershipDraft, PartnershipId,
    PartnershipRecord, SlotStorage,
};

/// Edit state for the single record currently being edited.
#[derive(Clone, Debug, PartialEq)]
pub struct EditSession {
    target: PartnershipId,
    draft: PartnershipDraft,
    errors: ValidationErrors,
}

impl EditSession {
    fn open(record: &PartnershipRecord) -> Self {
        Self {
            target: record.id.clone(),
            draft: PartnershipDraft::from(record),
            errors: ValidationErrors::default(),
        }
    }

    pub fn target(&self) -> &PartnershipId {
        &self.target
    }

    pub fn draft(&self) -> &PartnershipDraft {
        &self.draft
    }

    pub fn draft_mut(&mut self) -> &mut PartnershipDraft {
        &mut self.draft
    }

    /// Field errors from the last failed save.
    pub fn errors(&self) -> &ValidationErrors {
        &self.errors
    }
}

/// The store plus at most one open edit session.
pub struct Workbench<S: SlotStorage, C: Clock, G: IdGenerator> {
    store: RecordStore<S, C, G>,
    session: Option<EditSession>,
}

impl<S: SlotStorage, C: Clock, G: IdGenerator> Workbench<S, C, G> {
    pub fn new(store: RecordStore<S, C, G>) -> Self {
        Self {
            store,
            session: None,
        }
    }

    /// Read access to the store. Mutations go through the workbench so the
    /// session stays consistent.
    pub fn store(&self) -> &RecordStore<S, C, G> {
        &self.store
    }

    pub fn session(&self) -> Option<&EditSession> {
        self.session.as_ref()
    }

    pub fn editing_id(&self) -> Option<&PartnershipId> {
        self.session.as_ref().map(EditSession::target)
    }

    pub fn draft_mut(&mut self) -> Option<&mut PartnershipDraft> {
        self.session.as_mut().map(EditSession::draft_mut)
    }

    /// Open a session on an existing record, cancelling any open one first.
    /// Re-opening the record already being edited keeps its draft.
    pub fn begin_edit(&mut self, id: &PartnershipId) -> Result<&mut EditSession, CoreError> {
        if !self.store.contains(id) {
            return Err(CoreError::NotFound);
        }
        if self.editing_id() != Some(id) {
            self.cancel_edit();
            let record = self.store.find(id).ok_or(CoreError::NotFound)?;
            self.session = Some(EditSession::open(&record));
            debug!(id = %id, "edit session opened");
        }
        self.session.as_mut().ok_or(CoreError::NotFound)
    }

    /// Insert a blank placeholder and open a session on it.
    pub fn create_and_edit(
        &mut self,
        input: NewPartnership,
    ) -> Result<&mut EditSession, CoreError> {
        self.cancel_edit();
        let record = self.store.create(input)?;
        debug!(id = %record.id, "edit session opened on new record");
        Ok(self.session.insert(EditSession::open(&record)))
    }

    /// Validate the draft and commit it. On validation failure the session
    /// stays open with its errors set.
    pub fn save_edit(&mut self) -> Result<PartnershipRecord, CoreError> {
        let mut session = self.session.take().ok_or(CoreError::NotFound)?;
        let Some(base) = self.store.find(&session.target) else {
            self.session = Some(session);
            return Err(CoreError::NotFound);
        };

        match session.draft.commit(&base, self.store.now()) {
            Ok(record) => {
                let saved = self.store.update(&session.target, record)?;
                debug!(id = %saved.id, "edit session saved");
                Ok(saved)
            }
            Err(errors) => {
                debug!(id = %session.target, %errors, "edit session rejected");
                session.errors = errors.clone();
                self.session = Some(session);
                Err(CoreError::Validation(errors))
            }
        }
    }

    /// Drop the open session. A target that is still a blank placeholder is
    /// deleted as if it had never been created. Returns whether a record was
    /// discarded.
    pub fn cancel_edit(&mut self) -> bool {
        let Some(session) = self.session.take() else {
            return false;
        };
        let blank = self
            .store
            .find(&session.target)
            .is_some_and(|r| r.is_blank_placeholder());
        if blank {
            debug!(id = %session.target, "discarding untouched placeholder");
            return self.store.delete(&session.target);
        }
        debug!(id = %session.target, "edit session cancelled");
        false
    }

    /// Delete a record, closing its session if it was being edited.
    pub fn delete(&mut self, id: &PartnershipId) -> bool {
        if self.editing_id() == Some(id) {
            self.session = None;
        }
        self.store.delete(id)
    }
}
