use std::sync::Mutex;

use crate::{CoreError, SlotStorage};

/// Process-local slot. Contents vanish with the value.
#[derive(Debug, Default)]
pub struct InMemorySlot {
    inner: Mutex<Option<String>>,
}

impl InMemorySlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Slot pre-filled with raw contents, as if written by an earlier session.
    pub fn with_contents<S: Into<String>>(contents: S) -> Self {
        Self {
            inner: Mutex::new(Some(contents.into())),
        }
    }

    /// Snapshot of the current raw contents.
    pub fn contents(&self) -> Option<String> {
        self.inner.lock().ok().and_then(|g| g.clone())
    }
}

impl SlotStorage for InMemorySlot {
    fn read(&self) -> Result<Option<String>, CoreError> {
        let guard = self
            .inner
            .lock()
            .map_err(|_| CoreError::Storage("mutex poisoned".into()))?;
        Ok(guard.clone())
    }

    fn write(&self, contents: &str) -> Result<(), CoreError> {
        let mut guard = self
            .inner
            .lock()
            .map_err(|_| CoreError::Storage("mutex poisoned".into()))?;
        *guard = Some(contents.to_string());
        Ok(())
    }
}
