use crate::store::{SessionRecord, SessionStore, StoreError};
use std::sync::Mutex;

/// In-memory session store for tests and ephemeral deployments.
///
/// `failing()` builds a store whose every operation errors, for exercising
/// the fail-open paths.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    record: Mutex<Option<SessionRecord>>,
    fail: bool,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_record(record: SessionRecord) -> Self {
        Self {
            record: Mutex::new(Some(record)),
            fail: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            record: Mutex::new(None),
            fail: true,
        }
    }

    fn check_available(&self) -> Result<(), StoreError> {
        if self.fail {
            Err(StoreError::Unavailable("mock store failure".to_string()))
        } else {
            Ok(())
        }
    }
}

impl SessionStore for MemorySessionStore {
    fn load(&self) -> Result<Option<SessionRecord>, StoreError> {
        self.check_available()?;
        self.record
            .lock()
            .map(|guard| guard.clone())
            .map_err(|_| StoreError::Unavailable("record lock poisoned".to_string()))
    }

    fn save(&self, record: &SessionRecord) -> Result<(), StoreError> {
        self.check_available()?;
        let mut guard = self
            .record
            .lock()
            .map_err(|_| StoreError::Unavailable("record lock poisoned".to_string()))?;
        *guard = Some(record.clone());
        Ok(())
    }

    fn clear(&self) -> Result<(), StoreError> {
        self.check_available()?;
        let mut guard = self
            .record
            .lock()
            .map_err(|_| StoreError::Unavailable("record lock poisoned".to_string()))?;
        *guard = None;
        Ok(())
    }
}
