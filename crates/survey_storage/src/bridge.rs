#![forbid(unsafe_code)]

//! Best-effort persistence of the local survey session. Nothing here may
//! fail the caller: write errors are logged and dropped, read errors and
//! malformed documents read back as "nothing stored".

use serde::de::DeserializeOwned;
use serde::Serialize;
use survey_kernel_contracts::assignment::AssignmentSnapshot;
use survey_kernel_contracts::session::{NavigationState, ParticipantInfo, PersistedSession};
use tracing::{debug, warn};

use crate::kv::KeyValueStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionKey {
    Navigation,
    Participant,
    Assignment,
}

impl SessionKey {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Navigation => "credit_survey_state",
            Self::Participant => "credit_survey_user_info",
            Self::Assignment => "credit_survey_data",
        }
    }

    pub const fn all() -> &'static [Self] {
        &[Self::Navigation, Self::Participant, Self::Assignment]
    }
}

#[derive(Debug, Clone)]
pub struct PersistenceBridge<S: KeyValueStore> {
    store: S,
}

impl<S: KeyValueStore> PersistenceBridge<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn into_inner(self) -> S {
        self.store
    }

    pub fn save<T: Serialize>(&mut self, key: SessionKey, value: &T) {
        let serialized = match serde_json::to_string(value) {
            Ok(serialized) => serialized,
            Err(err) => {
                warn!(key = key.as_str(), error = %err, "failed to serialize session value");
                return;
            }
        };
        if let Err(err) = self.store.set(key.as_str(), &serialized) {
            warn!(key = key.as_str(), error = %err, "failed to save session value");
        }
    }

    pub fn load<T: DeserializeOwned>(&self, key: SessionKey) -> Option<T> {
        let raw = match self.store.get(key.as_str()) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(err) => {
                warn!(key = key.as_str(), error = %err, "failed to load session value");
                return None;
            }
        };
        match serde_json::from_str::<T>(&raw) {
            Ok(value) => Some(value),
            Err(err) => {
                warn!(key = key.as_str(), error = %err, "ignoring malformed session value");
                None
            }
        }
    }

    pub fn clear(&mut self) {
        for key in SessionKey::all() {
            if let Err(err) = self.store.remove(key.as_str()) {
                warn!(key = key.as_str(), error = %err, "failed to clear session value");
            }
        }
    }

    /// Each key is read on its own so one damaged entry only loses that part.
    pub fn load_session(&self) -> PersistedSession {
        let session = PersistedSession {
            navigation: self
                .load::<NavigationState>(SessionKey::Navigation)
                .unwrap_or_default(),
            participant: self.load::<ParticipantInfo>(SessionKey::Participant),
            assignment_snapshot: self.load::<AssignmentSnapshot>(SessionKey::Assignment),
        };
        debug!(
            page = session.navigation.current_page.as_str(),
            has_participant = session.participant.is_some(),
            has_snapshot = session.assignment_snapshot.is_some(),
            "session loaded"
        );
        session
    }

    /// Absent optional parts are left as they are in the store.
    pub fn save_session(&mut self, session: &PersistedSession) {
        self.save(SessionKey::Navigation, &session.navigation);
        if let Some(participant) = &session.participant {
            self.save(SessionKey::Participant, participant);
        }
        if let Some(snapshot) = &session.assignment_snapshot {
            self.save(SessionKey::Assignment, snapshot);
        }
    }
}
