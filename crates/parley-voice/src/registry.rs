//! In-memory registry of in-flight agent sessions, keyed by meeting id.

use crate::runtime::AgentSession;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// One join's entry in the registry.
#[derive(Clone)]
pub struct SessionRecord {
    /// Distinguishes successive joins for the same meeting.
    pub record_id: Uuid,
    pub session: Arc<dyn AgentSession>,
    /// Set by a leave request; observed by the join that owns this record.
    pub cancel: CancellationToken,
}

impl SessionRecord {
    pub fn new(session: Arc<dyn AgentSession>, cancel: CancellationToken) -> Self {
        Self {
            record_id: Uuid::new_v4(),
            session,
            cancel,
        }
    }
}

impl std::fmt::Debug for SessionRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionRecord")
            .field("record_id", &self.record_id)
            .field("connected", &self.session.is_connected())
            .field("cancelled", &self.cancel.is_cancelled())
            .finish()
    }
}

/// Meeting id -> active session record.
///
/// Uses `std::sync::RwLock`: every acquisition is a single map operation
/// that never spans an `.await`. A poisoned lock is recovered, since no
/// operation can leave the map half-updated.
#[derive(Debug, Clone, Default)]
pub struct SessionRegistry {
    inner: Arc<RwLock<HashMap<String, SessionRecord>>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts `record`, returning whatever record it replaced.
    pub fn insert(&self, meeting_id: &str, record: SessionRecord) -> Option<SessionRecord> {
        self.inner
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(meeting_id.to_string(), record)
    }

    /// Removes and returns the record for `meeting_id`.
    pub fn take(&self, meeting_id: &str) -> Option<SessionRecord> {
        self.inner
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(meeting_id)
    }

    /// Removes the record for `meeting_id` only if it is still the one
    /// identified by `record_id`. Returns whether anything was removed.
    pub fn remove_if_current(&self, meeting_id: &str, record_id: Uuid) -> bool {
        let mut map = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        match map.get(meeting_id) {
            Some(record) if record.record_id == record_id => {
                map.remove(meeting_id);
                true
            }
            _ => false,
        }
    }

    pub fn contains(&self, meeting_id: &str) -> bool {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(meeting_id)
    }

    /// The record id currently registered for `meeting_id`.
    pub fn current(&self, meeting_id: &str) -> Option<Uuid> {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(meeting_id)
            .map(|record| record.record_id)
    }

    pub fn meeting_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self
            .inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect();
        ids.sort();
        ids
    }

    pub fn len(&self) -> usize {
        self.inner.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Empties the registry and returns every record it held.
    pub fn drain(&self) -> Vec<(String, SessionRecord)> {
        self.inner
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .drain()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::mock::{ScriptedRuntime, StartBehavior};
    use crate::runtime::{AgentRuntime, SessionContext, SessionSpec};
    use crate::{AgentPersona, ConversationFlow, Pipeline};
    use crate::pipeline::{RealtimeModel, RealtimePipeline};

    fn record(runtime: &ScriptedRuntime) -> SessionRecord {
        let persona = AgentPersona::new("prompt", "calm", None);
        let flow = ConversationFlow::new(&persona);
        let session = runtime
            .create_session(SessionSpec {
                context: SessionContext {
                    meeting_id: "m".to_string(),
                    name: "agent".to_string(),
                    token: "tok".to_string(),
                },
                persona,
                pipeline: Pipeline::Realtime(RealtimePipeline {
                    model: RealtimeModel::Gemini(Default::default()),
                    api_key: None,
                }),
                flow,
            })
            .unwrap();
        SessionRecord::new(session, CancellationToken::new())
    }

    #[test]
    fn insert_replaces_previous_record() {
        let runtime = ScriptedRuntime::new(StartBehavior::Hold);
        let registry = SessionRegistry::new();
        let first = record(&runtime);
        let second = record(&runtime);
        let (first_id, second_id) = (first.record_id, second.record_id);

        assert!(registry.insert("m-1", first).is_none());
        let replaced = registry.insert("m-1", second).unwrap();
        assert_eq!(replaced.record_id, first_id);
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.current("m-1"), Some(second_id));
    }

    #[test]
    fn remove_if_current_ignores_stale_record() {
        let runtime = ScriptedRuntime::new(StartBehavior::Hold);
        let registry = SessionRegistry::new();
        let first = record(&runtime);
        let first_id = first.record_id;
        registry.insert("m-1", first);
        let second = record(&runtime);
        let second_id = second.record_id;
        registry.insert("m-1", second);

        assert!(!registry.remove_if_current("m-1", first_id));
        assert!(registry.contains("m-1"));
        assert!(registry.remove_if_current("m-1", second_id));
        assert!(registry.is_empty());
        // idempotent
        assert!(!registry.remove_if_current("m-1", second_id));
    }

    #[test]
    fn take_and_drain() {
        let runtime = ScriptedRuntime::new(StartBehavior::Hold);
        let registry = SessionRegistry::new();
        registry.insert("b", record(&runtime));
        registry.insert("a", record(&runtime));
        assert_eq!(registry.meeting_ids(), vec!["a".to_string(), "b".to_string()]);

        assert!(registry.take("a").is_some());
        assert!(registry.take("a").is_none());

        let drained = registry.drain();
        assert_eq!(drained.len(), 1);
        assert_eq!(drained[0].0, "b");
        assert!(registry.is_empty());
    }
}
