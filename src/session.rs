//! Session-scoped result accumulation.
//!
//! Each user session owns one `AssessmentSession`, created once and passed
//! into every dispatch call. Results accumulate across diseases for the
//! whole session and are cleared only when the session ends or is cleared
//! explicitly, never as a side effect of the UI redrawing.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One stored diagnosis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultEntry {
    pub disease_id: String,
    pub diagnosis: String,
}

/// Disease id → diagnosis text, in first-insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ResultStore {
    entries: Vec<ResultEntry>,
}

impl ResultStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or overwrite the entry for `disease_id`. An overwritten entry
    /// keeps its original position; other entries are untouched.
    pub fn record(&mut self, disease_id: &str, diagnosis: &str) {
        match self.entries.iter_mut().find(|e| e.disease_id == disease_id) {
            Some(entry) => entry.diagnosis = diagnosis.to_string(),
            None => self.entries.push(ResultEntry {
                disease_id: disease_id.to_string(),
                diagnosis: diagnosis.to_string(),
            }),
        }
    }

    pub fn get(&self, disease_id: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|e| e.disease_id == disease_id)
            .map(|e| e.diagnosis.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &ResultEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Owned, immutable copy for report generation.
    pub fn snapshot(&self) -> ResultSnapshot {
        ResultSnapshot {
            entries: self.entries.clone(),
        }
    }
}

/// Frozen view of a `ResultStore` at one point in time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultSnapshot {
    entries: Vec<ResultEntry>,
}

impl ResultSnapshot {
    pub fn entries(&self) -> &[ResultEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K, V> FromIterator<(K, V)> for ResultSnapshot
where
    K: AsRef<str>,
    V: AsRef<str>,
{
    /// Builds a snapshot with the same overwrite semantics as
    /// [`ResultStore::record`].
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut store = ResultStore::new();
        for (disease_id, diagnosis) in iter {
            store.record(disease_id.as_ref(), diagnosis.as_ref());
        }
        store.snapshot()
    }
}

/// Explicit per-user session context.
#[derive(Debug)]
pub struct AssessmentSession {
    id: Uuid,
    started_at: DateTime<Utc>,
    results: ResultStore,
}

impl Default for AssessmentSession {
    fn default() -> Self {
        Self::new()
    }
}

impl AssessmentSession {
    pub fn new() -> Self {
        let session = Self {
            id: Uuid::new_v4(),
            started_at: Utc::now(),
            results: ResultStore::new(),
        };
        tracing::debug!(session_id = %session.id, "Session started");
        session
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn results(&self) -> &ResultStore {
        &self.results
    }

    pub fn results_mut(&mut self) -> &mut ResultStore {
        &mut self.results
    }

    /// Drop accumulated results but keep the session alive.
    pub fn clear(&mut self) {
        tracing::info!(session_id = %self.id, cleared = self.results.len(), "Session results cleared");
        self.results.clear();
    }

    /// End the session, handing back whatever was accumulated.
    pub fn end(self) -> ResultStore {
        tracing::info!(
            session_id = %self.id,
            results = self.results.len(),
            duration_secs = (Utc::now() - self.started_at).num_seconds(),
            "Session ended"
        );
        self.results
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_adds_entries_in_insertion_order() {
        let mut store = ResultStore::new();
        store.record("Kidney", "Positive Diagnosis");
        store.record("Stroke", "Negative Diagnosis");

        let ids: Vec<&str> = store.iter().map(|e| e.disease_id.as_str()).collect();
        assert_eq!(ids, vec!["Kidney", "Stroke"]);
        assert_eq!(store.get("Stroke"), Some("Negative Diagnosis"));
    }

    #[test]
    fn overwrite_keeps_position_and_other_entries() {
        let mut store = ResultStore::new();
        store.record("Kidney", "Positive Diagnosis");
        store.record("Stroke", "Negative Diagnosis");
        store.record("Kidney", "Negative Diagnosis");

        assert_eq!(store.len(), 2);
        assert_eq!(store.iter().next().unwrap().disease_id, "Kidney");
        assert_eq!(store.get("Kidney"), Some("Negative Diagnosis"));
        assert_eq!(store.get("Stroke"), Some("Negative Diagnosis"));
    }

    #[test]
    fn snapshot_is_detached_from_store() {
        let mut store = ResultStore::new();
        store.record("Kidney", "Positive Diagnosis");
        let snapshot = store.snapshot();
        store.record("Diabetes", "Negative Diagnosis");

        assert_eq!(snapshot.len(), 1);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn snapshot_from_pairs() {
        let snapshot: ResultSnapshot = [("Kidney", "Positive"), ("Stroke", "Negative"), ("Kidney", "Negative")]
            .into_iter()
            .collect();
        assert_eq!(
            snapshot.entries(),
            &[
                ResultEntry {
                    disease_id: "Kidney".into(),
                    diagnosis: "Negative".into()
                },
                ResultEntry {
                    disease_id: "Stroke".into(),
                    diagnosis: "Negative".into()
                },
            ]
        );
    }

    #[test]
    fn session_accumulates_until_ended() {
        let mut session = AssessmentSession::new();
        session.results_mut().record("Kidney", "Positive Diagnosis");
        session.results_mut().record("Alzheimers", "Negative Diagnosis");
        assert_eq!(session.results().len(), 2);

        let results = session.end();
        assert_eq!(results.len(), 2);
    }

    #[test]
    fn clear_empties_results() {
        let mut session = AssessmentSession::new();
        session.results_mut().record("Kidney", "Positive Diagnosis");
        session.clear();
        assert!(session.results().is_empty());
    }

    #[test]
    fn sessions_are_isolated() {
        let mut a = AssessmentSession::new();
        let b = AssessmentSession::new();
        a.results_mut().record("Kidney", "Positive Diagnosis");

        assert_ne!(a.id(), b.id());
        assert!(b.results().is_empty());
        assert!(a.started_at() <= Utc::now());
    }
}
