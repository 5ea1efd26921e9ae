use tracing::{info, warn};

use super::slot::HistorySlot;
use crate::config::HistorySettings;

/// Recently analysed texts, most recent first, without duplicates.
///
/// Loaded once from the slot when opened and written back after every
/// mutation. Storage problems never reach the caller: an unreadable slot
/// yields an empty history and a failed write only logs.
pub struct AnalysisHistory {
    entries: Vec<String>,
    limit: usize,
    key: String,
    slot: Box<dyn HistorySlot>,
}

impl AnalysisHistory {
    pub fn open(slot: Box<dyn HistorySlot>, settings: &HistorySettings) -> Self {
        let mut entries = load_entries(slot.as_ref(), &settings.key);
        entries.truncate(settings.limit);
        info!("Loaded {} history entries", entries.len());

        Self {
            entries,
            limit: settings.limit,
            key: settings.key.clone(),
            slot,
        }
    }

    /// Move `text` to the front, evicting the oldest entry past the limit.
    /// Blank text is ignored.
    pub fn record(&mut self, text: &str) {
        if text.trim().is_empty() {
            return;
        }
        self.entries.retain(|entry| entry != text);
        self.entries.insert(0, text.to_string());
        self.entries.truncate(self.limit);
        self.persist();
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.persist();
        info!("Cleared analysis history");
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn persist(&self) {
        let json = match serde_json::to_string(&self.entries) {
            Ok(json) => json,
            Err(e) => {
                warn!("Failed to serialize history: {}", e);
                return;
            }
        };
        if let Err(e) = self.slot.save(&self.key, &json) {
            warn!("Failed to save history: {}", e);
        }
    }
}

fn load_entries(slot: &dyn HistorySlot, key: &str) -> Vec<String> {
    match slot.load(key) {
        Ok(Some(json)) => serde_json::from_str(&json).unwrap_or_else(|e| {
            warn!("Stored history is not a JSON string array, starting empty: {}", e);
            Vec::new()
        }),
        Ok(None) => Vec::new(),
        Err(e) => {
            warn!("Failed to load history, starting empty: {}", e);
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::slot::MemorySlot;

    fn settings(limit: usize) -> HistorySettings {
        HistorySettings {
            limit,
            key: "analysisHistory".to_string(),
        }
    }

    #[test]
    fn test_record_moves_duplicates_to_front() {
        let slot = MemorySlot::new();
        let mut history = AnalysisHistory::open(Box::new(slot.clone()), &settings(10));

        history.record("first");
        history.record("second");
        history.record("first");

        assert_eq!(history.entries(), ["first", "second"]);
        assert_eq!(
            slot.get("analysisHistory").as_deref(),
            Some("[\"first\",\"second\"]")
        );
    }

    #[test]
    fn test_limit_evicts_oldest() {
        let mut history = AnalysisHistory::open(Box::new(MemorySlot::new()), &settings(10));
        for i in 0..12 {
            history.record(&format!("text {}", i));
        }
        assert_eq!(history.len(), 10);
        assert_eq!(history.entries()[0], "text 11");
        assert_eq!(history.entries()[9], "text 2");
    }

    #[test]
    fn test_blank_text_is_not_recorded() {
        let mut history = AnalysisHistory::open(Box::new(MemorySlot::new()), &settings(10));
        history.record("  \n ");
        assert!(history.is_empty());
    }

    #[test]
    fn test_clear_persists_empty_array() {
        let slot = MemorySlot::with_value("analysisHistory", "[\"a\",\"b\"]");
        let mut history = AnalysisHistory::open(Box::new(slot.clone()), &settings(10));
        assert_eq!(history.len(), 2);

        history.clear();
        assert!(history.is_empty());
        assert_eq!(slot.get("analysisHistory").as_deref(), Some("[]"));
    }

    #[test]
    fn test_corrupt_slot_starts_empty() {
        let slot = MemorySlot::with_value("analysisHistory", "{not json");
        let history = AnalysisHistory::open(Box::new(slot), &settings(10));
        assert!(history.is_empty());

        let slot = MemorySlot::with_value("analysisHistory", "{\"a\": 1}");
        let history = AnalysisHistory::open(Box::new(slot), &settings(10));
        assert!(history.is_empty());
    }

    #[test]
    fn test_oversized_stored_history_is_truncated() {
        let stored = serde_json::to_string(&(0..15).map(|i| i.to_string()).collect::<Vec<_>>()).unwrap();
        let slot = MemorySlot::with_value("analysisHistory", &stored);
        let history = AnalysisHistory::open(Box::new(slot), &settings(10));
        assert_eq!(history.len(), 10);
        assert_eq!(history.entries()[0], "0");
    }

    #[test]
    fn test_write_failure_keeps_in_memory_state() {
        let slot = MemorySlot::new();
        slot.fail_writes(true);
        let mut history = AnalysisHistory::open(Box::new(slot.clone()), &settings(10));

        history.record("still here");
        assert_eq!(history.entries(), ["still here"]);
        assert_eq!(slot.get("analysisHistory"), None);
    }
}
