use std::collections::BTreeMap;
use uuid::Uuid;

/// Emitted once per pipeline run, after qualification, scheduling and publishing finished.
#[derive(Debug, serde::Serialize, serde::Deserialize, Clone)]
pub struct RunCompletedEvent {
    pub run_id: Uuid,
    pub received: usize,
    pub qualified: usize,
    pub scheduled: usize,
    pub rejected: BTreeMap<String, usize>,
    pub drafts_created: usize,
    pub draft_failures: usize,
    pub timestamp: i64,
}

impl RunCompletedEvent {
    pub fn rejected_total(&self) -> usize {
        self.rejected.values().sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_serialization() {
        let mut rejected = BTreeMap::new();
        rejected.insert("DUPLICATE".to_string(), 2);
        rejected.insert("BELOW_THRESHOLD".to_string(), 1);

        let event = RunCompletedEvent {
            run_id: Uuid::new_v4(),
            received: 5,
            qualified: 2,
            scheduled: 2,
            rejected,
            drafts_created: 2,
            draft_failures: 0,
            timestamp: 1_700_000_000,
        };

        assert_eq!(event.rejected_total(), 3);

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["rejected"]["DUPLICATE"], 2);
        assert_eq!(json["scheduled"], 2);
    }
}
