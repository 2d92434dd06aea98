use chrono::NaiveTime;
use promo_core::{BatchSlot, OfferStore};
use tracing::{error, info, warn};

use crate::ScheduleError;

/// Daily publication times used when the store has no slots for today.
pub const DEFAULT_TEMPLATE: [(u32, u32); 5] = [(8, 0), (11, 0), (14, 0), (18, 0), (22, 0)];

/// Picks the least-loaded upcoming slot for each draft.
#[derive(Debug, Clone)]
pub struct BatchScheduler {
    template: Vec<NaiveTime>,
}

impl Default for BatchScheduler {
    fn default() -> Self {
        Self::new(
            DEFAULT_TEMPLATE
                .iter()
                .filter_map(|(h, m)| NaiveTime::from_hms_opt(*h, *m, 0))
                .collect(),
        )
    }
}

impl BatchScheduler {
    pub fn new(template: Vec<NaiveTime>) -> Self {
        Self { template }
    }

    pub fn template(&self) -> &[NaiveTime] {
        &self.template
    }

    /// Slots strictly after `now` (or every slot once the day has run out),
    /// lowest pending count first, earliest time on ties.
    pub fn select(slots: &[BatchSlot], now: NaiveTime) -> Option<&BatchSlot> {
        let has_future = slots.iter().any(|s| s.scheduled_time > now);
        slots
            .iter()
            .filter(|s| !has_future || s.scheduled_time > now)
            .min_by_key(|s| (s.pending_count, s.scheduled_time))
    }

    /// Reads today's slots once. When there are none, creates them from the
    /// template. Listing failures count as "no slots".
    pub async fn load_board(&self, store: &dyn OfferStore) -> Result<SlotBoard, ScheduleError> {
        let existing = match store.list_batches_today().await {
            Ok(slots) => slots,
            Err(e) => {
                warn!("Could not list today's batches: {}", e);
                Vec::new()
            }
        };

        if !existing.is_empty() {
            return Ok(SlotBoard::new(existing));
        }

        info!("No batches for today, creating {} from template", self.template.len());
        let mut created = Vec::with_capacity(self.template.len());
        for time in &self.template {
            match store.create_batch(*time).await {
                Ok(slot) => created.push(slot),
                Err(e) => error!("Failed to create batch at {}: {}", time.format("%H:%M"), e),
            }
        }

        if created.is_empty() {
            return Err(ScheduleError::NoBatchAvailable);
        }
        Ok(SlotBoard::freshly_created(created))
    }
}

/// Slot state for one run. Read once, then updated locally as drafts get assigned.
#[derive(Debug, Clone, Default)]
pub struct SlotBoard {
    slots: Vec<BatchSlot>,
    pin_first: bool,
}

impl SlotBoard {
    pub fn new(slots: Vec<BatchSlot>) -> Self {
        Self { slots, pin_first: false }
    }

    /// Board over slots the run just created; the first assignment lands on the first of them.
    pub fn freshly_created(slots: Vec<BatchSlot>) -> Self {
        Self { slots, pin_first: true }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn slots(&self) -> &[BatchSlot] {
        &self.slots
    }

    /// Chooses a slot and counts the assignment against it.
    pub fn assign(&mut self, now: NaiveTime) -> Result<BatchSlot, ScheduleError> {
        let id = if std::mem::take(&mut self.pin_first) {
            self.slots.first().map(|s| s.id.clone())
        } else {
            BatchScheduler::select(&self.slots, now).map(|s| s.id.clone())
        }
        .ok_or(ScheduleError::NoBatchAvailable)?;

        let slot = self
            .slots
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or(ScheduleError::NoBatchAvailable)?;
        let chosen = slot.clone();
        slot.pending_count += 1;
        Ok(chosen)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use promo_store::MemoryOfferStore;

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn slot(id: &str, time: NaiveTime, pending: u32) -> BatchSlot {
        BatchSlot {
            id: id.to_string(),
            scheduled_time: time,
            pending_count: pending,
        }
    }

    #[test]
    fn test_tie_goes_to_earliest_future_slot() {
        let slots = vec![slot("a", t(8, 0), 3), slot("b", t(11, 0), 1), slot("c", t(14, 0), 1)];
        let chosen = BatchScheduler::select(&slots, t(9, 0)).unwrap();
        assert_eq!(chosen.id, "b");
    }

    #[test]
    fn test_lowest_pending_wins_over_time() {
        let slots = vec![slot("a", t(11, 0), 4), slot("b", t(18, 0), 0)];
        assert_eq!(BatchScheduler::select(&slots, t(9, 0)).unwrap().id, "b");
    }

    #[test]
    fn test_past_slots_ignored_while_future_exists() {
        let slots = vec![slot("a", t(8, 0), 0), slot("b", t(14, 0), 5)];
        assert_eq!(BatchScheduler::select(&slots, t(9, 0)).unwrap().id, "b");
    }

    #[test]
    fn test_falls_back_to_whole_day() {
        let slots = vec![slot("a", t(8, 0), 2), slot("b", t(11, 0), 1), slot("c", t(14, 0), 1)];
        assert_eq!(BatchScheduler::select(&slots, t(23, 0)).unwrap().id, "b");
        // a slot at exactly `now` is not in the future
        assert_eq!(BatchScheduler::select(&slots, t(14, 0)).unwrap().id, "b");
        assert!(BatchScheduler::select(&[], t(9, 0)).is_none());
    }

    #[test]
    fn test_board_spreads_assignments() {
        let mut board = SlotBoard::new(vec![slot("a", t(11, 0), 0), slot("b", t(14, 0), 0)]);
        let picks: Vec<String> = (0..4).map(|_| board.assign(t(9, 0)).unwrap().id).collect();
        assert_eq!(picks, vec!["a", "b", "a", "b"]);
        assert_eq!(board.slots()[0].pending_count, 2);
    }

    #[test]
    fn test_fresh_board_pins_first_created() {
        let mut board = SlotBoard::freshly_created(vec![slot("a", t(8, 0), 0), slot("b", t(11, 0), 0)]);
        assert_eq!(board.assign(t(9, 0)).unwrap().id, "a");
        assert_eq!(board.assign(t(9, 0)).unwrap().id, "b");
    }

    #[test]
    fn test_empty_board() {
        let mut board = SlotBoard::empty();
        assert_eq!(board.assign(t(9, 0)), Err(ScheduleError::NoBatchAvailable));
    }

    #[tokio::test]
    async fn test_load_board_creates_template() {
        let store = MemoryOfferStore::new();
        let board = BatchScheduler::default().load_board(&store).await.unwrap();
        assert_eq!(board.slots().len(), 5);
        assert_eq!(store.batches().await.len(), 5);
    }

    #[tokio::test]
    async fn test_load_board_uses_existing() {
        let store = MemoryOfferStore::new();
        store.seed_batches(vec![slot("x", t(14, 0), 2)]).await;
        let board = BatchScheduler::default().load_board(&store).await.unwrap();
        assert_eq!(board.slots().len(), 1);
        assert_eq!(store.batches().await.len(), 1);
    }

    #[tokio::test]
    async fn test_load_board_unreachable_store() {
        let store = MemoryOfferStore::new().without_batches();
        let result = BatchScheduler::default().load_board(&store).await;
        assert_eq!(result.unwrap_err(), ScheduleError::NoBatchAvailable);
    }
}
