//! Append-only, chronologically-ordered event log with side indices.

use std::collections::HashMap;

use chronicle_ecs::prelude::EntityId;

use crate::event::{Event, EventCategory, EventId};

/// Append-only event log. Maintains `by_id`, `by_category` and `by_entity`
/// indices alongside the master chronological list; every index stays
/// consistent with `get_all()` after every `append`.
#[derive(Debug, Default)]
pub struct EventLog {
    events: Vec<Event>,
    by_id: HashMap<EventId, usize>,
    by_category: HashMap<EventCategory, Vec<usize>>,
    by_entity: HashMap<EntityId, Vec<usize>>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `event`, updating every index in one logical step.
    pub fn append(&mut self, event: Event) {
        let idx = self.events.len();
        self.by_id.insert(event.id, idx);
        self.by_category.entry(event.category).or_default().push(idx);
        for &participant in &event.participants {
            self.by_entity.entry(participant).or_default().push(idx);
        }
        if let Some(location) = event.location {
            self.by_entity.entry(location).or_default().push(idx);
        }
        self.events.push(event);
    }

    pub fn get_all(&self) -> &[Event] {
        &self.events
    }

    pub fn get_by_id(&self, id: EventId) -> Option<&Event> {
        self.by_id.get(&id).map(|&idx| &self.events[idx])
    }

    pub fn get_by_id_mut(&mut self, id: EventId) -> Option<&mut Event> {
        let idx = *self.by_id.get(&id)?;
        Some(&mut self.events[idx])
    }

    pub fn get_by_category(&self, category: EventCategory) -> Vec<&Event> {
        self.by_category
            .get(&category)
            .map(|indices| indices.iter().map(|&i| &self.events[i]).collect())
            .unwrap_or_default()
    }

    pub fn get_by_entity(&self, entity: EntityId) -> Vec<&Event> {
        self.by_entity
            .get(&entity)
            .map(|indices| indices.iter().map(|&i| &self.events[i]).collect())
            .unwrap_or_default()
    }

    /// Events with `start_tick <= timestamp <= end_tick`, inclusive at both
    /// ends.
    pub fn get_by_time_range(&self, start_tick: u64, end_tick: u64) -> Vec<&Event> {
        self.events
            .iter()
            .filter(|e| e.timestamp >= start_tick && e.timestamp <= end_tick)
            .collect()
    }

    pub fn count(&self) -> usize {
        self.events.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::EventBuilder;

    fn event(id: u64, category: EventCategory, tick: u64, participants: Vec<EntityId>) -> Event {
        EventBuilder::new(category, "test", tick)
            .participants(participants)
            .build(EventId::from_raw(id))
    }

    #[test]
    fn single_event_capture_and_category_index() {
        let mut log = EventLog::new();
        log.append(event(0, EventCategory::Military, 1, vec![]));
        assert_eq!(log.count(), 1);
        assert_eq!(log.get_by_category(EventCategory::Military).len(), 1);
        assert_eq!(log.get_by_category(EventCategory::Economic).len(), 0);
    }

    #[test]
    fn get_by_id_is_present_after_append() {
        let mut log = EventLog::new();
        log.append(event(5, EventCategory::Political, 2, vec![]));
        assert_eq!(log.get_by_id(EventId::from_raw(5)).unwrap().timestamp, 2);
        assert!(log.get_by_id(EventId::from_raw(99)).is_none());
    }

    #[test]
    fn by_entity_indexes_participants_and_location() {
        let mut log = EventLog::new();
        let a = EntityId::from_raw(1);
        let b = EntityId::from_raw(2);
        log.append(event(0, EventCategory::Cultural, 1, vec![a, b]));
        assert_eq!(log.get_by_entity(a).len(), 1);
        assert_eq!(log.get_by_entity(b).len(), 1);
        assert_eq!(log.get_by_entity(EntityId::from_raw(3)).len(), 0);
    }

    #[test]
    fn time_range_inclusive_both_ends() {
        let mut log = EventLog::new();
        for tick in 0..10 {
            log.append(event(tick, EventCategory::Scientific, tick, vec![]));
        }
        let results = log.get_by_time_range(3, 5);
        let ticks: Vec<u64> = results.iter().map(|e| e.timestamp).collect();
        assert_eq!(ticks, vec![3, 4, 5]);
    }

    #[test]
    fn indices_consistent_with_get_all_after_multiple_appends() {
        let mut log = EventLog::new();
        for i in 0..20 {
            let category = if i % 2 == 0 {
                EventCategory::Military
            } else {
                EventCategory::Economic
            };
            log.append(event(i, category, i, vec![]));
        }
        assert_eq!(log.get_all().len(), 20);
        assert_eq!(log.get_by_category(EventCategory::Military).len(), 10);
        assert_eq!(log.get_by_category(EventCategory::Economic).len(), 10);
    }
}
