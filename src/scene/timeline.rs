//! Sorted storage of deferred scene effects.
//!
//! Actions are kept sorted by fire time. Inserting an action with the same
//! time as existing ones places it after them, so simultaneous actions fire
//! in the order they were scheduled. Fired actions are removed.

use std::collections::VecDeque;

use super::Effect;

/// An effect stamped with the scene time at which it fires.
#[derive(Debug, Clone)]
pub struct ScheduledAction {
    /// Scene-relative seconds.
    pub time: f64,
    pub effect: Effect,
}

/// A sorted queue of pending actions.
#[derive(Debug, Default)]
pub struct Timeline {
    actions: VecDeque<ScheduledAction>,
}

impl Timeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a single action after every pending action with time `<=` its own.
    pub fn insert(&mut self, action: ScheduledAction) {
        let pos = self.actions.partition_point(|a| a.time <= action.time);
        self.actions.insert(pos, action);
    }

    /// Insert a batch of actions, keeping their relative order for equal times.
    pub fn insert_batch(&mut self, actions: impl IntoIterator<Item = ScheduledAction>) {
        self.actions.extend(actions);
        self.actions
            .make_contiguous()
            .sort_by(|a, b| a.time.total_cmp(&b.time));
    }

    /// Remove every action due at `now`, in firing order. Actions inserted
    /// afterwards wait for the next call even if they are already due.
    pub fn drain_due(&mut self, now: f64) -> Vec<ScheduledAction> {
        let due = self.actions.partition_point(|a| a.time <= now);
        self.actions.drain(..due).collect()
    }

    /// Peek at the next pending action.
    pub fn peek_next(&self) -> Option<&ScheduledAction> {
        self.actions.front()
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    pub fn clear(&mut self) {
        self.actions.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::primitive::PrimitiveId;

    fn action(time: f64, id: u64) -> ScheduledAction {
        ScheduledAction {
            time,
            effect: Effect::Show(PrimitiveId(id)),
        }
    }

    fn fired_ids(tl: &mut Timeline, now: f64) -> Vec<u64> {
        tl.drain_due(now)
            .into_iter()
            .map(|a| match a.effect {
                Effect::Show(PrimitiveId(id)) => id,
                other => panic!("unexpected effect {other:?}"),
            })
            .collect()
    }

    #[test]
    fn empty_timeline() {
        let mut tl = Timeline::new();
        assert!(tl.is_empty());
        assert!(tl.peek_next().is_none());
        assert!(tl.drain_due(100.0).is_empty());
    }

    #[test]
    fn equal_times_fire_in_scheduling_order() {
        let mut tl = Timeline::new();
        tl.insert(action(1.0, 1)); // A
        tl.insert(action(1.0, 2)); // B
        tl.insert(action(0.5, 3)); // C
        assert_eq!(fired_ids(&mut tl, 1.0), vec![3, 1, 2]);
        assert!(tl.is_empty());
    }

    #[test]
    fn drain_due_stops_at_future_actions() {
        let mut tl = Timeline::new();
        tl.insert(action(0.0, 1));
        tl.insert(action(2.0, 2));
        assert_eq!(fired_ids(&mut tl, 1.0), vec![1]);
        assert_eq!(tl.len(), 1);
        assert_eq!(tl.peek_next().map(|a| a.time), Some(2.0));
        assert_eq!(fired_ids(&mut tl, 2.0), vec![2]);
    }

    #[test]
    fn batch_insert_is_stable() {
        let mut tl = Timeline::new();
        tl.insert_batch(vec![action(3.0, 1), action(1.0, 2), action(1.0, 3), action(0.0, 4)]);
        assert_eq!(fired_ids(&mut tl, 10.0), vec![4, 2, 3, 1]);
    }

    #[test]
    fn clear_empties() {
        let mut tl = Timeline::new();
        tl.insert(action(0.0, 1));
        tl.clear();
        assert!(tl.is_empty());
    }
}
