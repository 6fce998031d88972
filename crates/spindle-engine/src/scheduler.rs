use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

use chrono::{DateTime, TimeDelta, Utc};
use rand::Rng;
use rand::rngs::StdRng;
use spindle_world::LivingId;

/// A scheduled action: at `due` (game time), dispatch `action` on behalf
/// of `owner`. Actions are named, not closures, so they survive a trip
/// through a savegame; the story maps names back to behavior.
#[derive(Debug, Clone)]
pub struct Deferred {
    /// Game time at which the action comes due.
    pub due: DateTime<Utc>,
    /// The living this action belongs to.
    pub owner: LivingId,
    /// Action name the story dispatches on.
    pub action: String,
    /// For repeating actions: (min, max) game seconds until the next
    /// firing, drawn uniformly after each firing.
    pub periodic: Option<(f64, f64)>,
    seq: u64,
}

impl Deferred {
    /// Rebuild an entry from persisted state. The scheduler re-assigns
    /// the tie-breaking sequence number when the entry is queued.
    pub fn restored(
        due: DateTime<Utc>,
        owner: LivingId,
        action: impl Into<String>,
        periodic: Option<(f64, f64)>,
    ) -> Self {
        Self {
            due,
            owner,
            action: action.into(),
            periodic,
            seq: 0,
        }
    }
}

// Ordered by due time; seq (registration order) breaks ties so two
// actions due at the same instant fire in the order they were scheduled.
impl PartialEq for Deferred {
    fn eq(&self, other: &Self) -> bool {
        self.due == other.due && self.seq == other.seq
    }
}

impl Eq for Deferred {}

impl PartialOrd for Deferred {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Deferred {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.due, self.seq).cmp(&(other.due, other.seq))
    }
}

/// The deferred-action scheduler: a priority queue over game time.
///
/// The driver calls [`Scheduler::advance`] once per server tick with the
/// clock's current game time; everything due by then is returned in due
/// order and periodic entries are re-queued.
#[derive(Debug, Default)]
pub struct Scheduler {
    heap: BinaryHeap<Reverse<Deferred>>,
    next_seq: u64,
}

impl Scheduler {
    /// An empty scheduler.
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule `action` for `owner` at an absolute game time.
    pub fn defer_at(&mut self, due: DateTime<Utc>, owner: LivingId, action: impl Into<String>) {
        self.push(Deferred {
            due,
            owner,
            action: action.into(),
            periodic: None,
            seq: 0,
        });
    }

    /// Schedule `action` for `owner` after `secs` game seconds from `now`.
    pub fn defer_secs(
        &mut self,
        now: DateTime<Utc>,
        secs: f64,
        owner: LivingId,
        action: impl Into<String>,
    ) {
        self.defer_at(now + delta_secs(secs), owner, action);
    }

    /// Schedule a repeating action, first due between `min_secs` and
    /// `max_secs` game seconds from `now` and re-drawn in that range after
    /// each firing. A non-positive `min_secs` cancels any matching entry
    /// instead of scheduling.
    pub fn defer_periodic(
        &mut self,
        now: DateTime<Utc>,
        owner: LivingId,
        action: impl Into<String>,
        min_secs: f64,
        max_secs: f64,
        rng: &mut StdRng,
    ) {
        let action = action.into();
        if min_secs <= 0.0 {
            self.cancel(owner, &action);
            return;
        }
        let max_secs = max_secs.max(min_secs);
        let wait = rng.random_range(min_secs..=max_secs);
        self.push(Deferred {
            due: now + delta_secs(wait),
            owner,
            action,
            periodic: Some((min_secs, max_secs)),
            seq: 0,
        });
    }

    /// Remove every entry matching `owner` and `action`.
    pub fn cancel(&mut self, owner: LivingId, action: &str) {
        self.retain(|d| !(d.owner == owner && d.action == action));
    }

    /// Remove every entry belonging to `owner`, whatever the action. Used
    /// when a living leaves the world for good.
    pub fn cancel_owner(&mut self, owner: LivingId) {
        self.retain(|d| d.owner != owner);
    }

    fn retain(&mut self, keep: impl Fn(&Deferred) -> bool) {
        let kept: Vec<Deferred> = self
            .heap
            .drain()
            .map(|Reverse(d)| d)
            .filter(|d| keep(d))
            .collect();
        self.heap = kept.into_iter().map(Reverse).collect();
    }

    /// Pop every entry due at or before `now`, in due order. Periodic
    /// entries are re-queued relative to `now` before returning.
    pub fn advance(&mut self, now: DateTime<Utc>, rng: &mut StdRng) -> Vec<Deferred> {
        let mut fired = Vec::new();
        while let Some(Reverse(next)) = self.heap.peek() {
            if next.due > now {
                break;
            }
            let Some(Reverse(deferred)) = self.heap.pop() else {
                break;
            };
            if let Some((min_secs, max_secs)) = deferred.periodic {
                let wait = rng.random_range(min_secs..=max_secs.max(min_secs));
                self.push(Deferred {
                    due: now + delta_secs(wait),
                    owner: deferred.owner,
                    action: deferred.action.clone(),
                    periodic: deferred.periodic,
                    seq: 0,
                });
            }
            fired.push(deferred);
        }
        fired
    }

    /// The earliest due time among pending entries.
    pub fn next_due(&self) -> Option<DateTime<Utc>> {
        self.heap.peek().map(|Reverse(d)| d.due)
    }

    /// The number of pending entries.
    pub fn len(&self) -> usize {
        self.heap.len()
    }

    /// Whether no entries are pending.
    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Pending entries in due order, for persistence.
    pub fn state(&self) -> Vec<Deferred> {
        let mut entries: Vec<Deferred> = self.heap.iter().map(|Reverse(d)| d.clone()).collect();
        entries.sort();
        entries
    }

    /// Replace all pending entries with persisted ones, preserving their
    /// relative order for same-instant ties.
    pub fn restore(&mut self, entries: Vec<Deferred>) {
        self.heap.clear();
        for entry in entries {
            self.push(entry);
        }
    }

    fn push(&mut self, mut deferred: Deferred) {
        deferred.seq = self.next_seq;
        self.next_seq += 1;
        self.heap.push(Reverse(deferred));
    }
}

fn delta_secs(secs: f64) -> TimeDelta {
    // Floored at one millisecond; a re-queued periodic entry must land
    // strictly after `now` or `advance` would pop it forever.
    TimeDelta::milliseconds(((secs * 1000.0).round() as i64).max(1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use proptest::prelude::*;
    use rand::SeedableRng;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    fn rng() -> StdRng {
        StdRng::seed_from_u64(42)
    }

    #[test]
    fn fires_in_due_order() {
        let mut sched = Scheduler::new();
        let owner = LivingId(1);
        sched.defer_secs(t0(), 30.0, owner, "late");
        sched.defer_secs(t0(), 10.0, owner, "early");
        sched.defer_secs(t0(), 20.0, owner, "middle");

        let fired = sched.advance(t0() + TimeDelta::seconds(60), &mut rng());
        let names: Vec<&str> = fired.iter().map(|d| d.action.as_str()).collect();
        assert_eq!(names, ["early", "middle", "late"]);
        assert!(sched.is_empty());
    }

    #[test]
    fn same_instant_ties_fire_in_registration_order() {
        let mut sched = Scheduler::new();
        let owner = LivingId(1);
        sched.defer_at(t0(), owner, "first");
        sched.defer_at(t0(), owner, "second");
        sched.defer_at(t0(), owner, "third");

        let fired = sched.advance(t0(), &mut rng());
        let names: Vec<&str> = fired.iter().map(|d| d.action.as_str()).collect();
        assert_eq!(names, ["first", "second", "third"]);
    }

    #[test]
    fn not_yet_due_entries_stay_queued() {
        let mut sched = Scheduler::new();
        sched.defer_secs(t0(), 100.0, LivingId(1), "later");
        let fired = sched.advance(t0() + TimeDelta::seconds(50), &mut rng());
        assert!(fired.is_empty());
        assert_eq!(sched.len(), 1);
    }

    #[test]
    fn periodic_requeues_within_range() {
        let mut sched = Scheduler::new();
        let mut rng = rng();
        sched.defer_periodic(t0(), LivingId(1), "wander", 10.0, 20.0, &mut rng);

        let first_due = sched.next_due().unwrap();
        assert!(first_due >= t0() + TimeDelta::seconds(10));
        assert!(first_due <= t0() + TimeDelta::seconds(20));

        let fired = sched.advance(first_due, &mut rng);
        assert_eq!(fired.len(), 1);
        let next_due = sched.next_due().unwrap();
        assert!(next_due >= first_due + TimeDelta::seconds(10));
        assert!(next_due <= first_due + TimeDelta::seconds(20));
    }

    #[test]
    fn non_positive_interval_cancels() {
        let mut sched = Scheduler::new();
        let mut rng = rng();
        let owner = LivingId(1);
        sched.defer_periodic(t0(), owner, "wander", 10.0, 20.0, &mut rng);
        assert_eq!(sched.len(), 1);

        sched.defer_periodic(t0(), owner, "wander", 0.0, 0.0, &mut rng);
        assert!(sched.is_empty());
    }

    #[test]
    fn tiny_periodic_interval_still_moves_forward() {
        let mut sched = Scheduler::new();
        let mut rng = rng();
        // Well under a millisecond; the delta must not round to zero.
        sched.defer_periodic(t0(), LivingId(1), "buzz", 0.0001, 0.0001, &mut rng);

        let due = sched.next_due().unwrap();
        let fired = sched.advance(due, &mut rng);
        assert_eq!(fired.len(), 1);
        assert!(sched.next_due().unwrap() > due);
    }

    #[test]
    fn cancel_matches_owner_and_action() {
        let mut sched = Scheduler::new();
        sched.defer_secs(t0(), 10.0, LivingId(1), "wander");
        sched.defer_secs(t0(), 10.0, LivingId(2), "wander");
        sched.defer_secs(t0(), 10.0, LivingId(1), "mutter");

        sched.cancel(LivingId(1), "wander");
        assert_eq!(sched.len(), 2);
        let remaining = sched.state();
        assert!(
            remaining
                .iter()
                .all(|d| !(d.owner == LivingId(1) && d.action == "wander"))
        );
    }

    #[test]
    fn cancel_owner_removes_every_action() {
        let mut sched = Scheduler::new();
        sched.defer_secs(t0(), 10.0, LivingId(1), "wander");
        sched.defer_secs(t0(), 20.0, LivingId(1), "mutter");
        sched.defer_secs(t0(), 10.0, LivingId(2), "wander");

        sched.cancel_owner(LivingId(1));
        assert_eq!(sched.len(), 1);
        assert_eq!(sched.state()[0].owner, LivingId(2));
    }

    #[test]
    fn state_restore_round_trip() {
        let mut sched = Scheduler::new();
        sched.defer_secs(t0(), 30.0, LivingId(1), "a");
        sched.defer_secs(t0(), 10.0, LivingId(2), "b");
        let saved = sched.state();

        let mut restored = Scheduler::new();
        restored.restore(saved);
        let fired = restored.advance(t0() + TimeDelta::seconds(60), &mut rng());
        let names: Vec<&str> = fired.iter().map(|d| d.action.as_str()).collect();
        assert_eq!(names, ["b", "a"]);
    }

    proptest! {
        #[test]
        fn advance_always_returns_due_order(delays in prop::collection::vec(0u32..3600, 1..50)) {
            let mut sched = Scheduler::new();
            for (i, delay) in delays.iter().enumerate() {
                sched.defer_secs(t0(), f64::from(*delay), LivingId(i as u32), "x");
            }
            let fired = sched.advance(t0() + TimeDelta::seconds(3600), &mut rng());
            prop_assert_eq!(fired.len(), delays.len());
            for pair in fired.windows(2) {
                prop_assert!(pair[0].due <= pair[1].due);
            }
        }
    }
}
