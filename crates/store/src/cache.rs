//! Append-only action log with a claim/commit cursor pair.

use brisca_core::Action;

/// All actions seen so far plus the `processing`/`processed` cursors.
///
/// Both cursors start at `-1` and only move forward. `processing` moves on claim,
/// `processed` on commit; while they differ exactly one action is in flight and no
/// further claim succeeds.
#[derive(Debug)]
pub struct ActionCache {
    log: Vec<Action>,
    processing: i64,
    processed: i64,
}

impl ActionCache {
    pub fn new() -> Self { Self { log: Vec::new(), processing: -1, processed: -1 } }

    pub fn len(&self) -> usize { self.log.len() }
    pub fn is_empty(&self) -> bool { self.log.is_empty() }
    pub fn processing(&self) -> i64 { self.processing }
    pub fn processed(&self) -> i64 { self.processed }
    pub fn in_flight(&self) -> bool { self.processing != self.processed }
    pub fn log(&self) -> &[Action] { &self.log }

    /// Nothing in flight and nothing left to claim.
    pub fn is_drained(&self) -> bool { !self.in_flight() && self.next_index() >= self.log.len() }

    /// The action currently claimed but not yet committed.
    pub fn claimed(&self) -> Option<&Action> {
        if self.in_flight() { self.log.get(self.processing as usize) } else { None }
    }

    /// Extend the tail. Duplicate filtering is the caller's concern.
    pub fn append<I: IntoIterator<Item = Action>>(&mut self, batch: I) { self.log.extend(batch); }

    /// Claim the next action if nothing is in flight and the log has grown.
    pub fn try_dispatch_next(&mut self) -> Option<&Action> {
        if self.in_flight() {
            return None;
        }
        let next = self.next_index();
        if next >= self.log.len() {
            return None;
        }
        self.processing += 1;
        self.log.get(next)
    }

    /// Mark the claimed action as applied. Returns `false` when nothing was in flight.
    pub fn commit(&mut self) -> bool {
        if !self.in_flight() {
            return false;
        }
        self.processed = self.processing;
        true
    }

    fn next_index(&self) -> usize { (self.processing + 1) as usize }
}

impl Default for ActionCache {
    fn default() -> Self { Self::new() }
}

#[cfg(test)]
mod tests {
    use super::*;
    use brisca_core::{CardDrawn, TurnWon};

    fn drawn(seat: i64) -> Action { Action::CardDrawn(CardDrawn { seat }) }

    #[test]
    fn starts_empty_with_cursors_before_the_log() {
        let mut cache = ActionCache::new();
        assert_eq!((cache.processing(), cache.processed()), (-1, -1));
        assert!(cache.is_drained());
        assert!(cache.try_dispatch_next().is_none());
        assert!(!cache.commit());
    }

    #[test]
    fn one_claim_at_a_time() {
        let mut cache = ActionCache::new();
        cache.append([drawn(0), drawn(1)]);

        assert_eq!(cache.try_dispatch_next(), Some(&drawn(0)));
        assert_eq!((cache.processing(), cache.processed()), (0, -1));
        assert!(cache.try_dispatch_next().is_none(), "second claim while in flight");
        assert_eq!(cache.claimed(), Some(&drawn(0)));

        assert!(cache.commit());
        assert_eq!((cache.processing(), cache.processed()), (0, 0));
        assert!(cache.claimed().is_none());

        assert_eq!(cache.try_dispatch_next(), Some(&drawn(1)));
        assert!(cache.commit());
        assert!(cache.is_drained());
        assert!(cache.try_dispatch_next().is_none());
    }

    #[test]
    fn growth_after_drain_resumes_dispatch() {
        let mut cache = ActionCache::new();
        cache.append([drawn(0)]);
        cache.try_dispatch_next();
        cache.commit();
        assert!(cache.try_dispatch_next().is_none());

        cache.append([Action::TurnWon(TurnWon { seat: 1 })]);
        assert!(!cache.is_drained());
        assert_eq!(cache.try_dispatch_next().map(Action::kind), Some(brisca_core::ActionKind::TurnWon));
        assert_eq!(cache.processing(), 1);
    }

    #[test]
    fn cursors_never_pass_the_tail() {
        let mut cache = ActionCache::new();
        for round in 0..5 {
            cache.append((0..round).map(drawn));
            while cache.try_dispatch_next().is_some() {
                assert!(cache.processed() <= cache.processing());
                assert!(cache.processing() <= cache.len() as i64 - 1);
                cache.commit();
            }
        }
        assert_eq!(cache.processed(), cache.len() as i64 - 1);
    }
}
