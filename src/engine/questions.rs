//! Pending-question bookkeeping for proxy correlation
//!
//! A proxy forwards a solicitation to the far interface and must
//! remember who asked, so the advertisement coming back can be sent to
//! the original requester instead of flooded.

use super::types::PendingQuestion;
use std::collections::VecDeque;
use std::net::Ipv6Addr;

/// Upper bound on remembered questions; once full, the oldest entry
/// is evicted to make room.
const MAX_PENDING: usize = 40;

/// Recently forwarded solicitations, oldest first
#[derive(Debug, Default)]
pub struct PendingQuestions {
    entries: VecDeque<PendingQuestion>,
}

impl PendingQuestions {
    pub fn new() -> Self {
        Self {
            entries: VecDeque::new(),
        }
    }

    /// Record a forwarded solicitation
    pub fn push(&mut self, question: PendingQuestion) {
        if self.entries.len() == MAX_PENDING {
            self.entries.pop_front();
        }
        self.entries.push_back(question);
    }

    /// Remove and return the oldest question asking about `target`.
    /// Entries that do not match keep their relative order.
    pub fn take(&mut self, target: &Ipv6Addr) -> Option<PendingQuestion> {
        let index = self
            .entries
            .iter()
            .position(|q| q.target_addr == *target)?;
        self.entries.remove(index)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn question(target: &str, asked_by: &str) -> PendingQuestion {
        PendingQuestion {
            target_addr: target.parse().unwrap(),
            asked_by: asked_by.parse().unwrap(),
        }
    }

    #[test]
    fn test_push_take_roundtrip() {
        let mut pending = PendingQuestions::new();
        assert!(pending.is_empty());

        pending.push(question("2001:db8::1", "fe80::aa"));
        assert_eq!(pending.len(), 1);

        let taken = pending.take(&"2001:db8::1".parse().unwrap()).unwrap();
        assert_eq!(taken.asked_by, "fe80::aa".parse::<Ipv6Addr>().unwrap());
        assert!(pending.is_empty());
    }

    #[test]
    fn test_take_is_one_shot() {
        let mut pending = PendingQuestions::new();
        pending.push(question("2001:db8::1", "fe80::aa"));

        let target: Ipv6Addr = "2001:db8::1".parse().unwrap();
        assert!(pending.take(&target).is_some());
        assert!(pending.take(&target).is_none());
    }

    #[test]
    fn test_take_unknown_target() {
        let mut pending = PendingQuestions::new();
        pending.push(question("2001:db8::1", "fe80::aa"));

        assert!(pending.take(&"2001:db8::2".parse().unwrap()).is_none());
        assert_eq!(pending.len(), 1);
    }

    #[test]
    fn test_take_oldest_match_first() {
        let mut pending = PendingQuestions::new();
        pending.push(question("2001:db8::1", "fe80::aa"));
        pending.push(question("2001:db8::1", "fe80::bb"));

        let target: Ipv6Addr = "2001:db8::1".parse().unwrap();
        assert_eq!(
            pending.take(&target).unwrap().asked_by,
            "fe80::aa".parse::<Ipv6Addr>().unwrap()
        );
        assert_eq!(
            pending.take(&target).unwrap().asked_by,
            "fe80::bb".parse::<Ipv6Addr>().unwrap()
        );
    }

    #[test]
    fn test_take_preserves_relative_order() {
        let mut pending = PendingQuestions::new();
        pending.push(question("2001:db8::1", "fe80::aa"));
        pending.push(question("2001:db8::2", "fe80::bb"));
        pending.push(question("2001:db8::3", "fe80::cc"));

        assert!(pending.take(&"2001:db8::2".parse().unwrap()).is_some());

        assert_eq!(
            pending
                .take(&"2001:db8::1".parse().unwrap())
                .unwrap()
                .asked_by,
            "fe80::aa".parse::<Ipv6Addr>().unwrap()
        );
        assert_eq!(
            pending
                .take(&"2001:db8::3".parse().unwrap())
                .unwrap()
                .asked_by,
            "fe80::cc".parse::<Ipv6Addr>().unwrap()
        );
    }

    #[test]
    fn test_evicts_oldest_when_full() {
        let mut pending = PendingQuestions::new();
        for i in 0..=MAX_PENDING {
            pending.push(question(&format!("2001:db8::{:x}", i + 1), "fe80::aa"));
        }

        assert_eq!(pending.len(), MAX_PENDING);
        // The first entry was evicted, the second is still there.
        assert!(pending.take(&"2001:db8::1".parse().unwrap()).is_none());
        assert!(pending.take(&"2001:db8::2".parse().unwrap()).is_some());
        assert!(
            pending
                .take(&format!("2001:db8::{:x}", MAX_PENDING + 1).parse().unwrap())
                .is_some()
        );
    }
}
