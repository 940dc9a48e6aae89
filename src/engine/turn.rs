//! Turn sequencing for nomination rounds.
//!
//! The order is materialized once when a market session opens and stored
//! with the session; it is never recomputed mid-session, so the sequence
//! stays reproducible for audit. Members who leave the league are
//! filtered out, everyone else keeps their relative position.

use crate::engine::errors::AuctionError;
use rand::seq::SliceRandom;

/// Produce the initial nomination order.
///
/// With `shuffle` the member list is randomized once (random-once-then-
/// fixed); without it the given order is kept verbatim (admin-set order).
pub fn initial_order(mut member_ids: Vec<i64>, shuffle: bool) -> Vec<i64> {
    if shuffle {
        member_ids.shuffle(&mut rand::thread_rng());
    }
    member_ids
}

/// Index of the next member in the circular order.
pub fn advance(order_len: usize, current_index: usize) -> Result<usize, AuctionError> {
    if order_len == 0 {
        return Err(AuctionError::EmptyTurnOrder);
    }
    Ok((current_index + 1) % order_len)
}

/// Remove members that are no longer active, preserving relative order.
///
/// Returns the new index: clamped so it still points at a member, and
/// adjusted so removals before the cursor do not skip anyone's turn.
pub fn retain(
    order: &mut Vec<i64>,
    current_index: usize,
    is_active: impl Fn(i64) -> bool,
) -> Result<usize, AuctionError> {
    let removed_before = order
        .iter()
        .take(current_index)
        .filter(|id| !is_active(**id))
        .count();

    order.retain(|id| is_active(*id));

    if order.is_empty() {
        return Err(AuctionError::EmptyTurnOrder);
    }

    let shifted = current_index.saturating_sub(removed_before);
    Ok(shifted.min(order.len() - 1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_advance_wraps() {
        assert_eq!(advance(4, 0).unwrap(), 1);
        assert_eq!(advance(4, 3).unwrap(), 0);
    }

    #[test]
    fn test_advance_empty_order_is_fatal() {
        assert!(matches!(advance(0, 0), Err(AuctionError::EmptyTurnOrder)));
    }

    #[test]
    fn test_full_cycle_visits_everyone_once() {
        let order = initial_order(vec![10, 20, 30, 40, 50], false);
        let mut idx = 0;
        let mut visited = HashSet::new();
        for _ in 0..order.len() {
            assert!(visited.insert(order[idx]));
            idx = advance(order.len(), idx).unwrap();
        }
        assert_eq!(visited.len(), order.len());
        assert_eq!(idx, 0);
    }

    #[test]
    fn test_shuffle_preserves_membership() {
        let shuffled = initial_order(vec![1, 2, 3, 4, 5, 6], true);
        let set: HashSet<i64> = shuffled.iter().copied().collect();
        assert_eq!(set, HashSet::from([1, 2, 3, 4, 5, 6]));
    }

    #[test]
    fn test_retain_filters_and_keeps_order() {
        let mut order = vec![1, 2, 3, 4, 5];
        let idx = retain(&mut order, 3, |id| id != 2 && id != 5).unwrap();
        assert_eq!(order, vec![1, 3, 4]);
        // cursor was on member 4; one removal before it shifts it left
        assert_eq!(idx, 2);
        assert_eq!(order[idx], 4);
    }

    #[test]
    fn test_retain_clamps_when_tail_removed() {
        let mut order = vec![1, 2, 3];
        let idx = retain(&mut order, 2, |id| id != 3).unwrap();
        assert_eq!(order, vec![1, 2]);
        assert_eq!(idx, 1);
    }

    #[test]
    fn test_retain_all_gone_is_fatal() {
        let mut order = vec![7];
        assert!(matches!(
            retain(&mut order, 0, |_| false),
            Err(AuctionError::EmptyTurnOrder)
        ));
    }
}
