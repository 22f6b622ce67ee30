//! Subset enumeration for the clue and cardinality encodings.

use itertools::Itertools;

/// `C(n, k)`, saturating at `u64::MAX`. Zero when `k > n`.
pub fn binomial(n: usize, k: usize) -> u64 {
    if k > n {
        return 0;
    }
    let k = k.min(n - k);
    let mut acc: u128 = 1;
    for i in 0..k {
        // Exact at every step: acc is C(n, i) before the update.
        acc = acc * (n - i) as u128 / (i + 1) as u128;
        if acc > u64::MAX as u128 {
            return u64::MAX;
        }
    }
    acc as u64
}

/// Every `choose`-element subset of `items`, in lexicographic index order.
///
/// `choose == 0` yields the single empty subset and `choose > items.len()`
/// yields nothing.
pub fn subsets<T: Clone>(items: &[T], choose: usize) -> impl Iterator<Item = Vec<T>> + '_ {
    items.iter().cloned().combinations(choose)
}

/// Every way of marking exactly `marked` of `n` positions, as a mask.
pub fn masks(n: usize, marked: usize) -> impl Iterator<Item = Vec<bool>> {
    (0..n).combinations(marked).map(move |positions| {
        let mut mask = vec![false; n];
        for position in positions {
            mask[position] = true;
        }
        mask
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_binomial_small_values() {
        assert_eq!(binomial(0, 0), 1);
        assert_eq!(binomial(8, 0), 1);
        assert_eq!(binomial(8, 3), 56);
        assert_eq!(binomial(8, 8), 1);
        assert_eq!(binomial(3, 4), 0);
        assert_eq!(binomial(40, 20), 137_846_528_820);
    }

    #[test]
    fn test_binomial_saturates() {
        assert_eq!(binomial(200, 100), u64::MAX);
    }

    #[test]
    fn test_subset_edges() {
        let items = [1, 2, 3];
        assert_eq!(subsets(&items, 0).collect::<Vec<_>>(), vec![Vec::<i32>::new()]);
        assert_eq!(subsets(&items, 4).count(), 0);
        assert_eq!(subsets(&items, 2).count(), 3);
    }

    #[test]
    fn test_masks_are_distinct_and_weighted() {
        for n in 0..=8 {
            for k in 0..=n {
                let all: Vec<Vec<bool>> = masks(n, k).collect();
                assert_eq!(all.len() as u64, binomial(n, k));
                assert!(all.iter().all(|m| m.iter().filter(|&&b| b).count() == k));
                let unique: HashSet<_> = all.iter().collect();
                assert_eq!(unique.len(), all.len());
            }
        }
    }
}
