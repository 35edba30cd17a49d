use std::collections::HashSet;

/// Match outcome: index of the chosen training stack plus how many items it
/// carries beyond the query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StackMatch {
    pub user_index: usize,
    pub diff: usize,
}

/// Finds a previously trained user whose stack matches, or strictly
/// contains, the requested item set, so the latent vector can be reused
/// instead of recomputed.
///
/// The scan is linear over the stored stacks and its cost grows with the
/// training-set size; callers needing lower latency at scale should swap in
/// an inverted-index superset lookup with the same first-match semantics.
pub struct StackMatcher {
    stacks: Vec<HashSet<usize>>,
}

impl StackMatcher {
    pub fn new(stacks: Vec<HashSet<usize>>) -> Self {
        Self { stacks }
    }

    /// Scan the stacks in stored order. An exact match returns immediately
    /// (diff 0 is provably optimal); a strict superset is recorded only if
    /// its set-difference beats the best so far, so ties resolve to the
    /// first-encountered (lowest) index.
    pub fn find_closest(&self, query: &HashSet<usize>) -> Option<StackMatch> {
        if query.is_empty() {
            return None;
        }

        let mut best: Option<StackMatch> = None;
        for (user_index, stack) in self.stacks.iter().enumerate() {
            if stack == query {
                return Some(StackMatch {
                    user_index,
                    diff: 0,
                });
            }

            if query.is_subset(stack) {
                let diff = stack.len() - query.len();
                if best.map_or(true, |b| diff < b.diff) {
                    best = Some(StackMatch { user_index, diff });
                }
            }
        }

        best
    }

    pub fn len(&self) -> usize {
        self.stacks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stacks.is_empty()
    }
}
