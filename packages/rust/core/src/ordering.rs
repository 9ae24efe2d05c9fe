//! Top-level section ordering.
//!
//! Sections whose stage pins a fixed index are placed at that index among the
//! sections that will actually render; every other section fills the
//! remaining slots in creation order.
//!
//! Placement of fixed sections, sorted by requested index (ties keep
//! creation order):
//! 1. `placed = max(requested, previous placed + 1)` resolves collisions by
//!    moving later claimants down.
//! 2. `placed = min(placed, N - k + i)` pulls indices past the end back in
//!    while keeping the fixed sections in order (`N` rendered sections, `k`
//!    fixed, `i` the position among fixed ones).
//!
//! Any section not placed at its requested index is reported as an
//! [`OrderingConflict`]. Conflicts are warnings; ordering never fails.

use std::fmt;

use tracing::warn;

use crate::node::ContentNode;
use crate::stages::StageSet;

/// Why a fixed section did not land on its requested index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictReason {
    /// Another fixed section claimed the same or an earlier overlapping slot.
    Collision,
    /// The requested index is past the last rendered section.
    OutOfRange,
}

/// A fixed section that was displaced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderingConflict {
    pub key: String,
    pub requested: usize,
    pub placed: usize,
    pub reason: ConflictReason,
}

impl fmt::Display for OrderingConflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let why = match self.reason {
            ConflictReason::Collision => "collides with another fixed section",
            ConflictReason::OutOfRange => "is past the last section",
        };
        write!(
            f,
            "fixed section `{}` requested position {} which {why}; placed at {}",
            self.key, self.requested, self.placed
        )
    }
}

/// Final top-level order plus any conflicts found on the way.
#[derive(Debug, Default)]
pub struct SectionOrder<'a> {
    pub sections: Vec<&'a ContentNode>,
    pub conflicts: Vec<OrderingConflict>,
}

/// Order the top-level `nodes` (given in creation order) for rendering.
/// Nodes without content are dropped.
pub fn order_sections<'a, I>(stages: &StageSet, nodes: I) -> SectionOrder<'a>
where
    I: IntoIterator<Item = &'a ContentNode>,
{
    let mut fixed: Vec<(usize, &'a ContentNode)> = Vec::new();
    let mut flexible: Vec<&'a ContentNode> = Vec::new();

    for node in nodes.into_iter().filter(|n| n.has_content()) {
        match node.stage().and_then(|id| stages.fixed_order(id)) {
            Some(index) => fixed.push((index, node)),
            None => flexible.push(node),
        }
    }

    // Stable: equal indices keep creation order.
    fixed.sort_by_key(|(index, _)| *index);

    let total = fixed.len() + flexible.len();
    let mut slots: Vec<Option<&'a ContentNode>> = vec![None; total];
    let mut conflicts = Vec::new();
    let mut previous: Option<usize> = None;

    for (i, (requested, node)) in fixed.iter().enumerate() {
        let earliest = previous.map_or(0, |p| p + 1);
        let latest = total - fixed.len() + i;
        let placed = (*requested).max(earliest).min(latest);

        if placed != *requested {
            let conflict = OrderingConflict {
                key: node.key().to_string(),
                requested: *requested,
                placed,
                reason: if *requested >= total {
                    ConflictReason::OutOfRange
                } else {
                    ConflictReason::Collision
                },
            };
            warn!(%conflict, "fixed section displaced");
            conflicts.push(conflict);
        }

        slots[placed] = Some(*node);
        previous = Some(placed);
    }

    let mut rest = flexible.into_iter();
    let sections = slots
        .into_iter()
        .filter_map(|slot| slot.or_else(|| rest.next()))
        .collect();

    SectionOrder {
        sections,
        conflicts,
    }
}
