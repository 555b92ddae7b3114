//! Qualification - "more qualified than" ordering
//!
//! Every concept that can be ranked exposes a rank tuple. `a` is more
//! qualified than `b` iff `a.rank() > b.rank()`, which makes the relation
//! irreflexive, asymmetric and transitive. Equal ranks are a true tie and are
//! never broken by insertion order.

pub trait Qualifying {
    type Rank: Ord;

    fn rank(&self) -> Self::Rank;

    fn more_qualified_than(&self, other: &Self) -> bool {
        self.rank() > other.rank()
    }

    fn equally_qualified(&self, other: &Self) -> bool {
        self.rank() == other.rank()
    }
}

impl<T: Qualifying + ?Sized> Qualifying for &T {
    type Rank = T::Rank;

    fn rank(&self) -> Self::Rank {
        (**self).rank()
    }
}

/// Indices of the items no other item is more qualified than
pub fn top_tier<T: Qualifying>(items: &[T]) -> Vec<usize> {
    let ranks: Vec<T::Rank> = items.iter().map(Qualifying::rank).collect();
    let Some(best) = ranks.iter().max() else {
        return Vec::new();
    };
    ranks
        .iter()
        .enumerate()
        .filter(|(_, rank)| *rank == best)
        .map(|(index, _)| index)
        .collect()
}

/// Indices ordered by qualification, most qualified first
///
/// Ties keep their input order, so the result is stable for a given input.
pub fn by_qualification<T: Qualifying>(items: &[T]) -> Vec<usize> {
    let ranks: Vec<T::Rank> = items.iter().map(Qualifying::rank).collect();
    let mut order: Vec<usize> = (0..items.len()).collect();
    order.sort_by(|a, b| ranks[*b].cmp(&ranks[*a]));
    order
}
