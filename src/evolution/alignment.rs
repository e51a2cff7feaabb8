//! Two-pointer walk over two innovation-sorted gene sequences.
//!
//! Shared by crossover and by the compatibility distance so both see the
//! same matching/disjoint/excess classification.

use std::cmp::Ordering;

use crate::evolution::gene::ConnectionGene;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Side {
    First,
    Second,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum AlignedGene<'a> {
    /// Both sequences hold this innovation.
    Matching(&'a ConnectionGene, &'a ConnectionGene),
    /// Unmatched innovation inside the range covered by both sequences.
    Disjoint(Side, &'a ConnectionGene),
    /// Unmatched innovation past the end of the other sequence.
    Excess(Side, &'a ConnectionGene),
}

pub struct Alignment<'a> {
    first: &'a [ConnectionGene],
    second: &'a [ConnectionGene],
    i: usize,
    j: usize,
}

/// Aligns two gene sequences. Both must be sorted ascending by innovation.
pub fn align<'a>(first: &'a [ConnectionGene], second: &'a [ConnectionGene]) -> Alignment<'a> {
    debug_assert!(first.windows(2).all(|w| w[0].innovation() < w[1].innovation()));
    debug_assert!(second.windows(2).all(|w| w[0].innovation() < w[1].innovation()));

    Alignment {
        first,
        second,
        i: 0,
        j: 0,
    }
}

impl<'a> Iterator for Alignment<'a> {
    type Item = AlignedGene<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        match (self.first.get(self.i), self.second.get(self.j)) {
            (Some(a), Some(b)) => match a.innovation().cmp(&b.innovation()) {
                Ordering::Equal => {
                    self.i += 1;
                    self.j += 1;
                    Some(AlignedGene::Matching(a, b))
                }
                Ordering::Less => {
                    self.i += 1;
                    Some(AlignedGene::Disjoint(Side::First, a))
                }
                Ordering::Greater => {
                    self.j += 1;
                    Some(AlignedGene::Disjoint(Side::Second, b))
                }
            },
            (Some(a), None) => {
                self.i += 1;
                Some(AlignedGene::Excess(Side::First, a))
            }
            (None, Some(b)) => {
                self.j += 1;
                Some(AlignedGene::Excess(Side::Second, b))
            }
            (None, None) => None,
        }
    }
}
