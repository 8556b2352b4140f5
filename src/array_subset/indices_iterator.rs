use std::iter::FusedIterator;

use crate::{
    array::{unravel_index, ArrayIndices},
    array_subset::ArraySubset,
};

/// Iterates over element indices in an array subset, in C order.
#[derive(Clone, Debug)]
pub struct IndicesIterator {
    subset: ArraySubset,
    index: u64,
    num_elements: u64,
}

impl IndicesIterator {
    /// Create a new indices iterator.
    #[must_use]
    pub fn new(subset: ArraySubset) -> Self {
        let num_elements = subset.num_elements();
        Self {
            subset,
            index: 0,
            num_elements,
        }
    }
}

impl Iterator for IndicesIterator {
    type Item = ArrayIndices;

    fn next(&mut self) -> Option<Self::Item> {
        if self.index >= self.num_elements {
            return None;
        }
        let mut indices = unravel_index(self.index, self.subset.shape());
        for (index, start) in std::iter::zip(&mut indices, self.subset.start()) {
            *index += start;
        }
        self.index += 1;
        Some(indices)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = usize::try_from(self.num_elements - self.index).unwrap_or(usize::MAX);
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for IndicesIterator {}

impl FusedIterator for IndicesIterator {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn indices_iterator() {
        let subset = ArraySubset::new_with_ranges(&[1..3, 5..7]);
        let indices: Vec<_> = subset.iter_indices().collect();
        assert_eq!(
            indices,
            vec![vec![1, 5], vec![1, 6], vec![2, 5], vec![2, 6]]
        );
        assert_eq!(subset.iter_indices().len(), 4);
    }

    #[test]
    fn indices_iterator_empty_and_scalar() {
        let empty = ArraySubset::new_with_ranges(&[1..1, 0..4]);
        assert_eq!(empty.iter_indices().count(), 0);

        let scalar = ArraySubset::new_with_shape(vec![]);
        assert_eq!(scalar.iter_indices().collect::<Vec<_>>(), vec![Vec::<u64>::new()]);
    }
}
