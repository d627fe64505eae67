use rand::Rng;
use rand::seq::SliceRandom;

/// Playback order as a permutation of item indices `0..len`.
///
/// Positions in the order are "order space"; the values are indices into
/// the item list ("item space"). Surfaces only ever see item space.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DisplayOrder {
    indices: Vec<usize>,
}

impl DisplayOrder {
    /// Identity order `[0, 1, ..., item_count - 1]`.
    pub fn identity(item_count: usize) -> Self {
        Self {
            indices: (0..item_count).collect(),
        }
    }

    /// Uniformly random permutation of `0..item_count` (Fisher-Yates).
    pub fn shuffled<R>(item_count: usize, rng: &mut R) -> Self
    where
        R: Rng + ?Sized,
    {
        let mut order = Self::identity(item_count);
        order.indices.shuffle(rng);
        order
    }

    /// Generates the order for `item_count` items.
    ///
    /// # Example
    /// ```
    /// use engine::DisplayOrder;
    /// use rand::SeedableRng;
    /// use rand::rngs::SmallRng;
    ///
    /// let mut rng = SmallRng::seed_from_u64(7);
    /// let order = DisplayOrder::generate(4, false, &mut rng);
    /// assert_eq!(order.as_slice(), &[0, 1, 2, 3]);
    /// ```
    pub fn generate<R>(item_count: usize, shuffle: bool, rng: &mut R) -> Self
    where
        R: Rng + ?Sized,
    {
        if shuffle {
            Self::shuffled(item_count, rng)
        } else {
            Self::identity(item_count)
        }
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Item index stored at order position `position`.
    pub fn item_at(&self, position: usize) -> Option<usize> {
        self.indices.get(position).copied()
    }

    /// Order position holding `item_index`.
    pub fn position_of(&self, item_index: usize) -> Option<usize> {
        self.indices.iter().position(|&index| index == item_index)
    }

    pub fn as_slice(&self) -> &[usize] {
        &self.indices
    }

    /// Returns true when every index `0..len` appears exactly once.
    pub fn is_permutation(&self) -> bool {
        let mut seen = vec![false; self.indices.len()];
        for &index in &self.indices {
            match seen.get_mut(index) {
                Some(slot) if !*slot => *slot = true,
                _ => return false,
            }
        }
        true
    }
}
