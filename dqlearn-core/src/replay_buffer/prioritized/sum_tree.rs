//! Sum tree for prioritized sampling.
//!
//! Leaves hold `p_i^alpha` for every slot of the store; each internal node holds the
//! sum of its children, so the root is the normalizer of the sampling distribution.

#[derive(Debug)]
pub(super) struct SumTree {
    capacity: usize,
    tree: Vec<f64>,
}

impl SumTree {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            tree: vec![0f64; 2 * capacity - 1],
        }
    }

    pub fn total(&self) -> f64 {
        self.tree[0]
    }

    /// Value of the leaf of slot `ix`.
    pub fn leaf(&self, ix: usize) -> f64 {
        self.tree[ix + self.capacity - 1]
    }

    /// Sets the leaf of slot `ix` to `v` and recomputes its ancestors.
    pub fn update(&mut self, ix: usize, v: f64) {
        debug_assert!(ix < self.capacity);

        let mut node = ix + self.capacity - 1;
        self.tree[node] = v;
        while node != 0 {
            node = (node - 1) / 2;
            let left = 2 * node + 1;
            self.tree[node] = self.tree[left] + self.tree[left + 1];
        }
    }

    /// Returns the slot whose cumulative range contains `s`, for `0 <= s < total()`.
    pub fn get(&self, s: f64) -> usize {
        let mut node = 0;
        let mut s = s;

        loop {
            let left = 2 * node + 1;
            if left >= self.tree.len() {
                break;
            }
            if s < self.tree[left] || self.tree[left + 1] == 0.0 {
                node = left;
            } else {
                s -= self.tree[left];
                node = left + 1;
            }
        }

        node + 1 - self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::SumTree;

    #[test]
    fn test_sum_tree_odd() {
        let data = vec![0.5f64, 0.2, 0.8, 0.3, 1.1, 2.5, 3.9];
        let mut sum_tree = SumTree::new(8);
        for ix in 0..data.len() {
            sum_tree.update(ix, data[ix]);
        }

        assert!((sum_tree.total() - data.iter().sum::<f64>()).abs() < 1e-12);
        assert_eq!(sum_tree.get(0.0), 0);
        assert_eq!(sum_tree.get(0.4), 0);
        assert_eq!(sum_tree.get(0.6), 1);
        assert_eq!(sum_tree.get(1.2), 2);
        assert_eq!(sum_tree.get(1.6), 3);
        assert_eq!(sum_tree.get(2.0), 4);
        assert_eq!(sum_tree.get(2.8), 4);
        assert_eq!(sum_tree.get(9.2), 6);
    }

    #[test]
    fn test_sum_tree_update_keeps_total() {
        let mut sum_tree = SumTree::new(5);
        for ix in 0..5 {
            sum_tree.update(ix, 1.0);
        }
        sum_tree.update(3, 4.0);

        assert_eq!(sum_tree.total(), 8.0);
        assert_eq!(sum_tree.leaf(3), 4.0);
    }
}
