//! Fixed-capacity ring storage shared by the replay stores.

/// Fixed-capacity storage overwriting its oldest entry once full.
///
/// Slots are allocated up front; `push` is O(1) and never grows the storage
/// past `capacity`.
#[derive(Debug, Clone)]
pub struct RingBuffer<T> {
    capacity: usize,

    /// Slot written by the next push.
    i: usize,

    slots: Vec<T>,
}

impl<T> RingBuffer<T> {
    /// Creates an empty ring holding at most `capacity` entries.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "capacity of a replay store must be positive");
        Self {
            capacity,
            i: 0,
            slots: Vec::with_capacity(capacity),
        }
    }

    /// Inserts an item and returns the slot it was written to.
    pub fn push(&mut self, item: T) -> usize {
        let ix = self.i;
        if self.slots.len() < self.capacity {
            self.slots.push(item);
        } else {
            self.slots[ix] = item;
        }
        self.i = (self.i + 1) % self.capacity;
        ix
    }

    /// The number of occupied slots.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Returns `true` if nothing has been pushed.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// The maximum number of entries.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// The slot written by the next push.
    pub fn cursor(&self) -> usize {
        self.i
    }

    /// Returns the entry in slot `ix`.
    ///
    /// # Panics
    ///
    /// Panics if the slot is not occupied.
    pub fn get(&self, ix: usize) -> &T {
        &self.slots[ix]
    }

    /// Iterates over occupied slots in slot order.
    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.slots.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::RingBuffer;

    #[test]
    fn test_ring_overwrites_oldest() {
        let mut ring = RingBuffer::new(3);
        let slots = (0..5).map(|i| ring.push(i)).collect::<Vec<_>>();

        assert_eq!(slots, vec![0, 1, 2, 0, 1]);
        assert_eq!(ring.len(), 3);
        assert_eq!(ring.cursor(), 2);
        assert_eq!(ring.iter().copied().collect::<Vec<_>>(), vec![3, 4, 2]);
    }
}
