// element storage part of a channel.

/// Fixed-capacity stack of `T`
///
/// Push and pop act on the same end, so retrieval order among buffered elements is the
/// reverse of insertion order. The backing storage is allocated once at construction and
/// never grows.
pub(crate) struct BoundedStack<T> {
    elems: Vec<T>,
    capacity: usize,
}

impl<T> BoundedStack<T> {
    /// Construct empty, with all storage pre-allocated
    pub(crate) fn new(capacity: usize) -> Self {
        BoundedStack { elems: Vec::with_capacity(capacity), capacity }
    }

    /// Maximum number of elements
    pub(crate) fn capacity(&self) -> usize {
        self.capacity
    }

    /// Elements in stack
    pub(crate) fn len(&self) -> usize {
        self.elems.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.elems.is_empty()
    }

    pub(crate) fn is_full(&self) -> bool {
        self.elems.len() == self.capacity
    }

    /// Push onto the top. The caller must have checked `is_full`.
    pub(crate) fn push(&mut self, elem: T) {
        debug_assert!(self.elems.len() < self.capacity);
        self.elems.push(elem);
    }

    /// Pop the most recently pushed element
    pub(crate) fn pop(&mut self) -> Option<T> {
        self.elems.pop()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::prelude::*;
    use rand_pcg::Pcg32;

    fn new_rng() -> impl Rng {
        Pcg32::from_seed(0xfeedfacefeedfacefeedfacefeedfaceu128.to_le_bytes())
    }

    #[test]
    fn push_pop_is_lifo() {
        let mut stack = BoundedStack::new(4);
        stack.push('a');
        stack.push('b');
        stack.push('c');
        assert_eq!(stack.pop(), Some('c'));
        stack.push('d');
        assert_eq!(stack.pop(), Some('d'));
        assert_eq!(stack.pop(), Some('b'));
        assert_eq!(stack.pop(), Some('a'));
        assert_eq!(stack.pop(), None);
    }

    #[test]
    fn saturates_at_capacity() {
        let mut stack = BoundedStack::new(3);
        assert!(stack.is_empty());
        assert!(!stack.is_full());
        for i in 0..3 {
            stack.push(i);
        }
        assert!(stack.is_full());
        assert_eq!(stack.len(), 3);
        assert_eq!(stack.capacity(), 3);
        stack.pop().unwrap();
        assert!(!stack.is_full());
        assert_eq!(stack.len(), 2);
    }

    #[test]
    fn equivalence_with_vec_model() {
        let mut rng = new_rng();

        for _ in 0..100 {
            let capacity = rng.gen_range(1..=64);
            let mut stack = BoundedStack::<u32>::new(capacity);
            let mut model = Vec::<u32>::new();
            for _ in 0..10_000 {
                if rng.gen_ratio(52, 100) {
                    if model.len() < capacity {
                        let elem = rng.gen::<u32>();
                        model.push(elem);
                        stack.push(elem);
                    } else {
                        assert!(stack.is_full());
                    }
                } else {
                    assert_eq!(stack.pop(), model.pop());
                }
                // assert equivalent
                assert_eq!(stack.len(), model.len());
                assert_eq!(stack.is_empty(), model.is_empty());
                assert_eq!(stack.is_full(), model.len() == capacity);
            }
        }
    }
}
