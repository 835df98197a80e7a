/// A map from dense `usize` keys (e.g. arena indexes) to values.
///
/// Values are stored in a `Vec` sized to the largest key seen so far, which makes get and put
/// constant time.
pub(crate) struct IndexMap<T> {
    data: Vec<Option<T>>,
}

impl<T: Clone> IndexMap<T> {
    pub fn new(max_index: usize) -> Self {
        Self {
            data: vec![None; max_index + 1],
        }
    }

    pub fn get(&self, index: usize) -> Option<T> {
        self.data.get(index).cloned().flatten()
    }

    pub fn put(&mut self, index: usize, value: T) {
        if self.data.len() <= index {
            self.data.resize(index + 1, None);
        }
        self.data[index] = Some(value);
    }

    /// Returns the value for `index`, first storing the result of `f` if there is none.
    pub fn get_or_insert_with<F: FnOnce() -> T>(&mut self, index: usize, f: F) -> T {
        match self.get(index) {
            Some(value) => value,
            None => {
                let value = f();
                self.put(index, value.clone());
                value
            }
        }
    }
}

#[cfg(test)]
pub mod tests {
    use crate::util::index_map::IndexMap;

    #[test]
    fn test_new_empty() {
        let imap = IndexMap::<usize>::new(12);
        assert_eq!(imap.get(0), None);
        assert_eq!(imap.get(12), None);
        assert_eq!(imap.get(100), None);
    }

    #[test]
    fn test_put_grows() {
        let mut imap = IndexMap::<usize>::new(4);
        imap.put(1, 2);
        imap.put(10, 4);
        assert_eq!(imap.get(1), Some(2));
        assert_eq!(imap.get(10), Some(4));
        assert_eq!(imap.get(5), None);
        imap.put(10, 5);
        assert_eq!(imap.get(10), Some(5));
    }

    #[test]
    fn test_get_or_insert_with() {
        let mut imap = IndexMap::<usize>::new(4);
        let mut calls = 0;
        let mut insert = |imap: &mut IndexMap<usize>, index: usize| {
            imap.get_or_insert_with(index, || {
                calls += 1;
                calls * 10
            })
        };
        assert_eq!(insert(&mut imap, 3), 10);
        assert_eq!(insert(&mut imap, 3), 10);
        assert_eq!(insert(&mut imap, 0), 20);
        assert_eq!(insert(&mut imap, 9), 30);
        assert_eq!(imap.get(0), Some(20));
    }
}
