use std::iter::FromIterator;

/// A set backed by a vector, keeping insertion order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VecSet<T> {
    elements: Vec<T>,
}

impl<T> Default for VecSet<T> {
    fn default() -> Self {
        Self {
            elements: Vec::new(),
        }
    }
}

impl<T> VecSet<T> {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            elements: Vec::with_capacity(capacity),
        }
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn iter(&self) -> impl ExactSizeIterator<Item = &T> {
        self.elements.iter()
    }

    pub fn into_vec(self) -> Vec<T> {
        self.elements
    }

    pub fn as_slice(&self) -> &[T] {
        &self.elements
    }
}

impl<T: PartialEq> VecSet<T> {
    /// Returns true iff the value was already in the set.
    pub fn insert(&mut self, value: T) -> bool {
        if self.elements.contains(&value) {
            true
        } else {
            self.elements.push(value);

            false
        }
    }

    pub fn contains(&self, value: &T) -> bool {
        self.elements.contains(value)
    }

    /// Removes the value, keeping the order of the remaining elements.
    /// Returns whether the value was present.
    pub fn remove(&mut self, value: &T) -> bool {
        match self.elements.iter().position(|x| x == value) {
            None => false,
            Some(index) => {
                self.elements.remove(index);

                true
            }
        }
    }
}

impl<T: PartialEq> Extend<T> for VecSet<T> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for value in iter {
            self.insert(value);
        }
    }
}

impl<T: PartialEq> FromIterator<T> for VecSet<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut set = VecSet::default();
        set.extend(iter);
        set
    }
}

impl<T> IntoIterator for VecSet<T> {
    type Item = T;

    type IntoIter = std::vec::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.elements.into_iter()
    }
}

impl<'a, T> IntoIterator for &'a VecSet<T> {
    type Item = &'a T;

    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.elements.iter()
    }
}
