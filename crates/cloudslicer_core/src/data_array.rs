//! # Fixed-Capacity Data Array
//!
//! Staging buffer for pushing 2D data (slices, vector fields) to a square
//! render surface. The capacity is the surface's pixel count and never
//! grows: writes that do not fit are rejected instead of reallocating.

use crate::error::{CloudError, CloudResult};

/// Array with a pre-declared maximum length.
#[derive(Clone, Debug, PartialEq)]
pub struct DataArray<T> {
    data: Vec<T>,
    capacity: usize,
}

impl<T: Clone + Default> DataArray<T> {
    /// Creates an empty array that can hold up to `capacity` elements.
    ///
    /// Storage for the full capacity is reserved up front.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            data: Vec::with_capacity(capacity),
            capacity,
        }
    }

    /// Overwrites the element at `index`. Returns false if out of range.
    pub fn set_element(&mut self, index: usize, value: T) -> bool {
        match self.data.get_mut(index) {
            Some(slot) => {
                *slot = value;
                true
            }
            None => false,
        }
    }

    /// Replaces the whole content.
    ///
    /// # Errors
    ///
    /// Returns `CapacityExceeded` if `values` is longer than the capacity.
    pub fn set_array(&mut self, values: Vec<T>) -> CloudResult<()> {
        if values.len() > self.capacity {
            return Err(CloudError::CapacityExceeded {
                capacity: self.capacity,
                requested: values.len(),
            });
        }
        self.data = values;
        Ok(())
    }

    /// Grows (with default values) or shrinks the content to `new_len`.
    ///
    /// # Errors
    ///
    /// Returns `CapacityExceeded` if `new_len` is larger than the capacity.
    pub fn resize(&mut self, new_len: usize) -> CloudResult<()> {
        if new_len > self.capacity {
            return Err(CloudError::CapacityExceeded {
                capacity: self.capacity,
                requested: new_len,
            });
        }
        self.data.resize(new_len, T::default());
        Ok(())
    }
}

impl<T> DataArray<T> {
    /// Number of stored elements.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns true if nothing is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Maximum number of elements.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns true if `index` addresses a stored element.
    #[must_use]
    pub fn is_valid_index(&self, index: usize) -> bool {
        index < self.data.len()
    }

    /// Element at `index`.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&T> {
        self.data.get(index)
    }

    /// Stored elements with their plain indices.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &T)> {
        self.data.iter().enumerate()
    }

    /// Stored elements as a slice.
    #[must_use]
    pub fn as_slice(&self) -> &[T] {
        &self.data
    }
}

/// Converts a plain index into `(column, row)` on a square surface of side
/// `texture_size`.
#[must_use]
pub const fn to_image_coord(plain_index: usize, texture_size: usize) -> (usize, usize) {
    if texture_size == 0 {
        return (0, 0);
    }
    (plain_index % texture_size, plain_index / texture_size)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_array_within_capacity() {
        let mut array = DataArray::new(4);
        array.set_array(vec![1.0f32, 2.0, 3.0]).unwrap();
        assert_eq!(array.len(), 3);
        assert_eq!(array.capacity(), 4);
        assert_eq!(array.get(1), Some(&2.0));
    }

    #[test]
    fn test_set_array_over_capacity_keeps_content() {
        let mut array = DataArray::new(2);
        array.set_array(vec![7u8]).unwrap();
        let err = array.set_array(vec![1, 2, 3]).unwrap_err();
        assert_eq!(err, CloudError::CapacityExceeded { capacity: 2, requested: 3 });
        assert_eq!(array.as_slice(), &[7]);
    }

    #[test]
    fn test_set_element_and_resize() {
        let mut array: DataArray<i32> = DataArray::new(3);
        assert!(!array.set_element(0, 5));

        array.resize(2).unwrap();
        assert!(array.set_element(1, 5));
        assert!(!array.is_valid_index(2));
        assert_eq!(array.as_slice(), &[0, 5]);

        assert!(array.resize(4).is_err());
        assert_eq!(array.len(), 2);
    }

    #[test]
    fn test_iter_yields_plain_indices() {
        let mut array = DataArray::new(3);
        array.set_array(vec!['a', 'b']).unwrap();
        let collected: Vec<_> = array.iter().collect();
        assert_eq!(collected, vec![(0, &'a'), (1, &'b')]);
    }

    #[test]
    fn test_to_image_coord() {
        assert_eq!(to_image_coord(0, 64), (0, 0));
        assert_eq!(to_image_coord(65, 64), (1, 1));
        assert_eq!(to_image_coord(130, 64), (2, 2));
        assert_eq!(to_image_coord(5, 0), (0, 0));
    }
}
