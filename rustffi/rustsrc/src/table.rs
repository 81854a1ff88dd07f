//! Address tables built over a borrowed array.
//!
//! A table holds plain machine addresses computed as `base + index * stride`.
//! It borrows the array it was built from, so the array can be neither freed
//! nor reallocated while the table exists.

use std::marker::PhantomData;

use crate::array::{Element, NumericArray};
use crate::error::{MarshalError, Result};

/// How the entries of a table step through the array's storage.
///
/// The two schemes are not interchangeable on the receiving side: a native
/// function indexing rows through `RowPointers` reads garbage when handed a
/// `FlatLinear` table and vice versa.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Addressing {
    /// One entry per index of dimension 0, spaced by `strides[0]`.
    RowPointers,
    /// One entry per element, spaced by the element size.
    FlatLinear,
}

#[derive(Debug)]
pub struct PointerTable<'a> {
    addresses: Vec<usize>,
    addressing: Addressing,
    stride: usize,
    _source: PhantomData<&'a ()>,
}

impl<'a> PointerTable<'a> {
    fn build(base: usize, count: usize, stride: usize, addressing: Addressing) -> Self {
        Self {
            addresses: (0..count).map(|i| base + i * stride).collect(),
            addressing,
            stride,
            _source: PhantomData,
        }
    }

    pub fn rows<T: Element>(array: &'a NumericArray<T>) -> Result<Self> {
        let (count, stride) = row_layout(array)?;
        Ok(Self::build(array.base_address(), count, stride, Addressing::RowPointers))
    }

    /// Row table over an output buffer the native side may write through.
    pub fn rows_mut<T: Element>(array: &'a mut NumericArray<T>) -> Result<Self> {
        let (count, stride) = row_layout(array)?;
        let base = array.as_mut_ptr() as usize;
        Ok(Self::build(base, count, stride, Addressing::RowPointers))
    }

    pub fn flat<T: Element>(array: &'a NumericArray<T>) -> Self {
        Self::build(array.base_address(), array.len(), array.itemsize(), Addressing::FlatLinear)
    }

    pub fn flat_mut<T: Element>(array: &'a mut NumericArray<T>) -> Self {
        let (count, stride) = (array.len(), array.itemsize());
        let base = array.as_mut_ptr() as usize;
        Self::build(base, count, stride, Addressing::FlatLinear)
    }

    pub fn addresses(&self) -> &[usize] {
        &self.addresses
    }

    pub fn addressing(&self) -> Addressing {
        self.addressing
    }

    /// Bytes between consecutive entries.
    pub fn stride(&self) -> usize {
        self.stride
    }

    pub fn len(&self) -> usize {
        self.addresses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.addresses.is_empty()
    }

    pub fn as_ptr(&self) -> *const usize {
        self.addresses.as_ptr()
    }
}

fn row_layout<T: Element>(array: &NumericArray<T>) -> Result<(usize, usize)> {
    if array.ndim() < 2 {
        return Err(MarshalError::Rank {
            expected: "at least 2".to_string(),
            found: array.ndim(),
        });
    }
    Ok((array.shape()[0], array.strides()[0]))
}

/// One address per row: entry `i` is `base + i * strides[0]`.
pub fn build_row_pointer_table<T: Element>(array: &NumericArray<T>) -> Result<PointerTable<'_>> {
    PointerTable::rows(array)
}

/// One address per element, spaced by the element size.
pub fn build_flat_address_table<T: Element>(array: &NumericArray<T>) -> PointerTable<'_> {
    PointerTable::flat(array)
}
