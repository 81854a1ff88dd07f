//! Owned, row-major numeric arrays that can be handed to native code.

use std::fmt;
use std::mem::size_of;

use crate::error::{MarshalError, Result};

/// Fixed-size element types the native exports understand.
pub trait Element: Copy + Default + PartialEq + fmt::Debug + 'static {
    /// Short type name, used when printing signatures and shapes.
    const DTYPE: &'static str;

    /// The value at position `index` of a `range` array, or `None` when the
    /// type cannot hold `index` exactly.
    fn from_index(index: usize) -> Option<Self>;
}

macro_rules! impl_int_element {
    ($($ty:ty => $name:literal),* $(,)?) => {
        $(
            impl Element for $ty {
                const DTYPE: &'static str = $name;

                fn from_index(index: usize) -> Option<Self> {
                    <$ty>::try_from(index).ok()
                }
            }
        )*
    };
}

// `$digits` is the mantissa width: every integer below 2^digits is exact.
macro_rules! impl_float_element {
    ($($ty:ty => $name:literal, $digits:expr),* $(,)?) => {
        $(
            impl Element for $ty {
                const DTYPE: &'static str = $name;

                fn from_index(index: usize) -> Option<Self> {
                    (u64::try_from(index).ok()? <= 1u64 << $digits).then(|| index as $ty)
                }
            }
        )*
    };
}

impl_int_element! {
    i32 => "i32",
    i64 => "i64",
    u8 => "u8",
}

impl_float_element! {
    f64 => "f64", f64::MANTISSA_DIGITS,
    f32 => "f32", f32::MANTISSA_DIGITS,
}

/// A contiguous block of elements with a shape and byte strides.
///
/// Every dimension is at least 1 and the buffer never reallocates after
/// construction, so addresses taken from it stay valid while it is borrowed.
#[derive(Debug, Clone, PartialEq)]
pub struct NumericArray<T: Element = f64> {
    data: Vec<T>,
    shape: Vec<usize>,
    strides: Vec<usize>,
}

fn element_count(shape: &[usize]) -> Option<usize> {
    if shape.is_empty() || shape.contains(&0) {
        return None;
    }
    shape.iter().try_fold(1usize, |acc, &dim| acc.checked_mul(dim))
}

fn row_major_strides(shape: &[usize], itemsize: usize) -> Vec<usize> {
    let mut strides = vec![itemsize; shape.len()];
    for dim in (0..shape.len().saturating_sub(1)).rev() {
        strides[dim] = strides[dim + 1] * shape[dim + 1];
    }
    strides
}

impl<T: Element> NumericArray<T> {
    pub fn from_vec(data: Vec<T>, shape: &[usize]) -> Result<Self> {
        match element_count(shape) {
            Some(count) if count == data.len() => Ok(Self {
                strides: row_major_strides(shape, size_of::<T>()),
                shape: shape.to_vec(),
                data,
            }),
            _ => Err(MarshalError::InvalidShape {
                shape: shape.to_vec(),
                len: data.len(),
            }),
        }
    }

    pub fn zeros(shape: &[usize]) -> Result<Self> {
        let count = element_count(shape).ok_or_else(|| MarshalError::InvalidShape {
            shape: shape.to_vec(),
            len: 0,
        })?;
        Self::from_vec(vec![T::default(); count], shape)
    }

    /// `0, 1, 2, ...` laid out over `shape`.
    ///
    /// Fails with [`MarshalError::InvalidShape`] when the last index does not
    /// fit `T` exactly.
    pub fn range(shape: &[usize]) -> Result<Self> {
        let invalid = |len| MarshalError::InvalidShape {
            shape: shape.to_vec(),
            len,
        };
        let count = element_count(shape).ok_or_else(|| invalid(0))?;
        let data = (0..count)
            .map(T::from_index)
            .collect::<Option<Vec<T>>>()
            .ok_or_else(|| invalid(count))?;
        Self::from_vec(data, shape)
    }

    /// A fresh zero-filled array of the same shape and element type.
    pub fn zeros_like(&self) -> Self {
        Self {
            data: vec![T::default(); self.data.len()],
            shape: self.shape.clone(),
            strides: self.strides.clone(),
        }
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    /// Byte offset to advance one index along each dimension.
    pub fn strides(&self) -> &[usize] {
        &self.strides
    }

    pub fn ndim(&self) -> usize {
        self.shape.len()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn itemsize(&self) -> usize {
        size_of::<T>()
    }

    pub fn dtype(&self) -> &'static str {
        T::DTYPE
    }

    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    pub fn as_ptr(&self) -> *const T {
        self.data.as_ptr()
    }

    pub fn as_mut_ptr(&mut self) -> *mut T {
        self.data.as_mut_ptr()
    }

    pub fn base_address(&self) -> usize {
        self.data.as_ptr() as usize
    }

    pub fn get(&self, index: &[usize]) -> Option<T> {
        if index.len() != self.ndim() {
            return None;
        }
        let mut offset = 0;
        for ((&i, &dim), &stride) in index.iter().zip(&self.shape).zip(&self.strides) {
            if i >= dim {
                return None;
            }
            offset += i * stride / self.itemsize();
        }
        self.data.get(offset).copied()
    }

    fn fmt_block(&self, f: &mut fmt::Formatter<'_>, dim: usize, offset: usize) -> fmt::Result {
        let step = self.strides[dim] / self.itemsize();
        write!(f, "[")?;
        if dim + 1 == self.ndim() {
            for i in 0..self.shape[dim] {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{:?}", self.data[offset + i * step])?;
            }
        } else {
            let gap = "\n".repeat(self.ndim() - dim - 1);
            for i in 0..self.shape[dim] {
                if i > 0 {
                    write!(f, ",{}{}", gap, " ".repeat(dim + 1))?;
                }
                self.fmt_block(f, dim + 1, offset + i * step)?;
            }
        }
        write!(f, "]")
    }
}

impl<T: Element> fmt::Display for NumericArray<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fmt_block(f, 0, 0)
    }
}

/// Allocates the destination buffer for a native call on `array`.
pub fn allocate_output_like<T: Element>(array: &NumericArray<T>) -> NumericArray<T> {
    array.zeros_like()
}

/// Formats a shape the way the demonstrations print it, e.g. `(4, 5)` or `(27,)`.
pub fn format_shape(shape: &[usize]) -> String {
    match shape {
        [single] => format!("({},)", single),
        _ => {
            let dims: Vec<String> = shape.iter().map(|d| d.to_string()).collect();
            format!("({})", dims.join(", "))
        }
    }
}
