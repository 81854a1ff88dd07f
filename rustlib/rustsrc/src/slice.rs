/// A borrowed run of `len` values handed across the C boundary.
#[repr(C)]
pub struct FFISlice<T> {
    ptr: *const T,
    len: usize,
}

impl<T> FFISlice<T> {
    /// # Safety
    ///
    /// `ptr` must point to `len` initialised values that stay alive and unmoved
    /// for as long as the view is used. A null `ptr` is only allowed with `len == 0`.
    pub unsafe fn from_raw(ptr: *const T, len: usize) -> Self {
        Self { ptr, len }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn as_slice(&self) -> &[T] {
        if self.ptr.is_null() || self.len == 0 {
            return &[];
        }
        unsafe { std::slice::from_raw_parts(self.ptr, self.len) }
    }
}

/// Reinterprets a table of addresses as views of `width` values each.
///
/// # Safety
///
/// `table` must hold `entries` addresses, and every address must point to
/// `width` initialised values of `T`.
pub unsafe fn views_from_table<T>(table: *const usize, entries: usize, width: usize) -> Vec<FFISlice<T>> {
    let addresses = unsafe { FFISlice::from_raw(table, entries) };
    addresses
        .as_slice()
        .iter()
        .map(|&address| unsafe { FFISlice::from_raw(address as *const T, width) })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_pointer_is_empty() {
        let view = unsafe { FFISlice::<f64>::from_raw(std::ptr::null(), 0) };
        assert!(view.is_empty());
        assert_eq!(view.as_slice(), &[] as &[f64]);
    }

    #[test]
    fn test_views_from_table_follow_row_addresses() {
        let data = [0.0f64, 1.0, 2.0, 3.0, 4.0, 5.0];
        let base = data.as_ptr() as usize;
        let table = [base, base + 3 * std::mem::size_of::<f64>()];

        let rows = unsafe { views_from_table::<f64>(table.as_ptr(), table.len(), 3) };

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].as_slice(), &[0.0, 1.0, 2.0]);
        assert_eq!(rows[1].as_slice(), &[3.0, 4.0, 5.0]);
    }
}
