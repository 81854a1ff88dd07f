//! Bindings to the native exports and the four marshalling operations.

use std::sync::Arc;

use tracing::{debug, info};

use crate::array::{allocate_output_like, NumericArray};
use crate::config::HarnessConfig;
use crate::error::{MarshalError, Result};
use crate::library::{load_shared, NativeLibrary};
use crate::signature::{
    Array2dFn, Array3dFn, FlatArrayFn, ForeignSignature, HelloFn, LibraryKind, ARRAY_2D, ARRAY_3D,
    FLAT_ARRAY, HELLO,
};
use crate::table::{build_flat_address_table, build_row_pointer_table, Addressing, PointerTable};

/// `test_func` resolved from the hello library.
pub struct HelloBinding {
    test_func: HelloFn,
    _library: Option<Arc<NativeLibrary>>,
}

impl HelloBinding {
    pub fn load(config: &HarnessConfig) -> Result<Self> {
        Self::from_library(load_shared(&config.library_path(LibraryKind::Hello))?)
    }

    pub fn from_library(library: Arc<NativeLibrary>) -> Result<Self> {
        let test_func = unsafe { library.get_function::<HelloFn>(HELLO.name)? };
        Ok(Self {
            test_func,
            _library: Some(library),
        })
    }

    /// # Safety
    ///
    /// `test_func` must be callable with no arguments for as long as the
    /// binding exists.
    pub unsafe fn from_raw(test_func: HelloFn) -> Self {
        Self {
            test_func,
            _library: None,
        }
    }
}

/// The array exports, all resolved up front so a missing symbol fails before
/// any array is built.
pub struct ArrayBindings {
    flat: FlatArrayFn,
    array_2d: Array2dFn,
    array_3d: Array3dFn,
    _library: Option<Arc<NativeLibrary>>,
}

impl ArrayBindings {
    pub fn load(config: &HarnessConfig) -> Result<Self> {
        Self::from_library(load_shared(&config.library_path(LibraryKind::Array))?)
    }

    pub fn from_library(library: Arc<NativeLibrary>) -> Result<Self> {
        let (flat, array_2d, array_3d) = unsafe {
            (
                library.get_function::<FlatArrayFn>(FLAT_ARRAY.name)?,
                library.get_function::<Array2dFn>(ARRAY_2D.name)?,
                library.get_function::<Array3dFn>(ARRAY_3D.name)?,
            )
        };
        Ok(Self {
            flat,
            array_2d,
            array_3d,
            _library: Some(library),
        })
    }

    /// # Safety
    ///
    /// Each function must have exactly the declared C signature and must only
    /// read/write through the pointers it is given.
    pub unsafe fn from_raw(flat: FlatArrayFn, array_2d: Array2dFn, array_3d: Array3dFn) -> Self {
        Self {
            flat,
            array_2d,
            array_3d,
            _library: None,
        }
    }

    /// The resolved `test_3darr_func`. [`process_3d`] prepares its arguments
    /// but never calls it.
    pub fn array_3d(&self) -> Array3dFn {
        self.array_3d
    }
}

/// Result of a table-based call.
#[derive(Debug)]
pub struct Processed {
    pub output: NumericArray<f64>,
    pub input_table: Vec<usize>,
    pub output_table: Vec<usize>,
    pub addressing: Addressing,
    pub invoked: bool,
}

/// Each trailing size parameter of `sig` carries one dimension of the array.
fn expect_rank(array: &NumericArray<f64>, sig: &ForeignSignature) -> Result<()> {
    let rank = sig.size_params();
    if array.ndim() != rank {
        return Err(MarshalError::Rank {
            expected: rank.to_string(),
            found: array.ndim(),
        });
    }
    Ok(())
}

pub fn say_hello(binding: &HelloBinding) {
    info!(symbol = HELLO.name, "invoking");
    unsafe { (binding.test_func)() };
}

/// Hands a rank-2 array to `test_arr_func` as one flat pointer plus its row
/// and column counts.
pub fn pass_flat(bindings: &ArrayBindings, array: &NumericArray<f64>) -> Result<()> {
    expect_rank(array, &FLAT_ARRAY)?;
    let (rows, cols) = (array.shape()[0], array.shape()[1]);

    info!(symbol = FLAT_ARRAY.name, rows, cols, "invoking");
    unsafe { (bindings.flat)(array.as_ptr(), rows, cols) };
    Ok(())
}

/// Calls `test_2darr_func` with row-pointer tables over `x` and a fresh
/// zero-filled output of the same shape.
pub fn process_2d(bindings: &ArrayBindings, x: &NumericArray<f64>) -> Result<Processed> {
    expect_rank(x, &ARRAY_2D)?;
    let (rows, cols) = (x.shape()[0], x.shape()[1]);
    let mut y = allocate_output_like(x);

    let (input_table, output_table) = {
        let xpp = build_row_pointer_table(x)?;
        let ypp = PointerTable::rows_mut(&mut y)?;
        debug!(rows = xpp.len(), stride = xpp.stride(), "built row tables");

        info!(symbol = ARRAY_2D.name, rows, cols, "invoking");
        unsafe { (bindings.array_2d)(xpp.as_ptr(), ypp.as_ptr(), rows, cols) };
        (xpp.addresses().to_vec(), ypp.addresses().to_vec())
    };

    Ok(Processed {
        output: y,
        input_table,
        output_table,
        addressing: Addressing::RowPointers,
        invoked: true,
    })
}

/// Prepares a `test_3darr_func` call with flat per-element address tables.
///
/// The call itself is not made: whether the export reads flat addresses or a
/// two-level row table is unresolved, so the output stays zero.
pub fn process_3d(bindings: &ArrayBindings, x: &NumericArray<f64>) -> Result<Processed> {
    expect_rank(x, &ARRAY_3D)?;
    let mut y = allocate_output_like(x);

    let xpp = build_flat_address_table(x);
    let ypp = PointerTable::flat_mut(&mut y);
    debug!(
        entries = xpp.len(),
        stride = xpp.stride(),
        symbol = ARRAY_3D.name,
        address = bindings.array_3d() as usize,
        "built flat tables, call disabled"
    );

    let input_table = xpp.addresses().to_vec();
    let output_table = ypp.addresses().to_vec();
    Ok(Processed {
        output: y,
        input_table,
        output_table,
        addressing: Addressing::FlatLinear,
        invoked: false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    static HELLO_CALLS: AtomicUsize = AtomicUsize::new(0);
    static FLAT_ARGS: Mutex<Vec<(usize, usize, usize)>> = Mutex::new(Vec::new());
    static ROWS_SEEN: Mutex<Vec<Vec<f64>>> = Mutex::new(Vec::new());
    static CALLS_3D: AtomicUsize = AtomicUsize::new(0);

    extern "C" fn record_hello() {
        HELLO_CALLS.fetch_add(1, Ordering::SeqCst);
    }

    unsafe extern "C" fn record_flat(data: *const f64, rows: usize, cols: usize) {
        FLAT_ARGS.lock().unwrap().push((data as usize, rows, cols));
    }

    unsafe extern "C" fn read_rows(xpp: *const usize, _ypp: *const usize, rows: usize, cols: usize) {
        let table = unsafe { std::slice::from_raw_parts(xpp, rows) };
        let mut seen = ROWS_SEEN.lock().unwrap();
        for &address in table {
            let row = unsafe { std::slice::from_raw_parts(address as *const f64, cols) };
            seen.push(row.to_vec());
        }
    }

    unsafe extern "C" fn double_rows(xpp: *const usize, ypp: *const usize, rows: usize, cols: usize) {
        let inputs = unsafe { std::slice::from_raw_parts(xpp, rows) };
        let outputs = unsafe { std::slice::from_raw_parts(ypp, rows) };
        for (&x, &y) in inputs.iter().zip(outputs) {
            let x = unsafe { std::slice::from_raw_parts(x as *const f64, cols) };
            let y = unsafe { std::slice::from_raw_parts_mut(y as *mut f64, cols) };
            for (out, value) in y.iter_mut().zip(x) {
                *out = value * 2.0;
            }
        }
    }

    unsafe extern "C" fn noop_2d(_: *const usize, _: *const usize, _: usize, _: usize) {}

    unsafe extern "C" fn record_3d(_: *const usize, _: *const usize, _: usize, _: usize, _: usize) {
        CALLS_3D.fetch_add(1, Ordering::SeqCst);
    }

    fn bindings(array_2d: Array2dFn) -> ArrayBindings {
        unsafe { ArrayBindings::from_raw(record_flat, array_2d, record_3d) }
    }

    #[test]
    fn test_say_hello_returns() {
        let binding = unsafe { HelloBinding::from_raw(record_hello) };
        say_hello(&binding);
        assert!(HELLO_CALLS.load(Ordering::SeqCst) >= 1);
    }

    #[test]
    fn test_pass_flat_forwards_base_and_sizes() {
        let bindings = bindings(noop_2d);
        for shape in [[4, 5], [1, 1], [3, 1], [1, 7]] {
            let x = NumericArray::<f64>::range(&shape).unwrap();
            pass_flat(&bindings, &x).unwrap();

            let args = FLAT_ARGS.lock().unwrap();
            assert!(args.contains(&(x.base_address(), shape[0], shape[1])));
        }
    }

    #[test]
    fn test_pass_flat_rejects_other_ranks() {
        let bindings = bindings(noop_2d);
        let x = NumericArray::<f64>::range(&[3, 3, 3]).unwrap();
        assert!(matches!(
            pass_flat(&bindings, &x),
            Err(MarshalError::Rank { found: 3, .. })
        ));
    }

    #[test]
    fn test_process_2d_tables_and_zero_output() {
        let bindings = bindings(read_rows);
        let x = NumericArray::<f64>::range(&[2, 3]).unwrap();

        let processed = process_2d(&bindings, &x).unwrap();

        assert!(processed.invoked);
        assert_eq!(processed.addressing, Addressing::RowPointers);
        assert_eq!(
            processed.input_table,
            vec![x.base_address(), x.base_address() + x.strides()[0]]
        );
        let y = &processed.output;
        assert_eq!(y.shape(), &[2, 3]);
        assert!(y.as_slice().iter().all(|v| *v == 0.0));
        assert_eq!(
            processed.output_table,
            vec![y.base_address(), y.base_address() + y.strides()[0]]
        );

        let seen = ROWS_SEEN.lock().unwrap();
        assert!(seen.contains(&vec![0.0, 1.0, 2.0]));
        assert!(seen.contains(&vec![3.0, 4.0, 5.0]));
    }

    #[test]
    fn test_process_2d_output_receives_native_writes() {
        let bindings = bindings(double_rows);
        let x = NumericArray::<f64>::range(&[3, 2]).unwrap();

        let processed = process_2d(&bindings, &x).unwrap();

        assert_eq!(processed.output.as_slice(), &[0.0, 2.0, 4.0, 6.0, 8.0, 10.0]);
        assert_eq!(x.as_slice(), &[0.0, 1.0, 2.0, 3.0, 4.0, 5.0]);
    }

    #[test]
    fn test_process_3d_prepares_without_calling() {
        let bindings = bindings(noop_2d);
        let x = NumericArray::<f64>::range(&[3, 3, 3]).unwrap();

        let processed = process_3d(&bindings, &x).unwrap();

        assert!(!processed.invoked);
        assert_eq!(CALLS_3D.load(Ordering::SeqCst), 0);
        assert_eq!(processed.addressing, Addressing::FlatLinear);
        assert_eq!(processed.output.shape(), &[3, 3, 3]);
        assert!(processed.output.as_slice().iter().all(|v| *v == 0.0));

        for table in [&processed.input_table, &processed.output_table] {
            assert_eq!(table.len(), 27);
            for pair in table.windows(2) {
                assert_eq!(pair[1] - pair[0], std::mem::size_of::<f64>());
            }
        }
        assert_eq!(processed.input_table[0], x.base_address());
        assert_eq!(processed.output_table[0], processed.output.base_address());
        let end = processed.output.base_address() + processed.output.len() * 8;
        assert!(processed.output_table.iter().all(|a| *a < end));
        assert!(processed
            .output_table
            .iter()
            .all(|a| !processed.input_table.contains(a)));
    }

    #[test]
    fn test_process_3d_requires_rank_three() {
        let bindings = bindings(noop_2d);
        let x = NumericArray::<f64>::range(&[2, 3]).unwrap();
        match process_3d(&bindings, &x) {
            Err(MarshalError::Rank { expected, found }) => {
                assert_eq!(expected, "3");
                assert_eq!(found, 2);
            }
            other => panic!("expected Rank error, got {:?}", other),
        }
    }
}
