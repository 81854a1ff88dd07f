//! Stand-in for the native `bib_array` library.
//!
//! The exports only read their inputs. Output buffers are never written, so a
//! caller always gets back the zero-filled buffer it allocated.

mod slice;

pub use slice::{views_from_table, FFISlice};

/// Prints a row-major `rows x cols` matrix of doubles.
///
/// # Safety
///
/// `data` must point to `rows * cols` contiguous doubles.
#[no_mangle]
pub unsafe extern "C" fn test_arr_func(data: *const f64, rows: usize, cols: usize) {
    let values = unsafe { FFISlice::from_raw(data, rows * cols) };
    println!("test_arr_func: {rows}x{cols}");
    for row in values.as_slice().chunks(cols.max(1)) {
        println!("{:?}", row);
    }
}

/// Reads a 2D array through its row-pointer table.
///
/// # Safety
///
/// `input` and `output` must each hold `rows` addresses of `cols` doubles.
#[no_mangle]
pub unsafe extern "C" fn test_2darr_func(
    input: *const usize,
    _output: *const usize,
    rows: usize,
    cols: usize,
) {
    println!("test_2darr_func: {rows}x{cols}");
    for row in unsafe { views_from_table::<f64>(input, rows, cols) } {
        println!("{:?}", row.as_slice());
    }
}

/// Reads a 3D array through a flat table of per-element addresses.
///
/// # Safety
///
/// `input` and `output` must each hold `dim1 * dim2 * dim3` element addresses.
#[no_mangle]
pub unsafe extern "C" fn test_3darr_func(
    input: *const usize,
    _output: *const usize,
    dim1: usize,
    dim2: usize,
    dim3: usize,
) {
    let elements = unsafe { views_from_table::<f64>(input, dim1 * dim2 * dim3, 1) };
    let sum: f64 = elements.iter().flat_map(|e| e.as_slice()).sum();
    println!("test_3darr_func: {dim1}x{dim2}x{dim3}, sum {sum}");
}
