//! Stand-in for the native `bib_hello` library.

/// Prints a greeting. Takes nothing and returns nothing.
#[no_mangle]
pub extern "C" fn test_func() {
    println!("Hello, world!");
}
