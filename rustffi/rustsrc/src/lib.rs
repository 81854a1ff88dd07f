//! Marshalling of numeric arrays into native C-ABI exports.
//!
//! Arrays are handed over either as one flat pointer or as a table of
//! addresses (one per row, or one per element), always with explicit
//! dimension sizes. Address tables borrow the array they point into.

pub mod adapter;
pub mod array;
pub mod config;
pub mod error;
pub mod library;
pub mod signature;
pub mod table;

pub use adapter::{pass_flat, process_2d, process_3d, say_hello, ArrayBindings, HelloBinding, Processed};
pub use array::{allocate_output_like, format_shape, Element, NumericArray};
pub use config::HarnessConfig;
pub use error::{MarshalError, Result};
pub use library::{load_shared, platform_lib_name, NativeLibrary};
pub use signature::{ForeignSignature, LibraryKind};
pub use table::{build_flat_address_table, build_row_pointer_table, Addressing, PointerTable};
