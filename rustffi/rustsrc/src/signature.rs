//! Declared C signatures of the native exports.
//!
//! The declarations must match the native ABI exactly. Nothing here can check
//! that; a mismatch is undefined behavior at the call.

use std::fmt;

/// `void test_func(void)`
pub type HelloFn = unsafe extern "C" fn();

/// `void test_arr_func(const double *data, size_t rows, size_t cols)`
pub type FlatArrayFn = unsafe extern "C" fn(*const f64, usize, usize);

/// `void test_2darr_func(const uintptr_t *xpp, const uintptr_t *ypp, size_t rows, size_t cols)`
pub type Array2dFn = unsafe extern "C" fn(*const usize, *const usize, usize, usize);

/// `void test_3darr_func(const uintptr_t *xpp, const uintptr_t *ypp, size_t d1, size_t d2, size_t d3)`
pub type Array3dFn = unsafe extern "C" fn(*const usize, *const usize, usize, usize, usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FfiType {
    /// Pointer to contiguous doubles
    PtrF64,
    /// Pointer to a table of addresses
    PtrAddressTable,
    /// Dimension size
    Usize,
    Void,
}

impl fmt::Display for FfiType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FfiType::PtrF64 => "ptr<f64>",
            FfiType::PtrAddressTable => "ptr<usize>",
            FfiType::Usize => "usize",
            FfiType::Void => "void",
        };
        f.write_str(name)
    }
}

/// Which library an export lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LibraryKind {
    Hello,
    Array,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ForeignSignature {
    pub name: &'static str,
    pub library: LibraryKind,
    pub args: &'static [FfiType],
    pub ret: FfiType,
}

impl ForeignSignature {
    /// Number of trailing dimension-size parameters.
    pub fn size_params(&self) -> usize {
        self.args.iter().filter(|t| **t == FfiType::Usize).count()
    }
}

impl fmt::Display for ForeignSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.name)?;
        for (i, arg) in self.args.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", arg)?;
        }
        write!(f, ") -> {}", self.ret)
    }
}

pub const HELLO: ForeignSignature = ForeignSignature {
    name: "test_func",
    library: LibraryKind::Hello,
    args: &[],
    ret: FfiType::Void,
};

pub const FLAT_ARRAY: ForeignSignature = ForeignSignature {
    name: "test_arr_func",
    library: LibraryKind::Array,
    args: &[FfiType::PtrF64, FfiType::Usize, FfiType::Usize],
    ret: FfiType::Void,
};

pub const ARRAY_2D: ForeignSignature = ForeignSignature {
    name: "test_2darr_func",
    library: LibraryKind::Array,
    args: &[
        FfiType::PtrAddressTable,
        FfiType::PtrAddressTable,
        FfiType::Usize,
        FfiType::Usize,
    ],
    ret: FfiType::Void,
};

pub const ARRAY_3D: ForeignSignature = ForeignSignature {
    name: "test_3darr_func",
    library: LibraryKind::Array,
    args: &[
        FfiType::PtrAddressTable,
        FfiType::PtrAddressTable,
        FfiType::Usize,
        FfiType::Usize,
        FfiType::Usize,
    ],
    ret: FfiType::Void,
};

pub const ALL: [ForeignSignature; 4] = [HELLO, FLAT_ARRAY, ARRAY_2D, ARRAY_3D];
