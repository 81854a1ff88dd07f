//! Native library loading and the process-wide library registry.

use std::collections::HashMap;
use std::ffi::CString;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, OnceLock};

use libloading::{Library, Symbol};
use tracing::{debug, info};

use crate::error::{MarshalError, Result};

/// A loaded native library.
#[derive(Debug)]
pub struct NativeLibrary {
    library: Library,
    path: PathBuf,
}

impl NativeLibrary {
    /// Load a native library from an explicit file path.
    ///
    /// A missing file is reported as [`MarshalError::LibraryMissing`] before
    /// the loader is asked, so the error names the path that was tried.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(MarshalError::LibraryMissing(path.to_path_buf()));
        }

        let library = unsafe { Library::new(path) }.map_err(|source| MarshalError::LibraryLoad {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(path = %path.display(), "loaded native library");

        Ok(Self {
            library,
            path: path.to_path_buf(),
        })
    }

    /// Resolve `name` and copy out the function pointer.
    ///
    /// # Safety
    ///
    /// `F` must be the exact function pointer type of the export, and the
    /// returned pointer must not be called after this library is dropped.
    pub unsafe fn get_function<F: Copy>(&self, name: &str) -> Result<F> {
        let c_name =
            CString::new(name).map_err(|_| MarshalError::InvalidSymbolName(name.to_string()))?;

        let symbol: Symbol<'_, F> = unsafe { self.library.get(c_name.as_bytes_with_nul()) }
            .map_err(|source| MarshalError::SymbolNotFound {
                symbol: name.to_string(),
                path: self.path.clone(),
                source,
            })?;
        debug!(symbol = name, path = %self.path.display(), "resolved symbol");

        Ok(*symbol)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Platform file name for a library base name.
pub fn platform_lib_name(name: &str) -> String {
    #[cfg(target_os = "windows")]
    {
        format!("{}.dll", name)
    }
    #[cfg(target_os = "macos")]
    {
        format!("lib{}.dylib", name)
    }
    #[cfg(not(any(target_os = "windows", target_os = "macos")))]
    {
        format!("lib{}.so", name)
    }
}

type Registry = Mutex<HashMap<PathBuf, Arc<NativeLibrary>>>;

fn registry() -> &'static Registry {
    static LIBRARIES: OnceLock<Registry> = OnceLock::new();
    LIBRARIES.get_or_init(|| Mutex::new(HashMap::new()))
}

/// Load `path` once per process and hand out shared handles to it.
pub fn load_shared(path: &Path) -> Result<Arc<NativeLibrary>> {
    let mut libraries = registry().lock().map_err(|_| MarshalError::Registry)?;
    if let Some(library) = libraries.get(path) {
        return Ok(Arc::clone(library));
    }

    let library = Arc::new(NativeLibrary::load(path)?);
    libraries.insert(path.to_path_buf(), Arc::clone(&library));
    info!(path = %path.display(), "registered native library");
    Ok(library)
}

/// Drop the registry's handle to `path`.
///
/// The library is unmapped once every binding holding it is dropped too.
pub fn release(path: &Path) -> Result<bool> {
    let mut libraries = registry().lock().map_err(|_| MarshalError::Registry)?;
    let released = libraries.remove(path).is_some();
    if released {
        info!(path = %path.display(), "released native library");
    }
    Ok(released)
}

pub fn release_all() -> Result<usize> {
    let mut libraries = registry().lock().map_err(|_| MarshalError::Registry)?;
    let count = libraries.len();
    libraries.clear();
    Ok(count)
}
