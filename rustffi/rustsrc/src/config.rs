use std::env;
use std::path::{Path, PathBuf};

use crate::library::platform_lib_name;
use crate::signature::LibraryKind;

pub const DEFAULT_LIB_DIR: &str = "zig-out/bin";
pub const DEFAULT_HELLO_LIB: &str = "bib_hello";
pub const DEFAULT_ARRAY_LIB: &str = "bib_array";

/// Where the native libraries live and what they are called.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HarnessConfig {
    pub lib_dir: PathBuf,
    pub hello_lib: String,
    pub array_lib: String,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            lib_dir: PathBuf::from(DEFAULT_LIB_DIR),
            hello_lib: DEFAULT_HELLO_LIB.to_string(),
            array_lib: DEFAULT_ARRAY_LIB.to_string(),
        }
    }
}

impl HarnessConfig {
    pub fn library_name(&self, kind: LibraryKind) -> &str {
        match kind {
            LibraryKind::Hello => &self.hello_lib,
            LibraryKind::Array => &self.array_lib,
        }
    }

    /// Absolute path of the library file for `kind`.
    pub fn library_path(&self, kind: LibraryKind) -> PathBuf {
        absolute(&self.lib_dir.join(platform_lib_name(self.library_name(kind))))
    }
}

fn absolute(path: &Path) -> PathBuf {
    if path.is_absolute() {
        return path.to_path_buf();
    }
    match env::current_dir() {
        Ok(cwd) => cwd.join(path),
        Err(_) => path.to_path_buf(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_paths_are_absolute() {
        let config = HarnessConfig::default();
        let path = config.library_path(LibraryKind::Array);
        assert!(path.is_absolute());
        assert!(path.ends_with(Path::new("zig-out/bin").join(platform_lib_name("bib_array"))));
    }

    #[cfg(unix)]
    #[test]
    fn test_library_name_by_kind() {
        let config = HarnessConfig {
            lib_dir: PathBuf::from("/opt/native"),
            hello_lib: "greeter".to_string(),
            array_lib: "arrays".to_string(),
        };
        assert_eq!(config.library_name(LibraryKind::Hello), "greeter");
        assert_eq!(
            config.library_path(LibraryKind::Array),
            PathBuf::from("/opt/native").join(platform_lib_name("arrays"))
        );
    }
}
