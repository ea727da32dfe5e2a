//! Binding configuration.
//!
//! The native module is named after the host architecture, spelled the way a
//! JVM reports `os.arch` (`amd64`, not `x86_64`), so one install directory can
//! hold modules for several architectures side by side.

use std::env;
use std::ffi::{OsStr, OsString};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

use tracing::{debug, error};

use crate::BindingError;
use crate::binding::{LibraryBinding, ProbeBinding, RecordingBinding, SdtBinding};

/// Environment variable selecting the backend.
pub const ENV_BACKEND: &str = "HELPER_SDT_BACKEND";
/// Environment variable naming an explicit native module path.
pub const ENV_LIBRARY: &str = "HELPER_SDT_LIBRARY";
/// Environment variable listing directories to search for the native module.
pub const ENV_PATH: &str = "HELPER_SDT_PATH";

/// Which runtime binding to use.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Backend {
    /// Static tracepoints in this process.
    #[default]
    Sdt,
    /// Native runtime module loaded from disk.
    Library,
    /// Keep firings in memory.
    Record,
}

impl Backend {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Sdt => "sdt",
            Self::Library => "library",
            Self::Record => "record",
        }
    }

    /// Parse a backend name read from the environment.
    ///
    /// # Errors
    ///
    /// [`BindingError::UnknownBackend`] for an unrecognized or non-UTF-8 name.
    pub fn from_os_str(value: &OsStr) -> Result<Self, BindingError> {
        value.to_str().map_or_else(
            || {
                Err(BindingError::UnknownBackend(
                    value.to_string_lossy().into_owned(),
                ))
            },
            str::parse,
        )
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Backend {
    type Err = BindingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "sdt" | "usdt" => Ok(Self::Sdt),
            "library" | "lib" | "native" => Ok(Self::Library),
            "record" | "recording" => Ok(Self::Record),
            _ => Err(BindingError::UnknownBackend(s.to_string())),
        }
    }
}

/// Architecture identifier in JVM `os.arch` spelling.
#[must_use]
pub fn jvm_arch(rust_arch: &str) -> &str {
    match rust_arch {
        "x86_64" => "amd64",
        "x86" => "i386",
        "powerpc" => "ppc",
        "powerpc64" => "ppc64",
        "sparc64" => "sparcv9",
        other => other,
    }
}

/// Architecture identifier of the running host.
#[must_use]
pub fn host_arch() -> &'static str {
    if cfg!(all(target_arch = "powerpc64", target_endian = "little")) {
        "ppc64le"
    } else {
        jvm_arch(env::consts::ARCH)
    }
}

/// How to reach the native tracer runtime.
#[derive(Clone, Debug)]
pub struct BindingConfig {
    pub backend: Backend,
    /// Explicit module path; skips the search.
    pub library: Option<PathBuf>,
    /// Directories searched, in order, for the module file.
    pub search_dirs: Vec<PathBuf>,
    /// Architecture identifier used in the module file name.
    pub arch: String,
}

impl Default for BindingConfig {
    fn default() -> Self {
        Self {
            backend: Backend::default(),
            library: None,
            search_dirs: Vec::new(),
            arch: host_arch().to_string(),
        }
    }
}

impl BindingConfig {
    /// Defaults overridden by `HELPER_SDT_*` environment variables.
    ///
    /// # Errors
    ///
    /// [`BindingError::UnknownBackend`] for an unrecognized or non-UTF-8
    /// backend name.
    pub fn from_env() -> Result<Self, BindingError> {
        let mut config = Self::default();
        if let Some(backend) = env::var_os(ENV_BACKEND) {
            config.backend = Backend::from_os_str(&backend)?;
        }
        if let Some(library) = env::var_os(ENV_LIBRARY) {
            config.library = Some(PathBuf::from(library));
        }
        if let Some(paths) = env::var_os(ENV_PATH) {
            config.search_dirs = env::split_paths(&paths).collect();
        }
        Ok(config)
    }

    #[must_use]
    pub const fn with_backend(mut self, backend: Backend) -> Self {
        self.backend = backend;
        self
    }

    #[must_use]
    pub fn with_library(mut self, library: impl Into<PathBuf>) -> Self {
        self.library = Some(library.into());
        self
    }

    #[must_use]
    pub fn with_search_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.search_dirs.push(dir.into());
        self
    }

    /// Platform file name of the native module, e.g. `libHelperSDT_amd64.so`.
    #[must_use]
    pub fn module_file_name(&self) -> OsString {
        libloading::library_filename(format!("HelperSDT_{}", self.arch))
    }

    /// Locate the native module.
    ///
    /// An explicit path must exist. Otherwise the first search directory
    /// holding the module wins; failing that, the bare file name is returned
    /// for the dynamic loader to resolve.
    ///
    /// # Errors
    ///
    /// [`BindingError::LibraryNotFound`] if the explicit path does not exist.
    pub fn resolve_library(&self) -> Result<PathBuf, BindingError> {
        if let Some(library) = &self.library {
            if !library.exists() {
                error!(path = %library.display(), "native probe module not found");
                return Err(BindingError::LibraryNotFound(library.display().to_string()));
            }
            return Ok(library.clone());
        }

        let file_name = self.module_file_name();
        if let Some(found) = self
            .search_dirs
            .iter()
            .map(|dir| dir.join(&file_name))
            .find(|candidate| candidate.is_file())
        {
            return Ok(found);
        }

        debug!(
            module = %file_name.to_string_lossy(),
            "native probe module not in search path, deferring to dynamic loader"
        );
        Ok(PathBuf::from(file_name))
    }

    /// Build the configured binding.
    ///
    /// # Errors
    ///
    /// Library resolution or loading failures; the other backends cannot fail.
    pub fn open(&self) -> Result<Arc<dyn ProbeBinding>, BindingError> {
        let binding: Arc<dyn ProbeBinding> = match self.backend {
            Backend::Sdt => Arc::new(SdtBinding),
            Backend::Library => Arc::new(LibraryBinding::open(self.resolve_library()?)?),
            Backend::Record => Arc::new(RecordingBinding::new()),
        };
        debug!(backend = binding.name(), arch = %self.arch, "probe binding ready");
        Ok(binding)
    }
}
