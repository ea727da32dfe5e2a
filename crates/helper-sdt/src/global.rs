//! Process-wide probe surface.
//!
//! The binding is resolved once and shared read-only for the rest of the
//! process. Failing to establish it is reported to whoever initializes.

use std::sync::OnceLock;

use parking_lot::Mutex;
use tracing::debug;

use crate::BindingError;
use crate::config::BindingConfig;
use crate::surface::ProbeSurface;

static SURFACE: OnceLock<ProbeSurface> = OnceLock::new();

/// Serializes initialization so a binding is opened at most once.
static INIT_LOCK: Mutex<()> = parking_lot::const_mutex(());

/// Open the configured binding and install it process-wide.
///
/// Once a surface is installed, later calls return it and ignore `config`.
///
/// # Errors
///
/// Returns the [`BindingError`] from opening the binding; nothing is installed.
pub fn init(config: &BindingConfig) -> Result<&'static ProbeSurface, BindingError> {
    if let Some(surface) = SURFACE.get() {
        return Ok(surface);
    }

    let _guard = INIT_LOCK.lock();
    if let Some(surface) = SURFACE.get() {
        return Ok(surface);
    }

    let surface = ProbeSurface::with_binding(config.open()?);
    debug!(binding = surface.binding().name(), "installed process-wide probe surface");
    Ok(SURFACE.get_or_init(|| surface))
}

/// [`init`] with [`BindingConfig::from_env`].
///
/// # Errors
///
/// An unknown `HELPER_SDT_BACKEND` or a binding that fails to open.
pub fn init_from_env() -> Result<&'static ProbeSurface, BindingError> {
    init(&BindingConfig::from_env()?)
}

/// Install a pre-built surface process-wide.
///
/// # Errors
///
/// [`BindingError::AlreadyInitialized`] if a surface is already installed.
pub fn install(surface: ProbeSurface) -> Result<&'static ProbeSurface, BindingError> {
    let _guard = INIT_LOCK.lock();
    if SURFACE.get().is_some() {
        return Err(BindingError::AlreadyInitialized);
    }
    debug!(binding = surface.binding().name(), "installed process-wide probe surface");
    Ok(SURFACE.get_or_init(|| surface))
}

/// The process-wide surface, if one has been installed.
#[must_use]
pub fn global() -> Option<&'static ProbeSurface> {
    SURFACE.get()
}
