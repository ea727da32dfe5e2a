//! Rule names.

use std::borrow::Cow;
use std::ffi::{CStr, CString};
use std::fmt;

use crate::arg::nul_terminated;

/// Caller-supplied name correlating a firing with a logical probe site.
///
/// Stored NUL-terminated so it can be handed to the native runtime without
/// another copy. Uniqueness is not enforced; the tracer interprets it.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RuleName(CString);

impl RuleName {
    /// Build a rule name. Bytes from the first interior NUL onward are dropped.
    pub fn new(name: impl AsRef<[u8]>) -> Self {
        Self(nul_terminated(name.as_ref()))
    }

    #[must_use]
    pub fn as_c_str(&self) -> &CStr {
        &self.0
    }

    /// Lossy UTF-8 view.
    #[must_use]
    pub fn to_str_lossy(&self) -> Cow<'_, str> {
        self.0.to_string_lossy()
    }
}

impl From<&str> for RuleName {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for RuleName {
    fn from(name: String) -> Self {
        Self::new(name)
    }
}

impl From<&RuleName> for RuleName {
    fn from(name: &Self) -> Self {
        name.clone()
    }
}

impl From<&CStr> for RuleName {
    fn from(name: &CStr) -> Self {
        Self(name.to_owned())
    }
}

impl fmt::Debug for RuleName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.0, f)
    }
}

impl fmt::Display for RuleName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_str_lossy())
    }
}
