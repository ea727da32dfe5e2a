//! Native runtime module loaded at startup.
//!
//! The module exports one C entry point per table row (see
//! [`EntryPoint::symbol`]). Every probe entry takes the rule name followed by
//! `arity` 64-bit words:
//!
//! ```c
//! void helper_sdt_probe2(const char *rule, int64_t arg1, int64_t arg2);
//! void helper_sdt_bt(const char *rule, const char *line, int64_t ordinal);
//! void helper_sdt_bt_delete(const char *rule);
//! ```
//!
//! All symbols are resolved when the module is opened, so a module missing
//! any entry point never produces a usable binding.

use std::ffi::c_char;
use std::fmt;
use std::path::{Path, PathBuf};

use helper_sdt_abi::{
    Arity, EntryPoint, LoweredArgs, ProbeArg, ProbeSite, RuleName, nul_terminated,
};
use libloading::os::unix::{Library, RTLD_NOW, Symbol};
use tracing::{debug, error};

use super::ProbeBinding;
use crate::BindingError;

/// Untyped entry point; cast to its real signature at the call site.
type RawEntry = unsafe extern "C" fn();

type FrameFn = unsafe extern "C" fn(*const c_char, *const c_char, i64);
type RetireFn = unsafe extern "C" fn(*const c_char);

/// Binding that calls into a dynamically loaded native runtime module.
pub struct LibraryBinding {
    _lib: Library,
    path: PathBuf,
    table: [RawEntry; EntryPoint::COUNT],
}

impl LibraryBinding {
    /// Open a native runtime module and resolve the whole entry-point table.
    ///
    /// # Errors
    ///
    /// The module fails to load or lacks one of the entry points.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, BindingError> {
        let path = path.as_ref();

        // RTLD_NOW: resolve everything up front instead of on the first firing.
        debug!(path = %path.display(), "loading native probe module");
        let lib = unsafe { Library::open(Some(path), RTLD_NOW)? };
        let table = unsafe { resolve_table(&lib)? };

        debug!(
            path = %path.display(),
            entries = EntryPoint::COUNT,
            "resolved probe entry points"
        );

        Ok(Self {
            _lib: lib,
            path: path.to_path_buf(),
            table,
        })
    }

    /// Path the module was opened from.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    const fn entry(&self, entry: EntryPoint) -> RawEntry {
        self.table[entry.index()]
    }
}

impl fmt::Debug for LibraryBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LibraryBinding")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

/// Placeholder for table slots before resolution.
unsafe extern "C" fn unresolved() {}

unsafe fn resolve_table(lib: &Library) -> Result<[RawEntry; EntryPoint::COUNT], BindingError> {
    let mut table: [RawEntry; EntryPoint::COUNT] = [unresolved as RawEntry; EntryPoint::COUNT];
    for entry in EntryPoint::all() {
        table[entry.index()] = unsafe { load_symbol::<RawEntry>(lib, entry.symbol())? };
    }
    Ok(table)
}

unsafe fn load_symbol<T: Copy>(lib: &Library, symbol: &'static str) -> Result<T, BindingError> {
    unsafe {
        let sym: Symbol<T> = lib.get(symbol.as_bytes()).map_err(|e| {
            error!(symbol, "symbol not found in native probe module");
            BindingError::SymbolNotFound(symbol.to_string(), e)
        })?;
        Ok(*sym)
    }
}

macro_rules! word {
    ($i:literal) => {
        i64
    };
}

/// Call a probe entry with the rule and words `$i..`.
macro_rules! call_probe {
    ($entry:expr, $rule:expr, $w:ident; $($i:literal)*) => {{
        let f: unsafe extern "C" fn(*const c_char $(, word!($i))*) =
            unsafe { std::mem::transmute::<RawEntry, _>($entry) };
        unsafe { f($rule $(, $w[$i])*) }
    }};
}

impl ProbeBinding for LibraryBinding {
    fn name(&self) -> &'static str {
        "library"
    }

    fn fire(&self, site: ProbeSite, rule: &RuleName, args: &[ProbeArg<'_>]) {
        let Ok(lowered) = LoweredArgs::new(args) else {
            return;
        };
        let w = lowered.padded();
        let entry = self.entry(EntryPoint::Probe(site));
        let rule = rule.as_c_str().as_ptr();

        match site.arity() {
            Arity::A0 => call_probe!(entry, rule, w;),
            Arity::A1 => call_probe!(entry, rule, w; 0),
            Arity::A2 => call_probe!(entry, rule, w; 0 1),
            Arity::A3 => call_probe!(entry, rule, w; 0 1 2),
            Arity::A4 => call_probe!(entry, rule, w; 0 1 2 3),
            Arity::A5 => call_probe!(entry, rule, w; 0 1 2 3 4),
            Arity::A6 => call_probe!(entry, rule, w; 0 1 2 3 4 5),
            Arity::A7 => call_probe!(entry, rule, w; 0 1 2 3 4 5 6),
            Arity::A8 => call_probe!(entry, rule, w; 0 1 2 3 4 5 6 7),
            Arity::A9 => call_probe!(entry, rule, w; 0 1 2 3 4 5 6 7 8),
            Arity::A10 => call_probe!(entry, rule, w; 0 1 2 3 4 5 6 7 8 9),
        }
    }

    fn fire_frame(&self, rule: &RuleName, line: &str, ordinal: usize) {
        let line = nul_terminated(line.as_bytes());
        let ordinal = i64::try_from(ordinal).unwrap_or(i64::MAX);
        unsafe {
            let f = std::mem::transmute::<RawEntry, FrameFn>(self.entry(EntryPoint::Frame));
            f(rule.as_c_str().as_ptr(), line.as_ptr(), ordinal);
        }
    }

    fn retire(&self, rule: &RuleName) {
        unsafe {
            let f = std::mem::transmute::<RawEntry, RetireFn>(self.entry(EntryPoint::Retire));
            f(rule.as_c_str().as_ptr());
        }
    }
}
