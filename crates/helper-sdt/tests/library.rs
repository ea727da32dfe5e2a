//! Native runtime module binding, against a stub module built with `cc`.
//!
//! The stub records the last entry point called, its rule and its 64-bit
//! words, and exports `stub_last_*` accessors to read them back.

use std::ffi::{CStr, c_char, c_int};
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use helper_sdt::{
    AbiVersion, Arity, BindingError, EntryPoint, LibraryBinding, ProbeArg, ProbeSite,
    ProbeSurface, RuleName,
};

const STUB_PRELUDE: &str = r#"
#include <stdint.h>
#include <stdio.h>
#include <string.h>

static int last_entry = -1;
static int last_count = -1;
static char last_rule[256];
static char last_line[256];
static int64_t last_words[10];

static void record(int entry, const char *rule, int count) {
    last_entry = entry;
    last_count = count;
    snprintf(last_rule, sizeof last_rule, "%s", rule);
    last_line[0] = '\0';
    memset(last_words, 0, sizeof last_words);
}

int stub_last_entry(void) { return last_entry; }
int stub_last_count(void) { return last_count; }
const char *stub_last_rule(void) { return last_rule; }
const char *stub_last_line(void) { return last_line; }
int64_t stub_last_word(int i) { return last_words[i]; }
"#;

/// C source exporting every entry point except `missing`.
fn stub_source(missing: Option<EntryPoint>) -> String {
    let mut src = String::from(STUB_PRELUDE);
    for entry in EntryPoint::all().filter(|&e| Some(e) != missing) {
        let symbol = entry.symbol();
        let index = entry.index();
        let written = match entry {
            EntryPoint::Probe(site) => {
                let n = site.arity().count();
                let params: String = (0..n).map(|i| format!(", int64_t a{i}")).collect();
                let stores: String = (0..n).map(|i| format!(" last_words[{i}] = a{i};")).collect();
                writeln!(
                    src,
                    "void {symbol}(const char *rule{params}) {{ record({index}, rule, {n});{stores} }}"
                )
            }
            EntryPoint::Frame => writeln!(
                src,
                "void {symbol}(const char *rule, const char *line, int64_t ordinal) {{ \
                 record({index}, rule, 1); \
                 snprintf(last_line, sizeof last_line, \"%s\", line); \
                 last_words[0] = ordinal; }}"
            ),
            EntryPoint::Retire => {
                writeln!(src, "void {symbol}(const char *rule) {{ record({index}, rule, 0); }}")
            }
        };
        written.unwrap();
    }
    src
}

/// Compile a shared module, or `None` when there is no C compiler.
fn build_module(dir: &Path, name: &str, source: &str) -> Option<PathBuf> {
    let src_path = dir.join(format!("{name}.c"));
    std::fs::write(&src_path, source).unwrap();
    let out_path = dir.join(libloading::library_filename(name));

    let output = match Command::new("cc")
        .args(["-shared", "-fPIC", "-O2"])
        .arg(&src_path)
        .arg("-o")
        .arg(&out_path)
        .stderr(Stdio::piped())
        .output()
    {
        Ok(output) => output,
        Err(err) => {
            eprintln!("Skipping test: failed to run cc: {err}");
            return None;
        }
    };
    assert!(
        output.status.success(),
        "cc failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    Some(out_path)
}

/// Read side of the stub's last-call record.
struct StubModule {
    lib: libloading::Library,
}

impl StubModule {
    fn open(path: &Path) -> Self {
        // Same path as the binding, so the loader hands back the same image.
        let lib = unsafe { libloading::Library::new(path) }.unwrap();
        Self { lib }
    }

    fn int(&self, symbol: &str) -> c_int {
        unsafe {
            let f = self
                .lib
                .get::<unsafe extern "C" fn() -> c_int>(symbol.as_bytes())
                .unwrap();
            f()
        }
    }

    fn text(&self, symbol: &str) -> String {
        unsafe {
            let f = self
                .lib
                .get::<unsafe extern "C" fn() -> *const c_char>(symbol.as_bytes())
                .unwrap();
            CStr::from_ptr(f()).to_string_lossy().into_owned()
        }
    }

    fn last_entry(&self) -> usize {
        usize::try_from(self.int("stub_last_entry")).expect("no entry point called yet")
    }

    fn last_count(&self) -> usize {
        usize::try_from(self.int("stub_last_count")).unwrap()
    }

    fn last_rule(&self) -> String {
        self.text("stub_last_rule")
    }

    fn last_line(&self) -> String {
        self.text("stub_last_line")
    }

    fn last_words(&self) -> Vec<i64> {
        let f = unsafe {
            self.lib
                .get::<unsafe extern "C" fn(c_int) -> i64>(b"stub_last_word")
                .unwrap()
        };
        (0..10).map(|i| unsafe { f(i) }).collect()
    }
}

/// Arguments whose lowered words are all known up front.
fn word_args() -> (Vec<ProbeArg<'static>>, Vec<i64>) {
    let args = vec![
        ProbeArg::Int(-5),
        ProbeArg::UInt(u64::MAX),
        ProbeArg::Bool(true),
        ProbeArg::Char('λ'),
        ProbeArg::Float(2.5),
        ProbeArg::Null,
        ProbeArg::Int(i64::MIN),
        ProbeArg::Int(7),
        ProbeArg::Bool(false),
        ProbeArg::UInt(42),
    ];
    let words = vec![
        -5,
        -1,
        1,
        0x3bb,
        i64::from_ne_bytes(2.5_f64.to_bits().to_ne_bytes()),
        0,
        i64::MIN,
        7,
        0,
        42,
    ];
    (args, words)
}

#[test]
fn test_every_entry_point_reaches_the_module() {
    let dir = tempfile::tempdir().unwrap();
    let Some(path) = build_module(dir.path(), "HelperSDT_stub", &stub_source(None)) else {
        return;
    };

    let binding = LibraryBinding::open(&path).unwrap();
    assert_eq!(binding.path(), path.as_path());
    let surface = ProbeSurface::new(binding);
    let stub = StubModule::open(&path);
    let (args, words) = word_args();

    for version in AbiVersion::ALL {
        for arity in Arity::ALL {
            let site = ProbeSite::new(version, arity);
            let rule = RuleName::from(format!("rule.{site}"));
            surface
                .fire_dyn(version, &rule, &args[..arity.count()])
                .unwrap();

            assert_eq!(stub.last_entry(), EntryPoint::Probe(site).index(), "{site}");
            assert_eq!(stub.last_rule(), format!("rule.{site}"));
            assert_eq!(stub.last_count(), arity.count(), "{site}");
            let mut expected = words[..arity.count()].to_vec();
            expected.resize(10, 0);
            assert_eq!(stub.last_words(), expected, "{site}");
        }
    }

    let rule = RuleName::from("bt");
    surface.fire_frame(&rule, "frameX", 7);
    assert_eq!(stub.last_entry(), EntryPoint::Frame.index());
    assert_eq!(stub.last_rule(), "bt");
    assert_eq!(stub.last_line(), "frameX");
    assert_eq!(stub.last_words()[0], 7);

    surface.retire(&rule);
    assert_eq!(stub.last_entry(), EntryPoint::Retire.index());
    assert_eq!(stub.last_rule(), "bt");
    assert_eq!(stub.last_count(), 0);
}

#[test]
fn test_string_args_reach_the_module_as_pointers() {
    let dir = tempfile::tempdir().unwrap();
    let Some(path) = build_module(dir.path(), "HelperSDT_stub", &stub_source(None)) else {
        return;
    };

    let surface = ProbeSurface::new(LibraryBinding::open(&path).unwrap());
    let stub = StubModule::open(&path);

    surface.fire(
        AbiVersion::V31,
        &RuleName::from("strings"),
        [ProbeArg::from("text"), ProbeArg::Int(3)],
    );
    let words = stub.last_words();
    assert_ne!(words[0], 0);
    assert_eq!(words[1], 3);
}

#[test]
fn test_module_missing_retire_fails_to_open() {
    let dir = tempfile::tempdir().unwrap();
    let source = stub_source(Some(EntryPoint::Retire));
    let Some(path) = build_module(dir.path(), "HelperSDT_partial", &source) else {
        return;
    };

    let err = LibraryBinding::open(&path).unwrap_err();
    assert!(
        matches!(err, BindingError::SymbolNotFound(ref symbol, _) if symbol == "helper_sdt_bt_delete"),
        "{err}"
    );
}
