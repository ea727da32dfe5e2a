//! Probe arguments and their lowering to native words.

use std::borrow::Cow;
use std::ffi::CString;
use std::fmt;

use crate::{ArityError, Arity, MAX_ARITY};

/// A single positional probe argument.
///
/// Every variant lowers to exactly one 64-bit word at the native boundary;
/// see [`LoweredArgs`].
#[derive(Clone, Debug, PartialEq)]
pub enum ProbeArg<'a> {
    /// Absent value; lowered as a null pointer.
    Null,
    Bool(bool),
    Char(char),
    Int(i64),
    UInt(u64),
    Float(f64),
    Str(Cow<'a, str>),
}

impl ProbeArg<'_> {
    /// Detach from any borrowed string.
    #[must_use]
    pub fn into_owned(self) -> ProbeArg<'static> {
        match self {
            Self::Null => ProbeArg::Null,
            Self::Bool(v) => ProbeArg::Bool(v),
            Self::Char(v) => ProbeArg::Char(v),
            Self::Int(v) => ProbeArg::Int(v),
            Self::UInt(v) => ProbeArg::UInt(v),
            Self::Float(v) => ProbeArg::Float(v),
            Self::Str(v) => ProbeArg::Str(Cow::Owned(v.into_owned())),
        }
    }

    /// Name of the value kind.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Char(_) => "char",
            Self::Int(_) => "int",
            Self::UInt(_) => "uint",
            Self::Float(_) => "float",
            Self::Str(_) => "str",
        }
    }

    /// The string payload, if this is a string argument.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for ProbeArg<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("null"),
            Self::Bool(v) => write!(f, "{v}"),
            Self::Char(v) => write!(f, "{v:?}"),
            Self::Int(v) => write!(f, "{v}"),
            Self::UInt(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Str(v) => write!(f, "{v:?}"),
        }
    }
}

macro_rules! impl_from_signed {
    ($($ty:ty),*) => {
        $(impl From<$ty> for ProbeArg<'_> {
            fn from(v: $ty) -> Self {
                Self::Int(i64::from(v))
            }
        })*
    };
}

macro_rules! impl_from_unsigned {
    ($($ty:ty),*) => {
        $(impl From<$ty> for ProbeArg<'_> {
            fn from(v: $ty) -> Self {
                Self::UInt(u64::from(v))
            }
        })*
    };
}

impl_from_signed!(i8, i16, i32, i64);
impl_from_unsigned!(u8, u16, u32, u64);

impl From<isize> for ProbeArg<'_> {
    fn from(v: isize) -> Self {
        // isize is at most 64 bits on every supported target.
        Self::Int(v as i64)
    }
}

impl From<usize> for ProbeArg<'_> {
    fn from(v: usize) -> Self {
        Self::UInt(v as u64)
    }
}

impl From<bool> for ProbeArg<'_> {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<char> for ProbeArg<'_> {
    fn from(v: char) -> Self {
        Self::Char(v)
    }
}

impl From<f32> for ProbeArg<'_> {
    fn from(v: f32) -> Self {
        Self::Float(f64::from(v))
    }
}

impl From<f64> for ProbeArg<'_> {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl<'a> From<&'a str> for ProbeArg<'a> {
    fn from(v: &'a str) -> Self {
        Self::Str(Cow::Borrowed(v))
    }
}

impl<'a> From<&'a String> for ProbeArg<'a> {
    fn from(v: &'a String) -> Self {
        Self::Str(Cow::Borrowed(v.as_str()))
    }
}

impl From<String> for ProbeArg<'_> {
    fn from(v: String) -> Self {
        Self::Str(Cow::Owned(v))
    }
}

impl<'a, T: Into<ProbeArg<'a>>> From<Option<T>> for ProbeArg<'a> {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Null, Into::into)
    }
}

/// Arguments lowered to the words a fixed-signature entry point takes.
///
/// String arguments are copied into NUL-terminated buffers owned by this
/// value; the words holding their addresses are valid until it is dropped.
pub struct LoweredArgs {
    words: [i64; MAX_ARITY],
    arity: Arity,
    _strings: Vec<CString>,
}

impl LoweredArgs {
    /// Lower an argument list of at most [`MAX_ARITY`] entries.
    pub fn new(args: &[ProbeArg<'_>]) -> Result<Self, ArityError> {
        let arity = Arity::from_count(args.len()).ok_or(ArityError::TooMany { count: args.len() })?;
        let mut words = [0i64; MAX_ARITY];
        let mut strings = Vec::new();

        for (word, arg) in words.iter_mut().zip(args) {
            *word = match arg {
                ProbeArg::Null => 0,
                ProbeArg::Bool(v) => i64::from(*v),
                ProbeArg::Char(v) => i64::from(u32::from(*v)),
                ProbeArg::Int(v) => *v,
                ProbeArg::UInt(v) => i64::from_ne_bytes(v.to_ne_bytes()),
                ProbeArg::Float(v) => i64::from_ne_bytes(v.to_bits().to_ne_bytes()),
                ProbeArg::Str(s) => {
                    let c = nul_terminated(s.as_bytes());
                    let ptr = c.as_ptr() as i64;
                    strings.push(c);
                    ptr
                }
            };
        }

        Ok(Self {
            words,
            arity,
            _strings: strings,
        })
    }

    #[must_use]
    pub const fn arity(&self) -> Arity {
        self.arity
    }

    /// Lowered words, exactly `arity` long.
    #[must_use]
    pub fn words(&self) -> &[i64] {
        &self.words[..self.arity.count()]
    }

    /// All ten word slots; unused slots are zero.
    #[must_use]
    pub const fn padded(&self) -> &[i64; MAX_ARITY] {
        &self.words
    }
}

impl fmt::Debug for LoweredArgs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoweredArgs")
            .field("arity", &self.arity)
            .field("words", &self.words())
            .finish_non_exhaustive()
    }
}

/// Copy `bytes` into a C string, stopping at the first NUL.
#[must_use]
pub fn nul_terminated(bytes: &[u8]) -> CString {
    let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    // `end` excludes every NUL.
    CString::new(&bytes[..end]).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use std::ffi::{CStr, c_char};

    use super::*;

    #[test]
    fn test_lower_scalars() {
        let args = [
            ProbeArg::Null,
            ProbeArg::Bool(true),
            ProbeArg::Char('A'),
            ProbeArg::Int(-5),
            ProbeArg::UInt(u64::MAX),
            ProbeArg::Float(1.5),
        ];
        let lowered = LoweredArgs::new(&args).unwrap();
        assert_eq!(lowered.arity(), Arity::A6);
        assert_eq!(lowered.words()[..4], [0, 1, 65, -5]);
        assert_eq!(lowered.words()[4], -1);
        assert_eq!(lowered.words()[5].to_ne_bytes(), 1.5f64.to_bits().to_ne_bytes());
    }

    #[test]
    fn test_lower_string_points_at_copy() {
        let args = [ProbeArg::from("hello"), ProbeArg::from(String::from("wo\0rld"))];
        let lowered = LoweredArgs::new(&args).unwrap();

        let first = unsafe { CStr::from_ptr(lowered.words()[0] as *const c_char) };
        assert_eq!(first.to_bytes(), b"hello");

        let second = unsafe { CStr::from_ptr(lowered.words()[1] as *const c_char) };
        assert_eq!(second.to_bytes(), b"wo");
    }

    #[test]
    fn test_lower_rejects_eleven() {
        let args = vec![ProbeArg::Int(0); MAX_ARITY + 1];
        let err = LoweredArgs::new(&args).unwrap_err();
        assert_eq!(err, ArityError::TooMany { count: 11 });
    }

    #[test]
    fn test_padding_is_zero() {
        let lowered = LoweredArgs::new(&[ProbeArg::Int(7)]).unwrap();
        assert_eq!(lowered.padded()[0], 7);
        assert!(lowered.padded()[1..].iter().all(|&w| w == 0));
    }

    #[test]
    fn test_conversions() {
        assert_eq!(ProbeArg::from(3u8), ProbeArg::UInt(3));
        assert_eq!(ProbeArg::from(-3i32), ProbeArg::Int(-3));
        assert_eq!(ProbeArg::from(None::<i32>), ProbeArg::Null);
        assert_eq!(ProbeArg::from(Some("x")).as_str(), Some("x"));
        assert_eq!(ProbeArg::from('z').kind(), "char");
    }
}
