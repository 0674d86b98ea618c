//! PHP string values
//!
//! `PhpStr` is either a `'static` literal (the form compiled constants use,
//! so they can live in `const` items) or a shared heap string.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::Rc;

use crate::convert;

/// Immutable PHP string
#[derive(Clone)]
pub enum PhpStr {
    /// Compiled literal
    Static(&'static str),
    /// Runtime-built string
    Shared(Rc<str>),
}

impl PhpStr {
    /// The shared empty string
    pub const EMPTY: PhpStr = PhpStr::Static("");

    /// Wrap a literal
    pub const fn from_static(s: &'static str) -> Self {
        PhpStr::Static(s)
    }

    /// Build from borrowed text
    pub fn new(s: &str) -> Self {
        if s.is_empty() {
            PhpStr::EMPTY
        } else {
            PhpStr::Shared(Rc::from(s))
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            PhpStr::Static(s) => s,
            PhpStr::Shared(s) => s,
        }
    }

    pub fn len(&self) -> usize {
        self.as_str().len()
    }

    pub fn is_empty(&self) -> bool {
        self.as_str().is_empty()
    }

    /// String concatenation (`.`)
    pub fn concat(&self, other: &PhpStr) -> PhpStr {
        if other.is_empty() {
            return self.clone();
        }
        if self.is_empty() {
            return other.clone();
        }
        let mut s = String::with_capacity(self.len() + other.len());
        s.push_str(self.as_str());
        s.push_str(other.as_str());
        PhpStr::from(s)
    }

    pub fn from_long(v: i64) -> PhpStr {
        PhpStr::from(v.to_string())
    }

    pub fn from_double(v: f64) -> PhpStr {
        PhpStr::from(convert::double_to_string(v))
    }

    /// `true` converts to `"1"`, `false` to `""`
    pub fn from_bool(v: bool) -> PhpStr {
        if v {
            PhpStr::Static("1")
        } else {
            PhpStr::EMPTY
        }
    }

    /// `""` and `"0"` are false, everything else is true
    pub fn to_boolean(&self) -> bool {
        let s = self.as_str();
        !(s.is_empty() || s == "0")
    }

    pub fn to_long(&self) -> i64 {
        convert::string_to_long(self.as_str())
    }

    pub fn to_double(&self) -> f64 {
        convert::string_to_double(self.as_str())
    }

    /// Character at `index`, or the empty string when out of range
    pub fn char_at(&self, index: i64) -> PhpStr {
        if index < 0 {
            return PhpStr::EMPTY;
        }
        match self.as_str().chars().nth(index as usize) {
            Some(c) => PhpStr::from(c.to_string()),
            None => PhpStr::EMPTY,
        }
    }

    /// Replace the character at `index` with the first character of `with`,
    /// padding with spaces when `index` is past the end.
    pub fn with_char_at(&self, index: i64, with: &PhpStr) -> PhpStr {
        if index < 0 {
            return self.clone();
        }
        let index = index as usize;
        let mut chars: Vec<char> = self.as_str().chars().collect();
        while chars.len() <= index {
            chars.push(' ');
        }
        chars[index] = with.as_str().chars().next().unwrap_or(' ');
        PhpStr::from(chars.into_iter().collect::<String>())
    }
}

impl From<String> for PhpStr {
    fn from(s: String) -> Self {
        if s.is_empty() {
            PhpStr::EMPTY
        } else {
            PhpStr::Shared(Rc::from(s))
        }
    }
}

impl From<&str> for PhpStr {
    fn from(s: &str) -> Self {
        PhpStr::new(s)
    }
}

impl PartialEq for PhpStr {
    fn eq(&self, other: &Self) -> bool {
        self.as_str() == other.as_str()
    }
}

impl Eq for PhpStr {}

impl PartialOrd for PhpStr {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for PhpStr {
    fn cmp(&self, other: &Self) -> Ordering {
        self.as_str().as_bytes().cmp(other.as_str().as_bytes())
    }
}

impl Hash for PhpStr {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.as_str().hash(state)
    }
}

impl fmt::Debug for PhpStr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.as_str())
    }
}

impl fmt::Display for PhpStr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
