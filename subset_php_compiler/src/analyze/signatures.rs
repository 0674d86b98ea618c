//! Callee parameter-passing signatures
//!
//! Argument analysis needs to know which parameters take their argument by
//! reference. The program model answers through [`SignatureLookup`]; a
//! callee without a known signature is treated as taking every argument by
//! reference.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::{CompileError, CompileResult};

/// By-reference shape of a callee's parameter list
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signature {
    /// One flag per declared parameter
    #[serde(default)]
    pub by_ref: Vec<bool>,
    /// Arguments past the declared list are by reference
    #[serde(default)]
    pub rest_by_ref: bool,
}

impl Signature {
    /// All parameters by value
    pub fn by_value() -> Self {
        Self::default()
    }

    /// By-value except the listed parameter positions
    pub fn with_refs(positions: &[usize]) -> Self {
        let len = positions.iter().map(|p| p + 1).max().unwrap_or(0);
        let mut by_ref = vec![false; len];
        for &p in positions {
            by_ref[p] = true;
        }
        Self {
            by_ref,
            rest_by_ref: false,
        }
    }

    pub fn is_by_ref(&self, index: usize) -> bool {
        self.by_ref.get(index).copied().unwrap_or(self.rest_by_ref)
    }
}

/// Program-model lookup of callee signatures
pub trait SignatureLookup {
    fn function_signature(&self, name: &str) -> Option<Signature>;

    /// `class` is `None` for instance calls whose receiver class is unknown
    fn method_signature(&self, class: Option<&str>, name: &str) -> Option<Signature>;

    /// Stable digest of the table contents, part of the compiled-unit
    /// cache key.
    fn fingerprint(&self) -> String {
        String::new()
    }
}

/// Signature table keyed by lowercase function name. Method entries use
/// `class::method`; instance calls look up `*::method`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignatureTable {
    #[serde(default)]
    functions: BTreeMap<String, Signature>,
    #[serde(default)]
    methods: BTreeMap<String, Signature>,
}

const BY_VALUE_BUILTINS: &[&str] = &[
    "strlen", "count", "sizeof", "substr", "strpos", "implode", "explode", "join", "trim",
    "ltrim", "rtrim", "strtolower", "strtoupper", "sprintf", "printf",
    "print_r", "var_dump", "echo", "intval", "floatval", "strval", "boolval", "abs", "max",
    "min", "floor", "ceil", "round", "sqrt", "pow", "in_array", "array_keys",
    "array_values", "array_merge", "array_key_exists", "array_map", "array_filter",
    "array_slice", "array_reverse", "array_search", "json_encode", "json_decode",
    "htmlspecialchars", "urlencode", "md5", "sha1", "time", "microtime", "date",
    "function_exists", "class_exists", "method_exists", "defined", "define", "ord", "chr",
    "str_repeat", "ucfirst", "lcfirst", "nl2br", "number_format", "range", "serialize",
    "unserialize", "var_export", "gettype", "is_callable", "call_user_func",
    "call_user_func_array", "func_num_args", "func_get_args", "compact", "get_defined_vars",
    "get_class", "spl_object_hash",
];

/// Builtins with by-reference parameters: (name, positions)
const BY_REF_BUILTINS: &[(&str, &[usize])] = &[
    ("sort", &[0]),
    ("rsort", &[0]),
    ("usort", &[0]),
    ("uasort", &[0]),
    ("uksort", &[0]),
    ("ksort", &[0]),
    ("krsort", &[0]),
    ("asort", &[0]),
    ("arsort", &[0]),
    ("shuffle", &[0]),
    ("array_push", &[0]),
    ("array_pop", &[0]),
    ("array_shift", &[0]),
    ("array_unshift", &[0]),
    ("array_splice", &[0]),
    ("array_walk", &[0]),
    ("end", &[0]),
    ("reset", &[0]),
    ("next", &[0]),
    ("prev", &[0]),
    ("current", &[0]),
    ("key", &[0]),
    ("preg_match", &[2]),
    ("preg_match_all", &[2]),
    ("preg_replace", &[4]),
    ("str_replace", &[3]),
    ("settype", &[0]),
    ("extract", &[0]),
    ("parse_str", &[1]),
];

impl SignatureTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Table of common PHP builtins
    pub fn builtins() -> Self {
        let mut table = Self::new();
        for name in BY_VALUE_BUILTINS {
            table.add_function(name, Signature::by_value());
        }
        for (name, positions) in BY_REF_BUILTINS {
            table.add_function(name, Signature::with_refs(positions));
        }
        table
    }

    pub fn add_function(&mut self, name: &str, signature: Signature) {
        self.functions.insert(name.to_ascii_lowercase(), signature);
    }

    /// Register a method; `class` `None` registers it for instance calls
    pub fn add_method(&mut self, class: Option<&str>, name: &str, signature: Signature) {
        self.methods.insert(method_key(class, name), signature);
    }

    /// Load a table from JSON of the form
    /// `{"functions": {"name": {"by_ref": [true]}}, "methods": {...}}`
    pub fn from_json_str(json: &str) -> CompileResult<Self> {
        let table: SignatureTable = serde_json::from_str(json)
            .map_err(|e| CompileError::Config(format!("invalid signature table: {}", e)))?;
        let mut normalized = SignatureTable::new();
        for (name, signature) in table.functions {
            normalized.add_function(&name, signature);
        }
        for (key, signature) in table.methods {
            normalized.methods.insert(key.to_ascii_lowercase(), signature);
        }
        Ok(normalized)
    }

    /// Add every entry of `other`, replacing existing ones
    pub fn extend(&mut self, other: SignatureTable) {
        self.functions.extend(other.functions);
        self.methods.extend(other.methods);
    }
}

fn method_key(class: Option<&str>, name: &str) -> String {
    format!("{}::{}", class.unwrap_or("*"), name).to_ascii_lowercase()
}

impl SignatureLookup for SignatureTable {
    fn function_signature(&self, name: &str) -> Option<Signature> {
        self.functions.get(&name.to_ascii_lowercase()).cloned()
    }

    fn method_signature(&self, class: Option<&str>, name: &str) -> Option<Signature> {
        if class.is_some() {
            if let Some(signature) = self.methods.get(&method_key(class, name)) {
                return Some(signature.clone());
            }
        }
        self.methods.get(&method_key(None, name)).cloned()
    }

    fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        match serde_json::to_vec(self) {
            Ok(bytes) => hasher.update(&bytes),
            Err(_) => return String::new(),
        }
        format!("{:x}", hasher.finalize())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_positions() {
        let table = SignatureTable::builtins();
        let sort = table.function_signature("SORT").unwrap();
        assert!(sort.is_by_ref(0));
        let preg = table.function_signature("preg_match").unwrap();
        assert!(!preg.is_by_ref(0));
        assert!(!preg.is_by_ref(1));
        assert!(preg.is_by_ref(2));
        let strlen = table.function_signature("strlen").unwrap();
        assert!(!strlen.is_by_ref(0));
        assert!(table.function_signature("my_func").is_none());
    }

    #[test]
    fn test_method_lookup_falls_back_to_any_class() {
        let mut table = SignatureTable::new();
        table.add_method(None, "fill", Signature::with_refs(&[0]));
        table.add_method(Some("Pool"), "fill", Signature::by_value());
        assert!(!table.method_signature(Some("pool"), "fill").unwrap().is_by_ref(0));
        assert!(table.method_signature(Some("Other"), "FILL").unwrap().is_by_ref(0));
        assert!(table.method_signature(None, "fill").unwrap().is_by_ref(0));
    }

    #[test]
    fn test_json_table() {
        let json = r#"{"functions": {"Swap": {"by_ref": [true, true]}, "log_all": {"rest_by_ref": true}}}"#;
        let table = SignatureTable::from_json_str(json).unwrap();
        assert!(table.function_signature("swap").unwrap().is_by_ref(1));
        assert!(table.function_signature("log_all").unwrap().is_by_ref(7));
        assert!(SignatureTable::from_json_str("{\"functions\": 3}").is_err());
    }

    #[test]
    fn test_fingerprint_tracks_contents() {
        let a = SignatureTable::builtins();
        let mut b = SignatureTable::builtins();
        assert_eq!(a.fingerprint(), b.fingerprint());
        assert_eq!(a.fingerprint().len(), 64);
        b.add_function("swap", Signature::with_refs(&[0, 1]));
        assert_ne!(a.fingerprint(), b.fingerprint());
    }
}
