//! Output sink and literal pool
//!
//! The generator never writes output itself. Statement fragments go to a
//! [`Sink`], and every non-empty literal is interned there so identical
//! values share one pooled constant. [`PhpWriter`] is the in-memory
//! implementation used for one compilation unit.

use std::collections::HashMap;

/// Literal value that can be pooled as a boxed `Value` constant
#[derive(Debug, Clone, PartialEq)]
pub enum PoolValue {
    Long(i64),
    Double(f64),
    Str(String),
}

/// Dedup key: doubles compare by bit pattern so `NaN` interns once and
/// `0.0` and `-0.0` stay distinct.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum PoolKey {
    Long(i64),
    Double(u64),
    Str(String),
}

impl From<&PoolValue> for PoolKey {
    fn from(value: &PoolValue) -> Self {
        match value {
            PoolValue::Long(v) => PoolKey::Long(*v),
            PoolValue::Double(d) => PoolKey::Double(d.to_bits()),
            PoolValue::Str(s) => PoolKey::Str(s.clone()),
        }
    }
}

/// Consumer of generated code
pub trait Sink {
    /// Append one fragment of output
    fn emit_fragment(&mut self, text: &str);

    /// Identifier of the pooled boxed constant for `value`. Interning an
    /// equal value again returns the same identifier.
    fn intern_value(&mut self, value: &PoolValue) -> String;

    /// Identifier of the pooled raw string constant for `value`
    fn intern_string(&mut self, value: &str) -> String;

    /// Identifier of the pooled class reference for `name`
    fn intern_class_reference(&mut self, name: &str) -> String;
}

/// Insertion-ordered, value-deduplicated pool
#[derive(Debug)]
struct Pool<K> {
    prefix: &'static str,
    entries: Vec<K>,
    index: HashMap<K, usize>,
}

impl<K: Clone + Eq + std::hash::Hash> Pool<K> {
    fn new(prefix: &'static str) -> Self {
        Self {
            prefix,
            entries: Vec::new(),
            index: HashMap::new(),
        }
    }

    fn intern(&mut self, key: K) -> String {
        let id = match self.index.get(&key) {
            Some(&id) => id,
            None => {
                let id = self.entries.len();
                self.entries.push(key.clone());
                self.index.insert(key, id);
                id
            }
        };
        format!("{}{}", self.prefix, id)
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}

/// In-memory sink for one compilation unit
#[derive(Debug)]
pub struct PhpWriter {
    body: String,
    values: Pool<PoolKey>,
    strings: Pool<String>,
    classes: Pool<String>,
}

impl Default for PhpWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl PhpWriter {
    pub fn new() -> Self {
        Self {
            body: String::new(),
            values: Pool::new("_C"),
            strings: Pool::new("_S"),
            classes: Pool::new("_K"),
        }
    }

    /// Total number of pooled constants
    pub fn pool_len(&self) -> usize {
        self.values.len() + self.strings.len() + self.classes.len()
    }

    /// Emitted fragments without the pool
    pub fn body(&self) -> &str {
        &self.body
    }

    /// Pool declarations, one `const` item per entry
    pub fn render_pool(&self) -> String {
        let mut out = String::new();
        for (i, key) in self.values.entries.iter().enumerate() {
            let init = match key {
                PoolKey::Long(v) => format!("Value::from_long({})", long_literal(*v)),
                PoolKey::Double(bits) => {
                    format!("Value::from_double({})", double_literal(f64::from_bits(*bits)))
                }
                PoolKey::Str(s) => format!("Value::from_static({:?})", s),
            };
            out.push_str(&format!("const _C{}: Value = {};\n", i, init));
        }
        for (i, s) in self.strings.entries.iter().enumerate() {
            out.push_str(&format!(
                "const _S{}: PhpStr = PhpStr::from_static({:?});\n",
                i, s
            ));
        }
        for (i, name) in self.classes.entries.iter().enumerate() {
            out.push_str(&format!(
                "const _K{}: ClassRef = ClassRef::new({:?});\n",
                i, name
            ));
        }
        out
    }

    /// Complete module source: prelude import, pool, then the body
    pub fn finish(&self) -> String {
        let mut out = String::from("use subset_php_runtime::prelude::*;\n\n");
        let pool = self.render_pool();
        if !pool.is_empty() {
            out.push_str(&pool);
            out.push('\n');
        }
        out.push_str(&self.body);
        out
    }
}

impl Sink for PhpWriter {
    fn emit_fragment(&mut self, text: &str) {
        self.body.push_str(text);
    }

    fn intern_value(&mut self, value: &PoolValue) -> String {
        self.values.intern(PoolKey::from(value))
    }

    fn intern_string(&mut self, value: &str) -> String {
        self.strings.intern(value.to_string())
    }

    fn intern_class_reference(&mut self, name: &str) -> String {
        self.classes.intern(name.to_string())
    }
}

/// Rust source for an `i64` constant
pub(crate) fn long_literal(v: i64) -> String {
    if v == i64::MIN {
        "i64::MIN".to_string()
    } else {
        format!("{}_i64", v)
    }
}

/// Rust source for an `f64` constant
pub(crate) fn double_literal(d: f64) -> String {
    if d.is_nan() {
        "f64::NAN".to_string()
    } else if d.is_infinite() {
        if d > 0.0 {
            "f64::INFINITY".to_string()
        } else {
            "f64::NEG_INFINITY".to_string()
        }
    } else {
        format!("{:?}_f64", d)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interning_is_idempotent() {
        let mut w = PhpWriter::new();
        let a = w.intern_value(&PoolValue::Str("foo".to_string()));
        for _ in 0..10 {
            assert_eq!(w.intern_value(&PoolValue::Str("foo".to_string())), a);
        }
        assert_eq!(a, "_C0");
        assert_eq!(w.pool_len(), 1);
    }

    #[test]
    fn test_pools_are_separate_and_ordered() {
        let mut w = PhpWriter::new();
        assert_eq!(w.intern_value(&PoolValue::Long(5)), "_C0");
        assert_eq!(w.intern_value(&PoolValue::Double(5.0)), "_C1");
        assert_eq!(w.intern_string("foo"), "_S0");
        assert_eq!(w.intern_string("bar"), "_S1");
        assert_eq!(w.intern_class_reference("Foo"), "_K0");
        assert_eq!(w.intern_value(&PoolValue::Long(5)), "_C0");
        assert_eq!(w.pool_len(), 5);
    }

    #[test]
    fn test_nan_interns_once() {
        let mut w = PhpWriter::new();
        let a = w.intern_value(&PoolValue::Double(f64::NAN));
        let b = w.intern_value(&PoolValue::Double(f64::NAN));
        assert_eq!(a, b);
        assert_ne!(
            w.intern_value(&PoolValue::Double(0.0)),
            w.intern_value(&PoolValue::Double(-0.0))
        );
    }

    #[test]
    fn test_render_pool() {
        let mut w = PhpWriter::new();
        w.intern_value(&PoolValue::Long(i64::MIN));
        w.intern_value(&PoolValue::Double(1.5));
        w.intern_value(&PoolValue::Str("a\"b".to_string()));
        w.intern_string("x");
        w.intern_class_reference("Foo");
        insta::assert_snapshot!(w.render_pool(), @r###"
        const _C0: Value = Value::from_long(i64::MIN);
        const _C1: Value = Value::from_double(1.5_f64);
        const _C2: Value = Value::from_static("a\"b");
        const _S0: PhpStr = PhpStr::from_static("x");
        const _K0: ClassRef = ClassRef::new("Foo");
        "###);
    }

    #[test]
    fn test_literals() {
        assert_eq!(long_literal(-3), "-3_i64");
        assert_eq!(double_literal(2.0), "2.0_f64");
        assert_eq!(double_literal(1e300), "1e300_f64");
        assert_eq!(double_literal(f64::NEG_INFINITY), "f64::NEG_INFINITY");
    }
}
