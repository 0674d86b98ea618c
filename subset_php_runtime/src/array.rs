//! Ordered PHP arrays
//!
//! `PhpArray` keeps insertion order and maps integer or string keys to
//! values. `Value::Array` holds it behind an `Rc`; writers go through
//! `Rc::make_mut`, which gives assignment its copy-on-write semantics.

use std::collections::HashMap;

use crate::convert;
use crate::string::PhpStr;
use crate::value::Value;

/// Array key after PHP key normalization
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ArrayKey {
    Int(i64),
    Str(PhpStr),
}

impl ArrayKey {
    /// Normalize a value used as a key: canonical integer strings, floats
    /// and booleans become integer keys, null becomes `""`.
    pub fn from_value(key: &Value) -> ArrayKey {
        match key {
            Value::Long(v) => ArrayKey::Int(*v),
            Value::Double(d) => ArrayKey::Int(convert::double_to_long(*d)),
            Value::Bool(b) => ArrayKey::Int(i64::from(*b)),
            Value::Null => ArrayKey::Str(PhpStr::EMPTY),
            Value::Str(s) => match convert::canonical_int_key(s.as_str()) {
                Some(i) => ArrayKey::Int(i),
                None => ArrayKey::Str(s.clone()),
            },
            Value::Ref(var) => ArrayKey::from_value(&var.to_value()),
            other => ArrayKey::Str(other.to_string_value()),
        }
    }

    pub fn to_value(&self) -> Value {
        match self {
            ArrayKey::Int(i) => Value::Long(*i),
            ArrayKey::Str(s) => Value::Str(s.clone()),
        }
    }
}

/// Insertion-ordered hash array
#[derive(Debug, Clone, Default)]
pub struct PhpArray {
    entries: Vec<(ArrayKey, Value)>,
    index: HashMap<ArrayKey, usize>,
    next_index: i64,
    cursor: usize,
}

impl PhpArray {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, key: &ArrayKey) -> Option<&Value> {
        self.index.get(key).map(|&i| &self.entries[i].1)
    }

    pub fn contains_key(&self, key: &ArrayKey) -> bool {
        self.index.contains_key(key)
    }

    fn note_key(&mut self, key: &ArrayKey) {
        if let ArrayKey::Int(i) = key {
            if *i >= self.next_index {
                self.next_index = i.saturating_add(1);
            }
        }
    }

    /// Mutable slot for `key`, inserting null when absent
    pub fn slot_mut(&mut self, key: ArrayKey) -> &mut Value {
        let pos = match self.index.get(&key) {
            Some(&pos) => pos,
            None => {
                self.note_key(&key);
                self.entries.push((key.clone(), Value::Null));
                self.index.insert(key, self.entries.len() - 1);
                self.entries.len() - 1
            }
        };
        &mut self.entries[pos].1
    }

    /// Mutable slot for a freshly appended element
    pub fn append_slot(&mut self) -> &mut Value {
        let key = ArrayKey::Int(self.next_index);
        self.slot_mut(key)
    }

    /// Store `value`, writing through an element that is a reference
    pub fn insert(&mut self, key: ArrayKey, value: Value) {
        let slot = self.slot_mut(key);
        match slot {
            Value::Ref(var) => {
                var.set(value);
            }
            _ => *slot = value,
        }
    }

    pub fn push(&mut self, value: Value) {
        let key = ArrayKey::Int(self.next_index);
        self.insert(key, value);
    }

    pub fn remove(&mut self, key: &ArrayKey) -> Option<Value> {
        let pos = self.index.remove(key)?;
        let (_, value) = self.entries.remove(pos);
        for (i, (k, _)) in self.entries.iter().enumerate().skip(pos) {
            self.index.insert(k.clone(), i);
        }
        if self.cursor > pos {
            self.cursor -= 1;
        }
        Some(value)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ArrayKey, &Value)> {
        self.entries.iter().map(|(k, v)| (k, v))
    }

    /// Current element of the internal cursor, advancing it (`each`)
    pub fn next_entry(&mut self) -> Option<(ArrayKey, Value)> {
        let (key, value) = self.entries.get(self.cursor)?;
        let entry = (key.clone(), value.to_value());
        self.cursor += 1;
        Some(entry)
    }

    pub fn reset_cursor(&mut self) {
        self.cursor = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_normalization() {
        assert_eq!(ArrayKey::from_value(&Value::from_static("12")), ArrayKey::Int(12));
        assert_eq!(
            ArrayKey::from_value(&Value::from_static("012")),
            ArrayKey::Str(PhpStr::new("012"))
        );
        assert_eq!(ArrayKey::from_value(&Value::from_double(2.7)), ArrayKey::Int(2));
        assert_eq!(ArrayKey::from_value(&Value::TRUE), ArrayKey::Int(1));
        assert_eq!(ArrayKey::from_value(&Value::NULL), ArrayKey::Str(PhpStr::EMPTY));
    }

    #[test]
    fn test_append_uses_next_index() {
        let mut a = PhpArray::new();
        a.insert(ArrayKey::Int(5), Value::from_long(1));
        a.push(Value::from_long(2));
        assert_eq!(a.get(&ArrayKey::Int(6)).and_then(Value::as_long), Some(2));
        a.insert(ArrayKey::Str(PhpStr::new("x")), Value::from_long(3));
        a.push(Value::from_long(4));
        assert!(a.contains_key(&ArrayKey::Int(7)));
    }

    #[test]
    fn test_remove_keeps_order() {
        let mut a = PhpArray::new();
        a.push(Value::from_long(10));
        a.push(Value::from_long(20));
        a.push(Value::from_long(30));
        assert!(a.remove(&ArrayKey::Int(1)).is_some());
        let keys: Vec<_> = a.iter().map(|(k, _)| k.clone()).collect();
        assert_eq!(keys, vec![ArrayKey::Int(0), ArrayKey::Int(2)]);
        assert_eq!(a.get(&ArrayKey::Int(2)).and_then(Value::as_long), Some(30));
        a.push(Value::from_long(40));
        assert!(a.contains_key(&ArrayKey::Int(3)));
    }

    #[test]
    fn test_each_cursor() {
        let mut a = PhpArray::new();
        a.push(Value::from_static("a"));
        a.push(Value::from_static("b"));
        assert_eq!(a.next_entry().map(|(k, _)| k), Some(ArrayKey::Int(0)));
        assert_eq!(a.next_entry().map(|(k, _)| k), Some(ArrayKey::Int(1)));
        assert!(a.next_entry().is_none());
    }
}
