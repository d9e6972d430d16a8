//! Value tree produced by the literal parser.
//!
//! Tables preserve insertion order. The extraction engine never re-emits a
//! parsed table (write-back goes through raw-text substitution), but order
//! still matters for deterministic iteration and for any future re-emit.

/// A table key: Lua literal tables in mission archives use integer keys
/// (`[1]`) and string keys (`["DictKey_..."]` or bare `name =`).
///
/// `["1"]` stays a string key, distinct from `[1]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum LuaKey {
    Int(i64),
    Str(String),
}

impl LuaKey {
    pub fn str(s: impl Into<String>) -> Self {
        Self::Str(s.into())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum LuaValue {
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    Table(LuaTable),
}

impl LuaValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_table(&self) -> Option<&LuaTable> {
        match self {
            Self::Table(t) => Some(t),
            _ => None,
        }
    }
}

/// Ordered key-value container for parsed tables.
///
/// Kept as a vec of pairs rather than a hash map so insertion order survives;
/// duplicate keys follow Lua literal semantics (last occurrence wins, the
/// original position is kept).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LuaTable {
    entries: Vec<(LuaKey, LuaValue)>,
}

impl LuaTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn insert(&mut self, key: LuaKey, value: LuaValue) {
        if let Some(slot) = self.entries.iter_mut().find(|(k, _)| *k == key) {
            slot.1 = value;
        } else {
            self.entries.push((key, value));
        }
    }

    pub fn get(&self, key: &LuaKey) -> Option<&LuaValue> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    /// Look up a string-keyed field, the common case for mission fields.
    pub fn field(&self, name: &str) -> Option<&LuaValue> {
        self.entries.iter().find_map(|(k, v)| match k {
            LuaKey::Str(s) if s == name => Some(v),
            _ => None,
        })
    }

    /// Look up a string-keyed field and require a string value.
    pub fn field_str(&self, name: &str) -> Option<&str> {
        self.field(name).and_then(LuaValue::as_str)
    }

    /// Look up a string-keyed field and require a table value.
    pub fn field_table(&self, name: &str) -> Option<&LuaTable> {
        self.field(name).and_then(LuaValue::as_table)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&LuaKey, &LuaValue)> {
        self.entries.iter().map(|(k, v)| (k, v))
    }

    pub fn values(&self) -> impl Iterator<Item = &LuaValue> {
        self.entries.iter().map(|(_, v)| v)
    }
}

impl<'a> IntoIterator for &'a LuaTable {
    type Item = &'a (LuaKey, LuaValue);
    type IntoIter = std::slice::Iter<'a, (LuaKey, LuaValue)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
