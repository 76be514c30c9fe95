use std::collections::BTreeMap;
use std::fmt;
use serde::de::{self, Deserializer, MapAccess, SeqAccess, Visitor};
use serde::{Serialize, Deserialize};

/// The host's generic interchange value.
///
/// Every request argument and every result crossing the agent boundary is a
/// `Value`. Maps are ordered by key and keys are unique. `Void` is the
/// acknowledgement of a command that has nothing to return; it serializes to
/// `null` like `Null` and is never produced by deserialization.
///
/// Numbers with no `Integer` form (floats, integers beyond `i64`) read as
/// `Null`, so one such entry does not reject the surrounding list or map.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Boolean(bool),
    Integer(i64),
    String(String),
    List(Vec<Value>),
    Map(BTreeMap<Value, Value>),
    Void,
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&BTreeMap<Value, Value>> {
        match self {
            Value::Map(map) => Some(map),
            _ => None,
        }
    }

    /// Look up a map entry by string key. Returns `None` for non-maps.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.as_map()?.get(&Value::from(key))
    }

    /// String entry of a map, or `None` when absent or not a string.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key)?.as_str()
    }
}

impl Default for Value {
    fn default() -> Self {
        Value::Null
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Integer(i)
    }
}

impl From<u16> for Value {
    fn from(i: u16) -> Self {
        Value::Integer(i64::from(i))
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Value::List(items.into_iter().map(Into::into).collect())
    }
}

impl<K: Into<Value>, V: Into<Value>> FromIterator<(K, V)> for Value {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Value::Map(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(ValueVisitor)
    }
}

struct ValueVisitor;

impl<'de> Visitor<'de> for ValueVisitor {
    type Value = Value;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("null, a boolean, an integer, a string, a list or a map")
    }

    fn visit_unit<E>(self) -> Result<Value, E>
    where
        E: de::Error,
    {
        Ok(Value::Null)
    }

    fn visit_none<E>(self) -> Result<Value, E>
    where
        E: de::Error,
    {
        Ok(Value::Null)
    }

    fn visit_some<D>(self, deserializer: D) -> Result<Value, D::Error>
    where
        D: Deserializer<'de>,
    {
        Value::deserialize(deserializer)
    }

    fn visit_bool<E>(self, b: bool) -> Result<Value, E>
    where
        E: de::Error,
    {
        Ok(Value::Boolean(b))
    }

    fn visit_i64<E>(self, i: i64) -> Result<Value, E>
    where
        E: de::Error,
    {
        Ok(Value::Integer(i))
    }

    fn visit_u64<E>(self, u: u64) -> Result<Value, E>
    where
        E: de::Error,
    {
        Ok(i64::try_from(u).map_or(Value::Null, Value::Integer))
    }

    fn visit_f64<E>(self, _f: f64) -> Result<Value, E>
    where
        E: de::Error,
    {
        Ok(Value::Null)
    }

    fn visit_str<E>(self, s: &str) -> Result<Value, E>
    where
        E: de::Error,
    {
        Ok(Value::String(s.to_string()))
    }

    fn visit_string<E>(self, s: String) -> Result<Value, E>
    where
        E: de::Error,
    {
        Ok(Value::String(s))
    }

    fn visit_seq<A>(self, mut seq: A) -> Result<Value, A::Error>
    where
        A: SeqAccess<'de>,
    {
        let mut items = Vec::with_capacity(seq.size_hint().unwrap_or(0));
        while let Some(item) = seq.next_element()? {
            items.push(item);
        }
        Ok(Value::List(items))
    }

    fn visit_map<A>(self, mut map: A) -> Result<Value, A::Error>
    where
        A: MapAccess<'de>,
    {
        let mut entries = BTreeMap::new();
        while let Some((key, value)) = map.next_entry::<Value, Value>()? {
            entries.insert(key, value);
        }
        Ok(Value::Map(entries))
    }
}

/// A host term such as `SlpAgent()`, as passed to `otherCommand`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Term {
    pub name: String,
    #[serde(default)]
    pub args: Vec<Value>,
}

impl Term {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            args: Vec::new(),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "nil"),
            Value::Void => Ok(()),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::Integer(i) => write!(f, "{}", i),
            Value::String(s) => write!(f, "{:?}", s),
            Value::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
            Value::Map(map) => {
                write!(f, "$[")?;
                for (i, (k, v)) in map.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}:{}", k, v)?;
                }
                write!(f, "]")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_roundtrip_of_options_map() {
        let json = r#"{"pcServiceType":"service:ldap","pcScopeList":"","count":3,"flag":true,"none":null}"#;
        let value: Value = serde_json::from_str(json).unwrap();

        assert_eq!(value.get_str("pcServiceType"), Some("service:ldap"));
        assert_eq!(value.get_str("pcScopeList"), Some(""));
        assert_eq!(value.get("count").and_then(Value::as_i64), Some(3));
        assert_eq!(value.get("flag").and_then(Value::as_bool), Some(true));
        assert!(value.get("none").unwrap().is_null());
        assert!(value.get("missing").is_none());
    }

    #[test]
    fn test_unrepresentable_numbers_read_as_null() {
        let json = r#"{"pcServiceType":"service:ldap","ratio":0.5,"huge":18446744073709551615,"list":[1,2.5]}"#;
        let value: Value = serde_json::from_str(json).unwrap();

        assert_eq!(value.get_str("pcServiceType"), Some("service:ldap"));
        assert!(value.get("ratio").unwrap().is_null());
        assert!(value.get("huge").unwrap().is_null());
        assert_eq!(
            value.get("list"),
            Some(&Value::List(vec![Value::Integer(1), Value::Null]))
        );
    }

    #[test]
    fn test_void_serializes_as_null() {
        assert_eq!(serde_json::to_string(&Value::Void).unwrap(), "null");
        let back: Value = serde_json::from_str("null").unwrap();
        assert_eq!(back, Value::Null);
    }

    #[test]
    fn test_map_keys_are_ordered_and_unique() {
        let value: Value = vec![("b", 1i64), ("a", 2), ("b", 3)].into_iter().collect();
        let keys: Vec<_> = value.as_map().unwrap().keys().cloned().collect();
        assert_eq!(keys, vec![Value::from("a"), Value::from("b")]);
        assert_eq!(value.get("b").and_then(Value::as_i64), Some(3));
    }

    #[test]
    fn test_display() {
        let value = Value::from(vec!["a", "b"]);
        assert_eq!(value.to_string(), r#"["a", "b"]"#);
        assert_eq!(Value::Null.to_string(), "nil");
    }
}
