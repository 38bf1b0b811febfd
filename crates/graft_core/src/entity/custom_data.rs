use crate::access::Value;

/// Ordered key-value store for primitive item data.
///
/// Writes overwrite by key; only bool, int, float and string values are
/// accepted.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CustomDataStore {
    entries: Vec<(String, Value)>,
}

impl CustomDataStore {
    /// Store `value` under `key`. Non-primitive values are handed back.
    pub fn set(&mut self, key: &str, value: impl Into<Value>) -> Result<(), Value> {
        let value = value.into();
        if !value.is_primitive() {
            return Err(value);
        }
        self.insert(key, value);
        Ok(())
    }

    pub fn set_int(&mut self, key: &str, value: i64) {
        self.insert(key, Value::Int(value));
    }

    pub fn set_float(&mut self, key: &str, value: f64) {
        self.insert(key, Value::Float(value));
    }

    pub fn set_bool(&mut self, key: &str, value: bool) {
        self.insert(key, Value::Bool(value));
    }

    pub fn set_str(&mut self, key: &str, value: impl Into<String>) {
        self.insert(key, Value::Str(value.into()));
    }

    fn insert(&mut self, key: &str, value: Value) {
        match self.entries.iter_mut().find(|(k, _)| k == key) {
            Some((_, slot)) => *slot = value,
            None => self.entries.push((key.to_string(), value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn get_int(&self, key: &str) -> Option<i64> {
        match self.get(key) {
            Some(Value::Int(v)) => Some(*v),
            _ => None,
        }
    }

    pub fn get_float(&self, key: &str) -> Option<f64> {
        match self.get(key) {
            Some(Value::Float(v)) => Some(*v),
            Some(Value::Int(v)) => Some(*v as f64),
            _ => None,
        }
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        match self.get(key) {
            Some(Value::Bool(v)) => Some(*v),
            _ => None,
        }
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        match self.get(key) {
            Some(Value::Str(v)) => Some(v),
            _ => None,
        }
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        let index = self.entries.iter().position(|(k, _)| k == key)?;
        Some(self.entries.remove(index).1)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
