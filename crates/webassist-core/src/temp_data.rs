//! Values that survive until they are read
//!
//! [`TempData`] holds JSON values keyed by name. Reading a value with
//! [`TempData::get`] marks it for deletion at the end of the request; values
//! not read (or explicitly kept) are carried over to the next request through
//! the session.

use crate::session::Session;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::{HashMap, HashSet};

/// Session key under which temp data is persisted
pub const TEMP_DATA_SESSION_KEY: &str = "__TempData";

/// Read-once values carried between requests
#[derive(Debug, Clone, Default)]
pub struct TempData {
    values: HashMap<String, String>,
    read: HashSet<String>,
}

impl TempData {
    /// Empty temp data
    pub fn new() -> Self {
        Self::default()
    }

    /// Deserialize a value and mark it for deletion
    pub fn get<T: DeserializeOwned>(&mut self, key: &str) -> Option<T> {
        let raw = self.values.get(key)?;
        self.read.insert(key.to_string());
        serde_json::from_str(raw).ok()
    }

    /// Deserialize a value without marking it
    pub fn peek<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.values
            .get(key)
            .and_then(|raw| serde_json::from_str(raw).ok())
    }

    /// Serialize and store a value
    pub fn set<T: Serialize + ?Sized>(
        &mut self,
        key: impl Into<String>,
        value: &T,
    ) -> Result<(), serde_json::Error> {
        let key = key.into();
        let raw = serde_json::to_string(value)?;
        self.read.remove(&key);
        self.values.insert(key, raw);
        Ok(())
    }

    /// Keep a read value for the next request
    pub fn keep(&mut self, key: &str) {
        self.read.remove(key);
    }

    /// Keep every read value for the next request
    pub fn keep_all(&mut self) {
        self.read.clear();
    }

    /// Remove `key`, returning whether it was present
    pub fn remove(&mut self, key: &str) -> bool {
        self.read.remove(key);
        self.values.remove(key).is_some()
    }

    /// Whether `key` is set
    pub fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Number of values held
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether no value is held
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Load the values carried over in `session`
    pub fn load_from(session: &Session) -> Self {
        let values = session
            .get_json::<HashMap<String, String>>(TEMP_DATA_SESSION_KEY)
            .unwrap_or_default();
        Self {
            values,
            read: HashSet::new(),
        }
    }

    /// Persist the values that were not read into `session`
    pub fn save_to(&self, session: &Session) -> Result<(), serde_json::Error> {
        let retained: HashMap<&String, &String> = self
            .values
            .iter()
            .filter(|(key, _)| !self.read.contains(*key))
            .collect();

        if retained.is_empty() {
            session.remove(TEMP_DATA_SESSION_KEY);
            return Ok(());
        }
        session.set_json(TEMP_DATA_SESSION_KEY, &retained)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Notice {
        text: String,
    }

    fn notice(text: &str) -> Notice {
        Notice { text: text.into() }
    }

    #[test]
    fn read_values_do_not_survive_save() {
        let session = Session::new();
        let mut temp = TempData::new();
        temp.set("flash", &notice("saved")).unwrap();
        temp.set("other", &1).unwrap();
        temp.save_to(&session).unwrap();

        let mut next = TempData::load_from(&session);
        assert_eq!(next.get::<Notice>("flash"), Some(notice("saved")));
        next.save_to(&session).unwrap();

        let after = TempData::load_from(&session);
        assert!(!after.contains_key("flash"));
        assert_eq!(after.peek::<i32>("other"), Some(1));
    }

    #[test]
    fn peek_and_keep_retain_values() {
        let session = Session::new();
        let mut temp = TempData::new();
        temp.set("a", &notice("peeked")).unwrap();
        temp.set("b", &notice("kept")).unwrap();

        assert_eq!(temp.peek::<Notice>("a"), Some(notice("peeked")));
        assert!(temp.get::<Notice>("b").is_some());
        temp.keep("b");
        temp.save_to(&session).unwrap();

        let after = TempData::load_from(&session);
        assert_eq!(after.len(), 2);
    }

    #[test]
    fn empty_temp_data_clears_session_key() {
        let session = Session::new();
        let mut temp = TempData::new();
        temp.set("x", &1).unwrap();
        temp.save_to(&session).unwrap();
        assert!(session.contains_key(TEMP_DATA_SESSION_KEY));

        let mut temp = TempData::load_from(&session);
        let _ = temp.get::<i32>("x");
        temp.save_to(&session).unwrap();
        assert!(!session.contains_key(TEMP_DATA_SESSION_KEY));
    }

    #[test]
    fn missing_or_mismatched_type_is_none() {
        let mut temp = TempData::new();
        temp.set("n", &"text").unwrap();
        assert_eq!(temp.get::<i32>("n"), None);
        assert_eq!(temp.get::<i32>("absent"), None);
    }
}
