// Input record access

use crate::Value;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

/// Something a profile can be verified against.
///
/// `None` means the field is absent from the record.
pub trait Record {
    fn field(&self, name: &str) -> Option<Value>;
}

impl<R: Record + ?Sized> Record for &R {
    fn field(&self, name: &str) -> Option<Value> {
        (**self).field(name)
    }
}

impl Record for HashMap<String, Value> {
    fn field(&self, name: &str) -> Option<Value> {
        self.get(name).cloned()
    }
}

impl Record for BTreeMap<String, Value> {
    fn field(&self, name: &str) -> Option<Value> {
        self.get(name).cloned()
    }
}

impl Record for HashMap<String, String> {
    fn field(&self, name: &str) -> Option<Value> {
        self.get(name).map(|s| Value::String(s.clone()))
    }
}

impl Record for serde_json::Map<String, Value> {
    fn field(&self, name: &str) -> Option<Value> {
        self.get(name).cloned()
    }
}

/// Only objects have fields; any other JSON value is an empty record.
impl Record for Value {
    fn field(&self, name: &str) -> Option<Value> {
        self.as_object().and_then(|map| map.get(name).cloned())
    }
}

type Accessor<T> = Arc<dyn Fn(&T) -> Option<Value> + Send + Sync>;

/// Exposes an arbitrary object as a [`Record`] through named accessors.
///
/// ```
/// use verity_core::{AccessorRecord, Record};
///
/// struct User { name: String }
///
/// let user = User { name: "alice".into() };
/// let record = AccessorRecord::new(&user).accessor("name", |u| Some(u.name.clone().into()));
/// assert_eq!(record.field("name"), Some("alice".into()));
/// assert_eq!(record.field("email"), None);
/// ```
pub struct AccessorRecord<'a, T> {
    target: &'a T,
    accessors: HashMap<String, Accessor<T>>,
}

impl<'a, T> AccessorRecord<'a, T> {
    pub fn new(target: &'a T) -> Self {
        Self {
            target,
            accessors: HashMap::new(),
        }
    }

    pub fn accessor<F>(mut self, name: impl Into<String>, accessor: F) -> Self
    where
        F: Fn(&T) -> Option<Value> + Send + Sync + 'static,
    {
        self.accessors.insert(name.into(), Arc::new(accessor));
        self
    }
}

impl<T> Record for AccessorRecord<'_, T> {
    fn field(&self, name: &str) -> Option<Value> {
        self.accessors
            .get(name)
            .and_then(|accessor| accessor(self.target))
    }
}

impl<T> fmt::Debug for AccessorRecord<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<_> = self.accessors.keys().collect();
        names.sort();
        f.debug_struct("AccessorRecord")
            .field("accessors", &names)
            .finish()
    }
}
