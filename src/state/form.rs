//! Flat string-keyed request parameters.

use std::collections::HashMap;

/// Form fields as submitted by the client. A key may repeat.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormParams {
    fields: HashMap<String, Vec<String>>,
}

impl FormParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert, appending to any existing values.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.fields.entry(key.into()).or_default().push(value.into());
    }

    /// First value for `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields
            .get(key)
            .and_then(|values| values.first())
            .map(String::as_str)
    }

    /// First non-blank value for `key`, trimmed.
    pub fn get_trimmed(&self, key: &str) -> Option<&str> {
        self.get(key).map(str::trim).filter(|v| !v.is_empty())
    }

    /// Every value for `key`, in submission order.
    pub fn get_all(&self, key: &str) -> &[String] {
        self.fields.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for FormParams {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut form = Self::new();
        for (key, value) in iter {
            form.insert(key, value);
        }
        form
    }
}

/// What the client did on a stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Plain page load.
    View,
    /// Form submission.
    Submit(FormParams),
}

impl Action {
    pub fn form(&self) -> Option<&FormParams> {
        match self {
            Self::View => None,
            Self::Submit(form) => Some(form),
        }
    }
}
