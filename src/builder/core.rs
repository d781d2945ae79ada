use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::Value;

use crate::error::{ComposeError, Result};

/// Named fields accumulated by a builder.
pub type FieldMap = BTreeMap<String, Value>;

/// Builder lifecycle.
#[derive(Debug, Clone, PartialEq)]
pub enum BuildState {
    Open(FieldMap),
    Sealed,
}

/// Accumulates named fields across calls and commits them once.
///
/// Required field names are declared up front. [`StagedBuilder::finalize`]
/// checks them, seals the builder and hands out an immutable [`BuiltConfig`];
/// every later mutation or finalize on the same instance fails with
/// [`ComposeError::BuilderSealed`].
#[derive(Debug, Clone)]
pub struct StagedBuilder {
    required: Vec<String>,
    state: BuildState,
}

/// Shorthand for [`StagedBuilder::new`].
pub fn create_builder<I, S>(required: I) -> StagedBuilder
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    StagedBuilder::new(required)
}

impl StagedBuilder {
    pub fn new<I, S>(required: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut names: Vec<String> = Vec::new();
        for name in required {
            let name = name.into();
            if !names.contains(&name) {
                names.push(name);
            }
        }
        Self {
            required: names,
            state: BuildState::Open(FieldMap::new()),
        }
    }

    pub fn required(&self) -> &[String] {
        &self.required
    }

    pub fn state(&self) -> &BuildState {
        &self.state
    }

    pub fn is_sealed(&self) -> bool {
        matches!(self.state, BuildState::Sealed)
    }

    /// Set or overwrite a field. Chainable while the builder is open.
    pub fn set_field(&mut self, name: impl Into<String>, value: impl Into<Value>) -> Result<&mut Self> {
        match &mut self.state {
            BuildState::Open(fields) => {
                fields.insert(name.into(), value.into());
                Ok(self)
            }
            BuildState::Sealed => Err(ComposeError::BuilderSealed),
        }
    }

    /// Set every entry of a JSON object.
    pub fn set_fields(&mut self, fields: &serde_json::Map<String, Value>) -> Result<&mut Self> {
        if self.is_sealed() {
            return Err(ComposeError::BuilderSealed);
        }
        for (name, value) in fields {
            self.set_field(name.clone(), value.clone())?;
        }
        Ok(self)
    }

    /// Required names not set yet, in declaration order. Empty once sealed.
    pub fn missing_fields(&self) -> Vec<String> {
        match &self.state {
            BuildState::Open(fields) => self
                .required
                .iter()
                .filter(|name| !fields.contains_key(name.as_str()))
                .cloned()
                .collect(),
            BuildState::Sealed => Vec::new(),
        }
    }

    /// Validate and seal.
    ///
    /// A validation failure leaves the builder open so the missing fields can
    /// still be supplied.
    pub fn finalize(&mut self) -> Result<BuiltConfig> {
        if self.is_sealed() {
            return Err(ComposeError::BuilderSealed);
        }
        let missing = self.missing_fields();
        if !missing.is_empty() {
            return Err(ComposeError::IncompleteConfiguration { missing });
        }
        match std::mem::replace(&mut self.state, BuildState::Sealed) {
            BuildState::Open(fields) => Ok(BuiltConfig {
                fields: Arc::new(fields),
            }),
            BuildState::Sealed => Err(ComposeError::BuilderSealed),
        }
    }
}

/// Immutable snapshot produced by [`StagedBuilder::finalize`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BuiltConfig {
    fields: Arc<FieldMap>,
}

impl BuiltConfig {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(Value::as_str)
    }

    pub fn get_u64(&self, name: &str) -> Option<u64> {
        self.get(name).and_then(Value::as_u64)
    }

    pub fn get_bool(&self, name: &str) -> Option<bool> {
        self.get(name).and_then(Value::as_bool)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(name, value)| (name.as_str(), value))
    }

    pub fn to_json(&self) -> Value {
        Value::Object(
            self.fields
                .iter()
                .map(|(name, value)| (name.clone(), value.clone()))
                .collect(),
        )
    }
}
