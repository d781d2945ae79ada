use std::fmt;
use std::str::FromStr;

use blake3::Hash;
use serde::{Deserialize, Serialize};

use crate::error::{ComposeError, Result};
use crate::family::FamilyDescriptor;

/// Enumerated part roles a family can provide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Button,
    Text,
    Drawable,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::Button, Role::Text, Role::Drawable];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Button => "button",
            Role::Text => "text",
            Role::Drawable => "drawable",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = ComposeError;

    fn from_str(value: &str) -> Result<Self> {
        Role::ALL
            .into_iter()
            .find(|role| role.as_str().eq_ignore_ascii_case(value.trim()))
            .ok_or_else(|| ComposeError::InvalidBlueprint(format!("unknown role `{value}`")))
    }
}

/// Operations a part may expose to the dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Capability {
    Apply,
    Render,
    Draw,
}

impl Capability {
    pub const ALL: [Capability; 3] = [Capability::Apply, Capability::Render, Capability::Draw];

    pub fn as_str(&self) -> &'static str {
        match self {
            Capability::Apply => "apply",
            Capability::Render => "render",
            Capability::Draw => "draw",
        }
    }

    /// Resolve an operation name. Matching is exact; `"Apply"` is not `"apply"`.
    pub fn from_name(name: &str) -> Option<Self> {
        Capability::ALL.into_iter().find(|cap| cap.as_str() == name)
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Depth contract for clone-by-value.
///
/// `Shallow` keeps sharing reference-counted state (palettes, renderers) with
/// the source part. `Deep` gives the duplicate private copies of that state.
/// Plain owned data such as labels is copied in both cases.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloneDepth {
    Shallow,
    Deep,
}

/// Who made a part: its family, role and the family fingerprint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartIdentity {
    pub family: FamilyDescriptor,
    pub role: Role,
    pub fingerprint: Hash,
}

impl PartIdentity {
    pub fn new(family: FamilyDescriptor, role: Role, fingerprint: Hash) -> Self {
        Self {
            family,
            role,
            fingerprint,
        }
    }
}

/// Capability contract implemented by every part.
pub trait Part: Send + Sync + fmt::Debug {
    fn identity(&self) -> &PartIdentity;

    fn label(&self) -> &str;

    fn capabilities(&self) -> &[Capability];

    /// Run one capability and describe the effect it had.
    ///
    /// Only called with a capability listed by [`Part::capabilities`].
    fn perform(&self, capability: Capability) -> Result<String>;

    fn duplicate(&self, depth: CloneDepth) -> Box<dyn Part>;
}

/// Owned, opaque reference to a constructed part.
///
/// Not `Clone`; copies go through [`PartHandle::duplicate`] with an explicit
/// [`CloneDepth`].
#[derive(Debug)]
pub struct PartHandle {
    inner: Box<dyn Part>,
}

impl PartHandle {
    pub fn new<P>(part: P) -> Self
    where
        P: Part + 'static,
    {
        Self {
            inner: Box::new(part),
        }
    }

    pub fn from_boxed(inner: Box<dyn Part>) -> Self {
        Self { inner }
    }

    pub fn role(&self) -> Role {
        self.inner.identity().role
    }

    pub fn family(&self) -> &FamilyDescriptor {
        &self.inner.identity().family
    }

    pub fn fingerprint(&self) -> Hash {
        self.inner.identity().fingerprint
    }

    pub fn label(&self) -> &str {
        self.inner.label()
    }

    pub fn capabilities(&self) -> &[Capability] {
        self.inner.capabilities()
    }

    pub fn supports(&self, capability: Capability) -> bool {
        self.inner.capabilities().contains(&capability)
    }

    pub fn perform(&self, capability: Capability) -> Result<String> {
        if !self.supports(capability) {
            return Err(ComposeError::UnsupportedOperation(format!(
                "{} on {} part `{}`",
                capability,
                self.role(),
                self.label()
            )));
        }
        self.inner.perform(capability)
    }

    pub fn duplicate(&self, depth: CloneDepth) -> PartHandle {
        PartHandle::from_boxed(self.inner.duplicate(depth))
    }

    /// True when both parts were produced by the same family definition.
    pub fn same_family(&self, other: &PartHandle) -> bool {
        self.family() == other.family() && self.fingerprint() == other.fingerprint()
    }
}
