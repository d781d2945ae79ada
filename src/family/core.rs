use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use blake3::Hash;
use serde::{Deserialize, Serialize};

use crate::builder::BuiltConfig;
use crate::collab::SharedResources;
use crate::error::{ComposeError, Result};
use crate::parts::{Palette, PartHandle, PartIdentity, Role};

/// Symbolic family tag such as `"dark"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FamilyDescriptor(String);

impl FamilyDescriptor {
    pub fn new(tag: impl Into<String>) -> Self {
        Self(tag.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FamilyDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for FamilyDescriptor {
    fn from(tag: &str) -> Self {
        Self::new(tag)
    }
}

impl From<String> for FamilyDescriptor {
    fn from(tag: String) -> Self {
        Self(tag)
    }
}

/// Everything a part constructor may read.
pub struct PartContext<'a> {
    family: &'a Family,
    role: Role,
    config: &'a BuiltConfig,
    resources: &'a SharedResources,
}

impl<'a> PartContext<'a> {
    pub fn family(&self) -> &'a Family {
        self.family
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn config(&self) -> &'a BuiltConfig {
        self.config
    }

    pub fn resources(&self) -> &'a SharedResources {
        self.resources
    }

    /// Identity every part built from this context must carry.
    pub fn identity(&self) -> PartIdentity {
        PartIdentity::new(
            self.family.descriptor().clone(),
            self.role,
            self.family.fingerprint(),
        )
    }

    pub fn palette(&self) -> Arc<Palette> {
        Arc::clone(self.family.palette())
    }

    /// The configured `label`, falling back to the role name.
    pub fn label(&self) -> String {
        self.config
            .get_str("label")
            .map(str::to_string)
            .unwrap_or_else(|| self.role.to_string())
    }
}

/// Constructor registered for one role of one family.
pub type PartConstructor = Arc<dyn Fn(&PartContext<'_>) -> Result<PartHandle> + Send + Sync>;

/// A named set of mutually consistent part constructors.
#[derive(Clone)]
pub struct Family {
    descriptor: FamilyDescriptor,
    palette: Arc<Palette>,
    constructors: BTreeMap<Role, PartConstructor>,
    fingerprint: Hash,
}

impl fmt::Debug for Family {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Family")
            .field("descriptor", &self.descriptor)
            .field("palette", &self.palette)
            .field("roles", &self.roles())
            .field("fingerprint", &self.fingerprint.to_hex().as_str())
            .finish()
    }
}

impl Family {
    pub fn new(descriptor: impl Into<FamilyDescriptor>, palette: Palette) -> Self {
        let mut family = Self {
            descriptor: descriptor.into(),
            palette: Arc::new(palette),
            constructors: BTreeMap::new(),
            fingerprint: blake3::hash(&[]),
        };
        family.refresh_fingerprint();
        family
    }

    pub fn with_part<F>(mut self, role: Role, constructor: F) -> Self
    where
        F: Fn(&PartContext<'_>) -> Result<PartHandle> + Send + Sync + 'static,
    {
        self.constructors.insert(role, Arc::new(constructor));
        self.refresh_fingerprint();
        self
    }

    pub fn descriptor(&self) -> &FamilyDescriptor {
        &self.descriptor
    }

    pub fn palette(&self) -> &Arc<Palette> {
        &self.palette
    }

    pub fn fingerprint(&self) -> Hash {
        self.fingerprint
    }

    pub fn roles(&self) -> Vec<Role> {
        self.constructors.keys().copied().collect()
    }

    pub fn provides(&self, role: Role) -> bool {
        self.constructors.contains_key(&role)
    }

    fn refresh_fingerprint(&mut self) {
        let mut hasher = blake3::Hasher::new();
        hasher.update(self.descriptor.as_str().as_bytes());
        for channel in [
            &self.palette.foreground,
            &self.palette.background,
            &self.palette.accent,
        ] {
            hasher.update(&[0]);
            hasher.update(channel.as_bytes());
        }
        for role in self.constructors.keys() {
            hasher.update(&[1]);
            hasher.update(role.as_str().as_bytes());
        }
        self.fingerprint = hasher.finalize();
    }

    pub(crate) fn construct(
        &self,
        role: Role,
        config: &BuiltConfig,
        resources: &SharedResources,
    ) -> Result<PartHandle> {
        let constructor = self
            .constructors
            .get(&role)
            .ok_or_else(|| ComposeError::UnknownRole {
                family: self.descriptor.to_string(),
                role: role.to_string(),
            })?;
        let ctx = PartContext {
            family: self,
            role,
            config,
            resources,
        };
        let part = constructor(&ctx)?;
        if part.role() != role
            || part.family() != &self.descriptor
            || part.fingerprint() != self.fingerprint
        {
            return Err(ComposeError::InvalidOperation(format!(
                "constructor for {}/{} produced a {}/{} part",
                self.descriptor,
                role,
                part.family(),
                part.role()
            )));
        }
        Ok(part)
    }
}

/// Part creation bound to one family of a registry.
#[derive(Debug, Clone)]
pub struct FamilyFactory<'r> {
    family: &'r Family,
    resources: &'r SharedResources,
}

impl<'r> FamilyFactory<'r> {
    pub(crate) fn new(family: &'r Family, resources: &'r SharedResources) -> Self {
        Self { family, resources }
    }

    pub fn descriptor(&self) -> &'r FamilyDescriptor {
        self.family.descriptor()
    }

    pub fn family(&self) -> &'r Family {
        self.family
    }

    pub fn create_part(&self, role: Role) -> Result<PartHandle> {
        self.create_configured(role, &BuiltConfig::empty())
    }

    pub fn create_configured(&self, role: Role, config: &BuiltConfig) -> Result<PartHandle> {
        self.family.construct(role, config, self.resources)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::create_builder;
    use crate::parts::ThemedPart;

    fn themed(ctx: &PartContext<'_>) -> Result<PartHandle> {
        Ok(PartHandle::new(ThemedPart::new(
            ctx.identity(),
            ctx.label(),
            ctx.palette(),
        )))
    }

    fn sample() -> Family {
        Family::new("mono", Palette::new("#fff", "#000", "#888")).with_part(Role::Button, themed)
    }

    #[test]
    fn fingerprint_tracks_roles_and_palette() {
        let base = sample();
        let extended = sample().with_part(Role::Text, themed);
        let recoloured = Family::new("mono", Palette::new("#fff", "#111", "#888"))
            .with_part(Role::Button, themed);
        assert_eq!(base.fingerprint(), sample().fingerprint());
        assert_ne!(base.fingerprint(), extended.fingerprint());
        assert_ne!(base.fingerprint(), recoloured.fingerprint());
    }

    #[test]
    fn unknown_role_is_rejected() {
        let family = sample();
        let resources = SharedResources::new();
        let factory = FamilyFactory::new(&family, &resources);
        let err = factory.create_part(Role::Drawable).unwrap_err();
        assert!(matches!(
            err,
            ComposeError::UnknownRole { ref family, ref role } if family == "mono" && role == "drawable"
        ));
    }

    #[test]
    fn configured_label_reaches_part() {
        let family = sample();
        let resources = SharedResources::new();
        let factory = FamilyFactory::new(&family, &resources);
        let mut builder = create_builder(["label"]);
        builder.set_field("label", "Submit").unwrap();
        let config = builder.finalize().unwrap();
        let part = factory.create_configured(Role::Button, &config).unwrap();
        assert_eq!(part.label(), "Submit");
        assert_eq!(factory.create_part(Role::Button).unwrap().label(), "button");
    }

    #[test]
    fn foreign_identity_is_refused() {
        let family = Family::new("mono", Palette::new("#fff", "#000", "#888")).with_part(
            Role::Text,
            |ctx: &PartContext<'_>| {
                let mut identity = ctx.identity();
                identity.family = FamilyDescriptor::new("dark");
                Ok(PartHandle::new(ThemedPart::new(identity, "x", ctx.palette())))
            },
        );
        let resources = SharedResources::new();
        let err = FamilyFactory::new(&family, &resources)
            .create_part(Role::Text)
            .unwrap_err();
        assert!(matches!(err, ComposeError::InvalidOperation(_)));
    }
}
