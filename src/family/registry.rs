use std::collections::BTreeMap;
use std::sync::OnceLock;

use super::core::{Family, FamilyDescriptor, FamilyFactory};
use super::presets;
use crate::collab::SharedResources;
use crate::error::{ComposeError, Result};
use crate::parts::Role;

static GLOBAL_REGISTRY: OnceLock<FamilyRegistry> = OnceLock::new();

/// Read-only collection of families.
///
/// There is no API to add or replace a family once the registry is built, so
/// the parts of a family cannot change in the middle of a session.
#[derive(Debug)]
pub struct FamilyRegistry {
    families: BTreeMap<FamilyDescriptor, Family>,
    resources: SharedResources,
}

impl FamilyRegistry {
    pub fn builder() -> FamilyRegistryBuilder {
        FamilyRegistryBuilder::default()
    }

    /// Registry holding the built-in `dark`, `light` and `legacy` families.
    pub fn with_presets() -> Self {
        Self::from_families(presets::families())
    }

    pub(crate) fn from_families(families: Vec<Family>) -> Self {
        Self {
            families: families
                .into_iter()
                .map(|family| (family.descriptor().clone(), family))
                .collect(),
            resources: SharedResources::new(),
        }
    }

    /// Install `registry` as the process-wide registry.
    ///
    /// Idempotent: only the first install takes effect. Later calls drop their
    /// argument and return the registry that is already installed.
    pub fn install(registry: FamilyRegistry) -> &'static FamilyRegistry {
        GLOBAL_REGISTRY.get_or_init(|| registry)
    }

    /// Process-wide registry, installing the presets when nothing was installed.
    pub fn global() -> &'static FamilyRegistry {
        GLOBAL_REGISTRY.get_or_init(Self::with_presets)
    }

    pub fn is_installed() -> bool {
        GLOBAL_REGISTRY.get().is_some()
    }

    pub fn factory(&self, descriptor: &FamilyDescriptor) -> Result<FamilyFactory<'_>> {
        let family = self
            .families
            .get(descriptor)
            .ok_or_else(|| ComposeError::UnknownFamily(descriptor.to_string()))?;
        Ok(FamilyFactory::new(family, &self.resources))
    }

    pub fn family(&self, descriptor: &FamilyDescriptor) -> Option<&Family> {
        self.families.get(descriptor)
    }

    pub fn descriptors(&self) -> impl Iterator<Item = &FamilyDescriptor> {
        self.families.keys()
    }

    /// Families that provide `role`.
    pub fn providers_of(&self, role: Role) -> Vec<&FamilyDescriptor> {
        self.families
            .values()
            .filter(|family| family.provides(role))
            .map(Family::descriptor)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.families.len()
    }

    pub fn is_empty(&self) -> bool {
        self.families.is_empty()
    }

    /// Construct-once resources shared by every part this registry creates.
    pub fn resources(&self) -> &SharedResources {
        &self.resources
    }
}

/// Collects families; duplicates are reported when the registry is built.
#[derive(Debug, Default)]
pub struct FamilyRegistryBuilder {
    families: Vec<Family>,
}

impl FamilyRegistryBuilder {
    pub fn family(mut self, family: Family) -> Self {
        self.families.push(family);
        self
    }

    pub fn presets(mut self) -> Self {
        self.families.extend(presets::families());
        self
    }

    pub fn build(self) -> Result<FamilyRegistry> {
        let mut seen: Vec<&FamilyDescriptor> = Vec::with_capacity(self.families.len());
        for family in &self.families {
            if seen.contains(&family.descriptor()) {
                return Err(ComposeError::DuplicateFamily(family.descriptor().to_string()));
            }
            seen.push(family.descriptor());
        }
        Ok(FamilyRegistry::from_families(self.families))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parts::{Palette, PartHandle, ThemedPart};
    use crate::family::PartContext;

    fn mono(tag: &str) -> Family {
        Family::new(tag, Palette::new("#fff", "#000", "#777")).with_part(
            Role::Text,
            |ctx: &PartContext<'_>| {
                Ok(PartHandle::new(ThemedPart::new(
                    ctx.identity(),
                    ctx.label(),
                    ctx.palette(),
                )))
            },
        )
    }

    #[test]
    fn duplicate_family_rejected() {
        let err = FamilyRegistry::builder()
            .family(mono("mono"))
            .family(mono("mono"))
            .build()
            .unwrap_err();
        assert!(matches!(err, ComposeError::DuplicateFamily(tag) if tag == "mono"));
    }

    #[test]
    fn unknown_family_rejected() {
        let registry = FamilyRegistry::builder().family(mono("mono")).build().unwrap();
        let err = registry.factory(&"neon".into()).unwrap_err();
        assert!(matches!(err, ComposeError::UnknownFamily(tag) if tag == "neon"));
    }

    #[test]
    fn presets_cover_expected_roles() {
        let registry = FamilyRegistry::builder().presets().build().unwrap();
        let tags: Vec<_> = registry.descriptors().map(|d| d.as_str()).collect();
        assert_eq!(tags, ["dark", "legacy", "light"]);
        let drawers: Vec<_> = registry
            .providers_of(Role::Drawable)
            .into_iter()
            .map(|d| d.as_str())
            .collect();
        assert_eq!(drawers, ["dark", "light"]);
    }

    #[test]
    fn same_pair_yields_consistent_parts() {
        let registry = FamilyRegistry::with_presets();
        for tag in ["dark", "light", "legacy"] {
            let factory = registry.factory(&tag.into()).unwrap();
            for role in factory.family().roles() {
                let first = factory.create_part(role).unwrap();
                let second = factory.create_part(role).unwrap();
                assert!(first.same_family(&second));
                assert_eq!(first.family().as_str(), tag);
                assert_eq!(first.capabilities(), second.capabilities());
            }
        }
    }

    #[test]
    fn families_never_share_fingerprints() {
        let registry = FamilyRegistry::with_presets();
        let dark = registry.factory(&"dark".into()).unwrap().create_part(Role::Button).unwrap();
        let light = registry.factory(&"light".into()).unwrap().create_part(Role::Button).unwrap();
        assert!(!dark.same_family(&light));
        assert_ne!(dark.fingerprint(), light.fingerprint());
    }

    #[test]
    fn global_install_is_idempotent() {
        let first = FamilyRegistry::global();
        let again = FamilyRegistry::install(FamilyRegistry::builder().build().unwrap());
        assert!(std::ptr::eq(first, again));
        assert!(FamilyRegistry::is_installed());
        assert!(!again.is_empty());
    }
}
