use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::core::{Capability, CloneDepth, Part, PartIdentity, Role};
use crate::error::Result;

/// Symbolic colour set shared by every part of one family.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Palette {
    pub foreground: String,
    pub background: String,
    pub accent: String,
}

impl Palette {
    pub fn new(
        foreground: impl Into<String>,
        background: impl Into<String>,
        accent: impl Into<String>,
    ) -> Self {
        Self {
            foreground: foreground.into(),
            background: background.into(),
            accent: accent.into(),
        }
    }
}

/// Button or text part styled from its family palette.
#[derive(Debug)]
pub struct ThemedPart {
    identity: PartIdentity,
    label: String,
    palette: Arc<Palette>,
}

impl ThemedPart {
    pub fn new(identity: PartIdentity, label: impl Into<String>, palette: Arc<Palette>) -> Self {
        Self {
            identity,
            label: label.into(),
            palette,
        }
    }

    pub fn palette(&self) -> &Arc<Palette> {
        &self.palette
    }

    pub fn duplicate_themed(&self, depth: CloneDepth) -> ThemedPart {
        let palette = match depth {
            CloneDepth::Shallow => Arc::clone(&self.palette),
            CloneDepth::Deep => Arc::new(Palette::clone(&self.palette)),
        };
        ThemedPart {
            identity: self.identity.clone(),
            label: self.label.clone(),
            palette,
        }
    }
}

impl Part for ThemedPart {
    fn identity(&self) -> &PartIdentity {
        &self.identity
    }

    fn label(&self) -> &str {
        &self.label
    }

    fn capabilities(&self) -> &[Capability] {
        &[Capability::Apply, Capability::Render]
    }

    fn perform(&self, capability: Capability) -> Result<String> {
        let family = &self.identity.family;
        let role = self.identity.role;
        let palette = &self.palette;
        let line = match (capability, role) {
            (Capability::Apply, _) => format!(
                "[{family}] {role} `{}` applied fg={} bg={}",
                self.label, palette.foreground, palette.background
            ),
            (Capability::Render, Role::Button) => format!(
                "[{family}] button <{}> accent={}",
                self.label, palette.accent
            ),
            (Capability::Render, _) => {
                format!("[{family}] {role} \"{}\" fg={}", self.label, palette.foreground)
            }
            (Capability::Draw, _) => format!("[{family}] {role} `{}` has nothing to draw", self.label),
        };
        Ok(line)
    }

    fn duplicate(&self, depth: CloneDepth) -> Box<dyn Part> {
        Box::new(self.duplicate_themed(depth))
    }
}
