use std::fmt;
use std::sync::Arc;

use crate::error::{ComposeError, Result};
use crate::parts::{Capability, CloneDepth, Part, PartIdentity};

/// Third-party widget interface the engine does not control.
pub trait ForeignWidget: Send + Sync + fmt::Debug {
    fn caption(&self) -> &str;

    /// Paint with a named skin; third-party errors come back as plain strings.
    fn paint(&self, skin: &str) -> std::result::Result<String, String>;

    fn boxed_clone(&self) -> Box<dyn ForeignWidget>;
}

/// Stand-in for an older widget toolkit with its own painting call.
#[derive(Debug, Clone)]
pub struct LegacyControl {
    kind: String,
    caption: String,
}

impl LegacyControl {
    pub fn new(kind: impl Into<String>, caption: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            caption: caption.into(),
        }
    }
}

impl ForeignWidget for LegacyControl {
    fn caption(&self) -> &str {
        &self.caption
    }

    fn paint(&self, skin: &str) -> std::result::Result<String, String> {
        if self.caption.trim().is_empty() {
            return Err(format!("{} control has no caption", self.kind));
        }
        Ok(format!("{}({}) skin={skin}", self.kind.to_uppercase(), self.caption))
    }

    fn boxed_clone(&self) -> Box<dyn ForeignWidget> {
        Box::new(self.clone())
    }
}

/// Translates [`ForeignWidget::paint`] into the `apply` capability.
#[derive(Debug)]
pub struct AdaptedPart {
    identity: PartIdentity,
    skin: String,
    widget: Arc<dyn ForeignWidget>,
}

impl AdaptedPart {
    pub fn new(identity: PartIdentity, skin: impl Into<String>, widget: Arc<dyn ForeignWidget>) -> Self {
        Self {
            identity,
            skin: skin.into(),
            widget,
        }
    }

    pub fn widget(&self) -> &Arc<dyn ForeignWidget> {
        &self.widget
    }
}

impl Part for AdaptedPart {
    fn identity(&self) -> &PartIdentity {
        &self.identity
    }

    fn label(&self) -> &str {
        self.widget.caption()
    }

    fn capabilities(&self) -> &[Capability] {
        &[Capability::Apply]
    }

    fn perform(&self, _capability: Capability) -> Result<String> {
        let painted = self.widget.paint(&self.skin).map_err(ComposeError::Part)?;
        Ok(format!(
            "[{}] {} adapted {painted}",
            self.identity.family, self.identity.role
        ))
    }

    fn duplicate(&self, depth: CloneDepth) -> Box<dyn Part> {
        let widget = match depth {
            CloneDepth::Shallow => Arc::clone(&self.widget),
            CloneDepth::Deep => Arc::from(self.widget.boxed_clone()),
        };
        Box::new(AdaptedPart {
            identity: self.identity.clone(),
            skin: self.skin.clone(),
            widget,
        })
    }
}
