use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::parts::{Capability, CloneDepth, Palette, Part, PartIdentity};

/// Geometry carried by a drawable part.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Shape {
    Circle { radius: u32 },
    Rect { width: u32, height: u32 },
}

impl Default for Shape {
    fn default() -> Self {
        Shape::Rect {
            width: 1,
            height: 1,
        }
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Shape::Circle { radius } => write!(f, "circle r={radius}"),
            Shape::Rect { width, height } => write!(f, "rect {width}x{height}"),
        }
    }
}

/// Drawing implementation side of the bridge.
pub trait Renderer: Send + Sync + fmt::Debug {
    fn name(&self) -> &str;

    fn draw(&self, shape: &Shape, palette: &Palette) -> String;
}

/// Resolution independent renderer; describes the outline and fill.
#[derive(Debug, Default)]
pub struct VectorRenderer;

impl Renderer for VectorRenderer {
    fn name(&self) -> &str {
        "vector"
    }

    fn draw(&self, shape: &Shape, palette: &Palette) -> String {
        format!(
            "vector {shape} stroke={} fill={}",
            palette.accent, palette.background
        )
    }
}

/// Raster renderer parameters.
#[derive(Debug, Clone)]
pub struct RasterSettings {
    pub cell: char,
    pub scale: u32,
}

impl Default for RasterSettings {
    fn default() -> Self {
        Self {
            cell: '#',
            scale: 1,
        }
    }
}

/// Cell based renderer; reports how many cells the shape covers.
#[derive(Debug, Default)]
pub struct RasterRenderer {
    settings: RasterSettings,
}

impl RasterRenderer {
    pub fn new(settings: RasterSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &RasterSettings {
        &self.settings
    }

    /// Cells covered by `shape`, saturating at `u64::MAX` for huge shapes.
    fn cells(&self, shape: &Shape) -> u64 {
        let scale = u64::from(self.settings.scale.max(1));
        match *shape {
            Shape::Rect { width, height } => {
                let columns = u64::from(width).saturating_mul(scale);
                let rows = u64::from(height).saturating_mul(scale);
                columns.saturating_mul(rows)
            }
            // Bounding square, matching what the cell grid can address.
            Shape::Circle { radius } => {
                let side = u64::from(radius).saturating_mul(2).saturating_mul(scale);
                side.saturating_mul(side)
            }
        }
    }
}

impl Renderer for RasterRenderer {
    fn name(&self) -> &str {
        "raster"
    }

    fn draw(&self, shape: &Shape, palette: &Palette) -> String {
        format!(
            "raster {shape} cells={} glyph={} color={}",
            self.cells(shape),
            self.settings.cell,
            palette.foreground
        )
    }
}

/// Drawable abstraction side of the bridge.
#[derive(Debug)]
pub struct ShapePart {
    identity: PartIdentity,
    label: String,
    shape: Shape,
    palette: Arc<Palette>,
    renderer: Arc<dyn Renderer>,
}

impl ShapePart {
    pub fn new(
        identity: PartIdentity,
        label: impl Into<String>,
        shape: Shape,
        palette: Arc<Palette>,
        renderer: Arc<dyn Renderer>,
    ) -> Self {
        Self {
            identity,
            label: label.into(),
            shape,
            palette,
            renderer,
        }
    }

    pub fn shape(&self) -> Shape {
        self.shape
    }

    pub fn palette(&self) -> &Arc<Palette> {
        &self.palette
    }

    pub fn renderer(&self) -> &Arc<dyn Renderer> {
        &self.renderer
    }
}

impl Part for ShapePart {
    fn identity(&self) -> &PartIdentity {
        &self.identity
    }

    fn label(&self) -> &str {
        &self.label
    }

    fn capabilities(&self) -> &[Capability] {
        &[Capability::Apply, Capability::Draw]
    }

    fn perform(&self, capability: Capability) -> Result<String> {
        let family = &self.identity.family;
        let line = match capability {
            Capability::Draw => format!(
                "[{family}] drawable `{}` {}",
                self.label,
                self.renderer.draw(&self.shape, &self.palette)
            ),
            _ => format!(
                "[{family}] drawable `{}` applied fg={} bg={}",
                self.label, self.palette.foreground, self.palette.background
            ),
        };
        Ok(line)
    }

    // The renderer is a shared resource and stays shared at either depth.
    fn duplicate(&self, depth: CloneDepth) -> Box<dyn Part> {
        let palette = match depth {
            CloneDepth::Shallow => Arc::clone(&self.palette),
            CloneDepth::Deep => Arc::new(Palette::clone(&self.palette)),
        };
        Box::new(ShapePart {
            identity: self.identity.clone(),
            label: self.label.clone(),
            shape: self.shape,
            palette,
            renderer: Arc::clone(&self.renderer),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parts::{PartHandle, Role};

    fn part(renderer: Arc<dyn Renderer>) -> ShapePart {
        ShapePart::new(
            PartIdentity::new("light".into(), Role::Drawable, blake3::hash(b"light")),
            "logo",
            Shape::Circle { radius: 2 },
            Arc::new(Palette::new("#202020", "#fafafa", "#0066cc")),
            renderer,
        )
    }

    #[test]
    fn same_abstraction_different_renderers() {
        let vector = part(Arc::new(VectorRenderer));
        let raster = part(Arc::new(RasterRenderer::default()));
        assert_eq!(
            vector.perform(Capability::Draw).unwrap(),
            "[light] drawable `logo` vector circle r=2 stroke=#0066cc fill=#fafafa"
        );
        assert_eq!(
            raster.perform(Capability::Draw).unwrap(),
            "[light] drawable `logo` raster circle r=2 cells=16 glyph=# color=#202020"
        );
    }

    #[test]
    fn raster_scale_multiplies_cells() {
        let renderer = RasterRenderer::new(RasterSettings { cell: '*', scale: 2 });
        let palette = Palette::new("a", "b", "c");
        let drawn = renderer.draw(&Shape::Rect { width: 3, height: 2 }, &palette);
        assert_eq!(drawn, "raster rect 3x2 cells=24 glyph=* color=a");
    }

    #[test]
    fn huge_shapes_saturate_cell_count() {
        let palette = Palette::new("a", "b", "c");
        let plain = RasterRenderer::default();
        assert_eq!(
            plain.draw(&Shape::Circle { radius: u32::MAX }, &palette),
            format!("raster circle r={} cells={} glyph=# color=a", u32::MAX, u64::MAX)
        );

        let scaled = RasterRenderer::new(RasterSettings { cell: '#', scale: u32::MAX });
        let drawn = scaled.draw(
            &Shape::Rect {
                width: u32::MAX,
                height: 2,
            },
            &palette,
        );
        assert!(drawn.contains(&format!("cells={}", u64::MAX)));
        assert!(
            scaled
                .draw(&Shape::Rect { width: 1, height: 1 }, &palette)
                .contains(&format!("cells={}", u64::from(u32::MAX) * u64::from(u32::MAX)))
        );
    }

    #[test]
    fn duplicates_keep_renderer() {
        let original = part(Arc::new(VectorRenderer));
        let handle = PartHandle::new(original);
        let copy = handle.duplicate(CloneDepth::Deep);
        assert_eq!(
            handle.perform(Capability::Draw).unwrap(),
            copy.perform(Capability::Draw).unwrap()
        );
        assert!(!copy.supports(Capability::Render));
    }

    #[test]
    fn shape_parses_from_json() {
        let shape: Shape = serde_json::from_str(r#"{"kind":"rect","width":4,"height":1}"#).unwrap();
        assert_eq!(shape, Shape::Rect { width: 4, height: 1 });
        assert_eq!(Shape::default().to_string(), "rect 1x1");
    }
}
