//! Built-in families.
//!
//! - `dark`: themed button and text, drawable rendered by the vector renderer
//! - `light`: themed button and text, drawable rendered by the raster renderer
//! - `legacy`: button and text adapted from [`LegacyControl`], no drawable

use std::sync::Arc;

use super::core::{Family, PartContext};
use crate::collab::{
    AdaptedPart, LegacyControl, RasterRenderer, Renderer, Shape, ShapePart, VectorRenderer,
};
use crate::error::Result;
use crate::parts::{Palette, PartHandle, Role, ThemedPart};

pub const DARK: &str = "dark";
pub const LIGHT: &str = "light";
pub const LEGACY: &str = "legacy";

pub fn families() -> Vec<Family> {
    vec![dark(), light(), legacy()]
}

pub fn dark() -> Family {
    Family::new(DARK, Palette::new("#e0e0e0", "#121212", "#bb86fc"))
        .with_part(Role::Button, themed)
        .with_part(Role::Text, themed)
        .with_part(Role::Drawable, vector_shape)
}

pub fn light() -> Family {
    Family::new(LIGHT, Palette::new("#202020", "#fafafa", "#0066cc"))
        .with_part(Role::Button, themed)
        .with_part(Role::Text, themed)
        .with_part(Role::Drawable, raster_shape)
}

pub fn legacy() -> Family {
    Family::new(LEGACY, Palette::new("#000000", "#c0c0c0", "#000080"))
        .with_part(Role::Button, |ctx: &PartContext<'_>| adapted(ctx, "push"))
        .with_part(Role::Text, |ctx: &PartContext<'_>| adapted(ctx, "static"))
}

fn themed(ctx: &PartContext<'_>) -> Result<PartHandle> {
    Ok(PartHandle::new(ThemedPart::new(
        ctx.identity(),
        ctx.label(),
        ctx.palette(),
    )))
}

fn vector_shape(ctx: &PartContext<'_>) -> Result<PartHandle> {
    let renderer = ctx.resources().get_or_insert_with(|| VectorRenderer)?;
    shape_part(ctx, renderer)
}

fn raster_shape(ctx: &PartContext<'_>) -> Result<PartHandle> {
    let renderer = ctx
        .resources()
        .get_or_insert_with(RasterRenderer::default)?;
    shape_part(ctx, renderer)
}

fn shape_part(ctx: &PartContext<'_>, renderer: Arc<dyn Renderer>) -> Result<PartHandle> {
    let shape = match ctx.config().get("shape") {
        Some(value) => serde_json::from_value::<Shape>(value.clone())?,
        None => Shape::default(),
    };
    Ok(PartHandle::new(ShapePart::new(
        ctx.identity(),
        ctx.label(),
        shape,
        ctx.palette(),
        renderer,
    )))
}

fn adapted(ctx: &PartContext<'_>, kind: &str) -> Result<PartHandle> {
    let control = LegacyControl::new(kind, ctx.label());
    Ok(PartHandle::new(AdaptedPart::new(
        ctx.identity(),
        ctx.family().descriptor().as_str(),
        Arc::new(control),
    )))
}
