use std::borrow::Cow;

use crate::{
    compose::layout::{PlacedText, TextAnchor},
    foundation::core::Rgba8,
    foundation::error::{NyangError, NyangResult},
};

/// Advance-width measurement used by layout.
pub trait TextMeasure {
    /// Width in pixels of `text` set on one line at `size_px`.
    fn text_width(&mut self, text: &str, size_px: f32) -> f64;
}

/// A [`TextMeasure`] that can also paint what it measured.
pub trait Typesetter: TextMeasure {
    /// Fill one placed line into `ctx`.
    fn fill_text(
        &mut self,
        ctx: &mut vello_cpu::RenderContext,
        text: &PlacedText,
    ) -> NyangResult<()>;
}

/// Greedy word wrap: words are added to a line while it still fits in `max_width`.
///
/// A single word wider than `max_width` gets a line of its own and is not split.
pub fn wrap_words(
    text: &str,
    max_width: f64,
    size_px: f32,
    measure: &mut dyn TextMeasure,
) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    for word in text.split_whitespace() {
        if current.is_empty() {
            current.push_str(word);
            continue;
        }
        let candidate = format!("{current} {word}");
        if measure.text_width(&candidate, size_px) <= max_width {
            current = candidate;
        } else {
            lines.push(std::mem::replace(&mut current, word.to_string()));
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

/// Font-free typesetter with a fixed advance per character.
///
/// Glyphs are painted as solid boxes. Useful when no font file is available (tests, previews).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MonospaceTypesetter {
    /// Advance of one character, in ems.
    pub advance_em: f64,
}

impl Default for MonospaceTypesetter {
    fn default() -> Self {
        Self { advance_em: 0.6 }
    }
}

impl TextMeasure for MonospaceTypesetter {
    fn text_width(&mut self, text: &str, size_px: f32) -> f64 {
        text.chars().count() as f64 * self.advance_em * f64::from(size_px)
    }
}

impl Typesetter for MonospaceTypesetter {
    fn fill_text(
        &mut self,
        ctx: &mut vello_cpu::RenderContext,
        text: &PlacedText,
    ) -> NyangResult<()> {
        let size = f64::from(text.size_px);
        let advance = self.advance_em * size;
        let box_h = size * 0.6;
        let top = match text.anchor {
            TextAnchor::Baseline => text.origin.y - box_h,
            TextAnchor::Middle => text.origin.y - box_h / 2.0,
        };

        ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
        ctx.set_paint(text.color.to_paint());
        for (i, ch) in text.text.chars().enumerate() {
            if ch.is_whitespace() {
                continue;
            }
            let x = text.origin.x + i as f64 * advance;
            ctx.fill_rect(&vello_cpu::kurbo::Rect::new(
                x + advance * 0.1,
                top,
                x + advance * 0.9,
                top + box_h,
            ));
        }
        Ok(())
    }
}

/// Shapes and paints text with one font through Parley and the CPU rasterizer.
pub struct ParleyTypesetter {
    font_ctx: parley::FontContext,
    layout_ctx: parley::LayoutContext<Rgba8>,
    family_name: String,
    font: vello_cpu::peniko::FontData,
}

impl std::fmt::Debug for ParleyTypesetter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParleyTypesetter")
            .field("family_name", &self.family_name)
            .finish_non_exhaustive()
    }
}

impl ParleyTypesetter {
    /// Register `font_bytes` (TTF/OTF) and use its first family for everything.
    pub fn from_font_bytes(font_bytes: Vec<u8>) -> NyangResult<Self> {
        let mut font_ctx = parley::FontContext::default();
        let families = font_ctx
            .collection
            .register_fonts(parley::fontique::Blob::from(font_bytes.clone()), None);
        let family_id = families
            .first()
            .map(|(id, _)| *id)
            .ok_or_else(|| NyangError::render("no font families registered from font bytes"))?;
        let family_name = font_ctx
            .collection
            .family_name(family_id)
            .ok_or_else(|| NyangError::render("registered font family has no name"))?
            .to_string();

        let font =
            vello_cpu::peniko::FontData::new(vello_cpu::peniko::Blob::from(font_bytes), 0);

        tracing::debug!(family = %family_name, "font registered");
        Ok(Self {
            font_ctx,
            layout_ctx: parley::LayoutContext::new(),
            family_name,
            font,
        })
    }

    /// Family name resolved from the font bytes.
    pub fn family_name(&self) -> &str {
        &self.family_name
    }

    fn layout(&mut self, text: &str, size_px: f32, brush: Rgba8) -> parley::Layout<Rgba8> {
        let mut builder = self
            .layout_ctx
            .ranged_builder(&mut self.font_ctx, text, 1.0, true);
        builder.push_default(parley::style::StyleProperty::FontStack(
            parley::style::FontStack::Source(Cow::Owned(self.family_name.clone())),
        ));
        builder.push_default(parley::style::StyleProperty::FontSize(size_px));
        builder.push_default(parley::style::StyleProperty::Brush(brush));

        let mut layout: parley::Layout<Rgba8> = builder.build(text);
        layout.break_all_lines(None);
        layout
    }
}

impl TextMeasure for ParleyTypesetter {
    fn text_width(&mut self, text: &str, size_px: f32) -> f64 {
        if text.is_empty() {
            return 0.0;
        }
        f64::from(self.layout(text, size_px, Rgba8::default()).width())
    }
}

impl Typesetter for ParleyTypesetter {
    fn fill_text(
        &mut self,
        ctx: &mut vello_cpu::RenderContext,
        text: &PlacedText,
    ) -> NyangResult<()> {
        if text.text.is_empty() {
            return Ok(());
        }
        let layout = self.layout(&text.text, text.size_px, text.color);
        let Some(first) = layout.lines().next() else {
            return Ok(());
        };
        let m = first.metrics();
        let reference = match text.anchor {
            TextAnchor::Baseline => f64::from(m.baseline),
            TextAnchor::Middle => f64::from(m.baseline + (m.descent - m.ascent) / 2.0),
        };
        ctx.set_transform(vello_cpu::kurbo::Affine::translate((
            text.origin.x,
            text.origin.y - reference,
        )));

        for line in layout.lines() {
            for item in line.items() {
                let parley::layout::PositionedLayoutItem::GlyphRun(run) = item else {
                    continue;
                };
                let brush = run.style().brush;
                ctx.set_paint(brush.to_paint());
                let glyphs = run.positioned_glyphs().map(|g| vello_cpu::Glyph {
                    id: g.id,
                    x: g.x,
                    y: g.y,
                });
                ctx.glyph_run(&self.font)
                    .font_size(run.run().font_size())
                    .fill_glyphs(glyphs);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/compose/text.rs"]
mod tests;
