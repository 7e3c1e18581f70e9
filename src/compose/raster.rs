use std::sync::Arc;

use crate::{
    catalog::model::QuizResult,
    compose::assets::{AssetLoader, DecodedImage, load_logo, load_source},
    compose::export::{ExportedImage, encode_png, export_file_name},
    compose::layout::{CardLayout, LayoutParams, compute_layout, rounded_rect_path},
    compose::text::Typesetter,
    foundation::core::{BezPath, Rect, unpremultiply_rgba8_in_place},
    foundation::error::{NyangError, NyangResult},
};

/// Footer branding drawn on every card.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct Branding {
    /// Asset reference of the logo (raster or SVG).
    pub logo: String,
    /// Text drawn to the right of the logo.
    pub brand_text: String,
}

impl Default for Branding {
    fn default() -> Self {
        Self {
            logo: "images/logo.png".to_string(),
            brand_text: "nyangseng".to_string(),
        }
    }
}

/// Turns a [`QuizResult`] into a downloadable PNG card.
#[derive(Debug)]
pub struct Compositor<T> {
    params: LayoutParams,
    branding: Branding,
    typesetter: T,
}

impl<T: Typesetter> Compositor<T> {
    /// Compositor with validated `params`.
    pub fn new(params: LayoutParams, branding: Branding, typesetter: T) -> NyangResult<Self> {
        params.validate()?;
        Ok(Self {
            params,
            branding,
            typesetter,
        })
    }

    /// Layout parameters in use.
    pub fn params(&self) -> &LayoutParams {
        &self.params
    }

    /// Branding in use.
    pub fn branding(&self) -> &Branding {
        &self.branding
    }

    /// Card geometry for `result` with a source image of `image_size`, without drawing.
    pub fn layout(&mut self, result: &QuizResult, image_size: (u32, u32)) -> NyangResult<CardLayout> {
        compute_layout(
            &self.params,
            image_size,
            &result.title,
            &result.description,
            &self.branding.brand_text,
            &mut self.typesetter,
        )
    }

    /// Run the card pipeline for `result`.
    ///
    /// The source image is loaded first and drives the layout; the logo is loaded only after the
    /// body is drawn. Either load failing aborts with [`NyangError::AssetLoad`] and nothing is
    /// returned.
    #[tracing::instrument(skip(self, result, loader), fields(result = %result.id))]
    pub fn compose(
        &mut self,
        result: &QuizResult,
        loader: &dyn AssetLoader,
    ) -> NyangResult<ExportedImage> {
        let source = load_source(loader, &result.image, self.params.max_source_side_px)?;
        let layout = self.layout(result, (source.width, source.height))?;
        if layout.overflow_px > 0.0 {
            tracing::warn!(
                overflow_px = layout.overflow_px,
                height = layout.canvas.height,
                "card content runs into the footer band and will be clipped"
            );
        }

        let (w, h) = layout.canvas.as_u16().ok_or_else(|| {
            NyangError::render(format!(
                "canvas {}x{} exceeds rasterizer limits",
                layout.canvas.width, layout.canvas.height
            ))
        })?;
        let mut ctx = vello_cpu::RenderContext::new(w, h);

        let outline = rounded_rect_path(
            f64::from(layout.canvas.width),
            f64::from(layout.canvas.height),
            layout.corner_radius,
        );
        let outline = bezpath_to_cpu(&outline);
        ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
        ctx.set_paint(layout.background.to_paint());
        ctx.fill_path(&outline);

        ctx.push_clip_layer(&outline);
        draw_image(&mut ctx, &source, layout.image)?;
        self.typesetter.fill_text(&mut ctx, &layout.title)?;
        for line in &layout.description {
            self.typesetter.fill_text(&mut ctx, line)?;
        }

        let logo_size = layout.logo.width().round().max(1.0) as u32;
        let logo = load_logo(loader, &self.branding.logo, logo_size)?;
        draw_image(&mut ctx, &logo, layout.logo)?;
        self.typesetter.fill_text(&mut ctx, &layout.brand)?;
        ctx.pop_layer();

        ctx.flush();
        let mut pixmap = vello_cpu::Pixmap::new(w, h);
        ctx.render_to_pixmap(&mut pixmap);

        let mut rgba = pixmap.data_as_u8_slice().to_vec();
        unpremultiply_rgba8_in_place(&mut rgba);
        let png = encode_png(&rgba, layout.canvas.width, layout.canvas.height)?;

        let file_name = export_file_name(&result.title);
        tracing::info!(
            file = %file_name,
            width = layout.canvas.width,
            height = layout.canvas.height,
            "card composed"
        );
        Ok(ExportedImage {
            file_name,
            width: layout.canvas.width,
            height: layout.canvas.height,
            png,
        })
    }
}

/// Draw `img` scaled into `dst`.
fn draw_image(
    ctx: &mut vello_cpu::RenderContext,
    img: &DecodedImage,
    dst: Rect,
) -> NyangResult<()> {
    let pixmap = pixmap_from_premul_bytes(&img.rgba8_premul, img.width, img.height)?;
    let sx = dst.width() / f64::from(img.width);
    let sy = dst.height() / f64::from(img.height);
    ctx.set_transform(
        vello_cpu::kurbo::Affine::translate((dst.x0, dst.y0))
            * vello_cpu::kurbo::Affine::scale_non_uniform(sx, sy),
    );
    ctx.set_paint(vello_cpu::Image {
        image: vello_cpu::ImageSource::Pixmap(Arc::new(pixmap)),
        sampler: vello_cpu::peniko::ImageSampler::default(),
    });
    ctx.fill_rect(&vello_cpu::kurbo::Rect::new(
        0.0,
        0.0,
        f64::from(img.width),
        f64::from(img.height),
    ));
    Ok(())
}

fn bezpath_to_cpu(path: &BezPath) -> vello_cpu::kurbo::BezPath {
    use kurbo::PathEl;

    let mut out = vello_cpu::kurbo::BezPath::new();
    for &el in path.elements() {
        match el {
            PathEl::MoveTo(p) => out.move_to(vello_cpu::kurbo::Point::new(p.x, p.y)),
            PathEl::LineTo(p) => out.line_to(vello_cpu::kurbo::Point::new(p.x, p.y)),
            PathEl::QuadTo(p1, p2) => out.quad_to(
                vello_cpu::kurbo::Point::new(p1.x, p1.y),
                vello_cpu::kurbo::Point::new(p2.x, p2.y),
            ),
            PathEl::CurveTo(p1, p2, p3) => out.curve_to(
                vello_cpu::kurbo::Point::new(p1.x, p1.y),
                vello_cpu::kurbo::Point::new(p2.x, p2.y),
                vello_cpu::kurbo::Point::new(p3.x, p3.y),
            ),
            PathEl::ClosePath => out.close_path(),
        }
    }
    out
}

fn pixmap_from_premul_bytes(
    bytes: &[u8],
    width: u32,
    height: u32,
) -> NyangResult<vello_cpu::Pixmap> {
    let w: u16 = width
        .try_into()
        .map_err(|_| NyangError::render("image width exceeds u16"))?;
    let h: u16 = height
        .try_into()
        .map_err(|_| NyangError::render("image height exceeds u16"))?;
    if bytes.len() != (width as usize) * (height as usize) * 4 {
        return Err(NyangError::render("image byte len mismatch"));
    }
    let pixels = bytes
        .chunks_exact(4)
        .map(|px| vello_cpu::peniko::color::PremulRgba8::from_u8_array([px[0], px[1], px[2], px[3]]))
        .collect::<Vec<_>>();
    Ok(vello_cpu::Pixmap::from_parts_with_opacity(pixels, w, h, true))
}

#[cfg(test)]
#[path = "../../tests/unit/compose/raster.rs"]
mod tests;
