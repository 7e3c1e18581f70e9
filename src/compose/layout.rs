use std::f64::consts::{FRAC_PI_2, PI};

use kurbo::{Arc, BezPath, Point, Rect, Vec2};

use crate::{
    compose::text::{TextMeasure, wrap_words},
    foundation::core::{Canvas, Rgba8},
    foundation::error::{NyangError, NyangResult},
};

/// Flattening tolerance for the corner arcs.
const ARC_TOLERANCE: f64 = 0.1;

/// Fixed geometry and typography of the exported result card.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct LayoutParams {
    /// Inset of the image from the card edge, and the horizontal margin around the content.
    pub padding_px: f64,
    /// Width of the title/description column.
    pub text_column_width_px: f64,
    /// Title font size.
    pub title_size_px: f32,
    /// Description font size.
    pub description_size_px: f32,
    /// Distance between description baselines.
    pub line_height_px: f64,
    /// Cap on the description lines counted into the canvas height.
    pub max_description_lines: u32,
    /// Gap from the image bottom to the title baseline.
    pub image_to_title_px: f64,
    /// Gap from the title baseline to the first description baseline.
    pub title_to_description_px: f64,
    /// Height of the footer band at the bottom of the card.
    pub footer_height_px: f64,
    /// Image-to-title allowance counted into the height sum.
    pub reserved_image_to_title_px: f64,
    /// Title-to-description allowance counted into the height sum.
    pub reserved_title_to_description_px: f64,
    /// Footer allowance counted into the height sum.
    ///
    /// The three allowances overshoot the drawn gaps; [`LayoutParams::height_reduction`] brings
    /// the sum back to a card that still holds the padding, the title, the capped description and
    /// the footer band.
    pub reserved_footer_px: f64,
    /// Side of the square logo slot.
    pub logo_size_px: f64,
    /// Space between the logo and the brand text.
    pub logo_gap_px: f64,
    /// Brand text font size.
    pub brand_size_px: f32,
    /// Corner radius of the card background.
    pub corner_radius_px: f64,
    /// Scale applied to the summed vertical extent.
    pub height_reduction: f64,
    /// Source images larger than this on either side are scaled down before layout.
    pub max_source_side_px: u32,
    /// Card background.
    pub background: Rgba8,
    /// Title and description color.
    pub text_color: Rgba8,
    /// Brand text color.
    pub brand_color: Rgba8,
}

impl Default for LayoutParams {
    fn default() -> Self {
        Self {
            padding_px: 20.0,
            text_column_width_px: 300.0,
            title_size_px: 26.0,
            description_size_px: 16.0,
            line_height_px: 24.0,
            max_description_lines: 3,
            image_to_title_px: 40.0,
            title_to_description_px: 36.0,
            footer_height_px: 56.0,
            reserved_image_to_title_px: 120.0,
            reserved_title_to_description_px: 120.0,
            reserved_footer_px: 160.0,
            logo_size_px: 28.0,
            logo_gap_px: 8.0,
            brand_size_px: 14.0,
            corner_radius_px: 20.0,
            height_reduction: 0.7,
            max_source_side_px: 400,
            background: Rgba8::WHITE,
            text_color: Rgba8::opaque(31, 41, 55),
            brand_color: Rgba8::opaque(107, 114, 128),
        }
    }
}

impl LayoutParams {
    /// Reject non-finite or non-positive geometry.
    pub fn validate(&self) -> NyangResult<()> {
        let lengths = [
            ("padding_px", self.padding_px),
            ("image_to_title_px", self.image_to_title_px),
            ("title_to_description_px", self.title_to_description_px),
            ("footer_height_px", self.footer_height_px),
            ("reserved_image_to_title_px", self.reserved_image_to_title_px),
            (
                "reserved_title_to_description_px",
                self.reserved_title_to_description_px,
            ),
            ("reserved_footer_px", self.reserved_footer_px),
            ("logo_gap_px", self.logo_gap_px),
            ("corner_radius_px", self.corner_radius_px),
        ];
        for (name, v) in lengths {
            if !v.is_finite() || v < 0.0 {
                return Err(NyangError::validation(format!(
                    "{name} must be finite and >= 0"
                )));
            }
        }
        let sizes = [
            ("text_column_width_px", self.text_column_width_px),
            ("line_height_px", self.line_height_px),
            ("logo_size_px", self.logo_size_px),
            ("title_size_px", f64::from(self.title_size_px)),
            ("description_size_px", f64::from(self.description_size_px)),
            ("brand_size_px", f64::from(self.brand_size_px)),
        ];
        for (name, v) in sizes {
            if !v.is_finite() || v <= 0.0 {
                return Err(NyangError::validation(format!(
                    "{name} must be finite and > 0"
                )));
            }
        }
        if !(self.height_reduction > 0.0 && self.height_reduction <= 1.0) {
            return Err(NyangError::validation(
                "height_reduction must be in (0, 1]",
            ));
        }
        if self.max_source_side_px == 0 {
            return Err(NyangError::validation("max_source_side_px must be > 0"));
        }
        Ok(())
    }

    /// Card width for a source image `image_width` pixels wide.
    pub fn canvas_width(&self, image_width: u32) -> f64 {
        f64::from(image_width).max(self.text_column_width_px) + 2.0 * self.padding_px
    }

    /// Description block height counted into the canvas: proportional to the character count,
    /// capped at [`LayoutParams::max_description_lines`].
    pub fn text_block_height(&self, description: &str) -> f64 {
        let chars = description.chars().count() as f64;
        let chars_per_line =
            (self.text_column_width_px / f64::from(self.description_size_px)).floor().max(1.0);
        let lines = (chars / chars_per_line)
            .ceil()
            .min(f64::from(self.max_description_lines));
        lines * self.line_height_px
    }

    /// Card height: image, text block and the reserved margins, scaled by
    /// [`LayoutParams::height_reduction`].
    pub fn canvas_height(&self, image_height: u32, description: &str) -> f64 {
        let sum = f64::from(image_height)
            + self.text_block_height(description)
            + self.reserved_image_to_title_px
            + self.reserved_title_to_description_px
            + self.reserved_footer_px;
        sum * self.height_reduction
    }

    /// Whole-pixel canvas for the given inputs.
    pub fn canvas(&self, image_width: u32, image_height: u32, description: &str) -> Canvas {
        Canvas {
            width: self.canvas_width(image_width).ceil() as u32,
            height: self.canvas_height(image_height, description).ceil() as u32,
        }
    }
}

/// Vertical reference of a [`PlacedText`] origin.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TextAnchor {
    /// `origin.y` is the alphabetic baseline.
    Baseline,
    /// `origin.y` is the middle of the ascent/descent box.
    Middle,
}

/// One line of text with its resolved position.
#[derive(Clone, Debug, PartialEq)]
pub struct PlacedText {
    /// Text to draw.
    pub text: String,
    /// Left edge and vertical reference point.
    pub origin: Point,
    /// Measured advance width.
    pub width: f64,
    /// Font size.
    pub size_px: f32,
    /// How `origin.y` is interpreted.
    pub anchor: TextAnchor,
    /// Fill color.
    pub color: Rgba8,
}

/// Resolved geometry of a result card, ready for the drawing executor.
#[derive(Clone, Debug, PartialEq)]
pub struct CardLayout {
    /// Output size.
    pub canvas: Canvas,
    /// Effective corner radius.
    pub corner_radius: f64,
    /// Background fill.
    pub background: Rgba8,
    /// Where the source image is drawn.
    pub image: Rect,
    /// Centered title line.
    pub title: PlacedText,
    /// Wrapped, per-line centered description.
    pub description: Vec<PlacedText>,
    /// Logo slot in the footer band.
    pub logo: Rect,
    /// Brand text to the right of the logo.
    pub brand: PlacedText,
    /// How far the last text baseline reaches into or past the footer band.
    pub overflow_px: f64,
}

/// Compute the card geometry for an image of `image_size` and the given texts.
pub fn compute_layout(
    params: &LayoutParams,
    image_size: (u32, u32),
    title: &str,
    description: &str,
    brand_text: &str,
    measure: &mut dyn TextMeasure,
) -> NyangResult<CardLayout> {
    params.validate()?;
    let (image_w, image_h) = image_size;
    if image_w == 0 || image_h == 0 {
        return Err(NyangError::render("source image has no pixels"));
    }

    let canvas = params.canvas(image_w, image_h, description);
    let canvas_w = f64::from(canvas.width);
    let canvas_h = f64::from(canvas.height);
    let p = params.padding_px;

    let image = Rect::new(p, p, p + f64::from(image_w), p + f64::from(image_h));

    let title_width = measure.text_width(title, params.title_size_px);
    let title_baseline = image.y1 + params.image_to_title_px;
    let title = PlacedText {
        text: title.to_string(),
        origin: Point::new((canvas_w - title_width) / 2.0, title_baseline),
        width: title_width,
        size_px: params.title_size_px,
        anchor: TextAnchor::Baseline,
        color: params.text_color,
    };

    let column_w = params.text_column_width_px;
    let column_left = (canvas_w - column_w) / 2.0;
    let mut baseline = title_baseline + params.title_to_description_px;
    let mut lines = Vec::new();
    for line in wrap_words(description, column_w, params.description_size_px, measure) {
        let width = measure.text_width(&line, params.description_size_px);
        lines.push(PlacedText {
            text: line,
            origin: Point::new(column_left + (column_w - width) / 2.0, baseline),
            width,
            size_px: params.description_size_px,
            anchor: TextAnchor::Baseline,
            color: params.text_color,
        });
        baseline += params.line_height_px;
    }

    let band_top = canvas_h - params.footer_height_px;
    let band_mid = band_top + params.footer_height_px / 2.0;
    let brand_width = measure.text_width(brand_text, params.brand_size_px);
    let footer_right = canvas_w - p;
    let logo_x = footer_right - brand_width - params.logo_gap_px - params.logo_size_px;
    let logo = Rect::from_origin_size(
        Point::new(logo_x, band_mid - params.logo_size_px / 2.0),
        (params.logo_size_px, params.logo_size_px),
    );
    let brand = PlacedText {
        text: brand_text.to_string(),
        origin: Point::new(logo.x1 + params.logo_gap_px, band_mid),
        width: brand_width,
        size_px: params.brand_size_px,
        anchor: TextAnchor::Middle,
        color: params.brand_color,
    };

    let content_bottom = lines
        .last()
        .map_or(title.origin.y, |l: &PlacedText| l.origin.y);
    let overflow_px = (content_bottom - band_top).max(0.0);

    Ok(CardLayout {
        canvas,
        corner_radius: params
            .corner_radius_px
            .min(canvas_w / 2.0)
            .min(canvas_h / 2.0),
        background: params.background,
        image,
        title,
        description: lines,
        logo,
        brand,
        overflow_px,
    })
}

/// Scale `(width, height)` down to fit in a `max_side` square, keeping the aspect ratio.
pub fn fit_within(width: u32, height: u32, max_side: u32) -> (u32, u32) {
    let longest = width.max(height);
    if longest <= max_side || longest == 0 {
        return (width, height);
    }
    let scale = f64::from(max_side) / f64::from(longest);
    let fit = |v: u32| ((f64::from(v) * scale).round() as u32).max(1);
    (fit(width), fit(height))
}

/// Closed rounded-rectangle outline at the origin: four edges joined by quarter-circle arcs.
pub fn rounded_rect_path(width: f64, height: f64, radius: f64) -> BezPath {
    let r = radius.min(width / 2.0).min(height / 2.0).max(0.0);
    let corner = |center: Point, start_angle: f64| Arc {
        center,
        radii: Vec2::new(r, r),
        start_angle,
        sweep_angle: FRAC_PI_2,
        x_rotation: 0.0,
    };

    let mut path = BezPath::new();
    path.move_to((r, 0.0));
    path.line_to((width - r, 0.0));
    path.extend(corner(Point::new(width - r, r), -FRAC_PI_2).append_iter(ARC_TOLERANCE));
    path.line_to((width, height - r));
    path.extend(corner(Point::new(width - r, height - r), 0.0).append_iter(ARC_TOLERANCE));
    path.line_to((r, height));
    path.extend(corner(Point::new(r, height - r), FRAC_PI_2).append_iter(ARC_TOLERANCE));
    path.line_to((0.0, r));
    path.extend(corner(Point::new(r, r), PI).append_iter(ARC_TOLERANCE));
    path.close_path();
    path
}

#[cfg(test)]
#[path = "../../tests/unit/compose/layout.rs"]
mod tests;
