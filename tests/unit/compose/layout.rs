use kurbo::Shape as _;

use super::*;
use crate::compose::text::MonospaceTypesetter;

fn layout_for(params: &LayoutParams, size: (u32, u32), title: &str, description: &str) -> CardLayout {
    let mut mono = MonospaceTypesetter::default();
    compute_layout(params, size, title, description, "nyangseng", &mut mono).unwrap()
}

#[test]
fn canvas_follows_the_reduction_formula() {
    let params = LayoutParams::default();
    // 40 chars at 18 chars/line -> 3 lines -> 72px text block.
    let description = "x".repeat(40);
    let canvas = params.canvas(200, 150, &description);
    assert_eq!(canvas.width, 340);
    // (150 + 72 + 120 + 120 + 160) * 0.7 = 435.4
    assert_eq!(canvas.height, 436);

    // Wide images drive the width.
    assert_eq!(params.canvas(380, 150, &description).width, 420);
}

#[test]
fn text_block_is_capped_at_three_lines() {
    let params = LayoutParams::default();
    assert_eq!(params.text_block_height(""), 0.0);
    assert_eq!(params.text_block_height(&"x".repeat(18)), 24.0);
    assert_eq!(params.text_block_height(&"x".repeat(19)), 48.0);
    assert_eq!(params.text_block_height(&"x".repeat(5_000)), 72.0);
}

#[test]
fn layout_is_reproducible() {
    let params = LayoutParams::default();
    let a = layout_for(&params, (240, 180), "Temple Scholar", "Reads all day and naps all night.");
    let b = layout_for(&params, (240, 180), "Temple Scholar", "Reads all day and naps all night.");
    assert_eq!(a, b);
}

#[test]
fn title_and_lines_are_centered() {
    let params = LayoutParams::default();
    let l = layout_for(
        &params,
        (200, 150),
        "Royal Palace Cat",
        "Born among silk cushions, you ruled the palace with a single slow blink.",
    );
    let mid = f64::from(l.canvas.width) / 2.0;

    assert_eq!(l.image, Rect::new(20.0, 20.0, 220.0, 170.0));
    assert!((l.title.origin.x + l.title.width / 2.0 - mid).abs() < 1e-9);
    assert_eq!(l.title.origin.y, 170.0 + params.image_to_title_px);

    assert!(l.description.len() > 1);
    for (i, line) in l.description.iter().enumerate() {
        assert!((line.origin.x + line.width / 2.0 - mid).abs() < 1e-9);
        assert!(line.width <= params.text_column_width_px);
        let expected = l.title.origin.y + params.title_to_description_px + i as f64 * params.line_height_px;
        assert_eq!(line.origin.y, expected);
    }
}

#[test]
fn footer_is_right_anchored_and_vertically_centered() {
    let params = LayoutParams::default();
    let l = layout_for(&params, (200, 150), "Cat", "");
    let w = f64::from(l.canvas.width);
    let h = f64::from(l.canvas.height);
    let band_mid = h - params.footer_height_px / 2.0;

    assert_eq!(l.logo.width(), params.logo_size_px);
    assert!((l.logo.center().y - band_mid).abs() < 1e-9);
    assert_eq!(l.brand.anchor, TextAnchor::Middle);
    assert_eq!(l.brand.origin.y, band_mid);
    assert!((l.brand.origin.x - (l.logo.x1 + params.logo_gap_px)).abs() < 1e-9);
    assert!((l.brand.origin.x + l.brand.width - (w - params.padding_px)).abs() < 1e-9);
}

#[test]
fn overflow_is_reported_not_hidden() {
    let cramped = LayoutParams {
        height_reduction: 0.4,
        ..LayoutParams::default()
    };
    let l = layout_for(&cramped, (200, 150), "Cat", &"word ".repeat(30));
    assert!(l.overflow_px > 0.0);

    let l = layout_for(&LayoutParams::default(), (200, 150), "Cat", "");
    assert_eq!(l.overflow_px, 0.0);
}

#[test]
fn default_cards_keep_title_and_description_above_the_footer() {
    let catalog =
        crate::Catalog::from_json_str(include_str!("../../data/catalog.json")).unwrap();
    let result = catalog.result("result2").unwrap();
    let params = LayoutParams::default();

    for size in [(200, 200), (240, 180), (400, 400)] {
        let l = layout_for(&params, size, &result.title, &result.description);
        let band_top = f64::from(l.canvas.height) - params.footer_height_px;

        assert_eq!(l.overflow_px, 0.0, "{size:?}");
        assert!(l.title.origin.y > l.image.y1, "{size:?}");
        assert!(l.title.origin.y < band_top, "{size:?}");
        assert_eq!(l.description.len(), 3, "{size:?}");
        for line in &l.description {
            assert!(line.origin.y > l.title.origin.y, "{size:?}");
            assert!(line.origin.y < band_top, "{size:?}");
        }
    }
}

#[test]
fn capped_description_fits_at_the_largest_source() {
    let params = LayoutParams::default();
    let side = params.max_source_side_px;
    let l = layout_for(&params, (side, side), "Cat", &"x ".repeat(45));
    assert_eq!(l.description.len(), 3);
    assert_eq!(params.text_block_height(&"x ".repeat(45)), 72.0);
    let band_top = f64::from(l.canvas.height) - params.footer_height_px;
    let last = l.description.last().unwrap().origin.y;
    assert!(last + f64::from(params.description_size_px) / 2.0 <= band_top);
}

#[test]
fn corner_radius_is_clamped_to_the_canvas() {
    let params = LayoutParams {
        corner_radius_px: 10_000.0,
        ..LayoutParams::default()
    };
    let l = layout_for(&params, (10, 10), "a", "");
    let limit = f64::from(l.canvas.width.min(l.canvas.height)) / 2.0;
    assert_eq!(l.corner_radius, limit);
}

#[test]
fn empty_image_is_rejected() {
    let mut mono = MonospaceTypesetter::default();
    let err = compute_layout(&LayoutParams::default(), (0, 10), "t", "d", "b", &mut mono).unwrap_err();
    assert!(matches!(err, NyangError::Render(_)));
}

#[test]
fn validate_rejects_bad_geometry() {
    let bad = [
        LayoutParams {
            height_reduction: 0.0,
            ..LayoutParams::default()
        },
        LayoutParams {
            padding_px: -1.0,
            ..LayoutParams::default()
        },
        LayoutParams {
            description_size_px: f32::NAN,
            ..LayoutParams::default()
        },
        LayoutParams {
            max_source_side_px: 0,
            ..LayoutParams::default()
        },
    ];
    for p in bad {
        assert!(matches!(p.validate(), Err(NyangError::Validation(_))));
    }
    LayoutParams::default().validate().unwrap();
}

#[test]
fn params_deserialize_with_defaults() {
    let p: LayoutParams = serde_json::from_str(r#"{ "padding_px": 12, "height_reduction": 0.9 }"#).unwrap();
    assert_eq!(p.padding_px, 12.0);
    assert_eq!(p.height_reduction, 0.9);
    assert_eq!(p.text_column_width_px, LayoutParams::default().text_column_width_px);
    assert_eq!(p.background, Rgba8::WHITE);
}

#[test]
fn fit_within_keeps_aspect_ratio() {
    assert_eq!(fit_within(800, 600, 400), (400, 300));
    assert_eq!(fit_within(600, 1200, 400), (200, 400));
    assert_eq!(fit_within(300, 200, 400), (300, 200));
    assert_eq!(fit_within(4000, 1, 400), (400, 1));
}

#[test]
fn rounded_rect_spans_the_canvas() {
    let (w, h, r) = (300.0, 200.0, 24.0);
    let path = rounded_rect_path(w, h, r);
    let bb = path.bounding_box();
    assert!(bb.x0.abs() < 1e-6 && bb.y0.abs() < 1e-6);
    assert!((bb.x1 - w).abs() < 1e-6 && (bb.y1 - h).abs() < 1e-6);

    let expected = w * h - (4.0 - std::f64::consts::PI) * r * r;
    assert!((path.area().abs() - expected).abs() < 1.0);
}

#[test]
fn rounded_rect_with_zero_radius_is_a_rectangle() {
    let path = rounded_rect_path(10.0, 5.0, 0.0);
    assert!((path.area().abs() - 50.0).abs() < 1e-9);
}
