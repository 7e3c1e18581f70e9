use std::io::Cursor;

use super::*;
use crate::compose::assets::MemoryAssetLoader;
use crate::compose::layout::rounded_rect_path;
use crate::compose::text::MonospaceTypesetter;
use crate::foundation::error::AssetRole;

fn png(w: u32, h: u32, rgba: [u8; 4]) -> Vec<u8> {
    let img = image::RgbaImage::from_pixel(w, h, image::Rgba(rgba));
    let mut out = Vec::new();
    img.write_to(&mut Cursor::new(&mut out), image::ImageFormat::Png)
        .unwrap();
    out
}

fn result() -> QuizResult {
    QuizResult {
        id: "result1".to_string(),
        title: "Royal Palace Cat".to_string(),
        description: "Born among silk cushions.".to_string(),
        image: "images/result1.png".to_string(),
        tags: Default::default(),
    }
}

fn compositor() -> Compositor<MonospaceTypesetter> {
    Compositor::new(
        LayoutParams::default(),
        Branding::default(),
        MonospaceTypesetter::default(),
    )
    .unwrap()
}

#[test]
fn branding_defaults_and_partial_json() {
    let b = Branding::default();
    assert_eq!(b.logo, "images/logo.png");
    assert_eq!(b.brand_text, "nyangseng");

    let b: Branding = serde_json::from_str(r#"{ "brand_text": "냥생" }"#).unwrap();
    assert_eq!(b.logo, "images/logo.png");
    assert_eq!(b.brand_text, "냥생");
}

#[test]
fn invalid_params_are_rejected_up_front() {
    let params = LayoutParams {
        line_height_px: 0.0,
        ..LayoutParams::default()
    };
    let err = Compositor::new(params, Branding::default(), MonospaceTypesetter::default())
        .unwrap_err();
    assert!(matches!(err, NyangError::Validation(_)));
}

#[test]
fn compose_produces_a_png_of_the_layout_size() {
    let mut loader = MemoryAssetLoader::new();
    loader
        .insert("images/result1.png", png(200, 150, [220, 40, 40, 255]))
        .insert("images/logo.png", png(16, 16, [0, 0, 0, 255]));

    let mut c = compositor();
    let expected = c.layout(&result(), (200, 150)).unwrap().canvas;
    let out = c.compose(&result(), &loader).unwrap();

    assert_eq!(out.file_name, "Royal Palace Cat.png");
    assert_eq!((out.width, out.height), (expected.width, expected.height));
    let decoded = image::load_from_memory(&out.png).unwrap().to_rgba8();
    assert_eq!(decoded.dimensions(), (out.width, out.height));
    assert_eq!(decoded.get_pixel(100, 80).0, [220, 40, 40, 255]);
}

#[test]
fn logo_failure_aborts_after_the_source_loaded() {
    let mut loader = MemoryAssetLoader::new();
    loader.insert("images/result1.png", png(50, 50, [10, 10, 10, 255]));

    let err = compositor().compose(&result(), &loader).unwrap_err();
    assert!(matches!(err, NyangError::AssetLoad { role: AssetRole::Logo, .. }));
}

#[test]
fn source_failure_aborts_before_anything_else() {
    let loader = MemoryAssetLoader::new();
    let err = compositor().compose(&result(), &loader).unwrap_err();
    match err {
        NyangError::AssetLoad { role, reference, .. } => {
            assert_eq!(role, AssetRole::Source);
            assert_eq!(reference, "images/result1.png");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn path_conversion_keeps_every_element() {
    let path = rounded_rect_path(100.0, 60.0, 12.0);
    let cpu = bezpath_to_cpu(&path);
    assert_eq!(cpu.elements().len(), path.elements().len());
}

#[test]
fn pixmap_rejects_short_buffers() {
    let err = pixmap_from_premul_bytes(&[0; 12], 2, 2).unwrap_err();
    assert!(matches!(err, NyangError::Render(_)));
    let ok = pixmap_from_premul_bytes(&[0; 16], 2, 2).unwrap();
    assert_eq!((ok.width(), ok.height()), (2, 2));
}
