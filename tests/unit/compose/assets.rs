use std::io::Cursor;

use super::*;

fn png(w: u32, h: u32, rgba: [u8; 4]) -> Vec<u8> {
    let img = image::RgbaImage::from_pixel(w, h, image::Rgba(rgba));
    let mut out = Vec::new();
    img.write_to(&mut Cursor::new(&mut out), image::ImageFormat::Png)
        .unwrap();
    out
}

const RED_SVG: &str = r##"<svg xmlns="http://www.w3.org/2000/svg" width="10" height="10"><rect width="10" height="10" fill="#ff0000"/></svg>"##;

#[test]
fn references_normalize_to_clean_relative_paths() {
    assert_eq!(normalize_rel_path("/images/a.png").unwrap(), "images/a.png");
    assert_eq!(normalize_rel_path("images\\cats\\b.png").unwrap(), "images/cats/b.png");
    assert_eq!(normalize_rel_path("./images//c.png").unwrap(), "images/c.png");
    assert!(normalize_rel_path("../secret.png").is_err());
    assert!(normalize_rel_path("").is_err());
    assert!(normalize_rel_path("/").is_err());
}

#[test]
fn memory_loader_matches_normalized_keys() {
    let mut loader = MemoryAssetLoader::new();
    loader.insert("images/a.png", vec![1, 2, 3]);
    assert_eq!(loader.load("/images/a.png").unwrap(), vec![1, 2, 3]);
    assert!(loader.load("images/missing.png").is_err());
}

#[test]
fn dir_loader_reads_under_root() {
    let root = std::env::temp_dir().join(format!("nyangseng-assets-{}", std::process::id()));
    std::fs::create_dir_all(root.join("images")).unwrap();
    std::fs::write(root.join("images/x.bin"), b"xyz").unwrap();

    let loader = DirAssetLoader::new(&root);
    assert_eq!(loader.load("/images/x.bin").unwrap(), b"xyz".to_vec());
    let err = loader.load("images/nope.bin").unwrap_err();
    assert!(err.to_string().contains("read asset"));

    let _ = std::fs::remove_dir_all(&root);
}

#[test]
fn source_is_premultiplied_and_scaled_down() {
    let mut loader = MemoryAssetLoader::new();
    loader.insert("big.png", png(800, 400, [200, 100, 50, 128]));
    loader.insert("small.png", png(30, 20, [200, 100, 50, 128]));

    let big = load_source(&loader, "big.png", 400).unwrap();
    assert_eq!((big.width, big.height), (400, 200));

    let small = load_source(&loader, "small.png", 400).unwrap();
    assert_eq!((small.width, small.height), (30, 20));
    assert_eq!(small.rgba8_premul.len(), 30 * 20 * 4);
    assert_eq!(&small.rgba8_premul[..4], &[100, 50, 25, 128]);
}

#[test]
fn source_failures_are_tagged_with_their_role() {
    let mut loader = MemoryAssetLoader::new();
    loader.insert("broken.png", b"definitely not a png".to_vec());

    for reference in ["broken.png", "missing.png"] {
        match load_source(&loader, reference, 400) {
            Err(NyangError::AssetLoad { role, reference: r, .. }) => {
                assert_eq!(role, AssetRole::Source);
                assert_eq!(r, reference);
            }
            other => panic!("expected asset load failure, got {other:?}"),
        }
    }
}

#[test]
fn raster_logo_is_resized_to_slot() {
    let mut loader = MemoryAssetLoader::new();
    loader.insert("images/logo.png", png(64, 64, [0, 0, 255, 255]));
    let logo = load_logo(&loader, "images/logo.png", 28).unwrap();
    assert_eq!((logo.width, logo.height), (28, 28));
    assert_eq!(logo.rgba8_premul.len(), 28 * 28 * 4);
    assert_eq!(&logo.rgba8_premul[..4], &[0, 0, 255, 255]);
}

#[test]
fn svg_logo_is_rasterized() {
    let mut loader = MemoryAssetLoader::new();
    loader.insert("images/logo.svg", RED_SVG.as_bytes().to_vec());
    let logo = load_logo(&loader, "images/logo.svg", 20).unwrap();
    assert_eq!((logo.width, logo.height), (20, 20));
    let center = ((10 * 20 + 10) * 4) as usize;
    assert_eq!(&logo.rgba8_premul[center..center + 4], &[255, 0, 0, 255]);
}

#[test]
fn svg_is_sniffed_without_extension() {
    assert!(is_svg("logo", RED_SVG.as_bytes()));
    assert!(is_svg("LOGO.SVG", b""));
    assert!(!is_svg("logo.png", &png(1, 1, [0, 0, 0, 255])));
}

#[test]
fn logo_failures_are_tagged_with_their_role() {
    let mut loader = MemoryAssetLoader::new();
    loader.insert("images/logo.svg", b"<svg".to_vec());
    let err = load_logo(&loader, "images/logo.svg", 20).unwrap_err();
    assert!(matches!(err, NyangError::AssetLoad { role: AssetRole::Logo, .. }));
    assert!(err.is_user_visible());
}
