use super::*;
use crate::foundation::core::Point;

fn test_font_bytes() -> Option<Vec<u8>> {
    if let Ok(p) = std::env::var("NYANGSENG_TEST_FONT") {
        return std::fs::read(p).ok();
    }
    [
        "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
        "/usr/share/fonts/TTF/DejaVuSans.ttf",
        "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
        "/System/Library/Fonts/Supplemental/Arial.ttf",
        "C:\\Windows\\Fonts\\arial.ttf",
    ]
    .iter()
    .find_map(|p| std::fs::read(p).ok())
}

fn placed(text: &str, x: f64, y: f64, size_px: f32, anchor: TextAnchor) -> PlacedText {
    PlacedText {
        text: text.to_string(),
        origin: Point::new(x, y),
        width: 0.0,
        size_px,
        anchor,
        color: Rgba8::opaque(0, 0, 0),
    }
}

fn alpha_at(pixmap: &vello_cpu::Pixmap, x: usize, y: usize) -> u8 {
    let w = pixmap.width() as usize;
    pixmap.data_as_u8_slice()[(y * w + x) * 4 + 3]
}

#[test]
fn wrap_is_greedy_and_keeps_long_words_whole() {
    // 6px per character at size 10.
    let mut mono = MonospaceTypesetter::default();
    assert_eq!(
        wrap_words("aaaa bbbb cccc", 60.0, 10.0, &mut mono),
        vec!["aaaa bbbb".to_string(), "cccc".to_string()]
    );
    assert_eq!(
        wrap_words("abcdefghijklmnop qr", 60.0, 10.0, &mut mono),
        vec!["abcdefghijklmnop".to_string(), "qr".to_string()]
    );
    assert_eq!(
        wrap_words("  spaced    out  ", 600.0, 10.0, &mut mono),
        vec!["spaced out".to_string()]
    );
    assert!(wrap_words("", 60.0, 10.0, &mut mono).is_empty());
}

#[test]
fn monospace_width_scales_with_chars_and_size() {
    let mut mono = MonospaceTypesetter { advance_em: 0.5 };
    assert_eq!(mono.text_width("abcd", 10.0), 20.0);
    assert_eq!(mono.text_width("고양이", 20.0), 30.0);
    assert_eq!(mono.text_width("", 20.0), 0.0);
}

#[test]
fn monospace_paints_one_box_per_glyph() {
    let mut ctx = vello_cpu::RenderContext::new(100, 40);
    let mut mono = MonospaceTypesetter::default();
    // 12px advance; boxes span y 18..30.
    mono.fill_text(&mut ctx, &placed("a b", 10.0, 30.0, 20.0, TextAnchor::Baseline))
        .unwrap();
    ctx.flush();
    let mut pixmap = vello_cpu::Pixmap::new(100, 40);
    ctx.render_to_pixmap(&mut pixmap);

    assert_eq!(alpha_at(&pixmap, 15, 25), 255);
    assert_eq!(alpha_at(&pixmap, 27, 25), 0, "space is not painted");
    assert_eq!(alpha_at(&pixmap, 39, 25), 255);
    assert_eq!(alpha_at(&pixmap, 15, 10), 0, "nothing above the box");
}

#[test]
fn parley_rejects_garbage_font_bytes() {
    let err = ParleyTypesetter::from_font_bytes(b"not a font".to_vec()).unwrap_err();
    assert!(matches!(err, NyangError::Render(_)));
}

#[test]
fn parley_measures_and_paints_with_a_real_font() {
    let Some(bytes) = test_font_bytes() else {
        return;
    };
    let mut ts = ParleyTypesetter::from_font_bytes(bytes).unwrap();
    assert!(!ts.family_name().is_empty());

    let one = ts.text_width("meow", 20.0);
    let two = ts.text_width("meowmeow", 20.0);
    assert!(one > 0.0);
    assert!((two - 2.0 * one).abs() < 1.0);
    assert!(ts.text_width("meow", 40.0) > one);
    assert_eq!(ts.text_width("", 20.0), 0.0);

    let mut ctx = vello_cpu::RenderContext::new(200, 60);
    ts.fill_text(&mut ctx, &placed("meow", 10.0, 40.0, 24.0, TextAnchor::Baseline))
        .unwrap();
    ctx.flush();
    let mut pixmap = vello_cpu::Pixmap::new(200, 60);
    ctx.render_to_pixmap(&mut pixmap);

    let painted_above_baseline = (0..40).any(|y| (0..200).any(|x| alpha_at(&pixmap, x, y) > 0));
    let painted_far_below = (50..60).any(|y| (0..200).any(|x| alpha_at(&pixmap, x, y) > 0));
    assert!(painted_above_baseline);
    assert!(!painted_far_below);
}

#[test]
fn wrapped_lines_fit_and_preserve_the_words() {
    let mut mono = MonospaceTypesetter::default();
    let text = "a whiskered scholar of the old temple who read every scroll twice and \
                supercalifragilisticexpialidocious naps";
    let max_width = 96.0;
    let lines = wrap_words(text, max_width, 10.0, &mut mono);

    for line in &lines {
        let single_word = !line.contains(' ');
        assert!(mono.text_width(line, 10.0) <= max_width || single_word, "{line}");
    }
    let rejoined: Vec<&str> = lines.iter().flat_map(|l| l.split(' ')).collect();
    let original: Vec<&str> = text.split_whitespace().collect();
    assert_eq!(rejoined, original);
}
