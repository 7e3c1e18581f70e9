use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context as _;

use crate::{
    compose::layout::fit_within,
    foundation::core::premultiply_rgba8_in_place,
    foundation::error::{AssetRole, NyangError, NyangResult},
};

/// Source of raw asset bytes, keyed by catalog reference (e.g. `images/result3.png`).
pub trait AssetLoader {
    /// Fetch the bytes behind `reference`.
    fn load(&self, reference: &str) -> anyhow::Result<Vec<u8>>;
}

/// Loads assets from files under a root directory.
#[derive(Clone, Debug)]
pub struct DirAssetLoader {
    root: PathBuf,
}

impl DirAssetLoader {
    /// Loader rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Asset root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl AssetLoader for DirAssetLoader {
    fn load(&self, reference: &str) -> anyhow::Result<Vec<u8>> {
        let rel = normalize_rel_path(reference)?;
        let path = self.root.join(rel);
        std::fs::read(&path).with_context(|| format!("read asset '{}'", path.display()))
    }
}

/// Loads assets from an in-memory map.
#[derive(Clone, Debug, Default)]
pub struct MemoryAssetLoader {
    entries: HashMap<String, Vec<u8>>,
}

impl MemoryAssetLoader {
    /// Empty loader.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `bytes` under `reference`.
    pub fn insert(&mut self, reference: impl Into<String>, bytes: Vec<u8>) -> &mut Self {
        self.entries.insert(reference.into(), bytes);
        self
    }
}

impl AssetLoader for MemoryAssetLoader {
    fn load(&self, reference: &str) -> anyhow::Result<Vec<u8>> {
        let key = normalize_rel_path(reference)?;
        self.entries
            .get(&key)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("no asset registered for '{key}'"))
    }
}

/// Normalize an asset reference into a clean relative path with `/` separators.
///
/// A leading `/` is treated as the asset root, matching how the web app addresses `public/`.
pub fn normalize_rel_path(reference: &str) -> anyhow::Result<String> {
    let s = reference.trim().replace('\\', "/");
    let mut out = Vec::<&str>::new();
    for part in s.split('/') {
        if part.is_empty() || part == "." {
            continue;
        }
        if part == ".." {
            anyhow::bail!("asset reference must not contain '..': '{reference}'");
        }
        out.push(part);
    }
    if out.is_empty() {
        anyhow::bail!("asset reference must contain a file name: '{reference}'");
    }
    Ok(out.join("/"))
}

/// Decoded raster with premultiplied RGBA8 pixels.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DecodedImage {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Row-major premultiplied RGBA8.
    pub rgba8_premul: Arc<Vec<u8>>,
}

/// Load and decode the result photo, scaling it down to at most `max_side` on its longer side.
#[tracing::instrument(skip(loader))]
pub fn load_source(
    loader: &dyn AssetLoader,
    reference: &str,
    max_side: u32,
) -> NyangResult<DecodedImage> {
    let bytes = loader
        .load(reference)
        .map_err(|e| NyangError::asset_load(AssetRole::Source, reference, e))?;
    decode_raster(&bytes, Some(max_side))
        .map_err(|e| NyangError::asset_load(AssetRole::Source, reference, e))
}

/// Load and decode the footer logo into a `size`x`size` square. SVG logos are rasterized.
#[tracing::instrument(skip(loader))]
pub fn load_logo(loader: &dyn AssetLoader, reference: &str, size: u32) -> NyangResult<DecodedImage> {
    let bytes = loader
        .load(reference)
        .map_err(|e| NyangError::asset_load(AssetRole::Logo, reference, e))?;
    let decoded = if is_svg(reference, &bytes) {
        rasterize_svg(&bytes, size)
    } else {
        decode_raster(&bytes, None).and_then(|img| resize_exact(img, size))
    };
    decoded.map_err(|e| NyangError::asset_load(AssetRole::Logo, reference, e))
}

fn is_svg(reference: &str, bytes: &[u8]) -> bool {
    if reference.to_ascii_lowercase().ends_with(".svg") {
        return true;
    }
    let head = &bytes[..bytes.len().min(256)];
    String::from_utf8_lossy(head).contains("<svg")
}

fn decode_raster(bytes: &[u8], max_side: Option<u32>) -> anyhow::Result<DecodedImage> {
    let mut dyn_img = image::load_from_memory(bytes).context("decode image from memory")?;
    if let Some(max_side) = max_side {
        let (w, h) = fit_within(dyn_img.width(), dyn_img.height(), max_side);
        if (w, h) != (dyn_img.width(), dyn_img.height()) {
            tracing::debug!(from_w = dyn_img.width(), from_h = dyn_img.height(), w, h, "source scaled down");
            dyn_img = dyn_img.resize_exact(w, h, image::imageops::FilterType::Triangle);
        }
    }
    let rgba = dyn_img.to_rgba8();
    let (width, height) = rgba.dimensions();
    if width == 0 || height == 0 {
        anyhow::bail!("image has no pixels");
    }
    let mut rgba8_premul = rgba.into_raw();
    premultiply_rgba8_in_place(&mut rgba8_premul);
    Ok(DecodedImage {
        width,
        height,
        rgba8_premul: Arc::new(rgba8_premul),
    })
}

fn resize_exact(img: DecodedImage, size: u32) -> anyhow::Result<DecodedImage> {
    if img.width == size && img.height == size {
        return Ok(img);
    }
    let buf = image::RgbaImage::from_raw(img.width, img.height, img.rgba8_premul.to_vec())
        .context("rebuild logo buffer")?;
    // Pixels stay premultiplied through the resize.
    let resized = image::imageops::resize(&buf, size, size, image::imageops::FilterType::Triangle);
    Ok(DecodedImage {
        width: size,
        height: size,
        rgba8_premul: Arc::new(resized.into_raw()),
    })
}

fn rasterize_svg(bytes: &[u8], size: u32) -> anyhow::Result<DecodedImage> {
    let opts = usvg::Options::default();
    let tree = usvg::Tree::from_data(bytes, &opts).context("parse svg tree")?;
    let mut pixmap = resvg::tiny_skia::Pixmap::new(size, size)
        .context("allocate svg pixmap")?;

    let sx = (size as f32) / tree.size().width();
    let sy = (size as f32) / tree.size().height();
    let xform = resvg::tiny_skia::Transform::from_scale(sx, sy);
    resvg::render(&tree, xform, &mut pixmap.as_mut());

    Ok(DecodedImage {
        width: size,
        height: size,
        rgba8_premul: Arc::new(pixmap.data().to_vec()),
    })
}

#[cfg(test)]
#[path = "../../tests/unit/compose/assets.rs"]
mod tests;
