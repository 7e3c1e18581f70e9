use std::io::Cursor;
use std::path::{Path, PathBuf};

use anyhow::Context as _;

use crate::foundation::error::{NyangError, NyangResult};

/// A finished result card, PNG-encoded.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExportedImage {
    /// Download file name, `<sanitized title>.png`.
    pub file_name: String,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Encoded PNG bytes.
    pub png: Vec<u8>,
}

/// `<title>.png` with characters that are unsafe in file names replaced by `_`.
///
/// A title that sanitizes to nothing becomes `result.png`.
pub fn export_file_name(title: &str) -> String {
    let cleaned: String = title
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();
    let trimmed = cleaned.trim().trim_matches('.');
    let stem = if trimmed.is_empty() { "result" } else { trimmed };
    format!("{stem}.png")
}

/// Encode straight-alpha RGBA8 pixels as PNG.
pub fn encode_png(rgba: &[u8], width: u32, height: u32) -> NyangResult<Vec<u8>> {
    let buf = image::RgbaImage::from_raw(width, height, rgba.to_vec())
        .ok_or_else(|| NyangError::render("pixel buffer does not match image size"))?;
    let mut png = Vec::new();
    buf.write_to(&mut Cursor::new(&mut png), image::ImageFormat::Png)
        .map_err(|e| NyangError::render(format!("encode png: {e}")))?;
    Ok(png)
}

/// Where a downloaded card ends up.
pub trait DownloadSink {
    /// Store `bytes` as `file_name`. Either the whole file lands or nothing does.
    fn deliver(&mut self, file_name: &str, bytes: &[u8]) -> NyangResult<()>;
}

/// Writes downloads into a directory.
#[derive(Clone, Debug)]
pub struct DirDownloadSink {
    dir: PathBuf,
}

impl DirDownloadSink {
    /// Sink writing into `dir`, created on first delivery.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Target directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl DownloadSink for DirDownloadSink {
    fn deliver(&mut self, file_name: &str, bytes: &[u8]) -> NyangResult<()> {
        std::fs::create_dir_all(&self.dir)
            .with_context(|| format!("create download dir '{}'", self.dir.display()))?;
        let final_path = self.dir.join(file_name);
        let part_path = self.dir.join(format!("{file_name}.part"));
        std::fs::write(&part_path, bytes)
            .with_context(|| format!("write '{}'", part_path.display()))?;
        if let Err(e) = std::fs::rename(&part_path, &final_path) {
            let _ = std::fs::remove_file(&part_path);
            return Err(anyhow::Error::new(e)
                .context(format!("move download into '{}'", final_path.display()))
                .into());
        }
        tracing::info!(path = %final_path.display(), bytes = bytes.len(), "card downloaded");
        Ok(())
    }
}

/// Hand `image` to `sink` under its export file name.
pub fn download(image: ExportedImage, sink: &mut dyn DownloadSink) -> NyangResult<()> {
    sink.deliver(&image.file_name, &image.png)
}

/// Platform share facility (e.g. the Web Share API).
pub trait ShareTarget {
    /// Whether files can be shared at all on this platform.
    fn can_share(&self) -> bool;
    /// Share `image`, with the result title as caption.
    fn share(&mut self, image: &ExportedImage, title: &str) -> NyangResult<()>;
}

/// Share target for platforms with no share facility.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoShare;

impl ShareTarget for NoShare {
    fn can_share(&self) -> bool {
        false
    }

    fn share(&mut self, _image: &ExportedImage, _title: &str) -> NyangResult<()> {
        Err(NyangError::validation("sharing is not supported"))
    }
}

/// Message shown when the platform cannot share files.
pub const SHARE_UNSUPPORTED_MESSAGE: &str =
    "Sharing is not supported on this device. Download the image instead.";

/// What happened to a share request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ShareOutcome {
    /// The platform accepted the image.
    Shared,
    /// No share facility; tell the user.
    Unsupported {
        /// User-facing explanation.
        message: String,
    },
}

/// Share when the platform can, otherwise explain why not.
pub fn share_or_explain(
    target: &mut dyn ShareTarget,
    image: &ExportedImage,
    title: &str,
) -> NyangResult<ShareOutcome> {
    if !target.can_share() {
        tracing::warn!(file = %image.file_name, "share requested on a platform without share support");
        return Ok(ShareOutcome::Unsupported {
            message: SHARE_UNSUPPORTED_MESSAGE.to_string(),
        });
    }
    target.share(image, title)?;
    Ok(ShareOutcome::Shared)
}

#[cfg(test)]
#[path = "../../tests/unit/compose/export.rs"]
mod tests;
