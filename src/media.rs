// Classification of icon and image cell values.
//
// A cell is checked in a fixed order: an existing local file wins, then an
// http(s) URL, then (icons only) a single emoji. Anything else is reported
// as a missing file.

use crate::error::{ImportError, Result};
use std::path::{Path, PathBuf};
use unicode_segmentation::UnicodeSegmentation;
use url::Url;

/// Where a row icon comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IconSource {
    File(PathBuf),
    Url(String),
    Emoji(String),
}

/// Where an inline image comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageSource {
    File(PathBuf),
    Url(String),
}

impl IconSource {
    /// Display form of the icon: file name, URL or the emoji itself.
    pub fn label(&self) -> String {
        match self {
            IconSource::File(path) => file_label(path),
            IconSource::Url(url) => url.clone(),
            IconSource::Emoji(emoji) => emoji.clone(),
        }
    }
}

impl ImageSource {
    pub fn label(&self) -> String {
        match self {
            ImageSource::File(path) => file_label(path),
            ImageSource::Url(url) => url.clone(),
        }
    }
}

fn file_label(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Classify an icon cell. Empty means no icon.
pub fn classify_icon(raw: &str, base_dir: &Path) -> Result<Option<IconSource>> {
    let value = raw.trim();
    if value.is_empty() {
        return Ok(None);
    }
    if let Some(path) = existing_file(value, base_dir) {
        return Ok(Some(IconSource::File(path)));
    }
    if is_web_url(value) {
        return Ok(Some(IconSource::Url(value.to_string())));
    }
    if is_single_emoji(value) {
        return Ok(Some(IconSource::Emoji(value.to_string())));
    }
    Err(ImportError::FileNotFound(PathBuf::from(value)))
}

/// Classify an image cell. Empty means no image.
pub fn classify_image(raw: &str, base_dir: &Path) -> Result<Option<ImageSource>> {
    let value = raw.trim();
    if value.is_empty() {
        return Ok(None);
    }
    if let Some(path) = existing_file(value, base_dir) {
        return Ok(Some(ImageSource::File(path)));
    }
    if is_web_url(value) {
        return Ok(Some(ImageSource::Url(value.to_string())));
    }
    Err(ImportError::FileNotFound(PathBuf::from(value)))
}

fn existing_file(value: &str, base_dir: &Path) -> Option<PathBuf> {
    let candidate = Path::new(value);
    let path = if candidate.is_absolute() {
        candidate.to_path_buf()
    } else {
        base_dir.join(candidate)
    };
    path.is_file().then_some(path)
}

pub fn is_web_url(value: &str) -> bool {
    match Url::parse(value) {
        Ok(url) => matches!(url.scheme(), "http" | "https") && url.host().is_some(),
        Err(_) => false,
    }
}

/// True when `value` is one grapheme that is a known emoji, including
/// keycaps, flags, ZWJ sequences and skin tone variants.
pub fn is_single_emoji(value: &str) -> bool {
    value.graphemes(true).count() == 1 && emojis::get(value).is_some()
}
