// Per-row resolution: one CSV record in, the fields and media to write out.

use crate::columns::ColumnMap;
use crate::error::Result;
use crate::media::{classify_icon, classify_image, IconSource, ImageSource};
use std::path::Path;

/// What a single CSV record should become in the database.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RowIntent {
    /// Ordinary fields in header order, including kept special columns.
    pub fields: Vec<(String, String)>,
    pub icon: Option<IconSource>,
    pub image: Option<ImageSource>,
    /// Caption of `image`; only set when there is an image.
    pub caption: Option<String>,
}

impl RowIntent {
    /// Build the intent for `record`. Media paths are relative to `base_dir`.
    pub fn build(columns: &ColumnMap, record: &[String], base_dir: &Path) -> Result<Self> {
        let cell = |index: usize| record.get(index).map(String::as_str).unwrap_or("");

        let fields = columns
            .field_indices()
            .map(|(index, name)| (name.to_string(), cell(index).to_string()))
            .collect();

        let icon = match columns.icon_index() {
            Some(index) => classify_icon(cell(index), base_dir)?,
            None => None,
        };

        let image = match columns.image_index() {
            Some(index) => classify_image(cell(index), base_dir)?,
            None => None,
        };

        let caption = match (&image, columns.image_caption_index()) {
            (Some(_), Some(index)) => Some(cell(index).to_string()),
            _ => None,
        };

        Ok(RowIntent {
            fields,
            icon,
            image,
            caption,
        })
    }

    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }
}
