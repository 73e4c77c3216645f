// Column resolver: decides, for every CSV column, whether it feeds a regular
// field, the row icon, the inline image or the image caption.
//
// Resolution happens once per run, before any remote call, so a mistyped
// column name never leaves a half-written database behind.

use crate::error::{ImportError, Result};

/// What a CSV column is used for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnRole {
    Regular,
    Icon,
    Image,
    ImageCaption,
}

impl ColumnRole {
    /// Human name used in error messages ("Icon column 'x' not found").
    pub fn label(self) -> &'static str {
        match self {
            ColumnRole::Regular => "Regular",
            ColumnRole::Icon => "Icon",
            ColumnRole::Image => "Image",
            ColumnRole::ImageCaption => "Image caption",
        }
    }
}

/// Special column configuration as given on the command line.
#[derive(Debug, Clone, Default)]
pub struct ColumnOptions {
    pub icon_column: Option<String>,
    pub icon_keep: bool,
    pub image_column: Option<String>,
    pub image_keep: bool,
    pub image_caption_column: Option<String>,
    pub image_caption_keep: bool,
}

#[derive(Debug, Clone)]
struct Column {
    name: String,
    role: ColumnRole,
    keep: bool,
}

/// Result of resolving a header against `ColumnOptions`.
#[derive(Debug, Clone)]
pub struct ColumnMap {
    columns: Vec<Column>,
    icon: Option<usize>,
    image: Option<usize>,
    image_caption: Option<usize>,
}

impl ColumnMap {
    /// Assign roles to `header`. Fails if a configured column is missing
    /// or if one column is configured for two roles.
    pub fn resolve(header: &[String], options: &ColumnOptions) -> Result<Self> {
        let mut columns: Vec<Column> = header
            .iter()
            .map(|name| Column {
                name: name.clone(),
                role: ColumnRole::Regular,
                keep: true,
            })
            .collect();

        let specials = [
            (ColumnRole::Icon, &options.icon_column, options.icon_keep),
            (ColumnRole::Image, &options.image_column, options.image_keep),
            (
                ColumnRole::ImageCaption,
                &options.image_caption_column,
                options.image_caption_keep,
            ),
        ];

        let mut map = ColumnMap {
            columns: Vec::new(),
            icon: None,
            image: None,
            image_caption: None,
        };

        for (role, name, keep) in specials {
            let Some(name) = name.as_deref().filter(|n| !n.is_empty()) else {
                continue;
            };
            let index = header
                .iter()
                .position(|h| h == name)
                .ok_or_else(|| ImportError::ColumnNotFound {
                    kind: role.label(),
                    name: name.to_string(),
                })?;

            let column = &mut columns[index];
            if column.role != ColumnRole::Regular {
                return Err(ImportError::ColumnRoleConflict {
                    name: name.to_string(),
                    first: column.role.label(),
                    second: role.label(),
                });
            }
            column.role = role;
            column.keep = keep;

            match role {
                ColumnRole::Icon => map.icon = Some(index),
                ColumnRole::Image => map.image = Some(index),
                ColumnRole::ImageCaption => map.image_caption = Some(index),
                ColumnRole::Regular => {}
            }
            tracing::debug!(column = name, role = role.label(), keep, "resolved special column");
        }

        map.columns = columns;
        Ok(map)
    }

    /// Whether the column is written as an ordinary field: regular columns
    /// always, special columns only when kept.
    pub fn is_field(&self, index: usize) -> bool {
        self.columns.get(index).is_some_and(|c| c.keep)
    }

    pub fn icon_index(&self) -> Option<usize> {
        self.icon
    }

    pub fn image_index(&self) -> Option<usize> {
        self.image
    }

    pub fn image_caption_index(&self) -> Option<usize> {
        self.image_caption
    }

    /// Names written as ordinary fields, in header order.
    pub fn field_columns(&self) -> Vec<&str> {
        self.columns
            .iter()
            .filter(|c| c.keep)
            .map(|c| c.name.as_str())
            .collect()
    }

    /// Field indices paired with their names, in header order.
    pub fn field_indices(&self) -> impl Iterator<Item = (usize, &str)> {
        self.columns
            .iter()
            .enumerate()
            .filter(|(_, c)| c.keep)
            .map(|(i, c)| (i, c.name.as_str()))
    }

    /// Schema for a database created by this run. Consumed special columns
    /// are left out whatever they contain; kept ones are created even when
    /// every value is empty.
    pub fn new_database_schema(&self) -> Vec<String> {
        for column in self.columns.iter().filter(|c| !c.keep) {
            tracing::debug!(
                column = %column.name,
                role = column.role.label(),
                "not creating field for consumed column"
            );
        }
        self.field_columns().into_iter().map(str::to_string).collect()
    }
}
