// Import driver: resolves columns, prepares the target database and writes
// one row per CSV record through a `DatabaseApi`.

use crate::api::{
    database_id_from_url, CreateDatabaseRequest, Database, DatabaseApi, IconPayload, ImagePayload,
    RowPayload, SchemaField,
};
use crate::columns::{ColumnMap, ColumnOptions};
use crate::csv_file::CsvFile;
use crate::error::{ImportError, Result};
use crate::media::{IconSource, ImageSource};
use crate::row::RowIntent;
use std::collections::{HashMap, HashSet};

/// What to do with CSV columns an existing database does not have.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum MissingColumnsAction {
    /// Skip those fields when writing rows.
    #[default]
    Ignore,
    /// Create the columns as text fields.
    Add,
    /// Abort before writing anything.
    Fail,
}

#[derive(Debug, Clone, Default)]
pub struct ImportOptions {
    pub columns: ColumnOptions,
    /// Existing database to import into; a new one is created when unset.
    pub database_url: Option<String>,
    /// Title of a new database. Defaults to the CSV file name.
    pub title: Option<String>,
    /// Update rows whose first field matches instead of adding new ones.
    pub merge: bool,
    pub fail_on_duplicates: bool,
    pub missing_columns_action: MissingColumnsAction,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportSummary {
    pub database_url: String,
    pub created: bool,
    pub added: usize,
    pub updated: usize,
}

pub struct Importer<'a> {
    api: &'a dyn DatabaseApi,
}

impl<'a> Importer<'a> {
    pub fn new(api: &'a dyn DatabaseApi) -> Self {
        Importer { api }
    }

    /// Import every record of `csv`. `progress` is called with
    /// (rows done, total rows) after each row is written.
    pub fn run(
        &self,
        csv: &CsvFile,
        options: &ImportOptions,
        mut progress: impl FnMut(usize, usize),
    ) -> Result<ImportSummary> {
        let columns = ColumnMap::resolve(csv.header(), &options.columns)?;
        let key_column = columns.field_indices().next();

        if options.merge && options.fail_on_duplicates {
            if let Some((index, _)) = key_column {
                check_unique_keys(csv, index)?;
            }
        }

        let (database, created, writable) = match &options.database_url {
            Some(url) => {
                let (database, writable) = self.open_existing(url, &columns, options)?;
                (database, false, writable)
            }
            None => {
                let database = self.create_new(csv, &columns, options)?;
                let writable: HashSet<String> =
                    columns.field_columns().into_iter().map(str::to_string).collect();
                (database, true, writable)
            }
        };

        let mut existing: HashMap<String, String> = HashMap::new();
        if options.merge && !created {
            if let Some((_, key_name)) = key_column {
                for row in self.api.list_rows(&database.id)? {
                    if let Some(key) = row.field_text(key_name) {
                        existing.entry(key).or_insert(row.id);
                    }
                }
                tracing::debug!(rows = existing.len(), key = key_name, "indexed existing rows");
            }
        }

        let total = csv.records().len();
        let mut summary = ImportSummary {
            database_url: database.url.clone(),
            created,
            added: 0,
            updated: 0,
        };

        for (i, record) in csv.records().iter().enumerate() {
            let row_number = i + 1;
            let intent = RowIntent::build(&columns, record, csv.base_dir()).map_err(|e| {
                ImportError::Row {
                    row: row_number,
                    error: Box::new(e),
                }
            })?;
            tracing::debug!(
                row = row_number,
                icon = ?intent.icon.as_ref().map(IconSource::label),
                image = ?intent.image.as_ref().map(ImageSource::label),
                "resolved row media"
            );
            let payload = self.payload(&intent, &writable)?;

            let key = key_column.map(|(index, _)| record.get(index).cloned().unwrap_or_default());
            let target = match (&key, options.merge) {
                (Some(key), true) => existing.get(key).cloned(),
                _ => None,
            };

            match target {
                Some(row_id) => {
                    self.api.update_row(&row_id, &payload)?;
                    tracing::debug!(row = row_number, id = %row_id, "updated row");
                    summary.updated += 1;
                }
                None => {
                    let added = self.api.add_row(&database.id, &payload)?;
                    tracing::debug!(row = row_number, id = %added.id, "added row");
                    if let (Some(key), true) = (key, options.merge) {
                        existing.insert(key, added.id);
                    }
                    summary.added += 1;
                }
            }
            progress(row_number, total);
        }

        Ok(summary)
    }

    fn open_existing(
        &self,
        url: &str,
        columns: &ColumnMap,
        options: &ImportOptions,
    ) -> Result<(Database, HashSet<String>)> {
        let id = database_id_from_url(url)?;
        let database = self.api.fetch_database(&id)?;

        let fields = columns.field_columns();
        let missing: Vec<String> = fields
            .iter()
            .filter(|name| !database.has_field(name))
            .map(|name| name.to_string())
            .collect();

        let mut writable: HashSet<String> = fields
            .iter()
            .filter(|name| database.has_field(name))
            .map(|name| name.to_string())
            .collect();

        if !missing.is_empty() {
            match options.missing_columns_action {
                MissingColumnsAction::Ignore => {
                    tracing::warn!(
                        "Ignoring CSV columns missing from database: {}",
                        missing.join(", ")
                    );
                }
                MissingColumnsAction::Add => {
                    for name in missing {
                        self.api.add_column(&database.id, &name)?;
                        tracing::info!("Added column '{}' to database", name);
                        writable.insert(name);
                    }
                }
                MissingColumnsAction::Fail => return Err(ImportError::MissingColumns(missing)),
            }
        }

        Ok((database, writable))
    }

    fn create_new(
        &self,
        csv: &CsvFile,
        columns: &ColumnMap,
        options: &ImportOptions,
    ) -> Result<Database> {
        let request = CreateDatabaseRequest {
            title: options.title.clone().unwrap_or_else(|| csv.stem()),
            schema: columns
                .new_database_schema()
                .iter()
                .map(|name| SchemaField::text(name))
                .collect(),
        };
        let database = self.api.create_database(&request)?;
        tracing::info!("New database URL: {}", database.url);
        Ok(database)
    }

    fn payload(&self, intent: &RowIntent, writable: &HashSet<String>) -> Result<RowPayload> {
        let fields = intent
            .fields
            .iter()
            .filter(|(name, _)| writable.contains(name))
            .cloned()
            .collect();

        let icon = match &intent.icon {
            Some(IconSource::File(path)) => Some(IconPayload::Url(self.api.upload_file(path)?)),
            Some(IconSource::Url(url)) => Some(IconPayload::Url(url.clone())),
            Some(IconSource::Emoji(emoji)) => Some(IconPayload::Emoji(emoji.clone())),
            None => None,
        };

        let image = match &intent.image {
            Some(source) => {
                let url = match source {
                    ImageSource::File(path) => self.api.upload_file(path)?,
                    ImageSource::Url(url) => url.clone(),
                };
                Some(ImagePayload {
                    url,
                    caption: intent.caption.clone().unwrap_or_default(),
                })
            }
            None => None,
        };

        Ok(RowPayload {
            fields,
            icon,
            image,
        })
    }
}

fn check_unique_keys(csv: &CsvFile, index: usize) -> Result<()> {
    let mut seen = HashSet::new();
    for key in csv.column_values(index) {
        if !seen.insert(key) {
            return Err(ImportError::DuplicateKey(key.to_string()));
        }
    }
    Ok(())
}
