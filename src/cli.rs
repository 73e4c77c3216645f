// Command-line surface: argument parsing, logging setup and the glue that
// hands a parsed CSV file to the importer.

use crate::api::{ApiClient, DEFAULT_API_URL};
use crate::columns::ColumnOptions;
use crate::csv_file::CsvFile;
use crate::import::{ImportOptions, Importer, MissingColumnsAction};
use crate::ui;
use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "csv2db", version)]
#[command(about = "Import a CSV file into a remote database", long_about = None)]
pub struct Cli {
    /// CSV file to import
    pub csv_file: PathBuf,

    /// API token
    #[arg(long, env = "CSV2DB_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// URL of an existing database; a new database is created when omitted
    #[arg(long)]
    pub url: Option<String>,

    /// Base URL of the database service
    #[arg(long, env = "CSV2DB_API_URL", default_value = DEFAULT_API_URL)]
    pub api_url: String,

    /// Title of a newly created database (defaults to the CSV file name)
    #[arg(long)]
    pub title: Option<String>,

    /// Column holding the row icon: a file path, URL or emoji
    #[arg(long, value_name = "COLUMN")]
    pub icon_column: Option<String>,

    /// Also write the icon column as a regular field
    #[arg(long, requires = "icon_column")]
    pub icon_column_keep: bool,

    /// Column holding an image to embed in each row: a file path or URL
    #[arg(long, value_name = "COLUMN")]
    pub image_column: Option<String>,

    /// Also write the image column as a regular field
    #[arg(long, requires = "image_column")]
    pub image_column_keep: bool,

    /// Column holding the caption of the embedded image
    #[arg(long, value_name = "COLUMN")]
    pub image_caption_column: Option<String>,

    /// Also write the image caption column as a regular field
    #[arg(long, requires = "image_caption_column")]
    pub image_caption_column_keep: bool,

    /// Update rows whose first column matches instead of adding new ones
    #[arg(long, requires = "url")]
    pub merge: bool,

    /// With --merge, abort if the first column has duplicate values
    #[arg(long, requires = "merge")]
    pub fail_on_duplicates: bool,

    /// What to do with CSV columns missing from an existing database
    #[arg(long, value_enum, default_value_t = MissingColumnsAction::Ignore)]
    pub missing_columns_action: MissingColumnsAction,

    /// Save the token to the home directory for later runs
    #[arg(long)]
    pub save_token: bool,

    /// Log filter, e.g. "info" or "csv2db=debug"
    #[arg(long, env = "RUST_LOG", default_value = "info")]
    pub log_level: String,

    /// Shortcut for --log-level debug
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    pub fn import_options(&self) -> ImportOptions {
        ImportOptions {
            columns: ColumnOptions {
                icon_column: self.icon_column.clone(),
                icon_keep: self.icon_column_keep,
                image_column: self.image_column.clone(),
                image_keep: self.image_column_keep,
                image_caption_column: self.image_caption_column.clone(),
                image_caption_keep: self.image_caption_column_keep,
            },
            database_url: self.url.clone(),
            title: self.title.clone(),
            merge: self.merge,
            fail_on_duplicates: self.fail_on_duplicates,
            missing_columns_action: self.missing_columns_action,
        }
    }
}

pub fn init_logging(cli: &Cli) -> Result<()> {
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_new(&cli.log_level)
            .with_context(|| format!("Invalid log filter '{}'", cli.log_level))?
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
    Ok(())
}

/// Run one import as described by `cli`.
pub fn run(cli: Cli) -> Result<()> {
    let csv = CsvFile::read(&cli.csv_file)
        .with_context(|| format!("Failed to read {}", cli.csv_file.display()))?;
    let options = cli.import_options();

    // Column names are checked here so a typo fails without a token or a
    // network round trip.
    crate::columns::ColumnMap::resolve(csv.header(), &options.columns)?;

    let token = ui::resolve_token(cli.token.clone())?;
    if cli.save_token {
        ui::persist_token(&token)?;
    }

    let api = ApiClient::new(&cli.api_url, &token)?;
    tracing::debug!(api = api.base_url(), rows = csv.records().len(), "starting import");

    let pb = ui::row_progress(csv.records().len())?;
    let result = Importer::new(&api).run(&csv, &options, |done, _| pb.set_position(done as u64));
    pb.finish_and_clear();

    let summary = result.context("Import failed")?;
    tracing::info!(
        added = summary.added,
        updated = summary.updated,
        "Imported {} into {}",
        csv.path().display(),
        summary.database_url
    );
    Ok(())
}
