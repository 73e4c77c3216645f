// Library root
// -----------
// The binary (`main.rs`) only parses arguments and calls `cli::run`; all
// import logic lives in these modules so it can be tested without a
// terminal or a live service.
//
// Module responsibilities:
// - `csv_file`: reads and validates the input CSV.
// - `columns`: resolves icon, image and caption columns against the header.
// - `media`: classifies icon and image cell values.
// - `row`: turns one CSV record into the fields and media to write.
// - `api`: blocking HTTP client for the remote database service.
// - `import`: drives a whole import run against a `DatabaseApi`.
// - `ui` / `cli`: terminal interaction and command-line surface.
pub mod api;
mod api_tests;
pub mod cli;
pub mod columns;
pub mod csv_file;
pub mod error;
pub mod import;
pub mod media;
pub mod row;
pub mod ui;

pub use error::{ImportError, Result};
