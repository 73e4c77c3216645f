// UI layer: terminal interaction around an import run. Token prompting and
// persistence use `dialoguer` and the home directory; row progress is shown
// with an `indicatif` bar.

use anyhow::{Context, Result};
use dialoguer::Password;
use indicatif::{ProgressBar, ProgressStyle};
use std::io::IsTerminal;
use std::path::PathBuf;

const TOKEN_FILE: &str = ".csv2db_token";

/// Pick the API token: the explicit value first, then the saved token file,
/// then an interactive prompt when stdin is a terminal.
pub fn resolve_token(explicit: Option<String>) -> Result<String> {
    if let Some(token) = explicit.filter(|t| !t.trim().is_empty()) {
        return Ok(token.trim().to_string());
    }
    if let Ok(token) = load_token() {
        tracing::debug!(path = %token_path().display(), "using saved token");
        return Ok(token);
    }
    if std::io::stdin().is_terminal() {
        let token: String = Password::new()
            .with_prompt("API token")
            .interact()
            .context("Failed to read token from terminal")?;
        return Ok(token.trim().to_string());
    }
    anyhow::bail!("No API token: pass --token or set CSV2DB_TOKEN")
}

fn token_path() -> PathBuf {
    let dir = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
    dir.join(TOKEN_FILE)
}

/// Persist token into a file in the user's home directory.
pub fn persist_token(token: &str) -> Result<()> {
    let path = token_path();
    std::fs::write(&path, token)
        .with_context(|| format!("Failed to save token to {}", path.display()))?;
    tracing::info!("Saved token to {}", path.display());
    Ok(())
}

/// Load token from the user's home directory file.
fn load_token() -> Result<String> {
    let data = std::fs::read_to_string(token_path())?;
    let token = data.trim();
    if token.is_empty() {
        anyhow::bail!("saved token is empty");
    }
    Ok(token.to_string())
}

/// Progress bar over CSV rows.
pub fn row_progress(total: usize) -> Result<ProgressBar> {
    let pb = ProgressBar::new(total as u64);
    pb.set_style(
        ProgressStyle::with_template("{spinner} [{bar:30}] {pos}/{len} rows {msg}")
            .context("Invalid progress template")?
            .progress_chars("=> "),
    );
    pb.set_message("importing");
    Ok(pb)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_token_wins() {
        assert_eq!(resolve_token(Some("  secret \n".into())).unwrap(), "secret");
    }

    #[test]
    fn progress_bar_has_row_count() {
        let pb = row_progress(7).unwrap();
        assert_eq!(pb.length(), Some(7));
    }
}
