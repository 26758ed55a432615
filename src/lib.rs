pub mod plan;
pub mod provider;
pub mod reconciler;
pub mod settings;

use std::path::PathBuf;

/// Loads `.env` from the working directory or one of its parents, if present.
pub fn load_dotenv() -> Result<Option<PathBuf>, dotenvy::Error> {
    match dotenvy::dotenv() {
        Ok(path) => Ok(Some(path)),
        Err(e) if e.not_found() => Ok(None),
        Err(e) => Err(e),
    }
}

/// Installs the global subscriber; progress is reported through it on stdout.
pub fn init_tracing(json: bool) -> Result<(), tracing::subscriber::SetGlobalDefaultError> {
    let builder = tracing_subscriber::fmt().with_target(false);

    if json {
        tracing::subscriber::set_global_default(builder.json().finish())
    } else {
        tracing::subscriber::set_global_default(builder.finish())
    }
}
