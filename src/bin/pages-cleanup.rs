//! Tears down the old Pages project and the DNS records pointing at it.

use pages_provision::{
    provider::cloudflare::CloudflareProvider,
    reconciler::{finish_run, Reconciler},
    settings::Settings,
};
use std::mem;
use tracing::{debug, info};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let env_file = pages_provision::load_dotenv()?;
    let cfg = Settings::new()?;
    pages_provision::init_tracing(cfg.log_json)?;

    if let Some(path) = env_file {
        debug!(path = %path.display(), "loaded environment file");
    }

    run(cfg).await
}

async fn run(mut cfg: Settings) -> Result<(), Box<dyn std::error::Error>> {
    let credentials = cfg.credentials()?;
    let provider =
        CloudflareProvider::new(credentials, mem::take(&mut cfg.account_id), cfg.environment()?)?;

    let report = finish_run(Reconciler::new(provider).cleanup(&cfg.cleanup).await)?;
    if report.is_some_and(|r| r.is_noop()) {
        info!("nothing left to clean up");
    }

    Ok(())
}
