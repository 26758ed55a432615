//! Provisions the Pages project, its DNS record and its custom domain.

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
    let mut provider =
        CloudflareProvider::new(credentials, mem::take(&mut cfg.account_id), cfg.environment()?)?;
    if let Some(ttl) = cfg.ttl {
        *provider.ttl_mut() = ttl;
    }

    let report = finish_run(Reconciler::new(provider).setup(&cfg.setup).await)?;
    if report.is_some_and(|r| r.is_noop()) {
        info!("nothing to change");
    }

    Ok(())
}
