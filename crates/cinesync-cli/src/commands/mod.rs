pub mod config;
pub mod list;
pub mod show;
pub mod watch;

use cinesync_config::{Config, PathManager};
use cinesync_core::AppContext;
use cinesync_models::Identity;
use color_eyre::eyre::eyre;
use color_eyre::Result;
use std::time::Duration;

const LOAD_TIMEOUT: Duration = Duration::from_secs(10);

/// Build the context, sign in as `--user` (or the configured default user)
/// and wait until the user's document is loaded.
pub async fn open_session(config: Config, paths: &PathManager, user: Option<String>) -> Result<AppContext> {
    let identity = match user {
        Some(uid) => Identity::new(uid).map_err(|e| eyre!("Invalid --user: {}", e))?,
        None => config
            .default_identity()
            .ok_or_else(|| eyre!("No user given. Pass --user <UID> or set user.default_uid with 'cinesync config init --default-uid <UID>'."))?,
    };

    let context = AppContext::from_config(config, paths)
        .map_err(|e| eyre!("Failed to open document store: {}", e))?;
    context
        .sign_in(identity.clone())
        .await
        .map_err(|e| eyre!("Failed to sign in as {}: {}", identity, e))?;

    tokio::time::timeout(LOAD_TIMEOUT, context.store().wait_until_loaded())
        .await
        .map_err(|_| eyre!("Timed out waiting for the user document of {}", identity))?
        .map_err(|e| eyre!("{}", e))?;

    tracing::debug!(operation = "open_session", uid = %identity, "Session ready");
    Ok(context)
}
