use crate::output::Output;
use cinesync_core::{AppContext, DocumentState, StoreState};
use color_eyre::eyre::eyre;
use color_eyre::Result;
use serde_json::json;
use std::time::Duration;
use tracing::{debug, info, warn};

pub async fn run_watch(context: AppContext, poll_ms: u64, output: &Output) -> Result<()> {
    let mut changes = context.store().changes();
    let mut poll = tokio::time::interval(Duration::from_millis(poll_ms.max(50)));
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    info!(operation = "watch", "Watching user document, press Ctrl-C to stop");
    report(&changes.borrow_and_update(), output);

    let result = loop {
        tokio::select! {
            signal = &mut shutdown => {
                break signal.map_err(|e| eyre!("Failed to listen for Ctrl-C: {}", e));
            }
            changed = changes.changed() => {
                if changed.is_err() {
                    break Ok(());
                }
                report(&changes.borrow_and_update(), output);
            }
            _ = poll.tick() => {
                match context.documents().reload() {
                    Ok(0) => {}
                    Ok(count) => debug!(operation = "watch_poll", changed = count, "Picked up external changes"),
                    Err(e) => warn!(operation = "watch_poll", error = %e, "Could not reload data file"),
                }
            }
        }
    };

    info!(operation = "watch", "Stopped watching");
    context.shutdown().await;
    result
}

fn report(state: &StoreState, output: &Output) {
    let uid = state.identity.as_ref().map(|identity| identity.uid()).unwrap_or("-");
    match &state.document {
        DocumentState::NotYetLoaded => {}
        DocumentState::Absent => {
            if output.is_human() {
                output.warn(format!("{}: no user document", uid));
            } else {
                output.json(&json!({ "uid": uid, "document": null }));
            }
        }
        DocumentState::Loaded(document) => {
            if output.is_human() {
                output.info(format!(
                    "[{}] {}: {} in watchlist, {} in favorites",
                    document.updated_at.format("%Y-%m-%d %H:%M:%S"),
                    uid,
                    document.watchlist.len(),
                    document.favorites.len()
                ));
            } else {
                output.json(&json!({ "uid": uid, "document": document }));
            }
        }
    }
}
