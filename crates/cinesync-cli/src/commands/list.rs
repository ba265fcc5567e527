use crate::output::{items_table, list_heading, Output};
use crate::ListCommands;
use cinesync_core::{count_members, AppContext};
use cinesync_models::{ListName, NewMediaItem};
use color_eyre::eyre::eyre;
use color_eyre::Result;
use serde_json::json;
use tracing::info;

pub async fn run_list(list: ListName, cmd: ListCommands, context: AppContext, output: &Output) -> Result<()> {
    let result = match cmd {
        ListCommands::Add { id, title, kind, year, rating, poster, allow_duplicate } => {
            let item = NewMediaItem {
                id,
                title,
                media_kind: kind,
                release_year: year,
                rating,
                poster_ref: poster,
            };
            add(&context, list, item, allow_duplicate, output).await
        }
        ListCommands::Remove { id } => remove(&context, list, id, output).await,
        ListCommands::List => {
            show_items(&context, list, output);
            Ok(())
        }
        ListCommands::Contains { id } => {
            contains(&context, list, id, output);
            Ok(())
        }
    };

    context.shutdown().await;
    result
}

async fn add(context: &AppContext, list: ListName, item: NewMediaItem, allow_duplicate: bool, output: &Output) -> Result<()> {
    let store = context.store();

    // Ids are only unique by convention; the store appends whatever it is given.
    if store.contains(list, item.id) && !allow_duplicate {
        if output.is_human() {
            output.warn(format!("{} ({}) is already in your {}, skipping", item.title, item.id, list));
        } else {
            output.json(&json!({ "list": list, "id": item.id, "added": false }));
        }
        return Ok(());
    }

    let added = store
        .add(list, item)
        .await
        .map_err(|e| eyre!("Failed to add to {}: {}", list, e))?;
    info!(operation = "cli_add", list = %list, id = added.id, "Added entry");

    if output.is_human() {
        output.success(format!("Added {} ({}) to your {}", added.title, added.id, list));
    } else {
        output.json(&json!({ "list": list, "id": added.id, "added": true, "item": added }));
    }
    Ok(())
}

async fn remove(context: &AppContext, list: ListName, id: u64, output: &Output) -> Result<()> {
    let store = context.store();
    let matches = count_members(&store.items(list), id);

    store
        .remove(list, id)
        .await
        .map_err(|e| eyre!("Failed to remove from {}: {}", list, e))?;
    info!(operation = "cli_remove", list = %list, id, matches, "Removed entries");

    if !output.is_human() {
        output.json(&json!({ "list": list, "id": id, "removed": matches }));
    } else if matches == 0 {
        output.warn(format!("{} was not in your {}", id, list));
    } else {
        output.success(format!("Removed {} from your {}", id, list));
    }
    Ok(())
}

fn show_items(context: &AppContext, list: ListName, output: &Output) {
    let items = context.store().items(list);

    if output.is_human() {
        if output.is_quiet() {
            return;
        }
        println!("{}", list_heading(list, items.len()));
        if items.is_empty() {
            println!("Your {} is empty.", list);
        } else {
            println!("{}", items_table(&items));
        }
    } else {
        output.json(&json!({ "list": list, "items": items }));
    }
}

fn contains(context: &AppContext, list: ListName, id: u64, output: &Output) {
    let member = context.store().contains(list, id);

    if !output.is_human() {
        output.json(&json!({ "list": list, "id": id, "member": member }));
    } else if member {
        output.success(format!("{} is in your {}", id, list));
    } else {
        output.info(format!("{} is not in your {}", id, list));
    }
}
