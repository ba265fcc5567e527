use crate::output::{items_table, list_heading, Output};
use cinesync_core::AppContext;
use cinesync_models::{ListName, UserDocument};
use comfy_table::{Cell, Table};
use color_eyre::Result;
use owo_colors::OwoColorize;
use serde_json::json;

pub async fn run_show(context: AppContext, output: &Output) -> Result<()> {
    let uid = context
        .store()
        .active_identity()
        .map(|identity| identity.uid().to_string())
        .unwrap_or_default();
    let document = context.store().document();
    context.shutdown().await;

    let Some(document) = document else {
        if output.is_human() {
            output.warn(format!("No readable user document for {}", uid));
        } else {
            output.json(&json!({ "uid": uid, "document": null }));
        }
        return Ok(());
    };

    if !output.is_human() {
        output.json(&json!({ "uid": uid, "document": document }));
        return Ok(());
    }
    if output.is_quiet() {
        return Ok(());
    }

    println!("\n{} {}\n", "User".bright_cyan().bold(), uid.bold());
    println!("{}", summary_table(&document));
    for list in ListName::ALL {
        let items = document.list(list);
        println!("\n{}", list_heading(list, items.len()));
        if !items.is_empty() {
            println!("{}", items_table(items));
        }
    }
    Ok(())
}

fn summary_table(document: &UserDocument) -> Table {
    let mut table = Table::new();
    table.set_header(vec![
        Cell::new("Field").add_attribute(comfy_table::Attribute::Bold),
        Cell::new("Value").add_attribute(comfy_table::Attribute::Bold),
    ]);
    table.add_row(vec![Cell::new("Watchlist entries"), Cell::new(document.watchlist.len())]);
    table.add_row(vec![Cell::new("Favorites entries"), Cell::new(document.favorites.len())]);
    table.add_row(vec![Cell::new("Created"), Cell::new(document.created_at.to_rfc3339())]);
    table.add_row(vec![Cell::new("Last updated"), Cell::new(document.updated_at.to_rfc3339())]);
    table.load_preset(comfy_table::presets::UTF8_FULL);
    table.apply_modifier(comfy_table::modifiers::UTF8_ROUND_CORNERS);
    table
}
