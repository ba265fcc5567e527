use cinesync_models::{ListName, MediaItem};
use clap::ValueEnum;
use comfy_table::{Cell, Table};
use owo_colors::OwoColorize;
use serde_json::json;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Human,
    Json,
    #[value(name = "json-pretty")]
    JsonPretty,
}

pub struct Output {
    format: OutputFormat,
    quiet: bool,
}

impl Output {
    pub fn new(format: OutputFormat, quiet: bool) -> Self {
        Self { format, quiet }
    }

    pub fn is_human(&self) -> bool {
        self.format == OutputFormat::Human
    }

    pub fn is_quiet(&self) -> bool {
        self.quiet
    }

    pub fn success(&self, msg: impl AsRef<str>) {
        self.message("success", "✓".green().to_string(), msg.as_ref());
    }

    pub fn info(&self, msg: impl AsRef<str>) {
        if self.quiet {
            return;
        }

        match self.format {
            OutputFormat::Human => println!("{}", msg.as_ref()),
            OutputFormat::Json | OutputFormat::JsonPretty => {
                self.print_json(&json!({ "type": "info", "message": msg.as_ref() }));
            }
        }
    }

    pub fn warn(&self, msg: impl AsRef<str>) {
        self.message("warning", "⚠".yellow().to_string(), msg.as_ref());
    }

    fn message(&self, kind: &str, marker: String, msg: &str) {
        if self.quiet {
            return;
        }

        match self.format {
            OutputFormat::Human => println!("{} {}", marker, msg),
            OutputFormat::Json | OutputFormat::JsonPretty => {
                self.print_json(&json!({ "type": kind, "message": msg }));
            }
        }
    }

    /// Structured result for JSON formats; ignored in human mode, where the
    /// command prints its own rendering.
    pub fn json(&self, data: &serde_json::Value) {
        if self.quiet || self.is_human() {
            return;
        }

        self.print_json(data);
    }

    fn print_json(&self, data: &serde_json::Value) {
        match self.format {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string(data).unwrap_or_default());
            }
            OutputFormat::JsonPretty => {
                println!("{}", serde_json::to_string_pretty(data).unwrap_or_default());
            }
            OutputFormat::Human => println!("{}", data),
        }
    }
}

pub fn items_table(items: &[MediaItem]) -> Table {
    let mut table = Table::new();
    table.set_header(vec![
        Cell::new("#").add_attribute(comfy_table::Attribute::Bold),
        Cell::new("ID").add_attribute(comfy_table::Attribute::Bold),
        Cell::new("Title").add_attribute(comfy_table::Attribute::Bold),
        Cell::new("Type").add_attribute(comfy_table::Attribute::Bold),
        Cell::new("Year").add_attribute(comfy_table::Attribute::Bold),
        Cell::new("Rating").add_attribute(comfy_table::Attribute::Bold),
        Cell::new("Added").add_attribute(comfy_table::Attribute::Bold),
    ]);
    for (position, item) in items.iter().enumerate() {
        table.add_row(vec![
            Cell::new(position + 1),
            Cell::new(item.id),
            Cell::new(&item.title),
            Cell::new(item.media_kind),
            Cell::new(item.release_year),
            Cell::new(format!("{:.1}", item.rating)),
            Cell::new(item.added_at.format("%Y-%m-%d %H:%M UTC")),
        ]);
    }
    table.load_preset(comfy_table::presets::UTF8_FULL);
    table.apply_modifier(comfy_table::modifiers::UTF8_ROUND_CORNERS);
    table
}

pub fn list_heading(list: ListName, count: usize) -> String {
    let title = match list {
        ListName::Watchlist => "Watchlist",
        ListName::Favorites => "Favorites",
    };
    format!("{} ({} {})", title.bright_cyan().bold(), count, if count == 1 { "entry" } else { "entries" })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use cinesync_models::MediaKind;

    #[test]
    fn test_items_table_has_one_row_per_entry() {
        let item = MediaItem {
            id: 42,
            title: "Example".to_string(),
            media_kind: MediaKind::Tv,
            release_year: 2019,
            rating: 8.25,
            poster_ref: String::new(),
            added_at: Utc.with_ymd_and_hms(2025, 1, 2, 3, 4, 0).unwrap(),
        };
        let table = items_table(&[item.clone(), item]);
        assert_eq!(table.row_iter().count(), 2);

        let rendered = table.to_string();
        assert!(rendered.contains("Example"));
        assert!(rendered.contains("tv"));
        assert!(rendered.contains("2025-01-02 03:04 UTC"));
    }

    #[test]
    fn test_list_heading_pluralizes() {
        assert!(list_heading(ListName::Watchlist, 1).ends_with("(1 entry)"));
        assert!(list_heading(ListName::Favorites, 3).ends_with("(3 entries)"));
    }
}
