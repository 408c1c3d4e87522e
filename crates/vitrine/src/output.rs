//! Output formatting: table, JSON, YAML, plain.
//!
//! Tables are built at runtime from a view's column descriptors, so any
//! configured resource renders without a hand-written row type. Structured
//! formats serialize entities via serde; plain emits one id per line.

use std::io::{self, IsTerminal, Write};

use owo_colors::{AnsiColors, OwoColorize};
use serde::Serialize;
use tabled::{
    Table,
    builder::Builder,
    settings::{Alignment, Modify, Style, Width, object::Columns},
};

use vitrine_core::{
    Align, CrudConfig, CrudState, Entity, Notification, NotificationKind, PLACEHOLDER,
};

use crate::cli::{ColorMode, OutputFormat};

// ── Color helpers ────────────────────────────────────────────────────

/// Determine whether color output should be enabled.
pub fn should_color(mode: &ColorMode) -> bool {
    match mode {
        ColorMode::Always => true,
        ColorMode::Never => false,
        ColorMode::Auto => io::stdout().is_terminal() && std::env::var("NO_COLOR").is_err(),
    }
}

/// Map a status option's color name onto a terminal color.
fn ansi(name: &str) -> AnsiColors {
    match name.to_ascii_lowercase().as_str() {
        "green" => AnsiColors::Green,
        "yellow" | "amber" | "orange" => AnsiColors::Yellow,
        "red" => AnsiColors::Red,
        "blue" => AnsiColors::Blue,
        "purple" | "magenta" => AnsiColors::Magenta,
        "cyan" | "teal" => AnsiColors::Cyan,
        _ => AnsiColors::BrightBlack,
    }
}

// ── Cells ────────────────────────────────────────────────────────────

/// Cell text for `key`, with status values shown by label and colored.
fn cell(config: &CrudConfig, key: &str, entity: &Entity, color: bool) -> String {
    let Some(column) = config.column(key) else {
        return entity.text(key);
    };
    if config.status_field() != Some(key) {
        return column.display(entity);
    }
    let raw = entity.text(key);
    match config.status_option(&raw) {
        Some(option) if color => option.label.color(ansi(&option.color)).to_string(),
        Some(option) => option.label.clone(),
        None if raw.is_empty() => PLACEHOLDER.to_owned(),
        None => raw,
    }
}

// ── Render dispatchers ───────────────────────────────────────────────

#[derive(Serialize)]
struct Listing<'a> {
    items: &'a [Entity],
    page: usize,
    total_pages: usize,
    total_count: usize,
}

/// Render the visible page of a view in the chosen format.
pub fn render_page(
    format: &OutputFormat,
    config: &CrudConfig,
    state: &CrudState,
    color: bool,
) -> String {
    let listing = Listing {
        items: &state.filtered_items,
        page: state.pagination.current_page,
        total_pages: state.pagination.total_pages,
        total_count: state.pagination.total_count,
    };
    match format {
        OutputFormat::Table => {
            let footer = format!(
                "page {}/{} ({} {})",
                listing.page,
                listing.total_pages,
                listing.total_count,
                if listing.total_count == 1 { "item" } else { "items" }
            );
            if state.filtered_items.is_empty() {
                return format!("No {} found\n{footer}", config.plural.to_lowercase());
            }
            let table = render_entity_table(config, &state.filtered_items, color);
            format!("{table}\n{}", if color { footer.dimmed().to_string() } else { footer })
        }
        OutputFormat::Json => render_json(&listing, false),
        OutputFormat::JsonCompact => render_json(&listing, true),
        OutputFormat::Yaml => render_yaml(&listing),
        OutputFormat::Plain => render_ids(listing.items),
    }
}

/// Render a single entity: a two-column detail table or structured data.
pub fn render_entity(
    format: &OutputFormat,
    config: &CrudConfig,
    entity: &Entity,
    color: bool,
) -> String {
    match format {
        OutputFormat::Table => render_detail(config, entity, color),
        OutputFormat::Json => render_json(entity, false),
        OutputFormat::JsonCompact => render_json(entity, true),
        OutputFormat::Yaml => render_yaml(entity),
        OutputFormat::Plain => entity.id.to_string(),
    }
}

/// Render any serializable value; `detail_fn` produces the table form.
pub fn render_single<T: Serialize + ?Sized>(
    format: &OutputFormat,
    data: &T,
    detail_fn: impl Fn(&T) -> String,
    id_fn: impl Fn(&T) -> String,
) -> String {
    match format {
        OutputFormat::Table => detail_fn(data),
        OutputFormat::Json => render_json(data, false),
        OutputFormat::JsonCompact => render_json(data, true),
        OutputFormat::Yaml => render_yaml(data),
        OutputFormat::Plain => id_fn(data),
    }
}

/// Print the rendered output to stdout, respecting quiet mode.
pub fn print_output(output: &str, quiet: bool) {
    if quiet || output.is_empty() {
        return;
    }
    let mut stdout = io::stdout().lock();
    let _ = writeln!(stdout, "{output}");
}

/// Print queued notifications to stderr, one line each.
pub fn print_notifications(notifications: &[Notification], quiet: bool, color: bool) {
    if quiet {
        return;
    }
    for n in notifications {
        let (mark, tint) = match n.kind {
            NotificationKind::Success => ("✓", AnsiColors::Green),
            NotificationKind::Info => ("ℹ", AnsiColors::Blue),
            NotificationKind::Warning => ("!", AnsiColors::Yellow),
            NotificationKind::Error => ("✗", AnsiColors::Red),
        };
        let mark = if color {
            mark.color(tint).to_string()
        } else {
            mark.to_owned()
        };
        match &n.message {
            Some(message) => eprintln!("{mark} {}: {message}", n.title),
            None => eprintln!("{mark} {}", n.title),
        }
    }
}

// ── Format-specific renderers ────────────────────────────────────────

fn render_entity_table(config: &CrudConfig, entities: &[Entity], color: bool) -> String {
    let mut builder = Builder::default();
    builder.push_record(config.columns.iter().map(|c| c.title.clone()));
    for entity in entities {
        builder.push_record(
            config
                .columns
                .iter()
                .map(|c| cell(config, &c.key, entity, color)),
        );
    }

    let mut table = builder.build();
    table.with(Style::rounded());
    for (idx, column) in config.columns.iter().enumerate() {
        match column.align {
            Align::Left => {}
            Align::Center => {
                table.with(Modify::new(Columns::single(idx)).with(Alignment::center()));
            }
            Align::Right => {
                table.with(Modify::new(Columns::single(idx)).with(Alignment::right()));
            }
        }
        if let Some(width) = column.width {
            table.with(
                Modify::new(Columns::single(idx))
                    .with(Width::truncate(usize::from(width)).suffix("…")),
            );
        }
    }
    table.to_string()
}

/// Field/value table: configured columns first, then remaining attributes.
fn render_detail(config: &CrudConfig, entity: &Entity, color: bool) -> String {
    let mut builder = Builder::default();
    builder.push_record(["Field".to_owned(), "Value".to_owned()]);
    builder.push_record(["ID".to_owned(), entity.id.to_string()]);
    for column in &config.columns {
        if column.key == "id" {
            continue;
        }
        builder.push_record([column.title.clone(), cell(config, &column.key, entity, color)]);
    }
    for (key, value) in &entity.attributes {
        if config.column(key).is_none() {
            let label = config.field(key).map_or_else(|| key.clone(), |f| f.label.clone());
            builder.push_record([label, value.to_string()]);
        }
    }
    let mut table: Table = builder.build();
    table.with(Style::rounded());
    table.to_string()
}

fn render_ids(entities: &[Entity]) -> String {
    entities
        .iter()
        .map(|e| e.id.to_string())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Pretty-printed or compact JSON.
pub(crate) fn render_json<T: Serialize + ?Sized>(data: &T, compact: bool) -> String {
    let rendered = if compact {
        serde_json::to_string(data)
    } else {
        serde_json::to_string_pretty(data)
    };
    rendered.unwrap_or_else(|e| format!("{{\"error\": \"serialization failed: {e}\"}}"))
}

/// YAML output.
pub(crate) fn render_yaml<T: Serialize + ?Sized>(data: &T) -> String {
    serde_yaml::to_string(data).unwrap_or_else(|e| format!("# serialization failed: {e}"))
}
