//! View inspection handlers.

use std::fmt::Write;

use serde::Serialize;
use tabled::{Table, Tabled, settings::Style};

use vitrine_config::{View, ViewSet};
use vitrine_core::CrudConfig;

use crate::cli::{GlobalOpts, ViewsArgs, ViewsCommand};
use crate::error::CliError;
use crate::output;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled, Serialize)]
struct ViewRow {
    #[tabled(rename = "View")]
    key: String,
    #[tabled(rename = "Name")]
    plural: String,
    #[tabled(rename = "Resource")]
    resource: String,
    #[tabled(rename = "Columns")]
    columns: usize,
    #[tabled(rename = "Fields")]
    fields: usize,
    #[tabled(rename = "Statuses")]
    statuses: String,
    #[tabled(rename = "Seed")]
    seed: usize,
}

impl From<&View> for ViewRow {
    fn from(v: &View) -> Self {
        Self {
            key: v.key.clone(),
            plural: v.config.plural.clone(),
            resource: v.config.resource.clone(),
            columns: v.config.columns.len(),
            fields: v.config.form_fields.len(),
            statuses: v
                .config
                .status
                .as_ref()
                .map(|s| {
                    s.options
                        .iter()
                        .map(|o| o.value.as_str())
                        .collect::<Vec<_>>()
                        .join(", ")
                })
                .unwrap_or_default(),
            seed: v.seed.len(),
        }
    }
}

// ── Detail ──────────────────────────────────────────────────────────

fn describe(key: &str, config: &CrudConfig) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{} ({key} → /{})", config.plural, config.resource);
    let _ = writeln!(out, "page size: {}", config.page_size);
    if let Some(ref sort) = config.default_sort {
        let _ = writeln!(out, "default sort: {} {}", sort.key, sort.direction);
    }
    if !config.search_fields.is_empty() {
        let _ = writeln!(out, "search: {}", config.search_fields.join(", "));
    }

    let _ = writeln!(out, "\nColumns:");
    for c in &config.columns {
        let sortable = if c.sortable { "" } else { " (unsortable)" };
        let _ = writeln!(out, "  {:<16} {}{sortable}", c.key, c.title);
    }

    if !config.filters.is_empty() {
        let _ = writeln!(out, "\nFilters:");
        for f in &config.filters {
            let options: Vec<&str> = f.options.iter().map(|o| o.value.as_str()).collect();
            let kind = format!("{:?}", f.kind).to_lowercase();
            let _ = writeln!(out, "  {:<16} {kind:<8} {}", f.key, options.join("|"));
        }
    }

    if !config.form_fields.is_empty() {
        let _ = writeln!(out, "\nForm fields:");
        for f in &config.form_fields {
            let mut notes = Vec::new();
            if f.required {
                notes.push("required".to_owned());
            }
            if let Some(min) = f.validation.min {
                notes.push(format!("min {min}"));
            }
            if let Some(max) = f.validation.max {
                notes.push(format!("max {max}"));
            }
            if let Some(ref pattern) = f.validation.pattern {
                notes.push(format!("pattern {pattern}"));
            }
            if !f.options.is_empty() {
                let values: Vec<&str> = f.options.iter().map(|o| o.value.as_str()).collect();
                notes.push(format!("one of {}", values.join("|")));
            }
            if let Some(ref visibility) = f.visible_when {
                notes.push(format!("when {visibility:?}"));
            }
            let _ = writeln!(
                out,
                "  {:<16} {:<9} {}{}",
                f.key,
                f.kind.to_string(),
                f.label,
                if notes.is_empty() {
                    String::new()
                } else {
                    format!(" [{}]", notes.join(", "))
                }
            );
        }
    }

    if let Some(ref status) = config.status {
        let _ = writeln!(out, "\nStatus ({}):", status.field);
        for o in &status.options {
            let _ = writeln!(out, "  {:<16} {} ({})", o.value, o.label, o.color);
        }
    }

    let f = &config.features;
    let _ = write!(
        out,
        "\nFeatures: bulk_actions={} status_update={} row_actions={}",
        f.bulk_actions, f.status_update, f.row_actions
    );
    out
}

// ── Handler ─────────────────────────────────────────────────────────

pub fn handle(args: ViewsArgs, views: &ViewSet, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        ViewsCommand::List => {
            let rows: Vec<ViewRow> = views.iter().map(ViewRow::from).collect();
            let out = output::render_single(
                &global.output,
                &rows,
                |rows| Table::new(rows).with(Style::rounded()).to_string(),
                |rows| {
                    rows.iter()
                        .map(|r| r.key.clone())
                        .collect::<Vec<_>>()
                        .join("\n")
                },
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }

        ViewsCommand::Show { view } => {
            let view = views.get(&view)?;
            let out = output::render_single(
                &global.output,
                view.config.as_ref(),
                |config| describe(&view.key, config),
                |_| view.key.clone(),
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn describe_shows_rules_and_statuses() {
        let views = vitrine_config::builtin_views().unwrap();
        let products = views.get("products").unwrap();
        let text = describe(&products.key, &products.config);

        assert!(text.contains("Products (products"));
        assert!(text.contains("sku"));
        assert!(text.contains("required"));
        assert!(text.contains("Status (status)"));
        assert!(text.contains("published"));
    }

    #[test]
    fn rows_summarize_views() {
        let views = vitrine_config::builtin_views().unwrap();
        let rows: Vec<ViewRow> = views.iter().map(ViewRow::from).collect();
        assert_eq!(rows.len(), views.len());
        assert_eq!(rows[0].key, "products");
        assert!(rows[0].statuses.contains("draft"));
    }
}
