//! Record command handlers: list, get, create, update, delete, status,
//! and the bulk variants. Each runs against one view's controller.

use serde_json::json;
use tracing::debug;

use vitrine_config::View;
use vitrine_core::{
    Command as CoreCommand, CommandResult, CoreError, CrudConfig, CrudController, DataAccess,
    EntityId, SortDirection,
};

use crate::cli::{Command, GlobalOpts, ListArgs};
use crate::error::CliError;
use crate::output;

use super::util;

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle<B: DataAccess>(
    cmd: Command,
    view: &View,
    controller: &CrudController<B>,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let color = output::should_color(&global.color);
    let result = run(cmd, controller, global, color).await;

    if result.is_ok() {
        if let Some(notifier) = controller.notifier() {
            output::print_notifications(&notifier.pending(), global.quiet, color);
            notifier.clear();
        }
    }
    result.map_err(|e| e.in_view(&view.key))
}

#[allow(clippy::too_many_lines)]
async fn run<B: DataAccess>(
    cmd: Command,
    controller: &CrudController<B>,
    global: &GlobalOpts,
    color: bool,
) -> Result<(), CliError> {
    let config = controller.config().clone();

    match cmd {
        Command::List(args) => list(controller, args, global, color).await,

        Command::Get { id, .. } => {
            controller.fetch_items().await?;
            let id = EntityId::from(id);
            let entity = controller
                .state()
                .item(&id)
                .cloned()
                .ok_or_else(|| CoreError::not_found(&config.name, id.as_str()))?;
            controller.open_view_modal(entity);

            let state = controller.state();
            if let Some(entity) = state.modal.target() {
                let out = output::render_entity(&global.output, &config, entity, color);
                output::print_output(&out, global.quiet);
            }
            Ok(())
        }

        Command::Create(args) => {
            let draft = util::build_draft(&config, &args.fields)?;
            controller.open_form_modal(None);
            let entity = controller.submit_form(draft).await?;
            let out = output::render_entity(&global.output, &config, &entity, color);
            output::print_output(&out, global.quiet);
            Ok(())
        }

        Command::Update(args) => {
            let patch = util::build_draft(&config, &args.fields)?;
            controller.fetch_items().await?;
            let id = EntityId::from(args.id);
            let existing = controller
                .state()
                .item(&id)
                .cloned()
                .ok_or_else(|| CoreError::not_found(&config.name, id.as_str()))?;

            let mut draft = existing.to_draft();
            for (key, value) in patch.iter() {
                draft.set(key.clone(), value.clone());
            }
            controller.open_form_modal(Some(existing));
            let entity = controller.submit_form(draft).await?;
            let out = output::render_entity(&global.output, &config, &entity, color);
            output::print_output(&out, global.quiet);
            Ok(())
        }

        Command::Delete { id, .. } => {
            if !util::confirm(&format!("Delete {} '{id}'?", config.name), global.yes)? {
                return Ok(());
            }
            controller
                .execute(CoreCommand::Delete { id: id.into() })
                .await?;
            Ok(())
        }

        Command::Status { id, status, .. } => {
            let result = controller
                .execute(CoreCommand::UpdateStatus {
                    id: id.into(),
                    status,
                })
                .await?;
            match result {
                CommandResult::Entity(entity) => {
                    let out = output::render_entity(&global.output, &config, &entity, color);
                    output::print_output(&out, global.quiet);
                }
                _ => {
                    if !global.quiet {
                        eprintln!("{} has no status workflow; nothing changed", config.plural);
                    }
                }
            }
            Ok(())
        }

        Command::BulkDelete { ids, .. } => {
            let prompt = format!("Delete {} {}? This is destructive.", ids.len(), config.plural);
            if !util::confirm(&prompt, global.yes)? {
                return Ok(());
            }
            let result = controller
                .execute(CoreCommand::BulkDelete {
                    ids: ids.into_iter().map(EntityId::from).collect(),
                })
                .await?;
            print_affected(&result, &config, global);
            Ok(())
        }

        Command::BulkStatus { status, ids, .. } => {
            let result = controller
                .execute(CoreCommand::BulkUpdateStatus {
                    ids: ids.into_iter().map(EntityId::from).collect(),
                    status,
                })
                .await?;
            print_affected(&result, &config, global);
            Ok(())
        }

        // Views, Config and Completions are handled before dispatch
        Command::Views(_) | Command::Config(_) | Command::Completions(_) => unreachable!(),
    }
}

async fn list<B: DataAccess>(
    controller: &CrudController<B>,
    args: ListArgs,
    global: &GlobalOpts,
    color: bool,
) -> Result<(), CliError> {
    let config = controller.config().clone();
    check_list_args(&config, &args)?;

    controller.fetch_items().await?;

    if let Some(page_size) = args.page_size {
        controller.store().set_page_size(page_size);
    }
    if let Some(term) = args.search {
        controller.set_search_term(term);
    }
    for (key, value) in args.filter {
        if config.filter(&key).is_none() {
            debug!(key, "no filter descriptor, matching as text");
        }
        controller.set_filter(key, value);
    }
    if let Some(key) = args.sort {
        let direction = if args.desc {
            SortDirection::Desc
        } else {
            SortDirection::Asc
        };
        controller.set_sorting(key, direction);
    }
    controller.set_page(args.page);

    let state = controller.state();
    let out = output::render_page(&global.output, &config, &state, color);
    output::print_output(&out, global.quiet);
    Ok(())
}

/// Reject sort keys and page sizes the store would silently ignore.
fn check_list_args(config: &CrudConfig, args: &ListArgs) -> Result<(), CliError> {
    if args.page_size == Some(0) {
        return Err(CliError::Validation {
            field: "page-size".into(),
            reason: "must be at least 1".into(),
        });
    }
    if let Some(ref key) = args.sort {
        match config.column(key) {
            Some(column) if column.sortable => {}
            Some(_) => {
                return Err(CliError::Validation {
                    field: "sort".into(),
                    reason: format!("column '{key}' is not sortable"),
                });
            }
            None => {
                let keys: Vec<&str> = config.columns.iter().map(|c| c.key.as_str()).collect();
                return Err(CliError::Validation {
                    field: "sort".into(),
                    reason: format!("unknown column '{key}' (columns: {})", keys.join(", ")),
                });
            }
        }
    }
    Ok(())
}

fn print_affected(result: &CommandResult, config: &CrudConfig, global: &GlobalOpts) {
    let affected = match result {
        CommandResult::Affected(n) => *n,
        _ => 0,
    };
    let data = json!({ "affected": affected, "view": config.resource });
    // Table mode relies on the notification line.
    let out = output::render_single(
        &global.output,
        &data,
        |_| String::new(),
        |_| affected.to_string(),
    );
    output::print_output(&out, global.quiet);
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use vitrine_core::ColumnDescriptor;

    fn args(sort: Option<&str>, page_size: Option<usize>) -> ListArgs {
        ListArgs {
            view: "products".into(),
            search: None,
            filter: Vec::new(),
            sort: sort.map(str::to_owned),
            desc: false,
            page: 1,
            page_size,
        }
    }

    fn config() -> CrudConfig {
        CrudConfig::new("Product", "Products", "products")
            .with_column(ColumnDescriptor::new("name", "Name"))
            .with_column(ColumnDescriptor::new("actions", "Actions").unsortable())
    }

    #[test]
    fn sort_keys_are_checked_against_columns() {
        let cfg = config();
        assert!(check_list_args(&cfg, &args(Some("name"), None)).is_ok());
        assert!(check_list_args(&cfg, &args(None, None)).is_ok());

        let err = check_list_args(&cfg, &args(Some("actions"), None)).unwrap_err();
        assert!(err.to_string().contains("not sortable"));

        let err = check_list_args(&cfg, &args(Some("price"), None)).unwrap_err();
        assert!(err.to_string().contains("unknown column 'price'"));
    }

    #[test]
    fn zero_page_size_is_rejected() {
        assert!(check_list_args(&config(), &args(None, Some(0))).is_err());
    }
}
