//! Command dispatch: bridges CLI args -> view controller -> output formatting.

pub mod config_cmd;
pub mod entities;
pub mod util;
pub mod views;

use tracing::debug;

use vitrine_config::{View, ViewSet};
use vitrine_core::{CrudController, MemoryBackend, Notifier, RestBackend};

use crate::cli::{Command, GlobalOpts};
use crate::config::{self, Config};
use crate::error::CliError;

/// The view a record command targets.
pub fn view_key(cmd: &Command) -> Option<&str> {
    match cmd {
        Command::List(args) => Some(args.view.as_str()),
        Command::Create(args) => Some(args.view.as_str()),
        Command::Update(args) => Some(args.view.as_str()),
        Command::Get { view, .. }
        | Command::Delete { view, .. }
        | Command::Status { view, .. }
        | Command::BulkDelete { view, .. }
        | Command::BulkStatus { view, .. } => Some(view.as_str()),
        Command::Views(_) | Command::Config(_) | Command::Completions(_) => None,
    }
}

/// Dispatch a view-bound command, building its controller first.
///
/// `--demo` serves the view's seed records from memory; otherwise the
/// active profile's admin API backs the view.
pub async fn dispatch(
    cmd: Command,
    views: &ViewSet,
    cfg: &Config,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    if let Command::Views(args) = cmd {
        return views::handle(args, views, global);
    }
    let Some(key) = view_key(&cmd) else {
        return Err(CliError::Internal(format!("no view for {cmd:?}")));
    };
    let view: &View = views.get(key)?;
    let notifier = Notifier::new();

    if global.demo {
        debug!(view = %view.key, seed = view.seed.len(), "using in-memory backend");
        let backend = MemoryBackend::new(view.config.name.clone(), view.seed.clone());
        let controller = CrudController::new(view.config.clone(), backend, Some(notifier))?;
        entities::handle(cmd, view, &controller, global).await
    } else {
        let client = config::resolve_client(global, cfg)?;
        let backend = RestBackend::new(client, view.config.resource.clone());
        let controller = CrudController::new(view.config.clone(), backend, Some(notifier))?;
        entities::handle(cmd, view, &controller, global).await
    }
}
