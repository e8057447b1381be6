//! hafiz - on-demand content packages
//!
//! Command line front end over the installer: downloads catalog packages,
//! installs them into the content root and reports what is there.

mod cli;
mod display;
mod error;
mod events;
mod logging;
mod setup;

use crate::cli::{Cli, Commands, GlobalArgs};
use crate::display::{
    CleanFailure, CleanReport, InstalledPackage, OperationResult, OutputRenderer, PackageStatus,
    UninstallOutcome,
};
use crate::error::CliError;
use crate::events::EventHandler;
use crate::logging::init_tracing;
use crate::setup::SystemSetup;
use clap::Parser;
use console::Term;
use hafiz_config::Config;
use hafiz_events::EventReceiver;
use hafiz_types::{PackageDescriptor, PackageId};
use std::collections::HashSet;
use std::process;
use tokio::select;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let json_mode = cli.global.json;

    init_tracing(json_mode, cli.global.debug);

    if let Err(e) = run(cli).await {
        error!("Application error: {}", e);
        if !json_mode {
            eprintln!("Error: {e}");
        }
        process::exit(1);
    }
}

/// Main application logic
async fn run(cli: Cli) -> Result<(), CliError> {
    debug!("Starting hafiz v{}", env!("CARGO_PKG_VERSION"));

    // File config (or defaults), then environment, then flags
    let mut config = Config::load_or_default(cli.global.config.as_deref()).await?;
    config.merge_env()?;
    apply_cli_config(&mut config, &cli.global);

    let (event_sender, event_receiver) = hafiz_events::channel();
    let setup =
        SystemSetup::initialize(config, cli.command.needs_catalog(), event_sender).await?;

    let json_mode = cli.global.json;
    let renderer = OutputRenderer::new(
        json_mode,
        !json_mode && Term::stdout().features().colors_supported(),
    );
    let mut event_handler = EventHandler::new(
        json_mode,
        Term::stderr().features().colors_supported(),
        cli.global.debug,
    );

    let cancel = CancellationToken::new();
    let interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, cancelling in-flight operations");
            interrupt.cancel();
        }
    });

    let result = execute_command_with_events(
        cli.command,
        &setup,
        &cancel,
        event_receiver,
        &mut event_handler,
    )
    .await?;

    renderer.render_result(&result)?;

    if let OperationResult::Installed(results) = &result {
        let failed = results.iter().filter(|r| !r.is_success()).count();
        if failed > 0 {
            return Err(CliError::InstallFailed {
                failed,
                total: results.len(),
            });
        }
    }

    debug!("Command completed successfully");
    Ok(())
}

/// Execute command with concurrent event handling
async fn execute_command_with_events(
    command: Commands,
    setup: &SystemSetup,
    cancel: &CancellationToken,
    mut event_receiver: EventReceiver,
    event_handler: &mut EventHandler,
) -> Result<OperationResult, CliError> {
    let mut command_future = Box::pin(execute_command(command, setup, cancel));

    loop {
        select! {
            result = &mut command_future => {
                while let Ok(event) = event_receiver.try_recv() {
                    event_handler.handle_event(&event);
                }
                event_handler.finish();
                return result;
            }

            Some(event) = event_receiver.recv() => {
                event_handler.handle_event(&event);
            }
        }
    }
}

/// Execute the specified command
async fn execute_command(
    command: Commands,
    setup: &SystemSetup,
    cancel: &CancellationToken,
) -> Result<OperationResult, CliError> {
    match command {
        Commands::Install { packages } => {
            let descriptors = resolve_descriptors(setup, &packages)?;
            let results = setup
                .installer()
                .install_many(&descriptors, cancel)
                .await;
            Ok(OperationResult::Installed(results))
        }

        Commands::Uninstall { packages } => {
            let mut outcomes = Vec::with_capacity(packages.len());
            for id in parse_ids(&packages)? {
                let removed = setup.installer().uninstall(&id).await?;
                outcomes.push(UninstallOutcome {
                    package: id,
                    removed,
                });
            }
            Ok(OperationResult::Uninstalled(outcomes))
        }

        Commands::Status { packages } => {
            let descriptors = if packages.is_empty() {
                setup.catalog().iter().cloned().collect()
            } else {
                resolve_descriptors(setup, &packages)?
            };

            let mut statuses = Vec::with_capacity(descriptors.len());
            for descriptor in descriptors {
                let installed = setup.store().exists(&descriptor.id).await;
                let size_bytes = if installed {
                    setup.store().package_size(&descriptor.id).await.ok()
                } else {
                    None
                };
                statuses.push(PackageStatus {
                    in_flight: setup
                        .installer()
                        .in_flight(&descriptor.id)
                        .map(|phase| phase.to_string()),
                    installed,
                    size_bytes,
                    declared_size_bytes: descriptor.declared_size_bytes,
                    source_url: descriptor.source_url,
                    package: descriptor.id,
                });
            }
            Ok(OperationResult::Status(statuses))
        }

        Commands::List => {
            let store = setup.store();
            let mut packages = Vec::new();
            for id in store.list().await? {
                packages.push(InstalledPackage {
                    path: store.package_root(&id),
                    size_bytes: store.package_size(&id).await?,
                    package: id,
                });
            }
            Ok(OperationResult::List(packages))
        }

        Commands::Path { package, relative } => {
            let id = PackageId::new(package)?;
            let path = setup.store().path(&id, &relative)?;
            Ok(OperationResult::Path(path))
        }

        Commands::Clean => {
            let report = setup
                .store()
                .cleanup_stale(setup.config().stale_after())
                .await?;
            Ok(OperationResult::Cleaned(CleanReport {
                removed: report.removed,
                failed: report
                    .failed
                    .into_iter()
                    .map(|(path, error)| CleanFailure { path, error })
                    .collect(),
            }))
        }
    }
}

/// Parse ids in argument order, dropping repeats
fn parse_ids(raw: &[String]) -> Result<Vec<PackageId>, CliError> {
    let mut seen = HashSet::new();
    let mut ids = Vec::with_capacity(raw.len());
    for value in raw {
        let id = PackageId::new(value.as_str())
            .map_err(|e| CliError::InvalidArguments(format!("'{value}': {e}")))?;
        if seen.insert(id.clone()) {
            ids.push(id);
        }
    }
    Ok(ids)
}

fn resolve_descriptors(
    setup: &SystemSetup,
    raw: &[String],
) -> Result<Vec<PackageDescriptor>, CliError> {
    parse_ids(raw)?
        .iter()
        .map(|id| setup.catalog().get(id).cloned().map_err(CliError::from))
        .collect()
}

/// Apply CLI configuration overrides (highest precedence)
fn apply_cli_config(config: &mut Config, global: &GlobalArgs) {
    if let Some(root) = &global.content_root {
        config.paths.content_root = Some(root.clone());
    }
    if let Some(catalog) = &global.catalog {
        config.paths.catalog = Some(catalog.clone());
    }
}
