use anyhow::{Context, Result};
use clap::Parser;
use host::{TerminalHost, render};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use typeahead_common::observability::{LogConfig, init_logging};
use typeahead_common::{SearchEngine, SuggestionProvider};
use typeahead_config::{SettingsStore, TypeaheadConfig, TypeaheadConfigLoader};
use typeahead_core::{QueryController, settings_items};
use typeahead_runtime::{TypeaheadHandle, TypeaheadRuntime};

mod host;
mod wiring;

/// Live search suggestions in the terminal.
///
/// Each line read from stdin is the current contents of the search box.
/// Lines starting with `:` are commands: `:engine`, `:provider`, `:always`,
/// `:preview`, `:settings`, `:quit`.
#[derive(Debug, Parser)]
#[command(name = "typeahead", version)]
struct Args {
    /// YAML configuration file (skipped if missing).
    #[arg(long, env = "TYPEAHEAD_CONFIG", default_value = "typeahead.yaml")]
    config: PathBuf,

    /// Settings document; defaults to the per-user data directory.
    #[arg(long)]
    settings: Option<PathBuf>,

    /// Suggestion provider for this run only.
    #[arg(long)]
    provider: Option<SuggestionProvider>,

    /// Search engine for this run only.
    #[arg(long)]
    engine: Option<SearchEngine>,

    /// Never capture previews, whatever the settings say.
    #[arg(long)]
    no_preview: bool,

    /// Print the current settings and exit.
    #[arg(long)]
    show_settings: bool,

    /// Run one query, print the final list and exit.
    #[arg(long)]
    query: Option<String>,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let config = TypeaheadConfigLoader::new()
        .with_file(&args.config)
        .load()
        .with_context(|| format!("loading {}", args.config.display()))?;

    let log_path = init_logging(LogConfig {
        log_dir: config.logging.dir.clone(),
        emit_stderr: config.logging.stderr,
        format: config.logging.format,
        default_filter: config
            .logging
            .level
            .clone()
            .unwrap_or_else(|| "info".to_string()),
        ..LogConfig::default()
    })?;
    tracing::info!(log = %log_path.display(), config = %args.config.display(), "typeahead starting");

    let runtime = TypeaheadRuntime::build("typeahead-worker", None)?;
    let outcome = runtime.block_on(run(args, config, runtime.handle()));
    runtime.shutdown(Duration::from_secs(2));
    outcome
}

async fn run(args: Args, config: TypeaheadConfig, handle: TypeaheadHandle) -> Result<()> {
    let settings_path = match args.settings.clone().or_else(|| config.settings_file.clone()) {
        Some(path) => path,
        None => SettingsStore::default_path()
            .context("no local data directory; pass --settings")?,
    };
    let store = SettingsStore::open(&settings_path, config.settings.clone())
        .with_context(|| format!("opening settings {}", settings_path.display()))?;

    if args.show_settings {
        print!("{}", render(0, &settings_items(&store.current())));
        return Ok(());
    }

    // Command-line choices only touch the in-memory handle. The next `:`
    // command saves the whole snapshot, these choices included.
    let settings = store.handle();
    settings.update(|s| {
        if let Some(provider) = args.provider {
            s.set_provider(provider);
        }
        if let Some(engine) = args.engine {
            s.set_engine(engine);
        }
        if args.no_preview {
            s.set_render_preview(false);
        }
    });

    let host = Arc::new(TerminalHost::default());
    let changed = host.changed();
    let controller = wiring::build_controller(
        &config,
        settings,
        handle,
        host,
        !args.no_preview,
    )?;

    let result = match args.query.as_deref() {
        Some(query) => {
            controller.update_query(query);
            controller.settled().await;
            print!(
                "{}",
                render(controller.current_generation(), &controller.items())
            );
            Ok(())
        }
        None => interactive(&controller, &store, changed).await,
    };

    controller.dispose().await;
    tracing::info!("typeahead stopped");
    result
}

async fn interactive(
    controller: &QueryController,
    store: &SettingsStore,
    changed: Arc<tokio::sync::Notify>,
) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            _ = changed.notified() => {
                print!("{}", render(controller.current_generation(), &controller.items()));
            }
            line = lines.next_line() => {
                let Some(line) = line.context("reading stdin")? else {
                    break;
                };
                match line.strip_prefix(':') {
                    Some("quit") | Some("q") => break,
                    Some(command) => {
                        settings_command(command.trim(), store)?;
                    }
                    None => controller.update_query(&line),
                }
            }
        }
    }
    Ok(())
}

/// Apply a `:` command through the settings document and print the summary.
fn settings_command(command: &str, store: &SettingsStore) -> Result<()> {
    let updated = match command {
        "engine" => store.update(|s| {
            s.cycle_engine();
        })?,
        "provider" => store.update(|s| {
            s.cycle_provider();
        })?,
        "always" => store.update(|s| {
            s.toggle_always_show_query();
        })?,
        "preview" => store.update(|s| {
            s.toggle_render_preview();
        })?,
        "settings" => store.current(),
        other => {
            eprintln!("unknown command :{other}");
            return Ok(());
        }
    };
    tracing::debug!(command, "settings command applied");
    print!("{}", render(0, &settings_items(&updated)));
    Ok(())
}
