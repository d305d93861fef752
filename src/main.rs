mod aggregate;
mod app;
mod cli;
mod host;
mod input;
mod k8s;
mod mail;
mod model;
mod ui;

use anyhow::{Context, Result};
use app::{App, Command, FetchOutcome};
use clap::Parser;
use cli::CliArgs;
use crossterm::event::{
    Event, EventStream, KeyEventKind, KeyboardEnhancementFlags, PopKeyboardEnhancementFlags,
    PushKeyboardEnhancementFlags,
};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
    supports_keyboard_enhancement,
};
use futures::StreamExt;
use k8s::ClusterGateway;
use model::NamespaceFilter;
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use std::io::{self, Stdout};
use tokio::sync::mpsc;
use tokio::time::{Duration, MissedTickBehavior, interval};
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

type TuiTerminal = Terminal<CrosstermBackend<Stdout>>;

#[tokio::main]
async fn main() -> Result<()> {
    let args = CliArgs::parse();
    init_tracing(&args.log_filter)?;

    let gateway = ClusterGateway::new(args.kubeconfig.as_deref()).await?;
    let namespace = resolve_namespace_filter(&args, &gateway);

    if args.all_namespaces && args.namespace.is_some() {
        warn!("both --all-namespaces and --namespace were provided, using all namespaces");
    }

    let mut app = App::new(namespace);
    run(&mut app, &gateway, args.refresh_ms.max(500)).await
}

fn init_tracing(level_filter: &str) -> Result<()> {
    let filter = EnvFilter::try_new(level_filter)
        .or_else(|_| EnvFilter::try_new("info"))
        .context("failed to initialize tracing filter")?;

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .with_writer(std::io::sink)
        .try_init();

    Ok(())
}

fn resolve_namespace_filter(args: &CliArgs, gateway: &ClusterGateway) -> NamespaceFilter {
    if args.all_namespaces {
        NamespaceFilter::All
    } else if let Some(namespace) = &args.namespace {
        NamespaceFilter::Named(namespace.clone())
    } else if gateway.default_namespace().is_empty() {
        NamespaceFilter::All
    } else {
        NamespaceFilter::Named(gateway.default_namespace().to_string())
    }
}

async fn run(app: &mut App, gateway: &ClusterGateway, refresh_ms: u64) -> Result<()> {
    let (mut terminal, keyboard_enhanced) = init_terminal()?;
    let run_result = run_loop(&mut terminal, app, gateway, refresh_ms).await;
    let restore_result = restore_terminal(&mut terminal, keyboard_enhanced);

    match (run_result, restore_result) {
        (Err(run_error), Err(restore_error)) => Err(anyhow::anyhow!(
            "{run_error:#}\nterminal restore error: {restore_error:#}"
        )),
        (Err(error), _) => Err(error),
        (_, Err(error)) => Err(error),
        (Ok(()), Ok(())) => Ok(()),
    }
}

fn init_terminal() -> Result<(TuiTerminal, bool)> {
    enable_raw_mode().context("failed to enable raw mode")?;
    let mut stdout = io::stdout();
    let keyboard_enhanced = matches!(supports_keyboard_enhancement(), Ok(true));
    if keyboard_enhanced {
        execute!(
            stdout,
            EnterAlternateScreen,
            PushKeyboardEnhancementFlags(
                KeyboardEnhancementFlags::DISAMBIGUATE_ESCAPE_CODES
                    | KeyboardEnhancementFlags::REPORT_ALL_KEYS_AS_ESCAPE_CODES
                    | KeyboardEnhancementFlags::REPORT_ALTERNATE_KEYS
                    | KeyboardEnhancementFlags::REPORT_EVENT_TYPES
            )
        )
        .context("failed to enter alternate screen with keyboard enhancement")?;
    } else {
        execute!(stdout, EnterAlternateScreen).context("failed to enter alternate screen")?;
    }
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("failed to create terminal backend")?;
    terminal.clear().context("failed to clear terminal")?;
    Ok((terminal, keyboard_enhanced))
}

fn restore_terminal(terminal: &mut TuiTerminal, keyboard_enhanced: bool) -> Result<()> {
    if keyboard_enhanced {
        execute!(terminal.backend_mut(), PopKeyboardEnhancementFlags)
            .context("failed to pop keyboard enhancement flags")?;
    }
    disable_raw_mode().context("failed to disable raw mode")?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)
        .context("failed to leave alternate screen")?;
    terminal.show_cursor().context("failed to show cursor")?;
    Ok(())
}

async fn run_loop(
    terminal: &mut TuiTerminal,
    app: &mut App,
    gateway: &ClusterGateway,
    refresh_ms: u64,
) -> Result<()> {
    let mut reader = EventStream::new();
    let mut ticker = interval(Duration::from_millis(refresh_ms));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let (outcome_tx, mut outcome_rx) = mpsc::unbounded_channel::<FetchOutcome>();

    loop {
        terminal
            .draw(|frame| ui::render(frame, app))
            .context("failed to render terminal frame")?;

        if !app.running() {
            break;
        }

        tokio::select! {
            maybe_event = reader.next() => {
                match maybe_event {
                    Some(Ok(Event::Key(key))) if key.kind == KeyEventKind::Press => {
                        if let Some(action) = input::map_key(app.mode(), key) {
                            debug!("action={action:?}");
                            let command = app.apply_action(action);
                            spawn_effect(gateway, command, &outcome_tx);
                        }
                    }
                    Some(Ok(_)) => {}
                    Some(Err(error)) => {
                        app.set_status(format!("terminal event error: {error}"));
                    }
                    None => {
                        app.set_status("terminal event stream closed");
                        break;
                    }
                }
            }
            _ = ticker.tick() => {
                // the previous refresh still being in flight stretches the
                // effective interval to at least the fetch latency
                if !app.refresh_inflight() {
                    let command = app.screen_refresh_command();
                    if command != Command::None {
                        app.mark_refresh_inflight();
                        spawn_effect(gateway, command, &outcome_tx);
                    }
                }
            }
            maybe_outcome = outcome_rx.recv() => {
                if let Some(outcome) = maybe_outcome {
                    let follow_up = app.absorb(outcome);
                    spawn_effect(gateway, follow_up, &outcome_tx);
                }
            }
        }
    }

    Ok(())
}

/// Runs one command on a background task and reports back through the
/// outcome channel. The loop itself never awaits cluster I/O.
fn spawn_effect(
    gateway: &ClusterGateway,
    command: Command,
    outcome_tx: &mpsc::UnboundedSender<FetchOutcome>,
) {
    let gateway = gateway.clone();
    let tx = outcome_tx.clone();

    match command {
        Command::None | Command::Quit => {}
        Command::FetchList {
            kind,
            namespace,
            generation,
        } => {
            tokio::spawn(async move {
                let result = gateway
                    .fetch_list(kind, &namespace)
                    .await
                    .map_err(|error| compact_error(&error));
                let _ = tx.send(FetchOutcome::List {
                    kind,
                    generation,
                    result,
                });
            });
        }
        Command::FetchDashboard { generation } => {
            tokio::spawn(async move {
                let result = gateway
                    .fetch_dashboard()
                    .await
                    .map_err(|error| compact_error(&error));
                let _ = tx.send(FetchOutcome::Dashboard { generation, result });
            });
        }
        Command::FetchHost => {
            tokio::spawn(async move {
                let result = tokio::task::spawn_blocking(host::sample)
                    .await
                    .map_err(|error| error.to_string());
                let _ = tx.send(FetchOutcome::Host { result });
            });
        }
        Command::FetchNamespaces => {
            tokio::spawn(async move {
                let result = gateway
                    .fetch_namespaces()
                    .await
                    .map_err(|error| compact_error(&error));
                let _ = tx.send(FetchOutcome::Namespaces { result });
            });
        }
        Command::FetchPodLogs { namespace, name } => {
            tokio::spawn(async move {
                let title = format!("Pod Logs {namespace}/{name}");
                let result = gateway
                    .fetch_pod_logs(&namespace, &name)
                    .await
                    .map_err(|error| compact_error(&error));
                let _ = tx.send(FetchOutcome::PodLogs { title, result });
            });
        }
        Command::RunHostLog { kind } => {
            tokio::spawn(async move {
                let result = host::run_log_command(kind)
                    .await
                    .map_err(|error| compact_error(&error));
                let _ = tx.send(FetchOutcome::HostLog {
                    title: kind.title().to_string(),
                    result,
                });
            });
        }
        Command::DeletePod { namespace, name } => {
            tokio::spawn(async move {
                let result = gateway
                    .delete_pod(&namespace, &name)
                    .await
                    .map_err(|error| compact_error(&error));
                let _ = tx.send(FetchOutcome::Mutation {
                    label: format!("Deleted pod {namespace}/{name}"),
                    refresh: Some(model::ResourceKind::Pods),
                    result,
                });
            });
        }
        Command::ScaleDeployment {
            namespace,
            name,
            replicas,
        } => {
            tokio::spawn(async move {
                let result = gateway
                    .scale_deployment(&namespace, &name, replicas)
                    .await
                    .map_err(|error| compact_error(&error));
                let _ = tx.send(FetchOutcome::Mutation {
                    label: format!("Scaled {namespace}/{name} to {replicas}"),
                    refresh: Some(model::ResourceKind::Deployments),
                    result,
                });
            });
        }
        Command::PatchResource {
            kind,
            namespace,
            name,
            body,
        } => {
            tokio::spawn(async move {
                let result = gateway
                    .patch_resource(kind, namespace.as_deref(), &name, &body)
                    .await
                    .map_err(|error| compact_error(&error));
                let _ = tx.send(FetchOutcome::Mutation {
                    label: format!("Updated {} {name}", kind.title()),
                    refresh: Some(kind),
                    result,
                });
            });
        }
        Command::SendAlertEmail {
            settings,
            subject,
            body,
        } => {
            tokio::spawn(async move {
                let recipient = settings.recipient.clone();
                let result = mail::send_email(settings, subject, body)
                    .await
                    .map_err(|error| compact_error(&error));
                let _ = tx.send(FetchOutcome::Mutation {
                    label: format!("Alert sent to {recipient}"),
                    refresh: None,
                    result,
                });
            });
        }
    }
}

fn compact_error(error: &anyhow::Error) -> String {
    let mut out = Vec::new();
    for (index, cause) in error.chain().enumerate() {
        if index == 0 {
            out.push(cause.to_string());
        } else if index <= 2 {
            out.push(format!("caused by: {cause}"));
        } else {
            break;
        }
    }

    out.join("\n")
}
