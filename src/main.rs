use sfw::api;
use sfw::app;
use sfw::browser;
use sfw::cli;
use sfw::events;
use sfw::input;
use sfw::tui;

use api::client::Client;
use api::poller::{self, Poller};
use api::stream::TailStream;
use app::{AppState, View};
use clap::Parser;
use cli::Cli;
use color_eyre::eyre::Result;
use crossterm::execute;
use crossterm::terminal::{self, EnterAlternateScreen, LeaveAlternateScreen};
use events::{AppEvent, EventHandler};
use input::{Action, InputContext, ViewMode};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use sfw::tail::TailEvent;
use std::io;
use std::time::{Duration, Instant};

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    // Log to stderr only when explicitly asked; the alternate screen owns
    // stdout.
    if std::env::var_os("RUST_LOG").is_some() {
        tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_writer(io::stderr)
            .init();
    }

    let args = Cli::parse();

    let client = match Client::new(&args.server) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    // Startup validation: reach the backend once before entering the TUI
    let initial_builds = match client.fetch_builds().await {
        Ok(json) => match api::parser::parse_builds(&json) {
            Ok(mut builds) => {
                builds.truncate(args.limit);
                builds
            }
            Err(e) => {
                eprintln!("Error: unexpected response from {}: {}", args.server, e);
                std::process::exit(1);
            }
        },
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    let mut state = AppState::new(args.server.clone(), args.tail_len, args.limit);
    state.poll_interval = args.interval;
    state.set_builds(initial_builds);

    // Setup terminal with panic hook
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let _ = terminal::disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        original_hook(panic_info);
    }));

    terminal::enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;

    // Event handler
    let events = EventHandler::new(Duration::from_millis(100));
    let tx = events.sender();

    // Start poller
    let poller = Poller::new(client.clone(), args.limit, args.interval, tx.clone());
    tokio::spawn(async move {
        poller.run().await;
    });

    let result = run_app(&mut terminal, &mut state, events, &tx, &client).await;

    // Restore terminal
    terminal::disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

fn input_context(state: &AppState) -> InputContext {
    InputContext {
        view: match state.view {
            View::Builds => ViewMode::Builds,
            View::Detail => ViewMode::Detail,
            View::NewBuild => ViewMode::Form,
        },
        has_error: state.error_message().is_some(),
        is_loading: state.is_loading,
        can_restart: state.can_restart(),
    }
}

async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    state: &mut AppState,
    mut events: EventHandler,
    tx: &tokio::sync::mpsc::UnboundedSender<AppEvent>,
    client: &Client,
) -> Result<()> {
    let mut last_tick = Instant::now();
    let mut poll_start = Instant::now();

    loop {
        // Render
        terminal.draw(|f| tui::render::render(f, state))?;

        // Update countdown
        let elapsed = poll_start.elapsed().as_secs();
        state.next_poll_in = state.poll_interval.saturating_sub(elapsed);

        // Prune old notifications and stale errors
        state.prune_notifications();
        state.prune_error();

        // Process events
        if let Some(event) = events.next().await {
            match event {
                AppEvent::Key(key) => match input::map_key(key, &input_context(state)) {
                    Action::Quit => state.should_quit = true,
                    Action::DismissError => state.clear_error(),
                    Action::MoveUp => state.move_cursor_up(),
                    Action::MoveDown => state.move_cursor_down(),
                    Action::OpenBuild => {
                        if let Some(id) = state.current_build().map(|b| b.id) {
                            state.request_detail(id);
                            let client2 = client.clone();
                            let tx2 = tx.clone();
                            tokio::spawn(async move {
                                poller::fetch_build_detail(&client2, id, &tx2).await;
                            });
                        }
                    }
                    Action::Back => match state.view {
                        View::Detail => state.close_detail(),
                        View::NewBuild => {
                            state.form = app::BuildForm::default();
                            state.view = View::Builds;
                        }
                        View::Builds => {}
                    },
                    Action::Refresh => match state.view {
                        View::Detail => {
                            if let Some(id) = state.detail_build_id() {
                                let client2 = client.clone();
                                let tx2 = tx.clone();
                                tokio::spawn(async move {
                                    poller::fetch_build_detail(&client2, id, &tx2).await;
                                });
                            }
                        }
                        _ => {
                            state.is_loading = true;
                            let client2 = client.clone();
                            let tx2 = tx.clone();
                            let limit = state.config.limit;
                            tokio::spawn(async move {
                                match client2.fetch_builds().await {
                                    Ok(json) => match api::parser::parse_builds(&json) {
                                        Ok(mut builds) => {
                                            builds.truncate(limit);
                                            let _ = tx2.send(AppEvent::BuildsResult(builds));
                                        }
                                        Err(e) => {
                                            let _ = tx2.send(AppEvent::Error(format!("{}", e)));
                                        }
                                    },
                                    Err(e) => {
                                        let _ = tx2.send(AppEvent::Error(format!("{}", e)));
                                    }
                                }
                            });
                            poll_start = Instant::now();
                        }
                    },
                    Action::NewBuild => {
                        state.form = app::BuildForm::default();
                        state.view = View::NewBuild;
                    }
                    Action::Restart => {
                        if let Some(id) = state.detail_build_id() {
                            let client2 = client.clone();
                            let tx2 = tx.clone();
                            tokio::spawn(async move {
                                match client2.restart_build(id).await {
                                    Ok(json) => match api::parser::parse_restart(&json) {
                                        Ok(success) => {
                                            let _ =
                                                tx2.send(AppEvent::RestartResult { id, success });
                                        }
                                        Err(e) => {
                                            let _ = tx2.send(AppEvent::Error(format!("{}", e)));
                                        }
                                    },
                                    Err(e) => {
                                        let _ = tx2.send(AppEvent::Error(format!("{}", e)));
                                    }
                                }
                            });
                        }
                    }
                    Action::OpenRaw => {
                        if let Some(id) = state.detail_build_id() {
                            let url = state.raw_log_url(id);
                            tokio::spawn(async move {
                                let _ = browser::open(&url).await;
                            });
                        }
                    }
                    Action::FormInput(c) => state.form.insert(c),
                    Action::FormBackspace => state.form.backspace(),
                    Action::FormNextField => state.form.focus = state.form.focus.next(),
                    Action::FormPrevField => state.form.focus = state.form.focus.prev(),
                    Action::Submit => {
                        if !state.form.submitting {
                            let request = state.form.payload();
                            if request.origin.is_empty() {
                                state.set_error("origin is required".to_string());
                            } else {
                                state.form.submitting = true;
                                let client2 = client.clone();
                                let tx2 = tx.clone();
                                tokio::spawn(async move {
                                    match client2.submit_build(&request).await {
                                        Ok(json) => match api::parser::parse_submitted(&json) {
                                            Ok(build) => {
                                                let _ = tx2.send(AppEvent::BuildSubmitted(build));
                                            }
                                            Err(e) => {
                                                let _ =
                                                    tx2.send(AppEvent::Error(format!("{}", e)));
                                            }
                                        },
                                        Err(e) => {
                                            let _ = tx2.send(AppEvent::Error(format!("{}", e)));
                                        }
                                    }
                                });
                            }
                        }
                    }
                    Action::None => {}
                },
                AppEvent::Tick => {
                    if last_tick.elapsed() >= Duration::from_millis(100) {
                        state.advance_spinner();
                        last_tick = Instant::now();
                    }
                }
                AppEvent::BuildsResult(builds) => {
                    state.apply_builds_result(builds);
                    poll_start = Instant::now();
                }
                AppEvent::BuildResult { build, inputs } => {
                    if !state.detail_result_wanted(build.id) {
                        // Stale fetch; the user has moved on
                    } else if state.detail_build_id() == Some(build.id) {
                        state.update_detail(build, inputs);
                    } else {
                        let subscription = state.next_subscription();
                        let stream = TailStream::open(
                            subscription,
                            client.clone(),
                            build.id,
                            state.config.tail_len,
                            tx.clone(),
                        );
                        state.open_detail(build, inputs, stream);
                    }
                }
                AppEvent::BuildSubmitted(build) => {
                    state.notify(format!("Build #{} queued", build.id));
                    state.form = app::BuildForm::default();
                    state.view = View::Builds;
                    state.is_loading = true;
                    let client2 = client.clone();
                    let tx2 = tx.clone();
                    let limit = state.config.limit;
                    tokio::spawn(async move {
                        match client2.fetch_builds().await {
                            Ok(json) => match api::parser::parse_builds(&json) {
                                Ok(mut builds) => {
                                    builds.truncate(limit);
                                    let _ = tx2.send(AppEvent::BuildsResult(builds));
                                }
                                Err(e) => {
                                    let _ = tx2.send(AppEvent::Error(format!("{}", e)));
                                }
                            },
                            Err(e) => {
                                let _ = tx2.send(AppEvent::Error(format!("{}", e)));
                            }
                        }
                    });
                }
                AppEvent::RestartResult { id, success } => {
                    if success {
                        state.notify(format!("Build #{} restarted", id));
                        let client2 = client.clone();
                        let tx2 = tx.clone();
                        tokio::spawn(async move {
                            poller::fetch_build_detail(&client2, id, &tx2).await;
                        });
                    } else {
                        state.set_error(format!("Restart of build #{} was refused", id));
                    }
                }
                AppEvent::Tail {
                    subscription,
                    event,
                } => {
                    if let TailEvent::Error(msg) = &event {
                        tracing::warn!(subscription, "tail error from backend: {msg}");
                    }
                    state.apply_tail(subscription, event);
                }
                AppEvent::TailClosed { subscription } => {
                    state.tail_disconnected(subscription);
                }
                AppEvent::Error(e) => {
                    state.is_loading = false;
                    state.form.submitting = false;
                    state.set_error(e);
                }
            }
        }

        if state.should_quit {
            return Ok(());
        }
    }
}
