use std::fs::{self, OpenOptions};
use std::sync::Mutex;
use std::{io, time::Duration};

use anyhow::{Context, Result};
use crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Direction, Layout},
    style::{Modifier, Style},
    widgets::{Block, BorderType, Borders, Paragraph, Wrap},
    Frame, Terminal,
};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use pollsync::app::{App, ViewMode};
use pollsync::handlers::{handle_key_event, KeyAction};
use pollsync::ui::{self, render_confirm_delete, render_poll_details, render_poll_list, render_status_bar};

const LOG_ENV: &str = "POLLSYNC_LOG";

/// Send tracing output to `<data_dir>/pollsync/pollsync.log`; the terminal
/// belongs to the UI.
fn init_logging() -> Result<()> {
    let log_dir = dirs::data_dir()
        .context("Failed to get data directory")?
        .join("pollsync");
    fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_dir.join("pollsync.log"))
        .context("Failed to open log file")?;

    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(Mutex::new(log_file))
                .with_target(true)
                .with_ansi(false),
        )
        .with(filter)
        .try_init()
        .context("Failed to install tracing subscriber")?;

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    if let Err(e) = init_logging() {
        eprintln!("Logging disabled: {:#}", e);
    }

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = match App::new().await {
        Ok(app) => app,
        Err(e) => {
            disable_raw_mode()?;
            execute!(io::stdout(), LeaveAlternateScreen)?;
            eprintln!("Failed to initialize app: {:#}", e);
            return Err(e);
        }
    };

    let res = run_app(&mut terminal, &mut app).await;
    app.shutdown();

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        tracing::error!("{:?}", err);
        eprintln!("{:?}", err);
    }

    Ok(())
}

async fn run_app(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>, app: &mut App) -> Result<()> {
    loop {
        app.poll_sync().await;
        app.clear_expired_status();

        terminal.draw(|f| render_ui(f, app))?;

        if event::poll(Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                match handle_key_event(app, key).await {
                    KeyAction::Quit => return Ok(()),
                    KeyAction::Continue => {}
                }
            }
        }
    }
}

fn render_ui(f: &mut Frame, app: &App) {
    let theme = &app.theme;

    let mut constraints = vec![Constraint::Length(3)]; // Header
    if app.show_debug {
        constraints.push(Constraint::Percentage(60)); // Main content
        constraints.push(Constraint::Min(6)); // Debug panel
    } else {
        constraints.push(Constraint::Min(10));
    }
    constraints.push(Constraint::Length(3)); // Status bar

    let main_chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints(constraints)
        .split(f.area());

    let mut chunk_index = 0;

    // Header
    let backend = app.reconciler.store().backend_name();
    let header_text = match app.outage_active() {
        Some(true) => format!("pollsync - {} (simulated outage)", backend),
        _ => format!("pollsync - {}", backend),
    };
    let header = Paragraph::new(header_text)
        .style(Style::default().fg(theme.primary()).add_modifier(Modifier::BOLD))
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_type(BorderType::Rounded),
        );
    f.render_widget(header, main_chunks[chunk_index]);
    chunk_index += 1;

    // Main content
    let content_area = main_chunks[chunk_index];
    match (app.view_mode, app.details.as_ref()) {
        (ViewMode::Details, Some(details)) => render_poll_details(f, details, content_area, theme),
        _ => {
            let banner = app.banner();
            let list_state = ui::PollListState {
                polls: app.polls(),
                selected: app.selected,
                banner: &banner,
                filter_label: app.reconciler.filters().describe(),
                backend,
            };
            render_poll_list(f, &list_state, content_area, theme);
        }
    }
    chunk_index += 1;

    // Debug panel (only shown when enabled)
    if app.show_debug {
        let debug_text: String = app
            .debug_log
            .iter()
            .rev()
            .take(10)
            .rev()
            .cloned()
            .collect::<Vec<_>>()
            .join("\n");

        let debug_panel = Paragraph::new(debug_text)
            .style(Style::default().fg(theme.text_muted()))
            .wrap(Wrap { trim: false })
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title("Debug Log [D: hide]")
                    .border_style(Style::default().fg(theme.text_disabled())),
            );
        f.render_widget(debug_panel, main_chunks[chunk_index]);
        chunk_index += 1;
    }

    // Status bar
    let status_state = ui::StatusBarState {
        in_details: app.view_mode == ViewMode::Details,
        confirming_delete: app.pending_delete.is_some(),
        outage: app.outage_active(),
        status_message: app.status_message.as_ref().map(|m| (m.message.clone(), m.is_error)),
    };
    render_status_bar(f, &status_state, main_chunks[chunk_index], theme);

    // Confirmation popup on top of everything
    if let Some(ref pending) = app.pending_delete {
        render_confirm_delete(f, &pending.question, f.area(), theme);
    }
}
