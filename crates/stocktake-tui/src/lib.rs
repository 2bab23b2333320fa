mod counter_flow;
mod import_flow;
mod keymap;
mod theme;
mod ui;

use std::io::{Stdout, stdout};
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result, anyhow};
use counter_flow::{CounterFlowOps, CounterScreen};
use crossterm::cursor::{Hide, Show};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use import_flow::ImportScreen;
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::text::{Line, Text};
use stocktake_app::App;
use stocktake_core::api::StocklistApi;
use stocktake_core::counting::CountingSession;

use crate::ui::count_worker::{ApiCountSubmitter, CountSubmitter};
use crate::ui::modal::render_error_modal;
use crate::ui::text::{
    compact_hint, focus_line, key_hint_height, key_hint_paragraph, wrapped_paragraph,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiExit {
    Completed,
    Canceled,
}

pub(crate) struct TerminalSession {
    terminal: Terminal<CrosstermBackend<Stdout>>,
}

impl TerminalSession {
    pub(crate) fn enter() -> Result<Self> {
        let terminal = enter_with_ops(
            || enable_raw_mode().context("failed to enable raw mode"),
            || {
                let mut out = stdout();
                execute!(out, EnterAlternateScreen, Hide)
                    .context("failed to enter alternate screen")
            },
            || {
                let backend = CrosstermBackend::new(stdout());
                Terminal::new(backend).context("failed to create terminal backend")
            },
            || {
                let mut out = stdout();
                execute!(out, Show, LeaveAlternateScreen)
                    .context("failed to restore terminal screen during rollback")
            },
            || disable_raw_mode().context("failed to disable raw mode during rollback"),
        )?;
        Ok(Self { terminal })
    }

    pub(crate) fn draw<F>(&mut self, draw_fn: F) -> Result<()>
    where
        F: FnOnce(&mut ratatui::Frame<'_>),
    {
        self.terminal
            .draw(draw_fn)
            .context("failed to render terminal")?;
        Ok(())
    }

    pub(crate) fn autoresize(&mut self) -> Result<()> {
        self.terminal
            .autoresize()
            .context("failed to autoresize terminal")?;
        Ok(())
    }
}

impl Drop for TerminalSession {
    fn drop(&mut self) {
        let _ = execute!(self.terminal.backend_mut(), Show, LeaveAlternateScreen);
        let _ = disable_raw_mode();
    }
}

fn enter_with_ops<T, EnableRawMode, EnterAltScreen, CreateTerminal, LeaveAltScreen, DisableRawMode>(
    mut enable_raw_mode_op: EnableRawMode,
    mut enter_alt_screen_op: EnterAltScreen,
    mut create_terminal_op: CreateTerminal,
    mut leave_alt_screen_op: LeaveAltScreen,
    mut disable_raw_mode_op: DisableRawMode,
) -> Result<T>
where
    EnableRawMode: FnMut() -> Result<()>,
    EnterAltScreen: FnMut() -> Result<()>,
    CreateTerminal: FnMut() -> Result<T>,
    LeaveAltScreen: FnMut() -> Result<()>,
    DisableRawMode: FnMut() -> Result<()>,
{
    enable_raw_mode_op()?;

    if let Err(error) = enter_alt_screen_op() {
        return Err(failure_with_rollback(
            error,
            false,
            &mut leave_alt_screen_op,
            &mut disable_raw_mode_op,
        ));
    }

    match create_terminal_op() {
        Ok(terminal) => Ok(terminal),
        Err(error) => Err(failure_with_rollback(
            error,
            true,
            &mut leave_alt_screen_op,
            &mut disable_raw_mode_op,
        )),
    }
}

/// Raw mode is always enabled by the time a later setup step fails.
fn failure_with_rollback<LeaveAltScreen, DisableRawMode>(
    setup_error: anyhow::Error,
    alt_screen_entered: bool,
    leave_alt_screen_op: &mut LeaveAltScreen,
    disable_raw_mode_op: &mut DisableRawMode,
) -> anyhow::Error
where
    LeaveAltScreen: FnMut() -> Result<()>,
    DisableRawMode: FnMut() -> Result<()>,
{
    let mut cleanup_failures = Vec::<String>::new();

    if alt_screen_entered && let Err(error) = leave_alt_screen_op() {
        cleanup_failures.push(format!(
            "failed to restore alternate screen during rollback: {error:#}"
        ));
    }

    if let Err(error) = disable_raw_mode_op() {
        cleanup_failures.push(format!(
            "failed to disable raw mode during rollback: {error:#}"
        ));
    }

    if cleanup_failures.is_empty() {
        setup_error
    } else {
        anyhow!(
            "{setup_error:#}\nterminal rollback cleanup failed: {}",
            cleanup_failures.join("\n")
        )
    }
}

pub(crate) fn is_ctrl_c(key: KeyEvent) -> bool {
    key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c')
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EmptyAction {
    Import,
    Reload,
    Exit,
}

/// Shown when the store has no items or lists yet.
#[derive(Debug)]
struct EmptyScreen {
    title: String,
}

impl EmptyScreen {
    fn new(title: &str) -> Self {
        Self {
            title: title.to_string(),
        }
    }

    fn on_key(&self, key: KeyEvent) -> Option<EmptyAction> {
        if keymap::is_back(key) || keymap::is_quit(key) {
            return Some(EmptyAction::Exit);
        }

        match key.code {
            KeyCode::Char('i') => Some(EmptyAction::Import),
            KeyCode::Char('r') => Some(EmptyAction::Reload),
            _ if keymap::is_confirm(key) => Some(EmptyAction::Import),
            _ => None,
        }
    }

    fn render(&self, frame: &mut ratatui::Frame<'_>) {
        let area = frame.area();
        let key_text = compact_hint(
            area.width,
            "Enter/i: import CSV    r: reload    Esc/q: quit",
            "Enter/i: import    r: reload    q: quit",
            "i import | r reload | q quit",
        );
        let footer_height = key_hint_height(area.width, key_text);
        let [body, footer] = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(4), Constraint::Length(footer_height)])
            .areas(area);

        let text = Text::from(vec![
            Line::from("This store has no items yet."),
            Line::from(""),
            focus_line("Import a CSV file to start counting."),
        ]);
        frame.render_widget(
            wrapped_paragraph(text).block(theme::chrome(self.title.as_str())),
            body,
        );

        let hints = key_hint_paragraph(key_text).block(theme::key_block());
        frame.render_widget(hints, footer);
    }
}

enum ActiveScreen {
    Counter(Box<CounterScreen>),
    Import {
        screen: Box<ImportScreen>,
        parked: Option<Box<CounterScreen>>,
    },
    Empty(EmptyScreen),
}

impl ActiveScreen {
    fn for_session(
        ops: &dyn CounterFlowOps,
        session: Option<CountingSession>,
        submitter: &Arc<dyn CountSubmitter>,
    ) -> Self {
        match session {
            Some(session) => Self::Counter(Box::new(CounterScreen::new(
                ops,
                session,
                Arc::clone(submitter),
            ))),
            None => Self::Empty(EmptyScreen::new(ops.store_title())),
        }
    }

    fn render(&self, frame: &mut ratatui::Frame<'_>) {
        match self {
            Self::Counter(screen) => screen.render(frame),
            Self::Import { screen, .. } => screen.render(frame),
            Self::Empty(screen) => screen.render(frame),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DrainReason {
    Timeout,
    AfterInput,
}

trait RootLoopTickTarget {
    fn on_tick(&mut self);
    fn should_drain_after_input(&self) -> bool;
}

struct CounterTick<'s, 'o> {
    screen: &'s mut CounterScreen,
    ops: &'o dyn CounterFlowOps,
}

impl RootLoopTickTarget for CounterTick<'_, '_> {
    fn on_tick(&mut self) {
        self.screen.on_tick(self.ops);
    }

    fn should_drain_after_input(&self) -> bool {
        self.screen.should_drain_after_input()
    }
}

fn root_loop_drain_helper<T: RootLoopTickTarget>(target: &mut T, reason: DrainReason) -> bool {
    if !matches!(reason, DrainReason::Timeout) && !target.should_drain_after_input() {
        return false;
    }

    target.on_tick();
    true
}

/// Parked counters keep draining so completions land while the import screen is open.
fn root_loop_drain_counter(
    active: &mut ActiveScreen,
    ops: &dyn CounterFlowOps,
    reason: DrainReason,
) -> bool {
    let screen = match active {
        ActiveScreen::Counter(screen) => screen,
        ActiveScreen::Import {
            parked: Some(screen),
            ..
        } => screen,
        _ => return false,
    };

    root_loop_drain_helper(&mut CounterTick { screen, ops }, reason)
}

/// Opens the counter for the configured store, or the import prompt when it is empty.
pub fn run_root(app: &App<'_>, api: Arc<dyn StocklistApi>) -> Result<UiExit> {
    let submitter: Arc<dyn CountSubmitter> = Arc::new(ApiCountSubmitter::new(api));
    let mut global_error: Option<String> = None;
    let initial = match app.load_session() {
        Ok(session) => session,
        Err(error) => {
            global_error = Some(format!("{error:#}"));
            None
        }
    };
    let mut active = ActiveScreen::for_session(app, initial, &submitter);
    let mut session = TerminalSession::enter()?;
    const TICK_RATE: Duration = Duration::from_millis(120);

    loop {
        session.draw(|frame| {
            active.render(frame);

            if let Some(message) = global_error.as_deref() {
                render_global_error(frame, message);
            }
        })?;

        let has_event = event::poll(TICK_RATE).context("failed to poll terminal event")?;
        if !has_event {
            root_loop_drain_counter(&mut active, app, DrainReason::Timeout);
            if let Some(exit) = ready_exit(&active) {
                return Ok(exit);
            }
            continue;
        }

        let event = event::read().context("failed to read terminal event")?;
        let key = match event {
            Event::Resize(_, _) => {
                session.autoresize()?;
                continue;
            }
            Event::Key(key) if matches!(key.kind, KeyEventKind::Press) => key,
            _ => continue,
        };

        if is_ctrl_c(key) {
            match request_root_exit(&mut active, UiExit::Canceled) {
                Some(exit) => return Ok(exit),
                None => continue,
            }
        }

        if global_error.is_some() {
            if keymap::is_confirm(key) || keymap::is_back(key) {
                global_error = None;
            }
            continue;
        }

        let next = match on_root_key(&mut active, key, app, &submitter) {
            Ok(RootStep::Stay) => None,
            Ok(RootStep::Switch(screen)) => Some(screen),
            Ok(RootStep::Exit(exit)) => return Ok(exit),
            Err(error) => {
                global_error = Some(format!("{error:#}"));
                None
            }
        };
        if let Some(screen) = next {
            active = screen;
        }

        root_loop_drain_counter(&mut active, app, DrainReason::AfterInput);
        if let Some(exit) = ready_exit(&active) {
            return Ok(exit);
        }
    }
}

/// Brings a parked counter back so its pending saves stay visible while the
/// exit waits for them.
fn request_root_exit(active: &mut ActiveScreen, exit: UiExit) -> Option<UiExit> {
    let parked = match active {
        ActiveScreen::Import { parked, .. } => parked.take(),
        _ => None,
    };
    if let Some(counter) = parked {
        *active = ActiveScreen::Counter(counter);
    }

    match active {
        ActiveScreen::Counter(screen) => match screen.request_exit(exit, Instant::now()) {
            counter_flow::FlowSignal::Exit(exit) => Some(exit),
            _ => None,
        },
        _ => Some(exit),
    }
}

fn ready_exit(active: &ActiveScreen) -> Option<UiExit> {
    match active {
        ActiveScreen::Counter(screen) => screen.ready_exit(),
        _ => None,
    }
}

enum RootStep {
    Stay,
    Switch(ActiveScreen),
    Exit(UiExit),
}

fn on_root_key(
    active: &mut ActiveScreen,
    key: KeyEvent,
    app: &App<'_>,
    submitter: &Arc<dyn CountSubmitter>,
) -> Result<RootStep> {
    match active {
        ActiveScreen::Counter(screen) => {
            let signal = screen.on_key(key, app)?;
            match signal {
                counter_flow::FlowSignal::Continue => Ok(RootStep::Stay),
                counter_flow::FlowSignal::Exit(exit) => Ok(RootStep::Exit(exit)),
                counter_flow::FlowSignal::StoreEmpty => Ok(RootStep::Switch(
                    ActiveScreen::Empty(EmptyScreen::new(app.title())),
                )),
                counter_flow::FlowSignal::OpenImport => {
                    let parked = std::mem::replace(
                        active,
                        ActiveScreen::Empty(EmptyScreen::new(app.title())),
                    );
                    let ActiveScreen::Counter(parked) = parked else {
                        return Ok(RootStep::Stay);
                    };
                    Ok(RootStep::Switch(ActiveScreen::Import {
                        screen: Box::new(ImportScreen::new()),
                        parked: Some(parked),
                    }))
                }
            }
        }
        ActiveScreen::Import { screen, parked } => match screen.on_key(key, app)? {
            import_flow::FlowSignal::Continue => Ok(RootStep::Stay),
            import_flow::FlowSignal::Back => Ok(RootStep::Switch(match parked.take() {
                Some(counter) => ActiveScreen::Counter(counter),
                None => ActiveScreen::Empty(EmptyScreen::new(app.title())),
            })),
            import_flow::FlowSignal::Imported(summary) => {
                tracing::info!(
                    store_id = app.store_id(),
                    imported = summary.imported,
                    "csv import finished"
                );
                let summary = *summary;
                match (summary.session, parked.take()) {
                    (Some(session), Some(mut counter)) => {
                        counter.adopt_session(session);
                        Ok(RootStep::Switch(ActiveScreen::Counter(counter)))
                    }
                    (session, _) => Ok(RootStep::Switch(ActiveScreen::for_session(
                        app, session, submitter,
                    ))),
                }
            }
        },
        ActiveScreen::Empty(screen) => match screen.on_key(key) {
            Some(EmptyAction::Import) => Ok(RootStep::Switch(ActiveScreen::Import {
                screen: Box::new(ImportScreen::new()),
                parked: None,
            })),
            Some(EmptyAction::Reload) => Ok(RootStep::Switch(ActiveScreen::for_session(
                app,
                app.load_session()?,
                submitter,
            ))),
            Some(EmptyAction::Exit) => Ok(RootStep::Exit(UiExit::Completed)),
            None => Ok(RootStep::Stay),
        },
    }
}

fn render_global_error(frame: &mut ratatui::Frame<'_>, message: &str) {
    let text = format!("Operation failed.\n\n{message}");
    render_error_modal(frame, &text, "Enter/Esc: continue");
}

pub(crate) fn centered_rect(
    percent_x: u16,
    percent_y: u16,
    area: ratatui::layout::Rect,
) -> ratatui::layout::Rect {
    let pct_x = percent_x.min(100);
    let pct_y = percent_y.min(100);

    let [_, vertical, _] = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - pct_y) / 2),
            Constraint::Percentage(pct_y),
            Constraint::Percentage((100 - pct_y) / 2),
        ])
        .areas(area);
    let [_, horizontal, _] = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - pct_x) / 2),
            Constraint::Percentage(pct_x),
            Constraint::Percentage((100 - pct_x) / 2),
        ])
        .areas(vertical);
    horizontal
}
