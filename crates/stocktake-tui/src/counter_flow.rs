use std::path::PathBuf;
use std::sync::Arc;
use std::sync::mpsc::{Receiver, TryRecvError};
use std::time::{Duration, Instant};

use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::layout::{Constraint, Direction as LayoutDirection, Layout};
use ratatui::text::{Line, Text};
use stocktake_app::{App, write_export};
use stocktake_core::counting::{CountingSession, Direction};
use stocktake_core::csv_export::{CooldownPoll, DownloadCooldown};
use stocktake_core::items_table::ItemsTable;
use stocktake_core::model::ItemsSnapshot;

use crate::theme;
use crate::ui::count_worker::{CountOutcome, CountSubmitter, Spinner};
use crate::ui::input_field::InputField;
use crate::ui::items_table::render_items_table;
use crate::ui::text::{
    compact_hint, error_line, focus_line, key_hint_height, key_hint_paragraph, label_value_line,
    success_line, wrapped_paragraph,
};
use crate::{UiExit, keymap};

pub(crate) trait CounterFlowOps {
    fn store_title(&self) -> &str;
    fn reload_session(&self) -> Result<Option<CountingSession>>;
    fn mirror_session(&self, session: &CountingSession);
    fn export_snapshot(&self, snapshot: &ItemsSnapshot) -> Result<PathBuf>;
}

impl<'a> CounterFlowOps for App<'a> {
    fn store_title(&self) -> &str {
        self.title()
    }

    fn reload_session(&self) -> Result<Option<CountingSession>> {
        self.load_session()
    }

    fn mirror_session(&self, session: &CountingSession) {
        self.mirror(session);
    }

    fn export_snapshot(&self, snapshot: &ItemsSnapshot) -> Result<PathBuf> {
        let path = self.default_export_path();
        write_export(snapshot, &path)?;
        Ok(path)
    }
}

const EXIT_GRACE: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FlowSignal {
    Continue,
    OpenImport,
    StoreEmpty,
    Exit(UiExit),
}

#[derive(Debug, Clone, Copy)]
struct Closing {
    exit: UiExit,
    deadline: Instant,
}

pub(crate) struct CounterScreen {
    session: CountingSession,
    table: ItemsTable,
    amount: InputField,
    title: String,
    inline_error: Option<String>,
    export_notice: Option<String>,
    cooldown: DownloadCooldown,
    submitter: Arc<dyn CountSubmitter>,
    in_flight: Vec<Receiver<CountOutcome>>,
    spinner: Spinner,
    closing: Option<Closing>,
}

impl CounterScreen {
    pub(crate) fn new(
        ops: &dyn CounterFlowOps,
        session: CountingSession,
        submitter: Arc<dyn CountSubmitter>,
    ) -> Self {
        let table = session.table();
        let amount = InputField::with_value(session.current_form().amount.unwrap_or_default());
        Self {
            session,
            table,
            amount,
            title: ops.store_title().to_string(),
            inline_error: None,
            export_notice: None,
            cooldown: DownloadCooldown::default(),
            submitter,
            in_flight: Vec::new(),
            spinner: Spinner::default(),
            closing: None,
        }
    }

    pub(crate) fn should_drain_after_input(&self) -> bool {
        !self.in_flight.is_empty() || self.cooldown.is_active()
    }

    pub(crate) fn on_key(&mut self, key: KeyEvent, ops: &dyn CounterFlowOps) -> Result<FlowSignal> {
        if keymap::is_back(key) || keymap::is_quit(key) {
            return Ok(self.request_exit(UiExit::Completed, Instant::now()));
        }
        if self.closing.is_some() {
            return Ok(FlowSignal::Continue);
        }

        if keymap::is_confirm(key) || keymap::is_down(key) {
            self.record(Direction::Next);
            return Ok(FlowSignal::Continue);
        }

        if keymap::is_up(key) {
            self.record(Direction::Previous);
            return Ok(FlowSignal::Continue);
        }

        if keymap::is_left(key) || keymap::is_right(key) {
            let direction = if keymap::is_left(key) {
                Direction::Previous
            } else {
                Direction::Next
            };
            self.switch_list(direction);
            return Ok(FlowSignal::Continue);
        }

        if keymap::amount_char(key).is_some() || key.code == KeyCode::Backspace {
            self.amount.on_key(key);
            return Ok(FlowSignal::Continue);
        }

        match key.code {
            KeyCode::Char('e') => self.export(ops, Instant::now())?,
            KeyCode::Char('i') => return Ok(FlowSignal::OpenImport),
            KeyCode::Char('r') => return self.reload(ops),
            _ => {}
        }

        Ok(FlowSignal::Continue)
    }

    fn record(&mut self, direction: Direction) {
        match self.session.record(direction, self.amount.value()) {
            Ok(outcome) => {
                if let Some(submission) = outcome.submission {
                    tracing::debug!(
                        item_id = submission.item_id,
                        list_id = submission.list_id,
                        sequence = submission.sequence,
                        "submitting count"
                    );
                    self.in_flight.push(self.submitter.spawn_submit(submission));
                }
                self.amount
                    .set_value(outcome.form.amount.unwrap_or_default());
                self.inline_error = None;
            }
            Err(error) => self.inline_error = Some(error.to_string()),
        }
    }

    fn switch_list(&mut self, direction: Direction) {
        match self.session.select_adjacent_list(direction) {
            Ok(Some(form)) => {
                self.table.select_header(self.session.current_list_index());
                self.amount.set_value(form.amount.unwrap_or_default());
                self.inline_error = None;
            }
            Ok(None) => {}
            Err(error) => self.inline_error = Some(error.to_string()),
        }
    }

    fn export(&mut self, ops: &dyn CounterFlowOps, now: Instant) -> Result<()> {
        if self.cooldown.is_active() {
            return Ok(());
        }

        let path = ops.export_snapshot(&self.session.snapshot())?;
        self.cooldown.start(now);
        self.export_notice = Some(format!("Saved {}", path.display()));
        Ok(())
    }

    fn reload(&mut self, ops: &dyn CounterFlowOps) -> Result<FlowSignal> {
        let Some(session) = ops.reload_session()? else {
            return Ok(FlowSignal::StoreEmpty);
        };

        self.adopt_session(session);
        Ok(FlowSignal::Continue)
    }

    /// Swaps in a freshly loaded session. Submissions still in flight stay
    /// attached and complete against the new session.
    pub(crate) fn adopt_session(&mut self, mut session: CountingSession) {
        session.carry_submissions(&self.session);
        self.table = session.table();
        self.amount
            .set_value(session.current_form().amount.unwrap_or_default());
        self.session = session;
        self.inline_error = None;
    }

    /// Exits right away unless counts are still being saved, in which case
    /// the exit waits for them up to `EXIT_GRACE`. A second request exits
    /// without waiting.
    pub(crate) fn request_exit(&mut self, exit: UiExit, now: Instant) -> FlowSignal {
        if self.in_flight.is_empty() || self.closing.is_some() {
            return FlowSignal::Exit(exit);
        }

        tracing::info!(
            pending = self.in_flight.len(),
            "waiting for count submissions before exit"
        );
        self.closing = Some(Closing {
            exit,
            deadline: now + EXIT_GRACE,
        });
        FlowSignal::Continue
    }

    pub(crate) fn ready_exit(&self) -> Option<UiExit> {
        self.ready_exit_at(Instant::now())
    }

    fn ready_exit_at(&self, now: Instant) -> Option<UiExit> {
        let closing = self.closing?;
        if self.in_flight.is_empty() {
            return Some(closing.exit);
        }
        if now >= closing.deadline {
            tracing::warn!(
                pending = self.in_flight.len(),
                "exiting with count submissions still in flight"
            );
            return Some(closing.exit);
        }
        None
    }

    pub(crate) fn on_tick(&mut self, ops: &dyn CounterFlowOps) {
        self.on_tick_at(ops, Instant::now());
    }

    fn on_tick_at(&mut self, ops: &dyn CounterFlowOps, now: Instant) {
        if self.cooldown.poll(now) == CooldownPoll::Expired {
            self.export_notice = None;
        }

        if self.in_flight.is_empty() {
            return;
        }
        self.spinner.next_frame();

        let mut outcomes = Vec::new();
        self.in_flight.retain(|receiver| match receiver.try_recv() {
            Ok(outcome) => {
                outcomes.push(outcome);
                false
            }
            Err(TryRecvError::Empty) => true,
            Err(TryRecvError::Disconnected) => false,
        });

        if outcomes.is_empty() {
            return;
        }
        for outcome in outcomes {
            self.apply_outcome(outcome);
        }
        ops.mirror_session(&self.session);
    }

    fn apply_outcome(&mut self, outcome: CountOutcome) {
        let submission = outcome.submission;
        match outcome.result {
            Ok(created) => {
                let applied = self.session.apply_response(&submission, created);
                if let Some(patch) = applied.patch {
                    self.table
                        .patch_cell(patch.item_id, &patch.list_name, patch.amount);
                }
            }
            Err(error) => {
                tracing::warn!(
                    item_id = submission.item_id,
                    list_id = submission.list_id,
                    sequence = submission.sequence,
                    error = %error,
                    "count submission failed"
                );
                if let Some(patch) = self.session.apply_failure(&submission) {
                    self.table
                        .patch_cell(patch.item_id, &patch.list_name, patch.amount);
                }
            }
        }
    }

    pub(crate) fn render(&self, frame: &mut ratatui::Frame<'_>) {
        let area = frame.area();
        let key_text = compact_hint(
            area.width,
            "0-9/.: amount    Enter/Down: next    Up: previous    Left/Right: list    e: export    i: import    r: reload    Esc/q: quit",
            "Enter/Down: next    Up: previous    Left/Right: list    e: export    i: import    q: quit",
            "Enter next | Up prev | Left/Right list | e export | i import | q quit",
        );
        let footer_height = key_hint_height(area.width, key_text);
        let [header, body, form, status, footer] = Layout::default()
            .direction(LayoutDirection::Vertical)
            .constraints([
                Constraint::Length(4),
                Constraint::Min(6),
                Constraint::Length(3),
                Constraint::Length(1),
                Constraint::Length(footer_height),
            ])
            .areas(area);

        let pending = self.session.pending_count();
        let saving = if pending == 0 {
            Line::from("")
        } else {
            Line::from(format!("{} saving {pending}", self.spinner.current_frame()))
        };
        let header_text = Text::from(vec![focus_line(self.session.count_badge()), saving]);
        frame.render_widget(
            wrapped_paragraph(header_text).block(theme::chrome(self.title.as_str())),
            header,
        );

        render_items_table(
            frame,
            body,
            &self.table,
            Some(self.session.current_item_index()),
            Line::from("Items"),
        );

        let [item_area, amount_area] = Layout::default()
            .direction(LayoutDirection::Horizontal)
            .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
            .areas(form);
        let item_name = self.session.current_item().name.trim().to_string();
        frame.render_widget(
            wrapped_paragraph(label_value_line("Item", item_name))
                .block(theme::chrome(self.session.current_list().name.as_str())),
            item_area,
        );
        self.amount
            .render(frame, amount_area, focus_line("Amount"), true);

        let status_line = match (&self.inline_error, &self.export_notice) {
            _ if self.closing.is_some() => focus_line(format!(
                "Saving {} counts before exit. Press q again to quit now.",
                self.in_flight.len()
            )),
            (Some(error), _) => error_line(error.clone()),
            (None, Some(notice)) => success_line(notice.clone()),
            (None, None) => Line::from(""),
        };
        frame.render_widget(wrapped_paragraph(status_line), status);

        let keys = key_hint_paragraph(key_text).block(theme::key_block());
        frame.render_widget(keys, footer);
    }
}

#[cfg(test)]
mod tests {
    use std::cell::{Cell, RefCell};
    use std::path::PathBuf;
    use std::sync::mpsc::{self, Receiver, Sender};
    use std::sync::{Arc, Mutex};
    use std::time::{Duration, Instant};

    use anyhow::{Result, anyhow};
    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;
    use stocktake_core::api::ApiError;
    use stocktake_core::counting::{CountSubmission, CountingSession};
    use stocktake_core::model::{Amount, Item, ItemsSnapshot, List, ListItemRef, ListKind};

    use super::{CounterFlowOps, CounterScreen, EXIT_GRACE, FlowSignal};
    use crate::UiExit;
    use crate::ui::count_worker::{CountOutcome, CountSubmitter};

    #[derive(Default)]
    struct FakeOps {
        reloads: RefCell<Vec<Result<Option<CountingSession>>>>,
        mirrors: Cell<usize>,
        exports: RefCell<Vec<ItemsSnapshot>>,
    }

    impl CounterFlowOps for FakeOps {
        fn store_title(&self) -> &str {
            "Main Store"
        }

        fn reload_session(&self) -> Result<Option<CountingSession>> {
            self.reloads
                .borrow_mut()
                .pop()
                .unwrap_or_else(|| Err(anyhow!("no scripted reload")))
        }

        fn mirror_session(&self, _session: &CountingSession) {
            self.mirrors.set(self.mirrors.get() + 1);
        }

        fn export_snapshot(&self, snapshot: &ItemsSnapshot) -> Result<PathBuf> {
            self.exports.borrow_mut().push(snapshot.clone());
            Ok(PathBuf::from("Main Store.csv"))
        }
    }

    #[derive(Default)]
    struct ScriptedSubmitter {
        senders: Mutex<Vec<(CountSubmission, Sender<CountOutcome>)>>,
    }

    impl ScriptedSubmitter {
        fn submitted(&self) -> Vec<CountSubmission> {
            self.senders
                .lock()
                .expect("senders lock")
                .iter()
                .map(|(submission, _)| submission.clone())
                .collect()
        }

        fn complete(&self, index: usize, result: Result<bool, ApiError>) {
            let senders = self.senders.lock().expect("senders lock");
            let (submission, sender) = &senders[index];
            sender
                .send(CountOutcome {
                    submission: submission.clone(),
                    result,
                })
                .expect("send outcome");
        }
    }

    impl CountSubmitter for ScriptedSubmitter {
        fn spawn_submit(&self, submission: CountSubmission) -> Receiver<CountOutcome> {
            let (sender, receiver) = mpsc::channel();
            self.senders
                .lock()
                .expect("senders lock")
                .push((submission, sender));
            receiver
        }
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn snapshot() -> ItemsSnapshot {
        ItemsSnapshot {
            items: vec![
                Item {
                    id: 1,
                    name: "Milk ".to_string(),
                    list_items: vec![ListItemRef {
                        list_id: 10,
                        amount: Amount::new(4.0),
                    }],
                },
                Item {
                    id: 2,
                    name: "Bread ".to_string(),
                    list_items: Vec::new(),
                },
                Item {
                    id: 3,
                    name: "Eggs ".to_string(),
                    list_items: Vec::new(),
                },
            ],
            lists: vec![
                List {
                    id: 10,
                    name: "Import".to_string(),
                    kind: ListKind::Addition,
                    count: 3,
                },
                List {
                    id: 20,
                    name: "Start".to_string(),
                    kind: ListKind::Count,
                    count: 0,
                },
                List {
                    id: 30,
                    name: "End".to_string(),
                    kind: ListKind::Count,
                    count: 0,
                },
            ],
        }
    }

    fn screen(ops: &FakeOps, submitter: Arc<ScriptedSubmitter>) -> CounterScreen {
        let session = CountingSession::new(snapshot()).expect("session");
        CounterScreen::new(ops, session, submitter)
    }

    fn type_amount(screen: &mut CounterScreen, ops: &FakeOps, text: &str) {
        for ch in text.chars() {
            screen
                .on_key(key(KeyCode::Char(ch)), ops)
                .expect("type amount");
        }
    }

    fn render_output(screen: &CounterScreen) -> String {
        let mut terminal = Terminal::new(TestBackend::new(120, 24)).expect("terminal");
        terminal
            .draw(|frame| screen.render(frame))
            .expect("render counter");
        format!("{}", terminal.backend())
    }

    #[test]
    fn enter_submits_amount_and_advances() {
        let ops = FakeOps::default();
        let submitter = Arc::new(ScriptedSubmitter::default());
        let mut screen = screen(&ops, Arc::clone(&submitter));

        type_amount(&mut screen, &ops, "5");
        let signal = screen.on_key(key(KeyCode::Enter), &ops).expect("enter");

        assert_eq!(signal, FlowSignal::Continue);
        assert_eq!(screen.session.current_item_index(), 1);
        assert_eq!(screen.amount.value(), "");
        let submitted = submitter.submitted();
        assert_eq!(submitted.len(), 1);
        assert_eq!(submitted[0].item_id, 1);
        assert_eq!(submitted[0].list_id, 20);
        assert!(screen.should_drain_after_input());
    }

    #[test]
    fn completion_patches_cell_and_updates_badge() {
        let ops = FakeOps::default();
        let submitter = Arc::new(ScriptedSubmitter::default());
        let mut screen = screen(&ops, Arc::clone(&submitter));

        type_amount(&mut screen, &ops, "5");
        screen.on_key(key(KeyCode::Enter), &ops).expect("enter");
        submitter.complete(0, Ok(true));
        screen.on_tick(&ops);

        assert_eq!(screen.session.count_badge(), "Start Count 1/3");
        assert_eq!(screen.table.cell("1_Start").expect("cell").text, "5");
        assert_eq!(ops.mirrors.get(), 1);
        assert!(!screen.should_drain_after_input());
    }

    #[test]
    fn failed_submission_is_logged_and_cleared() {
        let ops = FakeOps::default();
        let submitter = Arc::new(ScriptedSubmitter::default());
        let mut screen = screen(&ops, Arc::clone(&submitter));

        type_amount(&mut screen, &ops, "5");
        screen.on_key(key(KeyCode::Enter), &ops).expect("enter");
        submitter.complete(
            0,
            Err(ApiError::Network {
                url: "http://127.0.0.1:8000".to_string(),
                message: "connection refused".to_string(),
            }),
        );
        screen.on_tick(&ops);

        assert_eq!(screen.session.pending_count(), 0);
        assert_eq!(screen.table.cell("1_Start").expect("cell").text, "");
        assert!(screen.inline_error.is_none());
    }

    #[test]
    fn up_from_first_item_wraps_to_last() {
        let ops = FakeOps::default();
        let mut screen = screen(&ops, Arc::new(ScriptedSubmitter::default()));

        screen.on_key(key(KeyCode::Up), &ops).expect("up");
        assert_eq!(screen.session.current_item_index(), 2);
        screen.on_key(key(KeyCode::Down), &ops).expect("down");
        assert_eq!(screen.session.current_item_index(), 0);
    }

    #[test]
    fn invalid_amount_shows_inline_error_and_stays() {
        let ops = FakeOps::default();
        let submitter = Arc::new(ScriptedSubmitter::default());
        let mut screen = screen(&ops, Arc::clone(&submitter));

        type_amount(&mut screen, &ops, "1.2.3");
        screen.on_key(key(KeyCode::Enter), &ops).expect("enter");

        assert_eq!(screen.session.current_item_index(), 0);
        assert!(screen.inline_error.is_some());
        assert!(submitter.submitted().is_empty());
    }

    #[test]
    fn letters_do_not_reach_amount_field() {
        let ops = FakeOps::default();
        let mut screen = screen(&ops, Arc::new(ScriptedSubmitter::default()));

        screen
            .on_key(key(KeyCode::Char('x')), &ops)
            .expect("ignored");
        type_amount(&mut screen, &ops, "12");
        screen
            .on_key(key(KeyCode::Backspace), &ops)
            .expect("backspace");

        assert_eq!(screen.amount.value(), "1");
    }

    #[test]
    fn right_switches_to_next_count_list() {
        let ops = FakeOps::default();
        let mut screen = screen(&ops, Arc::new(ScriptedSubmitter::default()));

        screen.on_key(key(KeyCode::Right), &ops).expect("right");
        assert_eq!(screen.session.current_list().name, "End");
        assert_eq!(screen.table.selected_header(), Some(2));

        screen.on_key(key(KeyCode::Right), &ops).expect("wrap");
        assert_eq!(screen.session.current_list().name, "Start");
    }

    #[test]
    fn export_is_single_shot_until_cooldown_expires() {
        let ops = FakeOps::default();
        let mut screen = screen(&ops, Arc::new(ScriptedSubmitter::default()));
        let start = Instant::now();

        screen.export(&ops, start).expect("export");
        screen.export(&ops, start).expect("ignored while active");
        assert_eq!(ops.exports.borrow().len(), 1);
        assert_eq!(screen.export_notice.as_deref(), Some("Saved Main Store.csv"));

        screen.on_tick_at(&ops, start + Duration::from_millis(1800));
        assert!(screen.export_notice.is_none());

        screen
            .export(&ops, start + Duration::from_millis(2000))
            .expect("export again");
        assert_eq!(ops.exports.borrow().len(), 2);
    }

    #[test]
    fn reload_to_empty_store_signals_import_prompt() {
        let ops = FakeOps::default();
        ops.reloads.borrow_mut().push(Ok(None));
        let mut screen = screen(&ops, Arc::new(ScriptedSubmitter::default()));

        let signal = screen
            .on_key(key(KeyCode::Char('r')), &ops)
            .expect("reload");
        assert_eq!(signal, FlowSignal::StoreEmpty);
    }

    #[test]
    fn esc_and_q_exit_and_i_opens_import() {
        let ops = FakeOps::default();
        let mut screen = screen(&ops, Arc::new(ScriptedSubmitter::default()));

        assert_eq!(
            screen.on_key(key(KeyCode::Esc), &ops).expect("esc"),
            FlowSignal::Exit(UiExit::Completed)
        );
        assert_eq!(
            screen.on_key(key(KeyCode::Char('q')), &ops).expect("q"),
            FlowSignal::Exit(UiExit::Completed)
        );
        assert_eq!(
            screen.on_key(key(KeyCode::Char('i')), &ops).expect("i"),
            FlowSignal::OpenImport
        );
    }

    #[test]
    fn reload_keeps_in_flight_count_and_applies_it_to_new_session() {
        let ops = FakeOps::default();
        let submitter = Arc::new(ScriptedSubmitter::default());
        let mut screen = screen(&ops, Arc::clone(&submitter));

        type_amount(&mut screen, &ops, "5");
        screen.on_key(key(KeyCode::Enter), &ops).expect("enter");
        ops.reloads
            .borrow_mut()
            .push(Ok(Some(CountingSession::new(snapshot()).expect("reloaded"))));
        let signal = screen
            .on_key(key(KeyCode::Char('r')), &ops)
            .expect("reload");
        assert_eq!(signal, FlowSignal::Continue);
        assert!(screen.should_drain_after_input());

        submitter.complete(0, Ok(true));
        screen.on_tick(&ops);

        assert_eq!(screen.table.cell("1_Start").expect("cell").text, "5");
        assert_eq!(screen.session.count_badge(), "Start Count 1/3");
        assert_eq!(ops.mirrors.get(), 1);
    }

    #[test]
    fn adopted_session_receives_parked_completions() {
        let ops = FakeOps::default();
        let submitter = Arc::new(ScriptedSubmitter::default());
        let mut screen = screen(&ops, Arc::clone(&submitter));

        type_amount(&mut screen, &ops, "3");
        screen.on_key(key(KeyCode::Enter), &ops).expect("enter");
        screen.adopt_session(CountingSession::new(snapshot()).expect("imported"));
        submitter.complete(0, Ok(true));
        screen.on_tick(&ops);

        assert_eq!(screen.table.cell("1_Start").expect("cell").text, "3");
        assert_eq!(screen.session.pending_count(), 0);
    }

    #[test]
    fn quit_waits_until_in_flight_counts_are_saved() {
        let ops = FakeOps::default();
        let submitter = Arc::new(ScriptedSubmitter::default());
        let mut screen = screen(&ops, Arc::clone(&submitter));

        type_amount(&mut screen, &ops, "5");
        screen.on_key(key(KeyCode::Enter), &ops).expect("enter");
        let signal = screen.on_key(key(KeyCode::Char('q')), &ops).expect("q");
        assert_eq!(signal, FlowSignal::Continue);
        assert_eq!(screen.ready_exit(), None);
        assert!(render_output(&screen).contains("Saving 1 counts before exit"));

        screen
            .on_key(key(KeyCode::Char('r')), &ops)
            .expect("ignored while closing");
        screen.on_tick(&ops);
        assert_eq!(screen.ready_exit(), None);

        submitter.complete(0, Ok(true));
        screen.on_tick(&ops);
        assert_eq!(screen.ready_exit(), Some(UiExit::Completed));
        assert_eq!(screen.table.cell("1_Start").expect("cell").text, "5");
        assert_eq!(ops.mirrors.get(), 1);
    }

    #[test]
    fn second_quit_or_grace_timeout_exits_with_counts_in_flight() {
        let ops = FakeOps::default();
        let submitter = Arc::new(ScriptedSubmitter::default());
        let mut screen = screen(&ops, Arc::clone(&submitter));
        let start = Instant::now();

        type_amount(&mut screen, &ops, "5");
        screen.on_key(key(KeyCode::Enter), &ops).expect("enter");
        assert_eq!(
            screen.request_exit(UiExit::Canceled, start),
            FlowSignal::Continue
        );
        assert_eq!(screen.ready_exit_at(start + Duration::from_secs(1)), None);
        assert_eq!(
            screen.ready_exit_at(start + EXIT_GRACE),
            Some(UiExit::Canceled)
        );

        assert_eq!(
            screen.on_key(key(KeyCode::Esc), &ops).expect("esc"),
            FlowSignal::Exit(UiExit::Completed)
        );
    }

    #[test]
    fn render_shows_title_badge_and_form() {
        let ops = FakeOps::default();
        let screen = screen(&ops, Arc::new(ScriptedSubmitter::default()));

        let output = render_output(&screen);
        assert!(output.contains("Main Store"));
        assert!(output.contains("Start Count 0/3"));
        assert!(output.contains("Item: Milk"));
        assert!(output.contains("Amount"));
    }
}
