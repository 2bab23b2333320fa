use std::path::Path;

use anyhow::Result;
use crossterm::event::KeyEvent;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Cell, Paragraph, Row, Table};
use stocktake_app::{App, ImportSummary};
use stocktake_core::csv_import::{ColumnRoles, CsvPreview, ImportError, ImportPlan, StagedCsv};

use crate::keymap;
use crate::theme;
use crate::ui::input_field::InputField;
use crate::ui::text::{
    compact_hint, error_line, focus_line, key_hint_height, key_hint_paragraph, wrapped_paragraph,
};

pub(crate) trait ImportFlowOps {
    fn stage_csv(&self, path: &Path) -> Result<StagedCsv>;
    fn import(&self, staged: &StagedCsv, plan: &ImportPlan) -> Result<ImportSummary>;
}

impl<'a> ImportFlowOps for App<'a> {
    fn stage_csv(&self, path: &Path) -> Result<StagedCsv> {
        Ok(StagedCsv::from_path(path, None)?)
    }

    fn import(&self, staged: &StagedCsv, plan: &ImportPlan) -> Result<ImportSummary> {
        self.import_plan(staged, plan)
    }
}

#[derive(Debug)]
pub(crate) enum FlowSignal {
    Continue,
    Back,
    Imported(Box<ImportSummary>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Focus {
    Path,
    Columns,
}

struct Staged {
    csv: StagedCsv,
    preview: CsvPreview,
    roles: ColumnRoles,
    column: usize,
}

pub(crate) struct ImportScreen {
    path: InputField,
    focus: Focus,
    staged: Option<Staged>,
    inline_error: Option<String>,
}

impl ImportScreen {
    pub(crate) fn new() -> Self {
        Self {
            path: InputField::default(),
            focus: Focus::Path,
            staged: None,
            inline_error: None,
        }
    }

    pub(crate) fn on_key(&mut self, key: KeyEvent, ops: &dyn ImportFlowOps) -> Result<FlowSignal> {
        if keymap::is_back(key) {
            return Ok(FlowSignal::Back);
        }

        if keymap::is_tab(key) && self.staged.is_some() {
            self.focus = match self.focus {
                Focus::Path => Focus::Columns,
                Focus::Columns => Focus::Path,
            };
            return Ok(FlowSignal::Continue);
        }

        match self.focus {
            Focus::Path => {
                if keymap::is_confirm(key) {
                    self.stage(ops)?;
                } else {
                    self.path.on_key(key);
                }
                Ok(FlowSignal::Continue)
            }
            Focus::Columns => self.on_column_key(key, ops),
        }
    }

    fn stage(&mut self, ops: &dyn ImportFlowOps) -> Result<()> {
        let raw = self.path.value().trim();
        if raw.is_empty() {
            self.inline_error = Some("Enter the path of a CSV file.".to_string());
            return Ok(());
        }

        let csv = ops.stage_csv(Path::new(raw))?;
        let preview = csv.preview();
        let roles = csv.column_roles();
        self.staged = Some(Staged {
            csv,
            preview,
            roles,
            column: 0,
        });
        self.focus = Focus::Columns;
        self.inline_error = None;
        Ok(())
    }

    fn on_column_key(&mut self, key: KeyEvent, ops: &dyn ImportFlowOps) -> Result<FlowSignal> {
        let Some(staged) = self.staged.as_mut() else {
            return Ok(FlowSignal::Continue);
        };

        if keymap::is_left(key) {
            staged.column = staged.column.saturating_sub(1);
        } else if keymap::is_right(key) {
            if staged.column + 1 < staged.roles.len() {
                staged.column += 1;
            }
        } else if keymap::is_toggle(key) {
            staged.roles.cycle(staged.column);
            self.inline_error = None;
        } else if keymap::is_confirm(key) {
            let plan = match staged.roles.plan() {
                Ok(plan) => plan,
                Err(ImportError::Validation { message }) => {
                    self.inline_error = Some(message);
                    return Ok(FlowSignal::Continue);
                }
                Err(error) => return Err(error.into()),
            };
            let summary = ops.import(&staged.csv, &plan)?;
            return Ok(FlowSignal::Imported(Box::new(summary)));
        }

        Ok(FlowSignal::Continue)
    }

    pub(crate) fn render(&self, frame: &mut ratatui::Frame<'_>) {
        let area = frame.area();
        let key_text = match self.focus {
            Focus::Path => compact_hint(
                area.width,
                "Type: file path    Enter: preview    Tab: columns    Esc: back",
                "Type path    Enter: preview    Tab: columns    Esc: back",
                "Type path | Enter preview | Esc back",
            ),
            Focus::Columns => compact_hint(
                area.width,
                "Left/Right: column    Space: role    Enter: import    Tab: file path    Esc: back",
                "Left/Right: column    Space: role    Enter: import    Esc: back",
                "Left/Right | Space role | Enter import | Esc",
            ),
        };
        let footer_height = key_hint_height(area.width, key_text);
        let [path_area, body, options, status, footer] = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Min(8),
                Constraint::Length(3),
                Constraint::Length(1),
                Constraint::Length(footer_height),
            ])
            .areas(area);

        let path_title = if self.focus == Focus::Path {
            focus_line("CSV file")
        } else {
            Line::from("CSV file (Tab to edit)")
        };
        self.path
            .render(frame, path_area, path_title, self.focus == Focus::Path);

        match &self.staged {
            Some(staged) => {
                render_preview(frame, body, staged, self.focus == Focus::Columns);
                render_options(frame, options, staged);
            }
            None => {
                let empty = Paragraph::new("Enter a CSV file path and press Enter to preview it.")
                    .block(theme::chrome("Preview"));
                frame.render_widget(empty, body);
            }
        }

        let status_line = self
            .inline_error
            .as_ref()
            .map(|message| error_line(message.clone()))
            .unwrap_or_default();
        frame.render_widget(wrapped_paragraph(status_line), status);

        let keys = key_hint_paragraph(key_text).block(theme::key_block());
        frame.render_widget(keys, footer);
    }
}

fn render_preview(frame: &mut ratatui::Frame<'_>, area: Rect, staged: &Staged, focused: bool) {
    let header_style = theme::column_header();
    let column_style = |index: usize| {
        if focused && index == staged.column {
            theme::selected_column()
        } else {
            header_style
        }
    };

    let header = Row::new(
        staged
            .preview
            .fields
            .iter()
            .enumerate()
            .map(|(index, field)| Cell::from(Span::styled(field.clone(), column_style(index)))),
    );
    let roles = Row::new((0..staged.roles.len()).map(|index| {
        let label = staged
            .roles
            .role(index)
            .map(|role| format!("[{role}]"))
            .unwrap_or_default();
        Cell::from(Span::styled(label, column_style(index)))
    }));
    let mut rows = vec![roles];
    rows.extend(
        staged
            .preview
            .rows
            .iter()
            .map(|row| Row::new(row.iter().cloned())),
    );

    let columns = staged.preview.fields.len().max(1);
    let widths = vec![Constraint::Ratio(1, columns as u32); columns];
    let title = if focused {
        focus_line(format!("Preview - {}", staged.preview.caption))
    } else {
        Line::from(format!("Preview - {}", staged.preview.caption))
    };
    let table = Table::new(rows, widths)
        .header(header)
        .block(theme::chrome(title));
    frame.render_widget(table, area);
}

fn render_options(frame: &mut ratatui::Frame<'_>, area: Rect, staged: &Staged) {
    let field = staged
        .preview
        .fields
        .get(staged.column)
        .cloned()
        .unwrap_or_default();
    let current = staged.roles.role(staged.column);

    let mut spans = Vec::new();
    for option in staged.roles.options(staged.column) {
        let style = if !option.enabled {
            theme::muted()
        } else if Some(option.role) == current {
            theme::success()
        } else {
            Default::default()
        };
        spans.push(Span::styled(format!(" {} ", option.role), style));
    }

    let paragraph =
        Paragraph::new(Line::from(spans)).block(theme::chrome(format!("Role for {field}")));
    frame.render_widget(paragraph, area);
}
