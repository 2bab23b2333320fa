use crossterm::event::{Event, KeyEvent};
use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::text::Line;
use ratatui::widgets::Paragraph;
use tui_input::Input;
use tui_input::backend::crossterm::EventHandler;

/// Single-line text field with a scrolling cursor.
#[derive(Debug, Default)]
pub(crate) struct InputField {
    input: Input,
}

impl InputField {
    pub(crate) fn with_value(value: impl Into<String>) -> Self {
        Self {
            input: Input::new(value.into()),
        }
    }

    pub(crate) fn value(&self) -> &str {
        self.input.value()
    }

    pub(crate) fn set_value(&mut self, value: impl Into<String>) {
        self.input = Input::new(value.into());
    }

    /// Returns `true` when the key changed the value or the cursor.
    pub(crate) fn on_key(&mut self, key: KeyEvent) -> bool {
        self.input.handle_event(&Event::Key(key)).is_some()
    }

    pub(crate) fn render(
        &self,
        frame: &mut Frame<'_>,
        area: Rect,
        title: Line<'_>,
        show_cursor: bool,
    ) {
        let width = area.width.saturating_sub(2) as usize;
        let scroll = self.input.visual_scroll(width);
        let paragraph = Paragraph::new(self.input.value())
            .scroll((0, scroll as u16))
            .block(crate::theme::chrome(title));
        frame.render_widget(paragraph, area);

        if !show_cursor || width == 0 {
            return;
        }

        let visual = self.input.visual_cursor();
        let relative = visual.saturating_sub(scroll).min(width.saturating_sub(1));
        frame.set_cursor_position((area.x + 1 + relative as u16, area.y + 1));
    }
}
