use ratatui::style::{Color, Modifier, Style};
use ratatui::text::Line;
use ratatui::widgets::{Block, Borders};

const ACCENT: Color = Color::Cyan;

pub(crate) fn chrome<'a>(title: impl Into<Line<'a>>) -> Block<'a> {
    Block::default().borders(Borders::ALL).title(title)
}

pub(crate) fn key_block() -> Block<'static> {
    chrome("Keys")
}

/// Header of a column that can be picked: Count lists and CSV fields.
pub(crate) fn column_header() -> Style {
    Style::default().fg(ACCENT).add_modifier(Modifier::BOLD)
}

/// The Count list or CSV field currently receiving input.
pub(crate) fn selected_column() -> Style {
    Style::default()
        .fg(Color::Yellow)
        .add_modifier(Modifier::BOLD | Modifier::UNDERLINED)
}

/// Row of the item being counted.
pub(crate) fn current_row() -> Style {
    Style::default()
        .fg(Color::Black)
        .bg(ACCENT)
        .add_modifier(Modifier::BOLD)
}

pub(crate) fn focus() -> Style {
    Style::default()
        .fg(Color::Blue)
        .add_modifier(Modifier::BOLD)
}

pub(crate) fn success() -> Style {
    Style::default()
        .fg(Color::Green)
        .add_modifier(Modifier::BOLD)
}

pub(crate) fn error() -> Style {
    Style::default().fg(Color::Red).add_modifier(Modifier::BOLD)
}

/// Labels, non-Count list headers and roles that cannot be chosen.
pub(crate) fn muted() -> Style {
    Style::default().fg(Color::Gray).add_modifier(Modifier::DIM)
}
