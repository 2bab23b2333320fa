use ratatui::layout::Alignment;
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Paragraph, Wrap};

use crate::theme;

pub(crate) fn wrapped_paragraph<'a, T>(text: T) -> Paragraph<'a>
where
    T: Into<Text<'a>>,
{
    Paragraph::new(text).wrap(Wrap { trim: false })
}

pub(crate) fn key_hint_paragraph<'a, T>(text: T) -> Paragraph<'a>
where
    T: Into<Text<'a>>,
{
    wrapped_paragraph(text).alignment(Alignment::Center)
}

/// Footer height for a bordered hint block holding `text`.
pub(crate) fn key_hint_height(total_width: u16, text: &str) -> u16 {
    let content_width = total_width.saturating_sub(2).max(1) as usize;
    let lines: u16 = text
        .split('\n')
        .map(|line| wrapped_rows(line, content_width))
        .fold(0u16, u16::saturating_add)
        .max(1);
    lines.saturating_add(2).max(3)
}

pub(crate) fn compact_hint<'a>(
    width: u16,
    full: &'a str,
    medium: &'a str,
    compact: &'a str,
) -> &'a str {
    if width >= 110 {
        full
    } else if width >= 78 {
        medium
    } else {
        compact
    }
}

pub(crate) fn focus_line(message: impl Into<String>) -> Line<'static> {
    Line::from(Span::styled(message.into(), theme::focus()))
}

pub(crate) fn error_line(message: impl Into<String>) -> Line<'static> {
    Line::from(Span::styled(message.into(), theme::error()))
}

pub(crate) fn success_line(message: impl Into<String>) -> Line<'static> {
    Line::from(Span::styled(message.into(), theme::success()))
}

pub(crate) fn label_value_line(
    label: impl Into<String>,
    value: impl Into<String>,
) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!("{}: ", label.into()), theme::muted()),
        Span::raw(value.into()),
    ])
}

fn wrapped_rows(line: &str, width: usize) -> u16 {
    let chars = line
        .chars()
        .map(|ch| if ch == '\t' { 4 } else { 1 })
        .sum::<usize>();
    if chars == 0 {
        return 1;
    }
    u16::try_from(chars.div_ceil(width.max(1))).unwrap_or(u16::MAX)
}
