use ratatui::Frame;
use ratatui::layout::{Constraint, Margin, Rect};
use ratatui::text::{Line, Span};
use ratatui::widgets::{
    Cell, Paragraph, Row, Scrollbar, ScrollbarOrientation, ScrollbarState, Table, TableState,
};
use stocktake_core::items_table::{ColumnHeader, ItemsTable};

use crate::theme;

const MIN_AMOUNT_WIDTH: u16 = 8;

fn header_cell(header: &ColumnHeader) -> Cell<'static> {
    let style = if header.selected {
        theme::selected_column()
    } else if header.selectable {
        theme::column_header()
    } else {
        theme::muted()
    };
    let marker = if header.selected { "> " } else { "" };
    Cell::from(Span::styled(format!("{marker}{}", header.name), style))
}

fn column_widths(table: &ItemsTable) -> Vec<Constraint> {
    let mut widths = vec![Constraint::Min(20)];
    widths.extend(table.headers.iter().map(|header| {
        let name_width = u16::try_from(header.name.chars().count()).unwrap_or(u16::MAX);
        Constraint::Length(name_width.saturating_add(3).max(MIN_AMOUNT_WIDTH))
    }));
    widths
}

/// Items by lists, with `current_row` highlighted and kept in view.
pub(crate) fn render_items_table(
    frame: &mut Frame<'_>,
    area: Rect,
    table: &ItemsTable,
    current_row: Option<usize>,
    title: Line<'_>,
) {
    if table.rows.is_empty() {
        let empty = Paragraph::new("This store has no items yet.").block(theme::chrome(title));
        frame.render_widget(empty, area);
        return;
    }

    let mut header_cells = vec![Cell::from(Span::styled(
        "Item",
        theme::column_header(),
    ))];
    header_cells.extend(table.headers.iter().map(header_cell));
    let header = Row::new(header_cells);

    let rows = table.rows.iter().map(|row| {
        let mut cells = vec![Cell::from(row.name.trim().to_string())];
        cells.extend(row.cells.iter().map(|cell| Cell::from(cell.text.clone())));
        Row::new(cells)
    });

    let widget = Table::new(rows, column_widths(table))
        .header(header)
        .block(theme::chrome(title))
        .row_highlight_style(theme::current_row())
        .highlight_symbol(">> ");

    let mut state = TableState::new();
    state.select(current_row);
    frame.render_stateful_widget(widget, area, &mut state);

    let viewport = area.height.saturating_sub(3) as usize;
    let mut scrollbar_state = ScrollbarState::new(table.rows.len())
        .position(current_row.unwrap_or(0))
        .viewport_content_length(viewport);
    frame.render_stateful_widget(
        Scrollbar::new(ScrollbarOrientation::VerticalRight)
            .begin_symbol(None)
            .end_symbol(None),
        area.inner(Margin {
            vertical: 1,
            horizontal: 0,
        }),
        &mut scrollbar_state,
    );
}
