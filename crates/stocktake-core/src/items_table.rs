use crate::model::{Amount, Item, ItemId, List, ListId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnHeader {
    pub list_id: ListId,
    pub name: String,
    pub kind: String,
    pub selectable: bool,
    pub selected: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableCell {
    pub key: String,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableRow {
    pub item_id: ItemId,
    pub name: String,
    pub cells: Vec<TableCell>,
}

/// Items (rows) by lists (columns). Only Count lists are selectable.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ItemsTable {
    pub headers: Vec<ColumnHeader>,
    pub rows: Vec<TableRow>,
}

pub fn cell_key(item_id: ItemId, list_name: &str) -> String {
    format!("{item_id}_{list_name}")
}

impl ItemsTable {
    pub fn build(items: &[Item], lists: &[List], selected_list: Option<usize>) -> Self {
        let headers = lists
            .iter()
            .enumerate()
            .map(|(index, list)| {
                let selectable = list.kind.is_count();
                ColumnHeader {
                    list_id: list.id,
                    name: list.name.clone(),
                    kind: list.kind.label().to_string(),
                    selectable,
                    selected: selectable && selected_list == Some(index),
                }
            })
            .collect();

        let rows = items
            .iter()
            .map(|item| TableRow {
                item_id: item.id,
                name: item.name.clone(),
                cells: lists
                    .iter()
                    .map(|list| TableCell {
                        key: cell_key(item.id, &list.name),
                        text: item
                            .amount_for(list.id)
                            .map(|amount| amount.to_string())
                            .unwrap_or_default(),
                    })
                    .collect(),
            })
            .collect();

        Self { headers, rows }
    }

    pub fn cell(&self, key: &str) -> Option<&TableCell> {
        self.rows
            .iter()
            .flat_map(|row| row.cells.iter())
            .find(|cell| cell.key == key)
    }

    /// Rewrites one cell's text. Returns `false` when no cell has that key.
    pub fn patch_cell(&mut self, item_id: ItemId, list_name: &str, amount: Amount) -> bool {
        let key = cell_key(item_id, list_name);
        let Some(cell) = self
            .rows
            .iter_mut()
            .filter(|row| row.item_id == item_id)
            .flat_map(|row| row.cells.iter_mut())
            .find(|cell| cell.key == key)
        else {
            return false;
        };

        cell.text = amount.to_string();
        true
    }

    /// Moves the `selected` mark. Non-selectable headers are refused.
    pub fn select_header(&mut self, index: usize) -> bool {
        if !self
            .headers
            .get(index)
            .is_some_and(|header| header.selectable)
        {
            return false;
        }

        for (position, header) in self.headers.iter_mut().enumerate() {
            header.selected = position == index;
        }
        true
    }

    pub fn selected_header(&self) -> Option<usize> {
        self.headers.iter().position(|header| header.selected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ListItemRef, ListKind};

    fn lists() -> Vec<List> {
        vec![
            List {
                id: 1,
                name: "Import".to_string(),
                kind: ListKind::Addition,
                count: 2,
            },
            List {
                id: 2,
                name: "Start".to_string(),
                kind: ListKind::Count,
                count: 1,
            },
            List {
                id: 3,
                name: "End".to_string(),
                kind: ListKind::Count,
                count: 0,
            },
        ]
    }

    fn items() -> Vec<Item> {
        vec![
            Item {
                id: 10,
                name: "Milk".to_string(),
                list_items: vec![
                    ListItemRef {
                        list_id: 1,
                        amount: "4.0".parse().expect("amount"),
                    },
                    ListItemRef {
                        list_id: 2,
                        amount: Amount::new(3.5),
                    },
                ],
            },
            Item {
                id: 11,
                name: "Bread".to_string(),
                list_items: vec![ListItemRef {
                    list_id: 1,
                    amount: Amount::new(2.0),
                }],
            },
        ]
    }

    #[test]
    fn build_fills_known_amounts_and_blanks() {
        let table = ItemsTable::build(&items(), &lists(), Some(2));

        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[0].cells.len(), 3);
        assert_eq!(table.cell("10_Import").expect("cell").text, "4");
        assert_eq!(table.cell("10_Start").expect("cell").text, "3.5");
        assert_eq!(table.cell("10_End").expect("cell").text, "");
        assert_eq!(table.cell("11_Start").expect("cell").text, "");
    }

    #[test]
    fn only_count_headers_are_selectable() {
        let table = ItemsTable::build(&items(), &lists(), Some(2));
        let selectable: Vec<bool> = table.headers.iter().map(|h| h.selectable).collect();
        assert_eq!(selectable, vec![false, true, true]);
        assert_eq!(table.selected_header(), Some(2));

        let not_count = ItemsTable::build(&items(), &lists(), Some(0));
        assert_eq!(not_count.selected_header(), None);
    }

    #[test]
    fn select_header_moves_mark_and_refuses_non_count() {
        let mut table = ItemsTable::build(&items(), &lists(), Some(2));

        assert!(table.select_header(1));
        assert_eq!(table.selected_header(), Some(1));

        assert!(!table.select_header(0));
        assert!(!table.select_header(9));
        assert_eq!(table.selected_header(), Some(1));
    }

    #[test]
    fn patch_cell_updates_only_matching_cell() {
        let mut table = ItemsTable::build(&items(), &lists(), Some(2));

        assert!(table.patch_cell(11, "End", Amount::new(6.0)));
        assert_eq!(table.cell("11_End").expect("cell").text, "6");
        assert_eq!(table.cell("10_End").expect("cell").text, "");

        assert!(!table.patch_cell(99, "End", Amount::new(1.0)));
        assert!(!table.patch_cell(11, "Missing", Amount::new(1.0)));
    }
}
