use std::collections::HashMap;

use thiserror::Error;

use crate::cache::CacheState;
use crate::items_table::ItemsTable;
use crate::model::{Amount, AmountError, Item, ItemId, ItemsSnapshot, List, ListId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Next,
    Previous,
}

/// Steps `index` through `0..len`, wrapping at both ends.
pub fn advance_index(index: usize, len: usize, direction: Direction) -> usize {
    if len == 0 {
        return 0;
    }
    match direction {
        Direction::Next => (index + 1) % len,
        Direction::Previous => (index + len - 1) % len,
    }
}

/// The first list not yet recorded for every item, else the last list.
pub fn first_incomplete_list(lists: &[List], item_count: usize) -> usize {
    lists
        .iter()
        .position(|list| list.count != item_count)
        .unwrap_or(lists.len().saturating_sub(1))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CountForm {
    pub item_name: String,
    pub amount: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CountSubmission {
    pub item_id: ItemId,
    pub list_id: ListId,
    pub list_name: String,
    pub amount: Amount,
    pub sequence: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecordOutcome {
    pub submission: Option<CountSubmission>,
    pub item_index: usize,
    pub form: CountForm,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CellPatch {
    pub item_id: ItemId,
    pub list_name: String,
    pub amount: Amount,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct AppliedCount {
    pub patch: Option<CellPatch>,
    pub count_changed: bool,
    pub stale: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CountingError {
    #[error("there are no items to count")]
    NoItems,
    #[error("there are no lists to count into")]
    NoLists,
    #[error("list #{index} does not exist")]
    UnknownList { index: usize },
    #[error("list '{name}' is not a Count list")]
    NotSelectable { name: String },
    #[error(transparent)]
    InvalidAmount(#[from] AmountError),
}

type PairKey = (ItemId, ListId);

/// Submission bookkeeping for one (item, list) pair.
#[derive(Debug, Clone, Default)]
struct PairState {
    /// Sent and not yet answered, oldest first.
    issued: Vec<(u64, Amount)>,
    /// Sequence of the amount currently held in `items`.
    applied: u64,
    /// Acknowledged while a newer submission was still in flight.
    held: Option<(u64, Amount)>,
}

impl PairState {
    fn is_settled(&self) -> bool {
        self.issued.is_empty() && self.held.is_none()
    }

    fn newer_issued(&self, sequence: u64) -> bool {
        self.issued.iter().any(|(issued, _)| *issued > sequence)
    }
}

/// Counter state for one store: which list is being counted, which item is
/// on screen, and the local copy of the server's items and lists.
#[derive(Debug, Clone)]
pub struct CountingSession {
    lists: Vec<List>,
    items: Vec<Item>,
    current_list_index: usize,
    current_item_index: usize,
    next_sequence: u64,
    pairs: HashMap<PairKey, PairState>,
}

impl CountingSession {
    pub fn new(snapshot: ItemsSnapshot) -> Result<Self, CountingError> {
        if snapshot.items.is_empty() {
            return Err(CountingError::NoItems);
        }
        if snapshot.lists.is_empty() {
            return Err(CountingError::NoLists);
        }

        let current_list_index = first_incomplete_list(&snapshot.lists, snapshot.items.len());
        tracing::debug!(
            current_list_index,
            items = snapshot.items.len(),
            lists = snapshot.lists.len(),
            "counting session initialised"
        );

        Ok(Self {
            lists: snapshot.lists,
            items: snapshot.items,
            current_list_index,
            current_item_index: 0,
            next_sequence: 1,
            pairs: HashMap::new(),
        })
    }

    /// Takes over the submission bookkeeping of `previous` so completions
    /// issued before a reload or import still land in this session.
    pub fn carry_submissions(&mut self, previous: &CountingSession) {
        self.next_sequence = self.next_sequence.max(previous.next_sequence);
        for (key, state) in &previous.pairs {
            self.pairs.insert(*key, state.clone());
        }
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn lists(&self) -> &[List] {
        &self.lists
    }

    pub fn current_list_index(&self) -> usize {
        self.current_list_index
    }

    pub fn current_item_index(&self) -> usize {
        self.current_item_index
    }

    pub fn current_list(&self) -> &List {
        &self.lists[self.current_list_index]
    }

    pub fn current_item(&self) -> &Item {
        &self.items[self.current_item_index]
    }

    /// Pairs with at least one submission still in flight.
    pub fn pending_count(&self) -> usize {
        self.pairs
            .values()
            .filter(|state| !state.issued.is_empty())
            .count()
    }

    pub fn count_badge(&self) -> String {
        let list = self.current_list();
        format!(
            "{} {} {}/{}",
            list.name,
            list.kind.label(),
            list.count,
            self.items.len()
        )
    }

    pub fn current_form(&self) -> CountForm {
        self.form_for(self.current_item_index)
    }

    fn form_for(&self, item_index: usize) -> CountForm {
        let item = &self.items[item_index];
        CountForm {
            item_name: item.name.clone(),
            amount: item
                .amount_for(self.current_list().id)
                .map(|amount| amount.to_string()),
        }
    }

    pub fn table(&self) -> ItemsTable {
        ItemsTable::build(&self.items, &self.lists, Some(self.current_list_index))
    }

    pub fn snapshot(&self) -> ItemsSnapshot {
        ItemsSnapshot {
            items: self.items.clone(),
            lists: self.lists.clone(),
        }
    }

    pub fn cache_state(&self, store_id: u64) -> CacheState {
        CacheState::new(
            store_id,
            &self.snapshot(),
            self.current_list_index,
            self.current_item_index,
        )
    }

    /// Makes `index` the counting target. Returns the refreshed form, or
    /// `None` when that list is already selected.
    pub fn select_list(&mut self, index: usize) -> Result<Option<CountForm>, CountingError> {
        let list = self
            .lists
            .get(index)
            .ok_or(CountingError::UnknownList { index })?;
        if !list.kind.is_count() {
            return Err(CountingError::NotSelectable {
                name: list.name.clone(),
            });
        }
        if index == self.current_list_index {
            return Ok(None);
        }

        self.current_list_index = index;
        Ok(Some(self.current_form()))
    }

    /// Selects the neighbouring Count list, wrapping around.
    pub fn select_adjacent_list(
        &mut self,
        direction: Direction,
    ) -> Result<Option<CountForm>, CountingError> {
        let len = self.lists.len();
        let mut index = self.current_list_index;
        for _ in 0..len {
            index = advance_index(index, len, direction);
            if self.lists[index].kind.is_count() {
                return self.select_list(index);
            }
        }
        Ok(None)
    }

    /// Records `input` for the current item and list, then moves to the
    /// neighbouring item. Blank or unchanged input advances without a
    /// submission. Invalid input leaves the position untouched.
    pub fn record(
        &mut self,
        direction: Direction,
        input: &str,
    ) -> Result<RecordOutcome, CountingError> {
        let input = input.trim();
        let amount = if input.is_empty() {
            None
        } else {
            Some(Amount::parse_input(input)?)
        };

        let item_id = self.current_item().id;
        let list = self.current_list();
        let list_id = list.id;
        let list_name = list.name.clone();
        let key = (item_id, list_id);

        let submission = amount.and_then(|amount| {
            let known = match self.pairs.get(&key).and_then(|state| state.issued.last()) {
                Some((_, issued_amount)) => Some(*issued_amount),
                None => self.current_item().amount_for(list_id),
            };
            if known == Some(amount) {
                return None;
            }

            let sequence = self.next_sequence;
            self.next_sequence += 1;
            self.pairs
                .entry(key)
                .or_default()
                .issued
                .push((sequence, amount));
            Some(CountSubmission {
                item_id,
                list_id,
                list_name,
                amount,
                sequence,
            })
        });

        self.current_item_index =
            advance_index(self.current_item_index, self.items.len(), direction);

        Ok(RecordOutcome {
            submission,
            item_index: self.current_item_index,
            form: self.current_form(),
        })
    }

    /// Folds a completed submission into the session.
    ///
    /// Only the newest answered submission for an (item, list) pair may
    /// change a recorded amount. An older one still counts towards the list
    /// total when it created the record, and is kept back in case every
    /// newer submission fails.
    pub fn apply_response(&mut self, submission: &CountSubmission, created: bool) -> AppliedCount {
        let key = (submission.item_id, submission.list_id);
        let state = self.pairs.entry(key).or_default();
        state
            .issued
            .retain(|(sequence, _)| *sequence != submission.sequence);
        let stale =
            submission.sequence < state.applied || state.newer_issued(submission.sequence);
        if stale {
            let newer_than_held = state
                .held
                .is_none_or(|(held, _)| held < submission.sequence);
            if submission.sequence > state.applied && newer_than_held {
                state.held = Some((submission.sequence, submission.amount));
            }
        } else {
            state.applied = submission.sequence;
            state.held = None;
        }
        self.prune(key);

        let Some((item_index, list_index)) = self.position_of(key) else {
            return AppliedCount {
                stale: true,
                ..AppliedCount::default()
            };
        };

        let had_record = self.items[item_index]
            .amount_for(submission.list_id)
            .is_some();

        let mut patch = None;
        if !stale || !had_record {
            self.items[item_index].upsert_amount(submission.list_id, submission.amount);
            patch = Some(CellPatch {
                item_id: submission.item_id,
                list_name: self.lists[list_index].name.clone(),
                amount: submission.amount,
            });
        }

        let count_changed = created && !had_record;
        if count_changed {
            self.lists[list_index].count += 1;
        }

        tracing::debug!(
            item_id = submission.item_id,
            list_id = submission.list_id,
            sequence = submission.sequence,
            created,
            stale,
            "applied count response"
        );

        AppliedCount {
            patch,
            count_changed,
            stale,
        }
    }

    /// Forgets a failed submission so the same value can be sent again.
    ///
    /// When it was the newest one in flight, an older acknowledged amount
    /// becomes the recorded one and its patch is returned.
    pub fn apply_failure(&mut self, submission: &CountSubmission) -> Option<CellPatch> {
        let key = (submission.item_id, submission.list_id);
        let state = self.pairs.get_mut(&key)?;
        state
            .issued
            .retain(|(sequence, _)| *sequence != submission.sequence);

        let promoted = match state.held {
            Some((sequence, amount)) if !state.newer_issued(sequence) => {
                state.applied = sequence;
                state.held = None;
                Some(amount)
            }
            _ => None,
        };
        self.prune(key);

        let amount = promoted?;
        let (item_index, list_index) = self.position_of(key)?;
        self.items[item_index].upsert_amount(submission.list_id, amount);
        tracing::debug!(
            item_id = submission.item_id,
            list_id = submission.list_id,
            "older acknowledged amount restored after failure"
        );
        Some(CellPatch {
            item_id: submission.item_id,
            list_name: self.lists[list_index].name.clone(),
            amount,
        })
    }

    fn prune(&mut self, key: PairKey) {
        if self.pairs.get(&key).is_some_and(PairState::is_settled) {
            self.pairs.remove(&key);
        }
    }

    fn position_of(&self, (item_id, list_id): PairKey) -> Option<(usize, usize)> {
        let item_index = self.items.iter().position(|item| item.id == item_id)?;
        let list_index = self.lists.iter().position(|list| list.id == list_id)?;
        Some((item_index, list_index))
    }
}
