//! Input and output histories.
//!
//! A [`History`] is an immutable value: every operation returns a new history and leaves the
//! receiver untouched. [`HistoryStore`] holds the pair of histories behind a watch channel so
//! every mutation publishes a whole snapshot, and observers re-render from snapshots only.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::kv::{self, SharedStore, keys};
use crate::notice::{Notice, messages};

/// Navigation direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Prev,
    Next,
}

/// Which of the two histories an operation targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HistoryKind {
    Input,
    Output,
}

impl HistoryKind {
    pub const VALUES: &[HistoryKind] = &[HistoryKind::Input, HistoryKind::Output];

    pub fn as_str(&self) -> &'static str {
        match self {
            HistoryKind::Input => "input",
            HistoryKind::Output => "output",
        }
    }

    /// Capitalized label for panes and notices
    pub fn label(&self) -> &'static str {
        match self {
            HistoryKind::Input => "Input",
            HistoryKind::Output => "Output",
        }
    }

    fn storage_keys(&self) -> (&'static str, &'static str) {
        match self {
            HistoryKind::Input => (keys::INPUT_TEXTS, keys::CURRENT_INPUT_INDEX),
            HistoryKind::Output => (keys::OUTPUT_TEXTS, keys::CURRENT_OUTPUT_INDEX),
        }
    }
}

impl fmt::Display for HistoryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for HistoryKind {
    type Err = Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "input" | "inputs" => Ok(HistoryKind::Input),
            "output" | "outputs" => Ok(HistoryKind::Output),
            _ => Err(Error::Validation(format!("unknown history: {}", s))),
        }
    }
}

/// Ordered entries plus a cursor.
///
/// `cursor` is `None` exactly when nothing is selected; otherwise it indexes into `entries`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct History {
    entries: Vec<String>,
    cursor: Option<usize>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a history from persisted parts, where `-1` encodes "no selection".
    /// An out-of-range index selects the last entry.
    pub fn restore(entries: Vec<String>, index: i64) -> Self {
        let cursor = if index < 0 || entries.is_empty() {
            None
        } else {
            Some((index as usize).min(entries.len() - 1))
        };
        Self { entries, cursor }
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    pub fn cursor(&self) -> Option<usize> {
        self.cursor
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.entries.get(index).map(String::as_str)
    }

    /// Cursor in the persisted encoding
    pub fn persisted_index(&self) -> i64 {
        self.cursor.map(|c| c as i64).unwrap_or(-1)
    }

    /// Add `text` as the last entry and select it.
    pub fn append(&self, text: impl Into<String>) -> History {
        let mut entries = self.entries.clone();
        entries.push(text.into());
        let cursor = Some(entries.len() - 1);
        History { entries, cursor }
    }

    /// Overwrite the selected entry, or append when nothing is selected.
    pub fn replace_at_cursor(&self, text: impl Into<String>) -> History {
        match self.cursor {
            Some(index) => self.replace_at(index, text),
            None => self.append(text),
        }
    }

    /// Overwrite the entry at `index` without moving the cursor. Out-of-range is a no-op.
    pub fn replace_at(&self, index: usize, text: impl Into<String>) -> History {
        if index >= self.entries.len() {
            return self.clone();
        }
        let mut entries = self.entries.clone();
        entries[index] = text.into();
        History { entries, cursor: self.cursor }
    }

    /// Move the cursor one step, clamped to the ends.
    pub fn navigate(&self, direction: Direction) -> History {
        if !self.can_navigate(direction) {
            return self.clone();
        }
        let cursor = self.cursor.map(|c| match direction {
            Direction::Prev => c - 1,
            Direction::Next => c + 1,
        });
        History { entries: self.entries.clone(), cursor }
    }

    pub fn can_navigate(&self, direction: Direction) -> bool {
        match (self.cursor, direction) {
            (None, _) => false,
            (Some(c), Direction::Prev) => c > 0,
            (Some(c), Direction::Next) => c + 1 < self.entries.len(),
        }
    }

    pub fn clear(&self) -> History {
        History::new()
    }

    /// The selected entry, or `""` when nothing is selected.
    pub fn current_value(&self) -> &str {
        self.cursor.and_then(|c| self.get(c)).unwrap_or("")
    }

    /// `"i/n"` for the selected entry
    pub fn position_label(&self) -> Option<String> {
        self.cursor.map(|c| format!("{}/{}", c + 1, self.entries.len()))
    }

    pub fn contains(&self, text: &str) -> bool {
        self.entries.iter().any(|entry| entry == text)
    }
}

/// Both histories at one point in time
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Histories {
    pub input: History,
    pub output: History,
}

impl Histories {
    pub fn get(&self, kind: HistoryKind) -> &History {
        match kind {
            HistoryKind::Input => &self.input,
            HistoryKind::Output => &self.output,
        }
    }

    fn get_mut(&mut self, kind: HistoryKind) -> &mut History {
        match kind {
            HistoryKind::Input => &mut self.input,
            HistoryKind::Output => &mut self.output,
        }
    }
}

/// Result of moving the current output into the input history
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveOutcome {
    /// Appended to the inputs and selected
    Moved,
    /// The exact text already exists among the inputs; nothing changed
    AlreadyPresent,
    /// No output selected, or the selected output is empty
    NothingToMove,
}

impl MoveOutcome {
    pub fn notice(&self) -> Notice {
        match self {
            MoveOutcome::Moved => Notice::info(messages::MOVED_TO_INPUT),
            MoveOutcome::AlreadyPresent => Notice::warning(messages::ALREADY_IN_INPUTS),
            MoveOutcome::NothingToMove => Notice::warning(messages::NOTHING_TO_MOVE),
        }
    }
}

/// Shared, observable holder of the input and output histories.
///
/// Mutations are synchronous and replace the affected history wholesale; subscribers are
/// woken only when something actually changed. When a key-value store is attached, the
/// affected history is written back after each mutation.
pub struct HistoryStore {
    tx: watch::Sender<Histories>,
    persistence: Option<SharedStore>,
}

impl Default for HistoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl HistoryStore {
    /// Empty, unpersisted histories
    pub fn new() -> Self {
        Self::from_histories(Histories::default())
    }

    pub fn from_histories(histories: Histories) -> Self {
        let (tx, _rx) = watch::channel(histories);
        Self { tx, persistence: None }
    }

    /// Restore both histories from `store` and keep writing changes back to it.
    pub fn load(store: SharedStore) -> Result<Self> {
        let mut histories = Histories::default();
        for kind in HistoryKind::VALUES {
            let (entries_key, index_key) = kind.storage_keys();
            let entries: Vec<String> = kv::get_json(store.as_ref(), entries_key)?.unwrap_or_default();
            let index: i64 = kv::get_json(store.as_ref(), index_key)?.unwrap_or(-1);
            *histories.get_mut(*kind) = History::restore(entries, index);
        }

        debug!(
            inputs = histories.input.len(),
            outputs = histories.output.len(),
            "Restored histories"
        );

        let (tx, _rx) = watch::channel(histories);
        Ok(Self { tx, persistence: Some(store) })
    }

    pub fn subscribe(&self) -> watch::Receiver<Histories> {
        self.tx.subscribe()
    }

    pub fn snapshot(&self) -> Histories {
        self.tx.borrow().clone()
    }

    pub fn history(&self, kind: HistoryKind) -> History {
        self.tx.borrow().get(kind).clone()
    }

    pub fn current_value(&self, kind: HistoryKind) -> String {
        self.tx.borrow().get(kind).current_value().to_string()
    }

    /// Append and select; returns the new entry's index.
    pub fn append(&self, kind: HistoryKind, text: impl Into<String>) -> usize {
        let text = text.into();
        let mut index = 0;
        self.modify(kind, |history| {
            let next = history.append(text);
            index = next.len() - 1;
            next
        });
        index
    }

    pub fn replace_at_cursor(&self, kind: HistoryKind, text: impl Into<String>) {
        let text = text.into();
        self.modify(kind, |history| history.replace_at_cursor(text));
    }

    /// Overwrite a specific entry. Returns false when `index` no longer exists.
    pub fn replace_at(&self, kind: HistoryKind, index: usize, text: impl Into<String>) -> bool {
        let text = text.into();
        let mut exists = false;
        self.modify(kind, |history| {
            exists = index < history.len();
            history.replace_at(index, text)
        });
        exists
    }

    /// Extend the entry at `index` with `fragment` as one atomic read-modify-write.
    /// Returns false when `index` no longer exists.
    pub fn append_to_entry(&self, kind: HistoryKind, index: usize, fragment: &str) -> bool {
        let mut exists = false;
        self.modify(kind, |history| match history.get(index) {
            Some(current) => {
                exists = true;
                let mut text = String::with_capacity(current.len() + fragment.len());
                text.push_str(current);
                text.push_str(fragment);
                history.replace_at(index, text)
            }
            None => history.clone(),
        });
        exists
    }

    /// Returns true when the cursor moved.
    pub fn navigate(&self, kind: HistoryKind, direction: Direction) -> bool {
        self.modify(kind, |history| history.navigate(direction))
    }

    pub fn clear(&self, kind: HistoryKind) {
        self.modify(kind, History::clear);
    }

    /// Live typing into the input pane.
    pub fn edit_input(&self, text: impl Into<String>) {
        self.replace_at_cursor(HistoryKind::Input, text);
    }

    /// Copy the selected output into the inputs unless the exact text is already there.
    pub fn move_output_to_input(&self) -> MoveOutcome {
        let output = self.current_value(HistoryKind::Output);
        if output.is_empty() {
            return MoveOutcome::NothingToMove;
        }

        if self.tx.borrow().input.contains(&output) {
            return MoveOutcome::AlreadyPresent;
        }

        self.append(HistoryKind::Input, output);
        MoveOutcome::Moved
    }

    fn modify<F>(&self, kind: HistoryKind, f: F) -> bool
    where
        F: FnOnce(&History) -> History,
    {
        let changed = self.tx.send_if_modified(|histories| {
            let next = f(histories.get(kind));
            if next == *histories.get(kind) {
                return false;
            }
            *histories.get_mut(kind) = next;
            true
        });

        if changed {
            self.persist(kind);
        }
        changed
    }

    fn persist(&self, kind: HistoryKind) {
        let Some(store) = &self.persistence else {
            return;
        };

        let history = self.history(kind);
        let (entries_key, index_key) = kind.storage_keys();
        let result = kv::set_json(store.as_ref(), entries_key, &history.entries)
            .and_then(|_| kv::set_json(store.as_ref(), index_key, &history.persisted_index()));

        if let Err(e) = result {
            warn!(history = %kind, error = %e, "Failed to persist history");
        }
    }
}
