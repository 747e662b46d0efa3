//! # Quick-Insert Palette
//!
//! ```text
//! Closed --trigger char--> Open { query: "" }
//! Open   --chars/backspace--> Open { query }
//! Open   --Enter | Escape | focus loss | backspace on empty query--> Closed
//! ```
//!
//! The palette only tracks state. The session inserts the typed text as
//! usual, and on selection deletes the trigger and query before running
//! the chosen command.

use inkpress_parser::ast::CalloutVariant;
use serde::{Deserialize, Serialize};

use crate::commands::Command;
use crate::selection::Position;

#[derive(Debug, Clone, PartialEq)]
pub struct PaletteEntry {
    pub key: &'static str,
    pub label: &'static str,
    pub command: Command,
}

const fn entry(key: &'static str, label: &'static str, command: Command) -> PaletteEntry {
    PaletteEntry {
        key,
        label,
        command,
    }
}

pub static CATALOGUE: [PaletteEntry; 15] = [
    entry("h1", "Heading 1", Command::Heading(1)),
    entry("h2", "Heading 2", Command::Heading(2)),
    entry("h3", "Heading 3", Command::Heading(3)),
    entry("bullet", "Bullet List", Command::BulletList),
    entry("numbered", "Numbered List", Command::OrderedList),
    entry("quote", "Quote", Command::BlockQuote),
    entry("code", "Code Block", Command::CodeBlock),
    entry("divider", "Divider", Command::HorizontalRule),
    entry("table", "Table", Command::Table { rows: 3, cols: 3 }),
    entry("columns", "Two Columns", Command::Columns),
    entry("info", "Info Callout", Command::Callout(CalloutVariant::Info)),
    entry("warning", "Warning Callout", Command::Callout(CalloutVariant::Warning)),
    entry("success", "Success Callout", Command::Callout(CalloutVariant::Success)),
    entry("error", "Error Callout", Command::Callout(CalloutVariant::Error)),
    entry("toggle", "Collapsible Section", Command::Collapsible),
];

/// Screen coordinates of the menu, captured once when it opens
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MenuPosition {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PaletteState {
    Closed,
    Open {
        query: String,
        position: MenuPosition,
        highlighted: usize,
        /// Where the trigger char was typed
        trigger: Position,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaletteKey {
    Up,
    Down,
    Enter,
    Escape,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PaletteOutcome {
    /// Key consumed, palette still open
    Handled,
    /// Key not meant for the palette
    Ignored,
    Closed,
    /// An entry was chosen; `typed_len` chars starting at `trigger` hold
    /// the trigger char and query
    Selected {
        command: Command,
        trigger: Position,
        typed_len: usize,
    },
}

#[derive(Debug, Clone)]
pub struct Palette {
    trigger_char: char,
    state: PaletteState,
}

impl Palette {
    pub fn new(trigger_char: char) -> Self {
        Self {
            trigger_char,
            state: PaletteState::Closed,
        }
    }

    pub fn state(&self) -> &PaletteState {
        &self.state
    }

    pub fn is_open(&self) -> bool {
        matches!(self.state, PaletteState::Open { .. })
    }

    pub fn query(&self) -> Option<&str> {
        match &self.state {
            PaletteState::Open { query, .. } => Some(query),
            PaletteState::Closed => None,
        }
    }

    /// Entries matching the query, case-insensitive, on label or key
    pub fn filtered(&self) -> Vec<&'static PaletteEntry> {
        let needle = self.query().unwrap_or_default().to_lowercase();
        CATALOGUE
            .iter()
            .filter(|entry| {
                entry.label.to_lowercase().contains(&needle) || entry.key.contains(&needle)
            })
            .collect()
    }

    /// A char typed at `caret`. Opens the palette on the trigger char,
    /// extends the query while open.
    pub fn on_char(&mut self, c: char, caret: &Position, position: MenuPosition) {
        match &mut self.state {
            PaletteState::Closed if c == self.trigger_char => {
                tracing::debug!("[Palette] opened");
                self.state = PaletteState::Open {
                    query: String::new(),
                    position,
                    highlighted: 0,
                    trigger: caret.clone(),
                };
            }
            PaletteState::Closed => {}
            PaletteState::Open {
                query, highlighted, ..
            } => {
                query.push(c);
                *highlighted = 0;
            }
        }
    }

    /// Backspace while open shortens the query; with an empty query it
    /// deletes the trigger char and closes
    pub fn on_backspace(&mut self) -> PaletteOutcome {
        match &mut self.state {
            PaletteState::Closed => PaletteOutcome::Ignored,
            PaletteState::Open {
                query, highlighted, ..
            } => {
                if query.pop().is_some() {
                    *highlighted = 0;
                    PaletteOutcome::Handled
                } else {
                    self.close();
                    PaletteOutcome::Closed
                }
            }
        }
    }

    pub fn on_key(&mut self, key: PaletteKey) -> PaletteOutcome {
        if !self.is_open() {
            return PaletteOutcome::Ignored;
        }
        let count = self.filtered().len();

        match key {
            PaletteKey::Escape => {
                self.close();
                PaletteOutcome::Closed
            }
            PaletteKey::Up | PaletteKey::Down => {
                if let PaletteState::Open { highlighted, .. } = &mut self.state {
                    if count > 0 {
                        *highlighted = match key {
                            PaletteKey::Up => (*highlighted + count - 1) % count,
                            _ => (*highlighted + 1) % count,
                        };
                    }
                }
                PaletteOutcome::Handled
            }
            PaletteKey::Enter => {
                let chosen = match &self.state {
                    PaletteState::Open {
                        query,
                        highlighted,
                        trigger,
                        ..
                    } => self.filtered().get(*highlighted).map(|entry| {
                        (
                            entry.command.clone(),
                            trigger.clone(),
                            1 + query.chars().count(),
                        )
                    }),
                    PaletteState::Closed => None,
                };
                self.close();

                match chosen {
                    Some((command, trigger, typed_len)) => {
                        tracing::debug!("[Palette] selected {}", command.name());
                        PaletteOutcome::Selected {
                            command,
                            trigger,
                            typed_len,
                        }
                    }
                    None => PaletteOutcome::Closed,
                }
            }
        }
    }

    pub fn on_focus_lost(&mut self) {
        self.close();
    }

    fn close(&mut self) {
        if self.is_open() {
            tracing::debug!("[Palette] closed");
        }
        self.state = PaletteState::Closed;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn caret() -> Position {
        Position::start_of("b-1")
    }

    fn open(palette: &mut Palette) {
        palette.on_char('/', &caret(), MenuPosition { x: 10.0, y: 20.0 });
    }

    #[test]
    fn test_catalogue_size() {
        assert_eq!(CATALOGUE.len(), 15);
    }

    #[test]
    fn test_trigger_opens_with_empty_query() {
        let mut palette = Palette::new('/');
        palette.on_char('a', &caret(), MenuPosition::default());
        assert!(!palette.is_open());

        open(&mut palette);
        assert_eq!(palette.query(), Some(""));
        assert_eq!(palette.filtered().len(), 15);
    }

    #[test]
    fn test_filter_is_case_insensitive() {
        let mut palette = Palette::new('/');
        open(&mut palette);
        for c in "CALL".chars() {
            palette.on_char(c, &caret(), MenuPosition::default());
        }

        let labels: Vec<_> = palette.filtered().iter().map(|e| e.label).collect();
        assert_eq!(
            labels,
            vec!["Info Callout", "Warning Callout", "Success Callout", "Error Callout"]
        );
    }

    #[test]
    fn test_position_is_held_while_open() {
        let mut palette = Palette::new('/');
        open(&mut palette);
        palette.on_char('t', &caret(), MenuPosition { x: 99.0, y: 99.0 });

        match palette.state() {
            PaletteState::Open { position, .. } => {
                assert_eq!(*position, MenuPosition { x: 10.0, y: 20.0 })
            }
            PaletteState::Closed => panic!("palette closed"),
        }
    }

    #[test]
    fn test_navigation_and_selection() {
        let mut palette = Palette::new('/');
        open(&mut palette);
        for c in "head".chars() {
            palette.on_char(c, &caret(), MenuPosition::default());
        }

        assert_eq!(palette.on_key(PaletteKey::Down), PaletteOutcome::Handled);
        assert_eq!(
            palette.on_key(PaletteKey::Enter),
            PaletteOutcome::Selected {
                command: Command::Heading(2),
                trigger: caret(),
                typed_len: 5,
            }
        );
        assert!(!palette.is_open());
    }

    #[test]
    fn test_up_wraps_around() {
        let mut palette = Palette::new('/');
        open(&mut palette);
        palette.on_key(PaletteKey::Up);

        match palette.on_key(PaletteKey::Enter) {
            PaletteOutcome::Selected { command, .. } => assert_eq!(command, Command::Collapsible),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_escape_focus_loss_and_backspace_close() {
        let mut palette = Palette::new('/');
        open(&mut palette);
        assert_eq!(palette.on_key(PaletteKey::Escape), PaletteOutcome::Closed);

        open(&mut palette);
        palette.on_focus_lost();
        assert!(!palette.is_open());

        open(&mut palette);
        palette.on_char('x', &caret(), MenuPosition::default());
        assert_eq!(palette.on_backspace(), PaletteOutcome::Handled);
        assert_eq!(palette.on_backspace(), PaletteOutcome::Closed);
        assert_eq!(palette.on_key(PaletteKey::Enter), PaletteOutcome::Ignored);
    }

    #[test]
    fn test_enter_with_no_match_closes() {
        let mut palette = Palette::new('/');
        open(&mut palette);
        for c in "zzz".chars() {
            palette.on_char(c, &caret(), MenuPosition::default());
        }
        assert!(palette.filtered().is_empty());
        assert_eq!(palette.on_key(PaletteKey::Enter), PaletteOutcome::Closed);
    }
}
