//! Plain-text key sequences such as `Ctrl+Alt+R`.
//!
//! Snippet files store their hotkey as a single header line. Parsing is
//! deliberately forgiving about case and aliases (`cmd`, `pgup`, `return`),
//! while [`KeySequence`]'s `Display` output is canonical so that a sequence
//! written back to disk re-parses to the same value.

use std::fmt;
use std::str::FromStr;

use crossterm::event::{KeyCode, KeyModifiers};
use thiserror::Error;

/// A single key with optional modifiers, bound to a snippet command.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct KeySequence {
    pub modifiers: KeyModifiers,
    pub code: KeyCode,
}

impl KeySequence {
    pub fn new(modifiers: KeyModifiers, code: KeyCode) -> Self {
        Self { modifiers, code }
    }
}

/// Error produced when a hotkey string cannot be understood.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseKeySequenceError {
    #[error("empty key sequence")]
    Empty,
    #[error("unknown modifier `{0}`")]
    UnknownModifier(String),
    #[error("unknown key `{0}`")]
    UnknownKey(String),
}

impl FromStr for KeySequence {
    type Err = ParseKeySequenceError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let input = input.trim();
        if input.is_empty() {
            return Err(ParseKeySequenceError::Empty);
        }

        let tokens: Vec<&str> = input.split('+').map(str::trim).collect();
        if tokens.iter().any(|token| token.is_empty()) {
            return Err(ParseKeySequenceError::Empty);
        }

        let (key_token, modifier_tokens) = tokens.split_last().unwrap_or((&"", &[]));
        let mut modifiers = KeyModifiers::empty();
        for token in modifier_tokens {
            modifiers |= parse_modifier(token)?;
        }
        let code = parse_key(key_token)?;
        Ok(Self { modifiers, code })
    }
}

fn parse_modifier(token: &str) -> Result<KeyModifiers, ParseKeySequenceError> {
    match token.to_ascii_lowercase().as_str() {
        "ctrl" | "control" => Ok(KeyModifiers::CONTROL),
        "alt" | "opt" | "option" => Ok(KeyModifiers::ALT),
        "shift" => Ok(KeyModifiers::SHIFT),
        "super" | "cmd" | "win" => Ok(KeyModifiers::SUPER),
        "meta" => Ok(KeyModifiers::META),
        other => Err(ParseKeySequenceError::UnknownModifier(other.to_owned())),
    }
}

fn parse_key(token: &str) -> Result<KeyCode, ParseKeySequenceError> {
    let mut chars = token.chars();
    if let (Some(ch), None) = (chars.next(), chars.next()) {
        return Ok(KeyCode::Char(ch.to_ascii_uppercase()));
    }

    let lowered = token.to_ascii_lowercase();
    if let Some(digits) = lowered.strip_prefix('f')
        && let Ok(n) = digits.parse::<u8>()
        && (1..=24).contains(&n)
    {
        return Ok(KeyCode::F(n));
    }

    match lowered.as_str() {
        "esc" | "escape" => Ok(KeyCode::Esc),
        "enter" | "return" => Ok(KeyCode::Enter),
        "tab" => Ok(KeyCode::Tab),
        "space" => Ok(KeyCode::Char(' ')),
        "backspace" => Ok(KeyCode::Backspace),
        "del" | "delete" => Ok(KeyCode::Delete),
        "ins" | "insert" => Ok(KeyCode::Insert),
        "home" => Ok(KeyCode::Home),
        "end" => Ok(KeyCode::End),
        "pageup" | "pgup" => Ok(KeyCode::PageUp),
        "pagedown" | "pgdn" => Ok(KeyCode::PageDown),
        "up" => Ok(KeyCode::Up),
        "down" => Ok(KeyCode::Down),
        "left" => Ok(KeyCode::Left),
        "right" => Ok(KeyCode::Right),
        other => Err(ParseKeySequenceError::UnknownKey(other.to_owned())),
    }
}

impl fmt::Display for KeySequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (flag, label) in [
            (KeyModifiers::CONTROL, "Ctrl"),
            (KeyModifiers::ALT, "Alt"),
            (KeyModifiers::SHIFT, "Shift"),
            (KeyModifiers::SUPER, "Super"),
            (KeyModifiers::META, "Meta"),
        ] {
            if self.modifiers.contains(flag) {
                write!(f, "{label}+")?;
            }
        }
        match self.code {
            KeyCode::Char(' ') => write!(f, "Space"),
            KeyCode::Char(ch) => write!(f, "{}", ch.to_ascii_uppercase()),
            KeyCode::F(n) => write!(f, "F{n}"),
            KeyCode::Esc => write!(f, "Esc"),
            KeyCode::Enter => write!(f, "Enter"),
            KeyCode::Tab => write!(f, "Tab"),
            KeyCode::Backspace => write!(f, "Backspace"),
            KeyCode::Delete => write!(f, "Del"),
            KeyCode::Insert => write!(f, "Ins"),
            KeyCode::Home => write!(f, "Home"),
            KeyCode::End => write!(f, "End"),
            KeyCode::PageUp => write!(f, "PageUp"),
            KeyCode::PageDown => write!(f, "PageDown"),
            KeyCode::Up => write!(f, "Up"),
            KeyCode::Down => write!(f, "Down"),
            KeyCode::Left => write!(f, "Left"),
            KeyCode::Right => write!(f, "Right"),
            ref other => write!(f, "{other:?}"),
        }
    }
}
