// SPDX-License-Identifier: LGPL-3.0-only

use bitflags::bitflags;
use std::fmt;
use unicode_general_category::{get_general_category, GeneralCategory};

bitflags! {
    /// Keyboard modifiers held during an event.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct Modifiers: u8 {
        /// Control key.
        const CONTROL = 0b0001;
        /// Command key (macOS) or Super/Windows key.
        const COMMAND = 0b0010;
        /// Shift key.
        const SHIFT = 0b0100;
        /// Alt/Option key.
        const ALT = 0b1000;
    }
}

/// Platform independent key identity.
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyName {
    Escape,
    LeftArrow,
    RightArrow,
    UpArrow,
    DownArrow,
    /// The main return key.
    Return,
    /// The keypad enter key.
    Enter,
    Home,
    End,
    DeleteBackward,
    DeleteForward,
    PageUp,
    PageDown,
    Tab,
    Space,
    /// Function key `F1` through `F12`.
    F(u8),
    /// Any other printable key, upper-cased.
    Char(char),
}

impl fmt::Display for KeyName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyName::Escape => write!(f, "⎋"),
            KeyName::LeftArrow => write!(f, "←"),
            KeyName::RightArrow => write!(f, "→"),
            KeyName::UpArrow => write!(f, "↑"),
            KeyName::DownArrow => write!(f, "↓"),
            KeyName::Return => write!(f, "↩"),
            KeyName::Enter => write!(f, "⌤"),
            KeyName::Home => write!(f, "⇱"),
            KeyName::End => write!(f, "⇲"),
            KeyName::DeleteBackward => write!(f, "⌫"),
            KeyName::DeleteForward => write!(f, "⌦"),
            KeyName::PageUp => write!(f, "⇞"),
            KeyName::PageDown => write!(f, "⇟"),
            KeyName::Tab => write!(f, "Tab"),
            KeyName::Space => write!(f, "Space"),
            KeyName::F(n) => write!(f, "F{n}"),
            KeyName::Char(c) => write!(f, "{c}"),
        }
    }
}

/// A key press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEvent {
    /// The key.
    pub name: KeyName,
    /// Modifiers held at the time of the press.
    pub modifiers: Modifiers,
}

/// Text committed by the input method or keyboard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditEvent {
    /// The text, verbatim.
    pub text: String,
}

/// Keyboard focus change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FocusEvent {
    /// Whether the window has keyboard focus.
    pub focus: bool,
}

/// Reports whether `c` is a printable character.
///
/// Letters, marks, numbers, punctuation, symbols and the ASCII space are
/// printable. Control, format, private use (where platforms put their
/// function keys) and unassigned code points are not, nor are separators
/// other than the space.
pub fn is_printable(c: char) -> bool {
    if c == ' ' {
        return true;
    }
    !matches!(
        get_general_category(c),
        GeneralCategory::Control
            | GeneralCategory::Format
            | GeneralCategory::Surrogate
            | GeneralCategory::PrivateUse
            | GeneralCategory::Unassigned
            | GeneralCategory::SpaceSeparator
            | GeneralCategory::LineSeparator
            | GeneralCategory::ParagraphSeparator
    )
}
