//! Lua table-literal parsing for mission and dictionary files
//!
//! The `.miz` entries (`mission`, `l10n/<LOCALE>/dictionary`, `options`) are
//! plain Lua literal tables assigned to a single root variable. This module
//! reads that subset only: no execution, no expressions, no function values.
pub mod lexer;
pub mod parser;
pub mod value;

pub use parser::{parse_document, parse_value_text};
pub use value::{LuaKey, LuaTable, LuaValue};

use thiserror::Error;

/// Syntax errors raised while tokenizing or parsing a literal table.
///
/// A failed parse is local to the one file being read; callers that iterate
/// over locale dictionaries skip the broken locale instead of aborting.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    #[error("unterminated string starting at line {line}, column {column}")]
    UnterminatedString { line: usize, column: usize },

    #[error("unexpected token `{found}` at line {line}, column {column}")]
    UnexpectedToken {
        found: String,
        line: usize,
        column: usize,
    },

    #[error("unbalanced braces: table opened at line {line}, column {column} is never closed")]
    UnbalancedBraces { line: usize, column: usize },
}
