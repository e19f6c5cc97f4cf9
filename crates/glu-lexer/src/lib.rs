//! Glu Lexer
//!
//! A regex-rule scanner driven by a stack of lexer states, used to
//! highlight Glu and GIL source. Language tables are plain data built with
//! [`DefinitionBuilder`]: named states, ordered rules, mixins, and word sets
//! for classifying identifiers. The engine handles nesting (block comments,
//! string interpolation), zero-width state switches, and recovers from any
//! input, so every scan finishes and loses no text.
//!
//! # Example
//!
//! ```
//! use glu_lexer::{LanguageDefinition, TokenKind};
//!
//! let def = LanguageDefinition::builder("words")
//!     .state("root", |s| s.rule(r"\s+", TokenKind::Text).rule(r"\w+", TokenKind::Name))
//!     .build()
//!     .unwrap();
//! let kinds: Vec<_> = def.lex("a b").map(|t| t.kind).collect();
//! assert_eq!(kinds, vec![TokenKind::Name, TokenKind::Text, TokenKind::Name]);
//! ```

pub mod classify;
pub mod definition;
pub mod rule;
pub mod scanner;
pub mod stack;
pub mod token;

pub use definition::{DefinitionBuilder, LanguageDefinition, State, StateBuilder};
pub use rule::{Action, Classifier, Rule, RuleId, StateId, Transition};
pub use scanner::{ScanOptions, Scanner, Tokens};
pub use stack::{StackError, StateStack};
pub use token::{Span, Token, TokenKind};

/// A language table that cannot be loaded.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DefinitionError {
    #[error("language `{language}` defines no states")]
    EmptyStateTable { language: String },

    #[error("start state `{state}` is not defined")]
    MissingStartState { state: String },

    #[error("state `{state}` is defined more than once")]
    DuplicateState { state: String },

    #[error("state `{state}` mixes in undefined state `{mixin}`")]
    UnresolvedMixin { state: String, mixin: String },

    #[error("mixin cycle: {}", .cycle.join(" -> "))]
    MixinCycle { cycle: Vec<String> },

    #[error("state `{state}` refers to undefined state `{target}`")]
    UnknownState { state: String, target: String },

    #[error("invalid pattern `{pattern}` in state `{state}`: {source}")]
    InvalidPattern {
        state: String,
        pattern: String,
        source: regex::Error,
    },

    #[error("pattern `{pattern}` in state `{state}` has {found} capture groups for {expected} kinds")]
    GroupCountMismatch {
        state: String,
        pattern: String,
        expected: usize,
        found: usize,
    },
}
