use regex::Regex;

use crate::token::TokenKind;

/// Index of a state inside a [`LanguageDefinition`](crate::LanguageDefinition).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StateId(pub(crate) usize);

/// Index of a compiled rule in a definition's rule arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RuleId(pub(crate) usize);

/// Strategy for rules whose token kind depends on the matched text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classifier {
    /// Case shape only: `FOO` is a constant, `Foo` a class, anything else
    /// gets the carried kind.
    Shape(TokenKind),
    /// Keyword, declaration and constant sets first, then `Shape(Name)`.
    Word,
    /// A word in call position (followed by `(`, optionally after `?`/`!`
    /// and whitespace) is `Shape(Name.Function)` unless it is a control word.
    /// Everything else falls back to `Word`.
    Callable,
}

/// What a matching rule emits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// The whole match as one kind.
    Emit(TokenKind),
    /// One kind per capture group, in group order. Matched text outside the
    /// groups is emitted as `Text`.
    EmitGroups(Vec<TokenKind>),
    /// Kind decided at match time.
    Classify(Classifier),
    /// No token of its own; used for zero-width state switches. Any text it
    /// does consume is emitted as `Text`.
    Fallthrough,
}

/// State stack directive applied after a rule's tokens are emitted.
///
/// Authoring code names states (`Transition<String>`); a built definition
/// refers to them by id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition<S = String> {
    None,
    Push(S),
    Pop,
    Goto(S),
}

impl Transition {
    pub fn push(state: impl Into<String>) -> Self {
        Transition::Push(state.into())
    }

    pub fn goto(state: impl Into<String>) -> Self {
        Transition::Goto(state.into())
    }
}

impl<S> Transition<S> {
    pub(crate) fn try_map<T, E>(self, mut f: impl FnMut(S) -> Result<T, E>) -> Result<Transition<T>, E> {
        Ok(match self {
            Transition::None => Transition::None,
            Transition::Push(s) => Transition::Push(f(s)?),
            Transition::Pop => Transition::Pop,
            Transition::Goto(s) => Transition::Goto(f(s)?),
        })
    }
}

/// A rule as written by a language author, before compilation.
#[derive(Debug, Clone)]
pub(crate) struct RuleSpec {
    pub pattern: String,
    pub action: Action,
    pub transition: Transition,
}

/// One item of a state's body: a rule, or another state spliced in.
#[derive(Debug, Clone)]
pub(crate) enum Entry {
    Rule(RuleSpec),
    Mixin(String),
}

/// A compiled rule. The pattern is anchored at the scan cursor.
#[derive(Debug, Clone)]
pub struct Rule {
    pub(crate) pattern: Regex,
    pub(crate) source: String,
    pub(crate) action: Action,
    pub(crate) transition: Transition<StateId>,
}

impl Rule {
    /// The pattern as written, without the anchor.
    pub fn pattern(&self) -> &str {
        &self.source
    }

    pub fn action(&self) -> &Action {
        &self.action
    }

    pub fn transition(&self) -> &Transition<StateId> {
        &self.transition
    }
}
