use std::collections::{HashMap, HashSet};

use regex::Regex;
use tracing::debug;

use crate::rule::{Action, Entry, Rule, RuleId, RuleSpec, StateId, Transition};
use crate::scanner::{ScanOptions, Tokens};
use crate::token::TokenKind;
use crate::DefinitionError;

/// A named state after mixin resolution: a flat, ordered list of rules.
#[derive(Debug, Clone)]
pub struct State {
    name: String,
    rules: Vec<RuleId>,
}

impl State {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn rule_ids(&self) -> &[RuleId] {
        &self.rules
    }
}

/// A compiled, immutable language table.
///
/// Built once through [`DefinitionBuilder`]; scans borrow it read-only, so a
/// single definition can serve any number of concurrent scans.
#[derive(Debug, Clone)]
pub struct LanguageDefinition {
    name: String,
    states: Vec<State>,
    rules: Vec<Rule>,
    index: HashMap<String, StateId>,
    start: StateId,
    entry: Vec<StateId>,
    keywords: HashSet<String>,
    declarations: HashSet<String>,
    constants: HashSet<String>,
    control: HashSet<String>,
}

impl LanguageDefinition {
    pub fn builder(name: impl Into<String>) -> DefinitionBuilder {
        DefinitionBuilder::new(name)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The bottom of every scan's state stack.
    pub fn start_state(&self) -> StateId {
        self.start
    }

    /// States pushed above the start state when a scan begins.
    pub fn entry_states(&self) -> &[StateId] {
        &self.entry
    }

    pub fn state_id(&self, name: &str) -> Option<StateId> {
        self.index.get(name).copied()
    }

    pub fn state(&self, id: StateId) -> &State {
        &self.states[id.0]
    }

    pub fn states(&self) -> impl Iterator<Item = &State> {
        self.states.iter()
    }

    pub fn rule(&self, id: RuleId) -> &Rule {
        &self.rules[id.0]
    }

    /// Flattened rules of a state, in match order.
    pub fn rules(&self, id: StateId) -> impl Iterator<Item = (RuleId, &Rule)> {
        self.states[id.0]
            .rules
            .iter()
            .map(move |&rule_id| (rule_id, &self.rules[rule_id.0]))
    }

    pub fn is_keyword(&self, word: &str) -> bool {
        self.keywords.contains(word)
    }

    pub fn is_declaration(&self, word: &str) -> bool {
        self.declarations.contains(word)
    }

    pub fn is_constant(&self, word: &str) -> bool {
        self.constants.contains(word)
    }

    pub fn is_control(&self, word: &str) -> bool {
        self.control.contains(word)
    }

    /// Lazily tokenize `source` with default options.
    pub fn lex<'def, 'src>(&'def self, source: &'src str) -> Tokens<'def, 'src> {
        Tokens::new(self, source, ScanOptions::default())
    }

    pub fn lex_with<'def, 'src>(
        &'def self,
        source: &'src str,
        options: ScanOptions,
    ) -> Tokens<'def, 'src> {
        Tokens::new(self, source, options)
    }
}

/// Authoring surface for a language table.
///
/// ```
/// use glu_lexer::{LanguageDefinition, TokenKind, Transition};
///
/// let def = LanguageDefinition::builder("tiny")
///     .state("root", |s| {
///         s.rule(r"\s+", TokenKind::Text)
///             .rule_then(r"\(", TokenKind::Punctuation, Transition::push("paren"))
///             .rule(r"\w+", TokenKind::Name)
///     })
///     .state("paren", |s| {
///         s.rule_then(r"\)", TokenKind::Punctuation, Transition::Pop)
///             .mixin("root")
///     })
///     .build()
///     .unwrap();
///
/// let text: String = def.lex("(a b)").map(|t| t.text).collect();
/// assert_eq!(text, "(a b)");
/// ```
#[derive(Debug, Clone)]
pub struct DefinitionBuilder {
    name: String,
    start: String,
    entry: Vec<String>,
    states: Vec<(String, Vec<Entry>)>,
    keywords: HashSet<String>,
    declarations: HashSet<String>,
    constants: HashSet<String>,
    control: HashSet<String>,
}

impl DefinitionBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            start: "root".to_string(),
            entry: Vec::new(),
            states: Vec::new(),
            keywords: HashSet::new(),
            declarations: HashSet::new(),
            constants: HashSet::new(),
            control: HashSet::new(),
        }
    }

    /// Bottom state of the stack (defaults to `root`).
    pub fn start(mut self, state: impl Into<String>) -> Self {
        self.start = state.into();
        self
    }

    /// Push `state` on top of the start state when a scan begins.
    pub fn entry(mut self, state: impl Into<String>) -> Self {
        self.entry.push(state.into());
        self
    }

    pub fn keywords<I, S>(mut self, words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.keywords.extend(words.into_iter().map(Into::into));
        self
    }

    pub fn declarations<I, S>(mut self, words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.declarations.extend(words.into_iter().map(Into::into));
        self
    }

    pub fn constants<I, S>(mut self, words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.constants.extend(words.into_iter().map(Into::into));
        self
    }

    /// Words never classified as calls, even when followed by `(`.
    pub fn control_words<I, S>(mut self, words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.control.extend(words.into_iter().map(Into::into));
        self
    }

    pub fn state(
        mut self,
        name: impl Into<String>,
        body: impl FnOnce(StateBuilder) -> StateBuilder,
    ) -> Self {
        let state = body(StateBuilder::default());
        self.states.push((name.into(), state.entries));
        self
    }

    /// Compile every pattern, resolve state names and flatten mixins.
    pub fn build(self) -> Result<LanguageDefinition, DefinitionError> {
        if self.states.is_empty() {
            return Err(DefinitionError::EmptyStateTable {
                language: self.name,
            });
        }

        let mut index = HashMap::new();
        for (i, (name, _)) in self.states.iter().enumerate() {
            if index.insert(name.clone(), StateId(i)).is_some() {
                return Err(DefinitionError::DuplicateState { state: name.clone() });
            }
        }

        let start = *index
            .get(&self.start)
            .ok_or_else(|| DefinitionError::MissingStartState {
                state: self.start.clone(),
            })?;
        let entry = self
            .entry
            .iter()
            .map(|name| {
                index.get(name).copied().ok_or_else(|| DefinitionError::UnknownState {
                    state: self.start.clone(),
                    target: name.clone(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        // Compile each state's own rules into the arena; mixins stay symbolic.
        let mut rules = Vec::new();
        let mut bodies = Vec::with_capacity(self.states.len());
        for (name, entries) in &self.states {
            let mut body = Vec::with_capacity(entries.len());
            for entry in entries {
                match entry {
                    Entry::Rule(spec) => {
                        body.push(Item::Rule(RuleId(rules.len())));
                        rules.push(compile_rule(name, spec, &index)?);
                    }
                    Entry::Mixin(mixin) => {
                        let target = index.get(mixin).copied().ok_or_else(|| {
                            DefinitionError::UnresolvedMixin {
                                state: name.clone(),
                                mixin: mixin.clone(),
                            }
                        })?;
                        body.push(Item::Mixin(target));
                    }
                }
            }
            bodies.push(body);
        }

        let mut flattener = Flattener {
            names: &self.states,
            bodies: &bodies,
            resolved: vec![None; bodies.len()],
            visiting: Vec::new(),
        };
        let mut states = Vec::with_capacity(bodies.len());
        for (i, (name, _)) in self.states.iter().enumerate() {
            let rules = flattener.resolve(StateId(i))?;
            states.push(State {
                name: name.clone(),
                rules,
            });
        }

        debug!(
            language = %self.name,
            states = states.len(),
            rules = rules.len(),
            "built language definition"
        );

        Ok(LanguageDefinition {
            name: self.name,
            states,
            rules,
            index,
            start,
            entry,
            keywords: self.keywords,
            declarations: self.declarations,
            constants: self.constants,
            control: self.control,
        })
    }
}

/// Ordered body of one state.
#[derive(Debug, Clone, Default)]
pub struct StateBuilder {
    entries: Vec<Entry>,
}

impl StateBuilder {
    /// Emit the whole match as `kind` and stay in the current state.
    pub fn rule(self, pattern: impl Into<String>, kind: TokenKind) -> Self {
        self.with(pattern, Action::Emit(kind), Transition::None)
    }

    pub fn rule_then(self, pattern: impl Into<String>, kind: TokenKind, transition: Transition) -> Self {
        self.with(pattern, Action::Emit(kind), transition)
    }

    pub fn groups(self, pattern: impl Into<String>, kinds: impl Into<Vec<TokenKind>>) -> Self {
        self.with(pattern, Action::EmitGroups(kinds.into()), Transition::None)
    }

    pub fn classify(self, pattern: impl Into<String>, classifier: crate::Classifier) -> Self {
        self.with(pattern, Action::Classify(classifier), Transition::None)
    }

    pub fn fallthrough(self, pattern: impl Into<String>, transition: Transition) -> Self {
        self.with(pattern, Action::Fallthrough, transition)
    }

    pub fn with(mut self, pattern: impl Into<String>, action: Action, transition: Transition) -> Self {
        self.entries.push(Entry::Rule(RuleSpec {
            pattern: pattern.into(),
            action,
            transition,
        }));
        self
    }

    /// Splice another state's rules in at this point.
    pub fn mixin(mut self, state: impl Into<String>) -> Self {
        self.entries.push(Entry::Mixin(state.into()));
        self
    }
}

#[derive(Debug, Clone, Copy)]
enum Item {
    Rule(RuleId),
    Mixin(StateId),
}

fn compile_rule(
    state: &str,
    spec: &RuleSpec,
    index: &HashMap<String, StateId>,
) -> Result<Rule, DefinitionError> {
    let pattern = Regex::new(&format!(r"\A(?:{})", spec.pattern)).map_err(|source| {
        DefinitionError::InvalidPattern {
            state: state.to_string(),
            pattern: spec.pattern.clone(),
            source,
        }
    })?;

    if let Action::EmitGroups(kinds) = &spec.action {
        let found = pattern.captures_len() - 1;
        if found != kinds.len() {
            return Err(DefinitionError::GroupCountMismatch {
                state: state.to_string(),
                pattern: spec.pattern.clone(),
                expected: kinds.len(),
                found,
            });
        }
    }

    let transition = spec.transition.clone().try_map(|target| {
        index
            .get(&target)
            .copied()
            .ok_or_else(|| DefinitionError::UnknownState {
                state: state.to_string(),
                target,
            })
    })?;

    Ok(Rule {
        pattern,
        source: spec.pattern.clone(),
        action: spec.action.clone(),
        transition,
    })
}

/// Depth-first mixin expansion with memoization and cycle detection.
struct Flattener<'a> {
    names: &'a [(String, Vec<Entry>)],
    bodies: &'a [Vec<Item>],
    resolved: Vec<Option<Vec<RuleId>>>,
    visiting: Vec<StateId>,
}

impl Flattener<'_> {
    fn resolve(&mut self, id: StateId) -> Result<Vec<RuleId>, DefinitionError> {
        if let Some(rules) = &self.resolved[id.0] {
            return Ok(rules.clone());
        }
        if let Some(pos) = self.visiting.iter().position(|&v| v == id) {
            let mut cycle: Vec<String> = self.visiting[pos..]
                .iter()
                .map(|v| self.names[v.0].0.clone())
                .collect();
            cycle.push(self.names[id.0].0.clone());
            return Err(DefinitionError::MixinCycle { cycle });
        }

        self.visiting.push(id);
        let mut rules = Vec::new();
        for item in &self.bodies[id.0] {
            match *item {
                Item::Rule(rule) => rules.push(rule),
                Item::Mixin(target) => rules.extend(self.resolve(target)?),
            }
        }
        self.visiting.pop();

        self.resolved[id.0] = Some(rules.clone());
        Ok(rules)
    }
}
