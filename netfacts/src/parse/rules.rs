//! Declarative line grammar: ordered `(pattern, handler)` rules.
//!
//! Rules are grouped into three phases that are always evaluated in the same
//! order for every line:
//!
//! 1. [`Phase::Open`] rules open a new entity (`BGP neighbor is ...`).
//! 2. [`Phase::Scope`] rules move between sub-scopes (`For address family: ...`).
//! 3. [`Phase::Field`] rules extract values into the current record.
//!
//! Within a phase, rules run in the order they were added. The first rule
//! whose guard holds and whose pattern matches consumes the line. A rule
//! marked [`fallthrough`](RuleTableBuilder::fallthrough) runs its handler but
//! lets evaluation continue with the next rule.

use std::fmt;

use regex::{Captures, Regex};

/// Evaluation phase of a rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Phase {
    /// Opens an entity scope.
    Open,
    /// Changes the sub-scope.
    Scope,
    /// Extracts fields.
    Field,
}

/// Handler run when a rule matches.
pub type Action<S> = fn(&mut S, &Captures<'_>);

/// Predicate over the scan state that gates a rule.
pub type Guard<S> = fn(&S) -> bool;

/// A single line rule.
pub struct Rule<S> {
    name: &'static str,
    phase: Phase,
    pattern: Regex,
    guard: Option<Guard<S>>,
    action: Action<S>,
    fallthrough: bool,
}

impl<S> Rule<S> {
    /// Rule name, unique within its table.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Phase the rule runs in.
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Whether the pattern matches `line`, ignoring the guard.
    pub fn is_match(&self, line: &str) -> bool {
        self.pattern.is_match(line)
    }

    /// Whether the guard admits this rule for `state`.
    pub fn applies(&self, state: &S) -> bool {
        self.guard.is_none_or(|guard| guard(state))
    }

    /// Run the rule against one line. Returns `true` if it matched.
    pub fn apply(&self, state: &mut S, line: &str) -> bool {
        if !self.applies(state) {
            return false;
        }
        match self.pattern.captures(line) {
            Some(caps) => {
                (self.action)(state, &caps);
                true
            }
            None => false,
        }
    }
}

impl<S> fmt::Debug for Rule<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rule")
            .field("name", &self.name)
            .field("phase", &self.phase)
            .field("pattern", &self.pattern.as_str())
            .field("guarded", &self.guard.is_some())
            .field("fallthrough", &self.fallthrough)
            .finish()
    }
}

/// Ordered rule table for one parser.
pub struct RuleTable<S> {
    rules: Vec<Rule<S>>,
}

impl<S> RuleTable<S> {
    /// Start building a table.
    pub fn builder() -> RuleTableBuilder<S> {
        RuleTableBuilder {
            rules: Vec::new(),
            error: None,
            last_ok: false,
        }
    }

    /// Feed one line through the table.
    ///
    /// Returns the name of the rule that consumed the line, or `None` when
    /// no rule did. Unmatched lines leave `state` untouched unless a
    /// fallthrough rule fired.
    pub fn dispatch(&self, state: &mut S, line: &str) -> Option<&'static str> {
        for rule in &self.rules {
            if rule.apply(state, line) && !rule.fallthrough {
                return Some(rule.name);
            }
        }
        None
    }

    /// Look a rule up by name.
    pub fn rule(&self, name: &str) -> Option<&Rule<S>> {
        self.rules.iter().find(|r| r.name == name)
    }

    /// Iterate over rules in evaluation order.
    pub fn iter(&self) -> impl Iterator<Item = &Rule<S>> {
        self.rules.iter()
    }

    /// Number of rules.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// True if the table has no rules.
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl<S> fmt::Debug for RuleTable<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(&self.rules).finish()
    }
}

/// Builder for [`RuleTable`].
///
/// The first pattern that fails to compile is reported by [`build`](Self::build).
pub struct RuleTableBuilder<S> {
    rules: Vec<Rule<S>>,
    error: Option<regex::Error>,
    last_ok: bool,
}

impl<S> RuleTableBuilder<S> {
    fn push(mut self, phase: Phase, name: &'static str, pattern: &str, action: Action<S>) -> Self {
        match Regex::new(pattern) {
            Ok(pattern) => {
                self.rules.push(Rule {
                    name,
                    phase,
                    pattern,
                    guard: None,
                    action,
                    fallthrough: false,
                });
                self.last_ok = true;
            }
            Err(e) => {
                self.error.get_or_insert(e);
                self.last_ok = false;
            }
        }
        self
    }

    /// Add an entity-open rule.
    pub fn open(self, name: &'static str, pattern: &str, action: Action<S>) -> Self {
        self.push(Phase::Open, name, pattern, action)
    }

    /// Add a scope-transition rule.
    pub fn scope(self, name: &'static str, pattern: &str, action: Action<S>) -> Self {
        self.push(Phase::Scope, name, pattern, action)
    }

    /// Add a field-extraction rule.
    pub fn field(self, name: &'static str, pattern: &str, action: Action<S>) -> Self {
        self.push(Phase::Field, name, pattern, action)
    }

    /// Gate the previously added rule on `guard`.
    pub fn when(mut self, guard: Guard<S>) -> Self {
        if self.last_ok {
            if let Some(rule) = self.rules.last_mut() {
                rule.guard = Some(guard);
            }
        }
        self
    }

    /// Let the previously added rule pass the line on after it fires.
    pub fn fallthrough(mut self) -> Self {
        if self.last_ok {
            if let Some(rule) = self.rules.last_mut() {
                rule.fallthrough = true;
            }
        }
        self
    }

    /// Finish the table, ordering rules by phase.
    pub fn build(self) -> Result<RuleTable<S>, regex::Error> {
        if let Some(e) = self.error {
            return Err(e);
        }
        let mut rules = self.rules;
        rules.sort_by_key(|r| r.phase);
        Ok(RuleTable { rules })
    }
}
