//! Prompt classification rules.
//!
//! A prompt is matched against a fixed, ordered table of prefix/suffix
//! phrases. The first rule that matches decides the category.

use std::sync::OnceLock;

use agentdeck_core::Category;

/// Where in the prompt a rule's phrase has to appear.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchKind {
    Prefix,
    Suffix,
}

/// One classification rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rule {
    pub kind: MatchKind,
    pub phrase: &'static str,
    pub category: Category,
}

/// The classification table, in priority order.
///
/// Suffix rules come first, so a prompt such as "search for physics notes"
/// lands in physics-notes rather than search.
pub const RULES: &[Rule] = &[
    Rule {
        kind: MatchKind::Suffix,
        phrase: "habit tracker",
        category: Category::HabitTracker,
    },
    Rule {
        kind: MatchKind::Suffix,
        phrase: "physics notes",
        category: Category::PhysicsNotes,
    },
    Rule {
        kind: MatchKind::Prefix,
        phrase: "code me an app",
        category: Category::DesktopAgent,
    },
    Rule {
        kind: MatchKind::Prefix,
        phrase: "create me an agent to",
        category: Category::CustomNotion,
    },
    Rule {
        kind: MatchKind::Prefix,
        phrase: "search for",
        category: Category::Search,
    },
];

struct CompiledRule {
    phrase: String,
    rule: Rule,
}

impl CompiledRule {
    fn matches(&self, lowered: &str) -> bool {
        match self.rule.kind {
            MatchKind::Prefix => lowered.starts_with(&self.phrase),
            MatchKind::Suffix => lowered.ends_with(&self.phrase),
        }
    }
}

/// The rule table with its phrases lower-cased for matching.
pub struct RuleSet {
    rules: Vec<CompiledRule>,
}

impl Default for RuleSet {
    fn default() -> Self {
        Self::new()
    }
}

impl RuleSet {
    /// Build the set from the built-in [`RULES`] table.
    pub fn new() -> Self {
        Self::from_rules(RULES)
    }

    /// Build the set from an arbitrary table, preserving its order.
    pub fn from_rules(rules: &[Rule]) -> Self {
        let rules = rules
            .iter()
            .map(|rule| CompiledRule {
                phrase: rule.phrase.to_lowercase(),
                rule: *rule,
            })
            .collect();
        Self { rules }
    }

    /// First rule matching the trimmed, lower-cased prompt, if any.
    ///
    /// Matching is plain `to_lowercase` followed by a prefix or suffix test;
    /// there is no Unicode case folding, so `ſ` does not stand in for `s`.
    pub fn matching_rule(&self, prompt: &str) -> Option<&Rule> {
        let lowered = prompt.trim().to_lowercase();
        if lowered.is_empty() {
            return None;
        }
        self.rules
            .iter()
            .find(|r| r.matches(&lowered))
            .map(|r| &r.rule)
    }

    /// Category of the first matching rule, if any.
    pub fn classify(&self, prompt: &str) -> Option<Category> {
        self.matching_rule(prompt).map(|r| r.category)
    }

    pub fn rules(&self) -> impl Iterator<Item = &Rule> {
        self.rules.iter().map(|r| &r.rule)
    }
}

/// Classify a prompt with the built-in rule table.
pub fn classify(prompt: &str) -> Option<Category> {
    static RULE_SET: OnceLock<RuleSet> = OnceLock::new();
    RULE_SET.get_or_init(RuleSet::new).classify(prompt)
}
