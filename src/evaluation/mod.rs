use serde::de::{Deserializer, MapAccess, Visitor};
use serde::Deserialize;
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;
use thiserror::Error;

// Per-request attribute bag rules are matched against (e.g. tier -> "premium")
pub type EvaluationContext = HashMap<String, Value>;

// Complete snapshot of flags keyed by name; BTreeMap keeps flag
// iteration sorted, so repeated evaluations walk flags in the same order
pub type Ruleset = BTreeMap<String, FeatureFlag>;

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub enum ConditionAction {
    #[serde(rename = "EQUALS")]
    Equals,
    #[serde(rename = "KEY_IN_VALUE")]
    KeyInValue,
    // Catch-all so an unrecognized operator survives parsing and is
    // reported against the flag that carries it, not the whole document
    #[serde(untagged)]
    Other(String),
}

#[derive(Debug, Clone, Deserialize)]
pub struct Condition {
    pub action: ConditionAction,
    pub key: String,
    pub value: Value,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Rule {
    pub when_match: bool,
    pub conditions: Vec<Condition>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FeatureFlag {
    pub default: bool,
    // Rule insertion order is evaluation order, so the JSON object order
    // must survive deserialization
    #[serde(default, deserialize_with = "rules_in_document_order")]
    pub rules: Vec<(String, Rule)>,
}

#[derive(Debug, Error, PartialEq)]
pub enum RulesetError {
    #[error("unknown condition action `{action}` in rules for flag `{flag}`")]
    UnknownAction { flag: String, action: String },
}

/// Evaluate every flag in the ruleset and return the names of the enabled
/// ones. Fails on the first flag whose rules carry an unrecognized
/// operator; the engine holds no state, so the remaining flags can still
/// be evaluated individually through [`evaluate_flag`].
pub fn evaluate(
    flags: &Ruleset,
    context: &EvaluationContext,
) -> Result<BTreeSet<String>, RulesetError> {
    let mut enabled = BTreeSet::new();

    for (name, flag) in flags {
        if evaluate_flag(name, flag, context)? {
            enabled.insert(name.clone());
        }
    }

    Ok(enabled)
}

/// Evaluate a single flag against the context. Rules are consulted in
/// their defined order and the first matching rule decides the value;
/// with no matching rule the flag falls back to its default.
pub fn evaluate_flag(
    name: &str,
    flag: &FeatureFlag,
    context: &EvaluationContext,
) -> Result<bool, RulesetError> {
    for (_, rule) in &flag.rules {
        if rule_matches(name, rule, context)? {
            return Ok(rule.when_match);
        }
    }

    Ok(flag.default)
}

// A rule matches iff all of its conditions hold; stops at the first
// condition that does not
fn rule_matches(
    flag: &str,
    rule: &Rule,
    context: &EvaluationContext,
) -> Result<bool, RulesetError> {
    for condition in &rule.conditions {
        if !condition_holds(flag, condition, context)? {
            return Ok(false);
        }
    }

    Ok(true)
}

fn condition_holds(
    flag: &str,
    condition: &Condition,
    context: &EvaluationContext,
) -> Result<bool, RulesetError> {
    // An attribute the caller never supplied is a non-match, not an
    // error: the feature stays off rather than failing the request
    let attribute = match context.get(&condition.key) {
        Some(value) => value,
        None => return Ok(false),
    };

    match &condition.action {
        ConditionAction::Equals => Ok(attribute == &condition.value),
        ConditionAction::KeyInValue => Ok(condition
            .value
            .as_array()
            .map_or(false, |allowed| allowed.contains(attribute))),
        ConditionAction::Other(action) => Err(RulesetError::UnknownAction {
            flag: flag.to_string(),
            action: action.clone(),
        }),
    }
}

fn rules_in_document_order<'de, D>(deserializer: D) -> Result<Vec<(String, Rule)>, D::Error>
where
    D: Deserializer<'de>,
{
    struct RulesVisitor;

    impl<'de> Visitor<'de> for RulesVisitor {
        type Value = Vec<(String, Rule)>;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("a map of rule name to rule")
        }

        fn visit_map<A>(self, mut access: A) -> Result<Self::Value, A::Error>
        where
            A: MapAccess<'de>,
        {
            let mut rules = Vec::with_capacity(access.size_hint().unwrap_or(0));
            while let Some(entry) = access.next_entry::<String, Rule>()? {
                rules.push(entry);
            }
            Ok(rules)
        }
    }

    deserializer.deserialize_map(RulesVisitor)
}
