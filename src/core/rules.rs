// src/core/rules.rs

//! # Rule Evaluator
//!
//! Rules are boolean `evalexpr` expressions evaluated against a flat view of a
//! [`Target`]. A rule that fails to parse or evaluate simply does not match.
//!
//! Available identifiers: `PROVIDER_NAME`, `PROVIDER_TYPE`, `ID`, `NAME`,
//! `DISPLAY_NAME`, `DESCRIPTION`, `WEB`, `START_DIRECTORY`, `TAGS` (a tuple),
//! and one `CONTEXT.<key>` string per context entry. `has_tag("x")` tests tags.

use crate::models::Target;
use evalexpr::{
    ContextWithMutableFunctions, ContextWithMutableVariables, EvalexprError, Function,
    HashMapContext, Value,
};
use std::fmt;

/// Evaluation environment for rules, built once per target.
pub struct RuleContext {
    inner: HashMapContext,
}

impl fmt::Debug for RuleContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RuleContext").finish_non_exhaustive()
    }
}

impl RuleContext {
    pub fn from_target(target: &Target) -> Self {
        let mut inner = HashMapContext::new();

        let scalars = [
            ("PROVIDER_NAME", target.provider_name.clone()),
            ("PROVIDER_TYPE", target.provider_type.clone()),
            ("ID", target.id.clone()),
            ("NAME", target.name.clone()),
            ("DISPLAY_NAME", target.display_name.clone()),
            ("DESCRIPTION", target.description.clone()),
            ("WEB", target.web.clone()),
            ("START_DIRECTORY", target.start_directory_template()),
        ];
        for (key, value) in scalars {
            set(&mut inner, key.to_string(), Value::String(value));
        }

        for (key, value) in &target.context {
            set(&mut inner, format!("CONTEXT.{}", key), Value::String(value.clone()));
        }

        let tags: Vec<Value> = target.tags.iter().cloned().map(Value::String).collect();
        set(&mut inner, "TAGS".to_string(), Value::Tuple(tags));

        let known_tags = target.tags.clone();
        let has_tag = Function::new(move |argument: &Value| {
            let wanted = argument.as_string()?;
            Ok(Value::Boolean(known_tags.iter().any(|t| *t == wanted)))
        });
        if let Err(e) = inner.set_function("has_tag".to_string(), has_tag) {
            log::debug!("Could not register has_tag(): {}", e);
        }

        Self { inner }
    }

    /// Evaluates one rule. Errors are reported, never propagated past `evaluate`.
    fn eval(&self, rule: &str) -> Result<bool, EvalexprError> {
        evalexpr::eval_boolean_with_context(rule, &self.inner)
    }
}

fn set(context: &mut HashMapContext, key: String, value: Value) {
    if let Err(e) = context.set_value(key.clone(), value) {
        log::debug!("Could not expose '{}' to rules: {}", key, e);
    }
}

/// Counts how many `rules` evaluate to `true`.
///
/// Malformed rules and rules that do not produce a boolean count as non-matching.
pub fn evaluate(rules: &[String], context: &RuleContext) -> usize {
    rules
        .iter()
        .filter(|rule| match context.eval(rule) {
            Ok(matched) => matched,
            Err(e) => {
                log::debug!("Rule '{}' did not evaluate: {}", rule, e);
                false
            }
        })
        .count()
}

/// An empty rule list always passes; otherwise at least one rule must match.
pub fn passes(rules: &[String], context: &RuleContext) -> bool {
    rules.is_empty() || evaluate(rules, context) > 0
}
