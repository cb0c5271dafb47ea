//! Preset condition evaluation

use crate::error::ConfigurationError;
use crate::macros::{MacroContext, expand};
use buildcfg_meta::schema::{Condition, ConditionExpr};
use regex::Regex;

/// Evaluate a preset condition. String operands are macro-expanded first.
pub fn evaluate(condition: &Condition, context: &MacroContext<'_>) -> Result<bool, ConfigurationError> {
    match condition {
        Condition::Literal(value) => Ok(*value),
        Condition::Expr(expr) => evaluate_expr(expr, context),
    }
}

fn evaluate_expr(expr: &ConditionExpr, context: &MacroContext<'_>) -> Result<bool, ConfigurationError> {
    let x = |value: &String| expand(value, context);

    Ok(match expr {
        ConditionExpr::Const { value } => *value,
        ConditionExpr::Equals { lhs, rhs } => x(lhs)? == x(rhs)?,
        ConditionExpr::NotEquals { lhs, rhs } => x(lhs)? != x(rhs)?,
        ConditionExpr::InList { string, list } => in_list(&x(string)?, list, context)?,
        ConditionExpr::NotInList { string, list } => !in_list(&x(string)?, list, context)?,
        ConditionExpr::Matches { string, regex } => matches(&x(string)?, regex, context)?,
        ConditionExpr::NotMatches { string, regex } => !matches(&x(string)?, regex, context)?,
        ConditionExpr::AnyOf { conditions } => {
            for condition in conditions {
                if evaluate(condition, context)? {
                    return Ok(true);
                }
            }
            false
        }
        ConditionExpr::AllOf { conditions } => {
            for condition in conditions {
                if !evaluate(condition, context)? {
                    return Ok(false);
                }
            }
            true
        }
        ConditionExpr::Not { condition } => !evaluate(condition, context)?,
    })
}

fn in_list(value: &str, list: &[String], context: &MacroContext<'_>) -> Result<bool, ConfigurationError> {
    for item in list {
        if expand(item, context)? == value {
            return Ok(true);
        }
    }
    Ok(false)
}

fn matches(value: &str, pattern: &str, context: &MacroContext<'_>) -> Result<bool, ConfigurationError> {
    let pattern = expand(pattern, context)?;
    let regex = Regex::new(&pattern).map_err(|e| ConfigurationError::InvalidRegex {
        preset: context.preset_name.to_string(),
        pattern: pattern.clone(),
        message: e.to_string(),
    })?;
    Ok(regex.is_match(value))
}
