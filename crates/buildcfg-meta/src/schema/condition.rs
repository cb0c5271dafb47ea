//! Preset `condition` expressions
//!
//! A condition is either a JSON boolean / `null` literal or an object tagged
//! by `type`. Evaluation needs macro expansion and lives with the resolver;
//! this module only describes the shape.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Condition {
    /// `true`, `false`. `null` deserializes to `None` on the owning field.
    Literal(bool),
    Expr(Box<ConditionExpr>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ConditionExpr {
    Const {
        value: bool,
    },
    Equals {
        lhs: String,
        rhs: String,
    },
    NotEquals {
        lhs: String,
        rhs: String,
    },
    InList {
        string: String,
        list: Vec<String>,
    },
    NotInList {
        string: String,
        list: Vec<String>,
    },
    Matches {
        string: String,
        regex: String,
    },
    NotMatches {
        string: String,
        regex: String,
    },
    AnyOf {
        conditions: Vec<Condition>,
    },
    AllOf {
        conditions: Vec<Condition>,
    },
    Not {
        condition: Box<Condition>,
    },
}
