use std::fmt;

use hk_graph::GraphError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConvertError {
    /// Routing was attempted before the classification pass ran.
    #[error("entities routed before preprocessing completed")]
    PreprocessingIncomplete,

    #[error(transparent)]
    Graph(#[from] GraphError),

    #[error("no context record `{id}` among the entities")]
    MissingContext { id: String },
}

pub type Result<T> = std::result::Result<T, ConvertError>;

/// Why the Reader left an entity out of the context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum SkipReason {
    /// A link whose connector and binds match no ontology element.
    UnrecognizedLink { connector: String },
    /// A link belonging to a context other than the one being read.
    ForeignParent { parent: String },
    /// A required bind role is empty.
    MissingBind { role: String },
    /// A compound expression that contains itself.
    CyclicExpression { head: String },
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::UnrecognizedLink { connector } => {
                write!(f, "unrecognized link shape (connector `{connector}`)")
            }
            SkipReason::ForeignParent { parent } => write!(f, "belongs to context `{parent}`"),
            SkipReason::MissingBind { role } => write!(f, "missing `{role}` bind"),
            SkipReason::CyclicExpression { head } => {
                write!(f, "expression `{head}` refers to itself")
            }
        }
    }
}
