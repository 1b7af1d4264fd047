//! Lazy bind validation.
//!
//! The graph accepts links whose binds do not match their connector; this
//! pass reports those mismatches for consumers that care.

use hk_fi::{parse_fi, LAMBDA};
use serde::{Deserialize, Serialize};

use crate::entity::{Entity, RoleType};
use crate::graph::Graph;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Severity {
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "issue", rename_all = "snake_case")]
pub enum BindIssue {
    /// The connector was never added; only a stub exists.
    UndefinedConnector { connector: String },
    /// The role is not declared by the connector.
    UndeclaredRole { role: String },
    /// The role is declared with role type `n`.
    UntypedRole { role: String },
    /// The anchor key is neither `λ` nor an FI anchor chain.
    MalformedAnchor { entity: String, anchor: String },
    /// The anchor key is not one of the bound entity's interfaces.
    UnknownAnchor { entity: String, anchor: String },
}

impl BindIssue {
    pub fn severity(&self) -> Severity {
        match self {
            BindIssue::MalformedAnchor { .. } => Severity::Error,
            _ => Severity::Warning,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BindViolation {
    pub link: String,
    pub issue: BindIssue,
}

/// Anchor keys are the anchor part of an FI, e.g. `page(2).line`.
fn is_anchor_chain(key: &str) -> bool {
    parse_fi(&format!("_.{key}")).is_ok()
}

/// Reports every bind that disagrees with its connector or target.
pub fn validate(graph: &Graph) -> Vec<BindViolation> {
    let mut out = Vec::new();
    for entity in graph.entities() {
        let Entity::Link(link) = entity else {
            continue;
        };
        let mut push = |issue| {
            out.push(BindViolation {
                link: link.id.clone(),
                issue,
            })
        };

        let connector = graph.get(link.connector_id()).and_then(Entity::as_connector);
        let defined = connector.filter(|_| !graph.is_stub(link.connector_id()));
        if defined.is_none() {
            push(BindIssue::UndefinedConnector {
                connector: link.connector_id().to_string(),
            });
        }

        for (role, targets) in &link.binds {
            if let Some(connector) = defined {
                match connector.roles.get(role) {
                    None => push(BindIssue::UndeclaredRole { role: role.clone() }),
                    Some(RoleType::None) => push(BindIssue::UntypedRole { role: role.clone() }),
                    Some(_) => {}
                }
            }
            for (target, anchors) in targets {
                for anchor in anchors.iter().filter(|a| a.as_str() != LAMBDA) {
                    if !is_anchor_chain(anchor) {
                        push(BindIssue::MalformedAnchor {
                            entity: target.clone(),
                            anchor: anchor.clone(),
                        });
                        continue;
                    }
                    let declared = match graph.get(target) {
                        Some(e) if !graph.is_stub(target) => e
                            .interfaces()
                            .map(|i| i.contains_key(anchor.as_str()))
                            .unwrap_or(true),
                        _ => true,
                    };
                    if !declared {
                        push(BindIssue::UnknownAnchor {
                            entity: target.clone(),
                            anchor: anchor.clone(),
                        });
                    }
                }
            }
        }
    }
    out
}
