//! HyperKnowledge identifiers
//!
//! Two small grammars name things inside a HyperKnowledge graph:
//!
//! - **FI** (fragment identifier): an artifact id followed by a chain of
//!   anchors, e.g. `mytext.subtext({start: 2, end: 50})`. It addresses a
//!   sub-part of a node through the node's interfaces.
//! - **IFI** (context-qualified identifier): `artifact#fragment`, where either
//!   side may itself be a bracketed IFI. The ontology layer uses it to give
//!   concepts, properties and individuals an identity that includes the
//!   context they were declared in.
//!
//! Both are parsed with `nom` and printed back through `Display`; the printed
//! form always re-parses to an equal value.

pub mod fi;
pub mod ifi;
pub mod parser;

pub use fi::{Fi, FiAnchor, FiArtifact, FiKey, FiOperator, FiToken, Hkid};
pub use ifi::{Ifi, IfiPart, IfiSyntaxError};
pub use parser::{parse_anchor, parse_fi, parse_hkid, FiSyntaxError};

/// Anchor key that binds a whole entity rather than one of its interfaces.
pub const LAMBDA: &str = "λ";
