//! # HyperKnowledge Converter
//!
//! Lossless conversion between the hypergraph encoding of a context and its
//! ontology model. [`Writer`] turns an [`hk_ontology::HkoContext`] into graph
//! entities; [`Reader`] turns those entities back into elements, so that
//! reading what was written yields the original element set.
//!
//! ```text
//! Concept A        node <A>            + instanceOf link -> hko#Concept
//! Property p       connector <p>       + instanceOf link -> hko#Property
//! (exists p C)     blank node _:<uuid> + `exists` link {head_concept, property, concept}
//! (subconcept A B) `subConceptOf` link {sub, sup}
//! (C i)            instanceOf link {subject: i, object: C}
//! (p a b)          link with connector <p> {subject, object}
//! (p a "v")        node <a> properties {"<p>": "v"}
//! ```

pub mod constants;
pub mod error;
pub mod persist;
pub mod reader;
pub mod writer;

pub use error::{ConvertError, Result, SkipReason};
pub use persist::{context_from_records, load_context, save_context};
pub use reader::{context_from_entities, ReadReport, Reader, ReaderConfig, SkippedEntity};
pub use writer::{Writer, WriterConfig};
