use thiserror::Error;

use crate::element::{Individual, Property, PropertyValue};

#[derive(Debug, Error)]
pub enum OntologyError {
    #[error("context {iri} is already registered")]
    DuplicateContext { iri: String },
}

#[derive(Debug, Error)]
pub enum ReasonerError {
    #[error("{subject} has {} values for {property}", values.len())]
    MultipleValues {
        subject: Individual,
        property: Property,
        values: Vec<PropertyValue>,
    },
}

pub type Result<T> = std::result::Result<T, OntologyError>;
