//! Context-qualified identifiers.
//!
//! ```text
//! ifi    := part ("#" part)*
//! part   := "<" ifi ">" | atom
//! atom   := (QUOTED | PLAIN)*        QUOTED := '"' [^"]* '"'   PLAIN := [^#<>"]+
//! ```
//!
//! Parts fold to the left, so `a#b#c` reads as `(a#b)#c`. The ontology layer
//! builds identities with [`Ifi::qualify`]: a context `<ctx>` and an element
//! `<http://ex.org/o#Person>` give `<ctx>#<http://ex.org/o#Person>`, and a
//! child context nests one level deeper (`<root>#<child>#<element>`).

use std::fmt;

use nom::{
    branch::alt,
    bytes::complete::{take_while, take_while1},
    character::complete::char as pchar,
    combinator::{all_consuming, map, recognize},
    multi::many0,
    sequence::{delimited, pair, preceded},
    IResult,
};
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid IFI syntax at offset {offset} in `{input}`")]
pub struct IfiSyntaxError {
    pub input: String,
    pub offset: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum IfiPart {
    Atom(String),
    Nested(Box<Ifi>),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Ifi {
    artifact: IfiPart,
    fragment: Option<IfiPart>,
}

impl IfiPart {
    /// Atom part. Fails when `text` contains `#`, `<`, `>` or an unbalanced `"`.
    pub fn atom(text: impl Into<String>) -> Result<Self, IfiSyntaxError> {
        let text = text.into();
        let checked = all_consuming(atom)(text.as_str())
            .map(|_| ())
            .map_err(|err| syntax_error(&text, err));
        checked.map(|()| IfiPart::Atom(text))
    }

    /// Bracketed part designating an IRI. Characters the grammar reserves for
    /// nesting are percent-encoded first, so this never fails.
    pub fn iri(iri: &str) -> Self {
        let encoded = iri
            .replace('<', "%3C")
            .replace('>', "%3E")
            .replace('"', "%22");
        match Ifi::parse(&encoded) {
            Ok(inner) => IfiPart::Nested(Box::new(inner)),
            Err(_) => IfiPart::Nested(Box::new(Ifi::from_part(IfiPart::Atom(
                encoded.replace('#', "%23"),
            )))),
        }
    }

    /// Text without the surrounding brackets.
    pub fn text(&self) -> String {
        match self {
            IfiPart::Atom(s) => s.clone(),
            IfiPart::Nested(ifi) => ifi.to_string(),
        }
    }
}

impl Ifi {
    pub fn from_part(artifact: IfiPart) -> Self {
        Self {
            artifact,
            fragment: None,
        }
    }

    pub fn new(artifact: IfiPart, fragment: Option<IfiPart>) -> Self {
        Self { artifact, fragment }
    }

    /// Identity of a root-level IRI: `<iri>`.
    pub fn from_iri(iri: &str) -> Self {
        Ifi::from_part(IfiPart::iri(iri))
    }

    /// Identity of `iri` declared inside the context identified by `context`.
    pub fn qualify(context: &Ifi, iri: &str) -> Self {
        let artifact = if context.fragment.is_none() {
            context.artifact.clone()
        } else {
            IfiPart::Nested(Box::new(context.clone()))
        };
        Self {
            artifact,
            fragment: Some(IfiPart::iri(iri)),
        }
    }

    pub fn parse(text: &str) -> Result<Self, IfiSyntaxError> {
        all_consuming(ifi)(text)
            .map(|(_, v)| v)
            .map_err(|err| syntax_error(text, err))
    }

    pub fn artifact(&self) -> &IfiPart {
        &self.artifact
    }

    pub fn fragment(&self) -> Option<&IfiPart> {
        self.fragment.as_ref()
    }

    /// True for identities produced by [`Ifi::qualify`].
    pub fn is_qualified(&self) -> bool {
        matches!(self.fragment, Some(IfiPart::Nested(_)))
    }

    /// The bracketed key of a qualified identity (the element's IRI).
    pub fn key(&self) -> Option<&Ifi> {
        match &self.fragment {
            Some(IfiPart::Nested(key)) => Some(key),
            _ => None,
        }
    }

    /// Identity of the context a qualified identity was declared in.
    pub fn context(&self) -> Option<Ifi> {
        if !self.is_qualified() {
            return None;
        }
        Some(match &self.artifact {
            IfiPart::Nested(inner) if inner.is_qualified() => (**inner).clone(),
            other => Ifi::from_part(other.clone()),
        })
    }

    /// IRI of a root-level identity built by [`Ifi::from_iri`].
    pub fn root_iri(&self) -> Option<String> {
        match (&self.artifact, &self.fragment) {
            (IfiPart::Nested(inner), None) => Some(inner.to_string()),
            _ => None,
        }
    }
}

fn syntax_error(text: &str, err: nom::Err<nom::error::Error<&str>>) -> IfiSyntaxError {
    let offset = match err {
        nom::Err::Error(e) | nom::Err::Failure(e) => text.len() - e.input.len(),
        nom::Err::Incomplete(_) => text.len(),
    };
    IfiSyntaxError {
        input: text.to_string(),
        offset,
    }
}

// ============================================================================
// Parser
// ============================================================================

fn atom(input: &str) -> IResult<&str, &str> {
    recognize(many0(alt((
        recognize(delimited(pchar('"'), take_while(|c| c != '"'), pchar('"'))),
        take_while1(|c| !matches!(c, '#' | '<' | '>' | '"')),
    ))))(input)
}

fn part(input: &str) -> IResult<&str, IfiPart> {
    alt((
        map(delimited(pchar('<'), ifi, pchar('>')), |inner| {
            IfiPart::Nested(Box::new(inner))
        }),
        map(atom, |s| IfiPart::Atom(s.to_string())),
    ))(input)
}

fn ifi(input: &str) -> IResult<&str, Ifi> {
    let (input, (first, rest)) = pair(part, many0(preceded(pchar('#'), part)))(input)?;
    let folded = rest.into_iter().fold(Ifi::from_part(first), |acc, next| {
        if acc.fragment.is_none() {
            Ifi {
                artifact: acc.artifact,
                fragment: Some(next),
            }
        } else {
            Ifi {
                artifact: IfiPart::Nested(Box::new(acc)),
                fragment: Some(next),
            }
        }
    });
    Ok((input, folded))
}

// ============================================================================
// Printer
// ============================================================================

impl fmt::Display for Ifi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.artifact {
            IfiPart::Atom(s) => write!(f, "{s}")?,
            // A left-folded chain prints without brackets.
            IfiPart::Nested(inner) if inner.fragment.is_some() && self.fragment.is_some() => {
                write!(f, "{inner}")?
            }
            IfiPart::Nested(inner) => write!(f, "<{inner}>")?,
        }
        match &self.fragment {
            None => Ok(()),
            Some(IfiPart::Atom(s)) => write!(f, "#{s}"),
            Some(IfiPart::Nested(inner)) => write!(f, "#<{inner}>"),
        }
    }
}

impl std::str::FromStr for Ifi {
    type Err = IfiSyntaxError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ifi::parse(s)
    }
}

impl Serialize for Ifi {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Ifi {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Ifi::parse(&text).map_err(de::Error::custom)
    }
}
