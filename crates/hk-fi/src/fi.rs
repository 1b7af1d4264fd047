//! FI value types and the canonical printer.
//!
//! An FI is a left-nested chain: `a.b.c` is `((a).b).c`. Each level holds an
//! artifact and at most one anchor. The constructors below keep that shape
//! canonical (a nested artifact always carries an anchor), which is what
//! makes `parse(print(x)) == x` hold for every value built through them.

use std::fmt;

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

use crate::parser::{self, FiSyntaxError};

// ============================================================================
// Identifiers
// ============================================================================

/// Words that read as JSON literals inside a token. They are ordinary basic
/// ids everywhere else.
pub const RESERVED_WORDS: [&str; 3] = ["null", "true", "false"];

/// Identifier of an artifact or anchor indexer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Hkid {
    /// Bare token: `[_a-zA-Z][a-zA-Z0-9_-]*`.
    Basic(String),
    /// Double back-quoted text: ``` ``any text`` ```.
    Extended(String),
    /// Angle-bracketed IRI: `<http://example.org/x>`.
    Iri(String),
}

pub(crate) fn is_basic_start(c: char) -> bool {
    c == '_' || c.is_ascii_alphabetic()
}

pub(crate) fn is_basic_continue(c: char) -> bool {
    c == '_' || c == '-' || c.is_ascii_alphanumeric()
}

pub(crate) fn is_extended_char(c: char) -> bool {
    !matches!(c, '`' | '\\' | '\n' | '\r')
}

pub(crate) fn is_iri_char(c: char) -> bool {
    c.is_ascii_alphanumeric()
        || matches!(
            c,
            '!' | '#'..='/' | ':' | ';' | '=' | '?' | '@' | '[' | ']' | '_' | '|' | '~'
        )
}

impl Hkid {
    pub fn basic(text: impl Into<String>) -> Result<Self, FiSyntaxError> {
        let text = text.into();
        let mut chars = text.chars();
        let shape_ok = chars.next().is_some_and(is_basic_start) && chars.all(is_basic_continue);
        if !shape_ok {
            return Err(FiSyntaxError::new(&text, 0));
        }
        Ok(Hkid::Basic(text))
    }

    pub fn extended(text: impl Into<String>) -> Result<Self, FiSyntaxError> {
        let text = text.into();
        match text.char_indices().find(|(_, c)| !is_extended_char(*c)) {
            Some((offset, _)) => Err(FiSyntaxError::new(&text, offset)),
            None => Ok(Hkid::Extended(text)),
        }
    }

    pub fn iri(text: impl Into<String>) -> Result<Self, FiSyntaxError> {
        let text = text.into();
        match text.char_indices().find(|(_, c)| !is_iri_char(*c)) {
            Some((offset, _)) => Err(FiSyntaxError::new(&text, offset)),
            None => Ok(Hkid::Iri(text)),
        }
    }

    /// Picks the most compact legal form for `text`.
    pub fn from_text(text: &str) -> Result<Self, FiSyntaxError> {
        Hkid::basic(text)
            .or_else(|_| Hkid::iri(text))
            .or_else(|_| Hkid::extended(text))
    }

    pub fn parse(text: &str) -> Result<Self, FiSyntaxError> {
        parser::parse_hkid(text)
    }

    /// Raw text without delimiters.
    pub fn text(&self) -> &str {
        match self {
            Hkid::Basic(s) | Hkid::Extended(s) | Hkid::Iri(s) => s,
        }
    }

    pub fn is_reserved_word(&self) -> bool {
        matches!(self, Hkid::Basic(s) if RESERVED_WORDS.contains(&s.as_str()))
    }
}

impl fmt::Display for Hkid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Hkid::Basic(s) => write!(f, "{s}"),
            Hkid::Extended(s) => write!(f, "``{s}``"),
            Hkid::Iri(s) => write!(f, "<{s}>"),
        }
    }
}

// ============================================================================
// Tokens
// ============================================================================

/// Key of an object member inside a token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FiKey {
    String(String),
    Id(Hkid),
}

/// JSON-like anchor argument. Object members keep their written order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FiToken {
    Null,
    Bool(bool),
    Number(serde_json::Number),
    String(String),
    Object(Vec<(FiKey, FiToken)>),
    Array(Vec<FiToken>),
    Fi(Box<Fi>),
}

impl FiToken {
    pub fn int(value: i64) -> Self {
        FiToken::Number(value.into())
    }

    /// Nested FI token. A bare `null`, `true` or `false` would read back as a
    /// literal, so such a root is kept as an extended id.
    pub fn fi(fi: Fi) -> Self {
        FiToken::Fi(Box::new(fi.token_safe()))
    }

    /// Object token with bare-identifier keys. Keys must be valid basic ids.
    pub fn object<'a>(
        members: impl IntoIterator<Item = (&'a str, FiToken)>,
    ) -> Result<Self, FiSyntaxError> {
        let members = members
            .into_iter()
            .map(|(k, v)| Ok((FiKey::Id(Hkid::basic(k)?), v)))
            .collect::<Result<Vec<_>, FiSyntaxError>>()?;
        Ok(FiToken::Object(members))
    }

    /// Lossy view as a JSON value. Nested FIs become their printed string.
    pub fn to_json(&self) -> serde_json::Value {
        use serde_json::Value;
        match self {
            FiToken::Null => Value::Null,
            FiToken::Bool(b) => Value::Bool(*b),
            FiToken::Number(n) => Value::Number(n.clone()),
            FiToken::String(s) => Value::String(s.clone()),
            FiToken::Object(members) => Value::Object(
                members
                    .iter()
                    .map(|(k, v)| {
                        let key = match k {
                            FiKey::String(s) => s.clone(),
                            FiKey::Id(id) => id.text().to_string(),
                        };
                        (key, v.to_json())
                    })
                    .collect(),
            ),
            FiToken::Array(items) => Value::Array(items.iter().map(FiToken::to_json).collect()),
            FiToken::Fi(fi) => Value::String(fi.to_string()),
        }
    }
}

fn write_json_string(f: &mut fmt::Formatter<'_>, s: &str) -> fmt::Result {
    write!(f, "{}", serde_json::Value::String(s.to_string()))
}

impl fmt::Display for FiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FiKey::String(s) => write_json_string(f, s),
            FiKey::Id(id) => write!(f, "{id}"),
        }
    }
}

impl fmt::Display for FiToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FiToken::Null => write!(f, "null"),
            FiToken::Bool(b) => write!(f, "{b}"),
            FiToken::Number(n) => write!(f, "{n}"),
            FiToken::String(s) => write_json_string(f, s),
            FiToken::Object(members) => {
                write!(f, "{{")?;
                for (i, (k, v)) in members.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{k}: {v}")?;
                }
                write!(f, "}}")
            }
            FiToken::Array(items) => {
                write!(f, "[")?;
                for (i, v) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{v}")?;
                }
                write!(f, "]")
            }
            FiToken::Fi(fi) if fi.is_bare_reserved_word() => write!(f, "``{}``", fi.root().text()),
            FiToken::Fi(fi) => write!(f, "{fi}"),
        }
    }
}

// ============================================================================
// Anchors
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FiOperator {
    #[default]
    None,
    /// `*`: the anchor describes the artifact rather than selecting a part.
    Description,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FiAnchor {
    pub indexer: Hkid,
    pub operator: FiOperator,
    pub token: Option<FiToken>,
}

impl FiAnchor {
    pub fn new(indexer: Hkid) -> Self {
        Self {
            indexer,
            operator: FiOperator::None,
            token: None,
        }
    }

    pub fn described(mut self) -> Self {
        self.operator = FiOperator::Description;
        self
    }

    pub fn with_token(mut self, token: FiToken) -> Self {
        self.token = Some(token);
        self
    }

    pub fn parse(text: &str) -> Result<Self, FiSyntaxError> {
        parser::parse_anchor(text)
    }
}

impl fmt::Display for FiAnchor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.indexer)?;
        if self.operator == FiOperator::Description {
            write!(f, "*")?;
        }
        if let Some(token) = &self.token {
            write!(f, "({token})")?;
        }
        Ok(())
    }
}

// ============================================================================
// FI
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FiArtifact {
    Id(Hkid),
    Fi(Box<Fi>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fi {
    artifact: FiArtifact,
    anchor: Option<FiAnchor>,
}

impl Fi {
    pub fn new(id: Hkid) -> Self {
        Self {
            artifact: FiArtifact::Id(id),
            anchor: None,
        }
    }

    /// Appends one anchor to the chain.
    pub fn with_anchor(self, anchor: FiAnchor) -> Self {
        if self.anchor.is_none() {
            Self {
                artifact: self.artifact,
                anchor: Some(anchor),
            }
        } else {
            Self {
                artifact: FiArtifact::Fi(Box::new(self)),
                anchor: Some(anchor),
            }
        }
    }

    pub fn parse(text: &str) -> Result<Self, FiSyntaxError> {
        parser::parse_fi(text)
    }

    fn is_bare_reserved_word(&self) -> bool {
        self.anchor.is_none() && matches!(&self.artifact, FiArtifact::Id(id) if id.is_reserved_word())
    }

    fn token_safe(self) -> Self {
        if self.is_bare_reserved_word() {
            Fi::new(Hkid::Extended(self.root().text().to_string()))
        } else {
            self
        }
    }

    pub fn artifact(&self) -> &FiArtifact {
        &self.artifact
    }

    /// Last anchor of the chain.
    pub fn anchor(&self) -> Option<&FiAnchor> {
        self.anchor.as_ref()
    }

    /// Identifier at the root of the chain.
    pub fn root(&self) -> &Hkid {
        match &self.artifact {
            FiArtifact::Id(id) => id,
            FiArtifact::Fi(inner) => inner.root(),
        }
    }

    /// Anchors in written order.
    pub fn anchors(&self) -> Vec<&FiAnchor> {
        let mut out = match &self.artifact {
            FiArtifact::Id(_) => Vec::new(),
            FiArtifact::Fi(inner) => inner.anchors(),
        };
        out.extend(self.anchor.as_ref());
        out
    }

    /// Splits `a.b.c` into the root id `a` and the anchor text `b.c`.
    pub fn split_root(&self) -> (String, Option<String>) {
        let anchors = self.anchors();
        if anchors.is_empty() {
            return (self.root().to_string(), None);
        }
        let rest = anchors
            .iter()
            .map(|a| a.to_string())
            .collect::<Vec<_>>()
            .join(".");
        (self.root().to_string(), Some(rest))
    }
}

impl From<Hkid> for Fi {
    fn from(id: Hkid) -> Self {
        Fi::new(id)
    }
}

impl std::str::FromStr for Fi {
    type Err = FiSyntaxError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parser::parse_fi(s)
    }
}

impl fmt::Display for Fi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.artifact {
            FiArtifact::Id(id) => write!(f, "{id}")?,
            FiArtifact::Fi(inner) => write!(f, "{inner}")?,
        }
        if let Some(anchor) = &self.anchor {
            write!(f, ".{anchor}")?;
        }
        Ok(())
    }
}

impl Serialize for Fi {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Fi {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        parser::parse_fi(&text).map_err(de::Error::custom)
    }
}
