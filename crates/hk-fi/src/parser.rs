//! `nom` parser for the FI grammar.
//!
//! ```text
//! fi        := id ("." anchor)*
//! anchor    := id ["*"] ["(" token ")"]
//! token     := "null" | "true" | "false" | NUMBER | STRING | object | array | fi
//! id        := IDSIMPLE | IDEXTENDED | IRI
//! object    := "{" (member ("," member)*)? "}"      member := (STRING | id) ":" token
//! array     := "[" (token ("," token)*)? "]"
//! ```
//!
//! Whitespace is accepted around the punctuation inside `()`, `[]` and `{}`;
//! the id/anchor chain itself is whitespace-free.

use nom::{
    branch::alt,
    bytes::complete::{tag, take_while, take_while1},
    character::complete::{anychar, char as pchar, digit0, digit1, multispace0, one_of, satisfy},
    combinator::{all_consuming, map, map_res, not, opt, recognize, value},
    multi::{many0, separated_list0},
    sequence::{delimited, pair, preceded, terminated, tuple},
    IResult,
};
use thiserror::Error;

use crate::fi::{
    is_basic_continue, is_basic_start, is_extended_char, is_iri_char, Fi, FiAnchor, FiKey,
    FiOperator, FiToken, Hkid,
};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid FI syntax at offset {offset}: `{fragment}`")]
pub struct FiSyntaxError {
    pub input: String,
    pub offset: usize,
    /// Text starting at the point of failure, truncated.
    pub fragment: String,
}

impl FiSyntaxError {
    pub(crate) fn new(input: &str, offset: usize) -> Self {
        let fragment = input.get(offset..).unwrap_or("").chars().take(32).collect();
        Self {
            input: input.to_string(),
            offset,
            fragment,
        }
    }
}

// ============================================================================
// Entry points
// ============================================================================

pub fn parse_fi(text: &str) -> Result<Fi, FiSyntaxError> {
    run(text, fi)
}

pub fn parse_anchor(text: &str) -> Result<FiAnchor, FiSyntaxError> {
    run(text, anchor)
}

pub fn parse_hkid(text: &str) -> Result<Hkid, FiSyntaxError> {
    run(text, hkid)
}

fn run<'a, O>(
    text: &'a str,
    parser: impl FnMut(&'a str) -> IResult<&'a str, O>,
) -> Result<O, FiSyntaxError> {
    let lead = text.len() - text.trim_start().len();
    let trimmed = text.trim();
    all_consuming(parser)(trimmed)
        .map(|(_, v)| v)
        .map_err(|err| {
            let consumed = match err {
                nom::Err::Error(e) | nom::Err::Failure(e) => trimmed.len() - e.input.len(),
                nom::Err::Incomplete(_) => trimmed.len(),
            };
            FiSyntaxError::new(text, lead + consumed)
        })
}

// ============================================================================
// Identifiers
// ============================================================================

/// Reserved words are ids here; `token` tries its literals before falling
/// back to a nested FI.
fn basic_id(input: &str) -> IResult<&str, &str> {
    recognize(pair(satisfy(is_basic_start), take_while(is_basic_continue)))(input)
}

fn extended_id(input: &str) -> IResult<&str, &str> {
    delimited(tag("``"), take_while(is_extended_char), tag("``"))(input)
}

fn iri_id(input: &str) -> IResult<&str, &str> {
    delimited(pchar('<'), take_while(is_iri_char), pchar('>'))(input)
}

fn hkid(input: &str) -> IResult<&str, Hkid> {
    alt((
        map(iri_id, |s| Hkid::Iri(s.to_string())),
        map(extended_id, |s| Hkid::Extended(s.to_string())),
        map(basic_id, |s| Hkid::Basic(s.to_string())),
    ))(input)
}

// ============================================================================
// FI and anchors
// ============================================================================

fn fi(input: &str) -> IResult<&str, Fi> {
    let (input, root) = hkid(input)?;
    let (input, anchors) = many0(preceded(pchar('.'), anchor))(input)?;
    let fi = anchors
        .into_iter()
        .fold(Fi::new(root), |acc, anchor| acc.with_anchor(anchor));
    Ok((input, fi))
}

fn anchor(input: &str) -> IResult<&str, FiAnchor> {
    let (input, indexer) = hkid(input)?;
    let (input, star) = opt(pchar('*'))(input)?;
    let (input, token) = opt(delimited(
        pair(pchar('('), multispace0),
        token,
        pair(multispace0, pchar(')')),
    ))(input)?;
    Ok((
        input,
        FiAnchor {
            indexer,
            operator: if star.is_some() {
                FiOperator::Description
            } else {
                FiOperator::None
            },
            token,
        },
    ))
}

// ============================================================================
// Tokens
// ============================================================================

fn comma(input: &str) -> IResult<&str, ()> {
    value((), tuple((multispace0, pchar(','), multispace0)))(input)
}

fn keyword<'a>(word: &'static str) -> impl FnMut(&'a str) -> IResult<&'a str, &'a str> {
    terminated(tag(word), not(satisfy(|c| is_basic_continue(c) || c == '.')))
}

fn literal(input: &str) -> IResult<&str, FiToken> {
    alt((
        value(FiToken::Null, keyword("null")),
        value(FiToken::Bool(true), keyword("true")),
        value(FiToken::Bool(false), keyword("false")),
    ))(input)
}

/// Signed number. Either side of the point may be empty (`.5`, `1.`); the
/// text is normalised to JSON form.
fn number(input: &str) -> IResult<&str, FiToken> {
    map_res(
        recognize(tuple((
            opt(one_of("+-")),
            alt((
                recognize(pair(digit1, opt(pair(pchar('.'), digit0)))),
                recognize(pair(pchar('.'), digit1)),
            )),
            opt(tuple((one_of("eE"), opt(one_of("+-")), digit1))),
        ))),
        |text: &str| serde_json::from_str::<serde_json::Number>(&json_number(text)).map(FiToken::Number),
    )(input)
}

fn json_number(text: &str) -> String {
    let text = text.strip_prefix('+').unwrap_or(text);
    let (sign, digits) = match text.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", text),
    };
    let mut out = String::from(sign);
    if digits.starts_with('.') {
        out.push('0');
    }
    let mut chars = digits.chars().peekable();
    while let Some(c) = chars.next() {
        out.push(c);
        if c == '.' && !chars.peek().is_some_and(char::is_ascii_digit) {
            out.push('0');
        }
    }
    out
}

fn json_string(input: &str) -> IResult<&str, String> {
    map_res(
        recognize(delimited(
            pchar('"'),
            many0(alt((
                recognize(pair(pchar('\\'), anychar)),
                take_while1(|c| c != '"' && c != '\\'),
            ))),
            pchar('"'),
        )),
        serde_json::from_str::<String>,
    )(input)
}

fn key(input: &str) -> IResult<&str, FiKey> {
    alt((map(json_string, FiKey::String), map(hkid, FiKey::Id)))(input)
}

fn member(input: &str) -> IResult<&str, (FiKey, FiToken)> {
    let (input, k) = key(input)?;
    let (input, _) = tuple((multispace0, pchar(':'), multispace0))(input)?;
    let (input, v) = token(input)?;
    Ok((input, (k, v)))
}

fn object(input: &str) -> IResult<&str, FiToken> {
    map(
        delimited(
            pair(pchar('{'), multispace0),
            separated_list0(comma, member),
            pair(multispace0, pchar('}')),
        ),
        FiToken::Object,
    )(input)
}

fn array(input: &str) -> IResult<&str, FiToken> {
    map(
        delimited(
            pair(pchar('['), multispace0),
            separated_list0(comma, token),
            pair(multispace0, pchar(']')),
        ),
        FiToken::Array,
    )(input)
}

fn token(input: &str) -> IResult<&str, FiToken> {
    alt((
        literal,
        number,
        map(json_string, FiToken::String),
        object,
        array,
        map(fi, FiToken::fi),
    ))(input)
}
