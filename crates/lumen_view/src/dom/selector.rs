//! CSS selector subset
//!
//! Supported syntax:
//! - Type and universal selectors: `button`, `*`
//! - `#id`, `.class`, `[attr]`, `[attr=value]`, `[attr="quoted value"]`
//! - Compound selectors: `span.ck-tooltip.ck-hidden`
//! - Descendant (whitespace) and child (`>`) combinators
//! - Selector lists: `.a, .b`

use nom::{
    branch::alt,
    bytes::complete::{take_until, take_while1},
    character::complete::{char, multispace0, multispace1},
    combinator::{all_consuming, map, map_opt, opt, value},
    error::VerboseError,
    multi::{many0, separated_list1},
    sequence::{delimited, pair, preceded, tuple},
    Finish, IResult,
};
use thiserror::Error;

type ParseResult<'a, O> = IResult<&'a str, O, VerboseError<&'a str>>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectorError {
    #[error("invalid selector `{selector}` at offset {offset}")]
    Invalid { selector: String, offset: usize },
}

/// A single part of a compound selector
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SelectorPart {
    Universal,
    Type(String),
    Id(String),
    Class(String),
    Attribute { name: String, value: Option<String> },
}

/// Combinator between compound selectors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Combinator {
    /// Whitespace: `.parent .child`
    Descendant,
    /// `>`: `.parent > .child`
    Child,
}

/// Simple selectors with no combinator between them, e.g. `li.item[data-x]`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CompoundSelector {
    pub parts: Vec<SelectorPart>,
}

/// Compound selectors joined by combinators
///
/// Each segment carries the combinator linking it to the next one; the
/// last segment (the subject) has `None`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ComplexSelector {
    pub segments: Vec<(CompoundSelector, Option<Combinator>)>,
}

impl ComplexSelector {
    /// The rightmost compound, which the matched element itself must satisfy
    pub fn subject(&self) -> Option<&CompoundSelector> {
        self.segments.last().map(|(compound, _)| compound)
    }
}

/// A comma separated list of complex selectors
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SelectorList {
    pub selectors: Vec<ComplexSelector>,
}

impl SelectorList {
    pub fn parse(selector: &str) -> Result<Self, SelectorError> {
        match all_consuming(selector_list)(selector).finish() {
            Ok((_, selectors)) => Ok(Self { selectors }),
            Err(err) => {
                let remaining = err.errors.first().map_or(0, |(input, _)| input.len());
                Err(SelectorError::Invalid {
                    selector: selector.to_string(),
                    offset: selector.len().saturating_sub(remaining),
                })
            }
        }
    }
}

impl std::str::FromStr for SelectorList {
    type Err = SelectorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

fn ws(input: &str) -> ParseResult<&str> {
    multispace0(input)
}

fn identifier(input: &str) -> ParseResult<&str> {
    take_while1(|c: char| c.is_alphanumeric() || c == '-' || c == '_')(input)
}

fn quoted(input: &str) -> ParseResult<&str> {
    alt((
        delimited(char('"'), take_until("\""), char('"')),
        delimited(char('\''), take_until("'"), char('\'')),
    ))(input)
}

fn attribute_part(input: &str) -> ParseResult<SelectorPart> {
    map(
        delimited(
            pair(char('['), ws),
            pair(
                identifier,
                opt(preceded(tuple((ws, char('='), ws)), alt((quoted, identifier)))),
            ),
            pair(ws, char(']')),
        ),
        |(name, value): (&str, Option<&str>)| SelectorPart::Attribute {
            name: name.to_string(),
            value: value.map(str::to_string),
        },
    )(input)
}

fn simple_part(input: &str) -> ParseResult<SelectorPart> {
    alt((
        map(preceded(char('#'), identifier), |id: &str| {
            SelectorPart::Id(id.to_string())
        }),
        map(preceded(char('.'), identifier), |class: &str| {
            SelectorPart::Class(class.to_string())
        }),
        attribute_part,
    ))(input)
}

fn compound(input: &str) -> ParseResult<CompoundSelector> {
    map_opt(
        pair(
            opt(alt((
                value(SelectorPart::Universal, char('*')),
                map(identifier, |tag: &str| SelectorPart::Type(tag.to_string())),
            ))),
            many0(simple_part),
        ),
        |(head, rest)| {
            let parts: Vec<SelectorPart> = head.into_iter().chain(rest).collect();
            (!parts.is_empty()).then_some(CompoundSelector { parts })
        },
    )(input)
}

fn combinator(input: &str) -> ParseResult<Combinator> {
    alt((
        value(Combinator::Child, delimited(ws, char('>'), ws)),
        value(Combinator::Descendant, multispace1),
    ))(input)
}

fn complex(input: &str) -> ParseResult<ComplexSelector> {
    map(
        pair(compound, many0(pair(combinator, compound))),
        |(first, rest)| {
            let mut segments = Vec::with_capacity(rest.len() + 1);
            let mut current = first;
            for (combinator, next) in rest {
                segments.push((current, Some(combinator)));
                current = next;
            }
            segments.push((current, None));
            ComplexSelector { segments }
        },
    )(input)
}

fn selector_list(input: &str) -> ParseResult<Vec<ComplexSelector>> {
    delimited(
        ws,
        separated_list1(tuple((ws, char(','), ws)), complex),
        ws,
    )(input)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn class(name: &str) -> SelectorPart {
        SelectorPart::Class(name.to_string())
    }

    #[test]
    fn test_parse_compound() {
        let list = SelectorList::parse("span.ck-tooltip.ck-hidden").unwrap();
        assert_eq!(list.selectors.len(), 1);
        let subject = list.selectors[0].subject().unwrap();
        assert_eq!(
            subject.parts,
            vec![
                SelectorPart::Type("span".to_string()),
                class("ck-tooltip"),
                class("ck-hidden"),
            ]
        );
    }

    #[test]
    fn test_parse_attribute_forms() {
        let list = SelectorList::parse("[disabled][type=button][title='Bold (Ctrl+B)']").unwrap();
        let parts = &list.selectors[0].segments[0].0.parts;
        assert_eq!(
            parts[0],
            SelectorPart::Attribute {
                name: "disabled".to_string(),
                value: None
            }
        );
        assert_eq!(
            parts[2],
            SelectorPart::Attribute {
                name: "title".to_string(),
                value: Some("Bold (Ctrl+B)".to_string())
            }
        );
    }

    #[test]
    fn test_parse_combinators_and_lists() {
        let list = SelectorList::parse(" .toolbar  > li .label , #main ").unwrap();
        assert_eq!(list.selectors.len(), 2);

        let first = &list.selectors[0];
        assert_eq!(first.segments.len(), 3);
        assert_eq!(first.segments[0].1, Some(Combinator::Child));
        assert_eq!(first.segments[1].1, Some(Combinator::Descendant));
        assert_eq!(first.segments[2].1, None);

        assert_eq!(
            list.selectors[1].subject().unwrap().parts,
            vec![SelectorPart::Id("main".to_string())]
        );
    }

    #[test]
    fn test_parse_universal() {
        let list: SelectorList = "*".parse().unwrap();
        assert_eq!(
            list.selectors[0].subject().unwrap().parts,
            vec![SelectorPart::Universal]
        );
    }

    #[test]
    fn test_invalid_selectors() {
        for input in ["", ".", "a >", "[x", "a,,b", "#"] {
            assert!(SelectorList::parse(input).is_err(), "{input:?} should fail");
        }
    }
}
