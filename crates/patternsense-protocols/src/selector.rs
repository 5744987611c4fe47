//! A small CSS-like selector language for candidate discovery.
//!
//! Supported syntax: type (`div`), universal (`*`), `#id`, `.class`,
//! `[attr]`, `[attr=v]`, `[attr~=v]`, `[attr*=v]`, `[attr^=v]`, `[attr$=v]`,
//! descendant (`a b`) and child (`a > b`) combinators, and comma groups.
//! Values may be bare or single/double quoted.

use std::fmt;
use std::str::FromStr;

use crate::dom::{DocumentEnv, NodeId};
use crate::error::SelectorError;

#[cfg(test)]
#[path = "selector_tests.rs"]
mod tests;

/// Attribute comparison operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttrOp {
    Exists,
    Equals,
    Includes,
    Contains,
    Prefix,
    Suffix,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttrSelector {
    pub name: String,
    pub op: AttrOp,
    pub value: String,
}

impl AttrSelector {
    fn test(&self, actual: Option<&str>) -> bool {
        let Some(actual) = actual else {
            return false;
        };
        match self.op {
            AttrOp::Exists => true,
            AttrOp::Equals => actual == self.value,
            AttrOp::Includes => actual.split_whitespace().any(|t| t == self.value),
            AttrOp::Contains => !self.value.is_empty() && actual.contains(&self.value),
            AttrOp::Prefix => !self.value.is_empty() && actual.starts_with(&self.value),
            AttrOp::Suffix => !self.value.is_empty() && actual.ends_with(&self.value),
        }
    }
}

/// One compound selector such as `input.search[type=text]`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Compound {
    pub tag: Option<String>,
    pub id: Option<String>,
    pub classes: Vec<String>,
    pub attrs: Vec<AttrSelector>,
}

impl Compound {
    fn is_empty(&self) -> bool {
        self.tag.is_none() && self.id.is_none() && self.classes.is_empty() && self.attrs.is_empty()
    }

    /// Test this compound against a single node. Read faults mean no match.
    pub fn matches<E: DocumentEnv + ?Sized>(&self, env: &E, node: NodeId) -> bool {
        if let Some(ref tag) = self.tag {
            match env.tag_name(node) {
                Ok(actual) if actual.eq_ignore_ascii_case(tag) => {}
                _ => return false,
            }
        }
        if let Some(ref id) = self.id {
            match env.attribute(node, "id") {
                Ok(Some(actual)) if &actual == id => {}
                _ => return false,
            }
        }
        if !self.classes.is_empty() {
            let class_attr = match env.attribute(node, "class") {
                Ok(Some(c)) => c,
                _ => return false,
            };
            let have: Vec<&str> = class_attr.split_whitespace().collect();
            if !self.classes.iter().all(|c| have.contains(&c.as_str())) {
                return false;
            }
        }
        for attr in &self.attrs {
            let actual = env.attribute(node, &attr.name).ok().flatten();
            if !attr.test(actual.as_deref()) {
                return false;
            }
        }
        true
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Combinator {
    Descendant,
    Child,
}

/// A chain of compounds joined by combinators, e.g. `form .row > input`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComplexSelector {
    pub compounds: Vec<Compound>,
    /// `combinators[i]` joins `compounds[i]` and `compounds[i + 1]`.
    pub combinators: Vec<Combinator>,
}

impl ComplexSelector {
    pub fn matches<E: DocumentEnv + ?Sized>(&self, env: &E, node: NodeId) -> bool {
        match self.compounds.len() {
            0 => false,
            n => self.match_at(env, n - 1, node),
        }
    }

    fn match_at<E: DocumentEnv + ?Sized>(&self, env: &E, idx: usize, node: NodeId) -> bool {
        if !self.compounds[idx].matches(env, node) {
            return false;
        }
        if idx == 0 {
            return true;
        }
        match self.combinators[idx - 1] {
            Combinator::Child => match env.parent(node) {
                Ok(Some(parent)) => self.match_at(env, idx - 1, parent),
                _ => false,
            },
            Combinator::Descendant => {
                let mut current = env.parent(node).ok().flatten();
                while let Some(ancestor) = current {
                    if self.match_at(env, idx - 1, ancestor) {
                        return true;
                    }
                    current = env.parent(ancestor).ok().flatten();
                }
                false
            }
        }
    }
}

/// A parsed selector list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selector {
    source: String,
    groups: Vec<ComplexSelector>,
}

impl Selector {
    pub fn parse(input: &str) -> Result<Self, SelectorError> {
        Parser::new(input).parse_list().map(|groups| Self {
            source: input.trim().to_string(),
            groups,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    pub fn groups(&self) -> &[ComplexSelector] {
        &self.groups
    }

    /// True if any comma group matches the node.
    pub fn matches<E: DocumentEnv + ?Sized>(&self, env: &E, node: NodeId) -> bool {
        self.groups.iter().any(|g| g.matches(env, node))
    }
}

impl FromStr for Selector {
    type Err = SelectorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

struct Parser {
    chars: Vec<(usize, char)>,
    pos: usize,
}

impl Parser {
    fn new(input: &str) -> Self {
        Self {
            chars: input.char_indices().collect(),
            pos: 0,
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).map(|(_, c)| *c)
    }

    fn offset(&self) -> usize {
        self.chars
            .get(self.pos)
            .map(|(i, _)| *i)
            .unwrap_or_else(|| self.chars.last().map(|(i, c)| i + c.len_utf8()).unwrap_or(0))
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek();
        if c.is_some() {
            self.pos += 1;
        }
        c
    }

    fn skip_ws(&mut self) -> bool {
        let start = self.pos;
        while matches!(self.peek(), Some(c) if c.is_whitespace()) {
            self.pos += 1;
        }
        self.pos > start
    }

    fn unexpected(&self) -> SelectorError {
        match self.peek() {
            Some(found) => SelectorError::UnexpectedChar {
                found,
                position: self.offset(),
            },
            None => SelectorError::MissingName(self.offset()),
        }
    }

    fn parse_list(&mut self) -> Result<Vec<ComplexSelector>, SelectorError> {
        let mut groups = Vec::new();
        loop {
            self.skip_ws();
            if self.peek().is_none() {
                if groups.is_empty() {
                    return Err(SelectorError::Empty);
                }
                return Err(SelectorError::MissingName(self.offset()));
            }
            groups.push(self.parse_complex()?);
            self.skip_ws();
            match self.peek() {
                None => return Ok(groups),
                Some(',') => {
                    self.bump();
                }
                Some(_) => return Err(self.unexpected()),
            }
        }
    }

    fn parse_complex(&mut self) -> Result<ComplexSelector, SelectorError> {
        let mut compounds = vec![self.parse_compound()?];
        let mut combinators = Vec::new();
        loop {
            let had_ws = self.skip_ws();
            match self.peek() {
                None | Some(',') => break,
                Some('>') => {
                    self.bump();
                    self.skip_ws();
                    combinators.push(Combinator::Child);
                }
                Some(_) if had_ws => combinators.push(Combinator::Descendant),
                Some(_) => return Err(self.unexpected()),
            }
            compounds.push(self.parse_compound()?);
        }
        Ok(ComplexSelector {
            compounds,
            combinators,
        })
    }

    fn parse_compound(&mut self) -> Result<Compound, SelectorError> {
        let mut compound = Compound::default();
        let mut universal = false;
        match self.peek() {
            Some('*') => {
                self.bump();
                universal = true;
            }
            Some(c) if is_ident_char(c) => {
                compound.tag = Some(self.parse_ident()?.to_ascii_lowercase());
            }
            _ => {}
        }
        loop {
            match self.peek() {
                Some('#') => {
                    self.bump();
                    compound.id = Some(self.parse_ident()?);
                }
                Some('.') => {
                    self.bump();
                    compound.classes.push(self.parse_ident()?);
                }
                Some('[') => {
                    compound.attrs.push(self.parse_attr()?);
                }
                _ => break,
            }
        }
        if compound.is_empty() && !universal {
            return Err(self.unexpected());
        }
        Ok(compound)
    }

    fn parse_ident(&mut self) -> Result<String, SelectorError> {
        let start = self.offset();
        let mut out = String::new();
        while let Some(c) = self.peek() {
            if is_ident_char(c) {
                out.push(c);
                self.pos += 1;
            } else {
                break;
            }
        }
        if out.is_empty() {
            return Err(SelectorError::MissingName(start));
        }
        Ok(out)
    }

    fn parse_attr(&mut self) -> Result<AttrSelector, SelectorError> {
        let open = self.offset();
        self.bump();
        self.skip_ws();
        let name = self.parse_ident()?.to_ascii_lowercase();
        self.skip_ws();
        let op = match self.peek() {
            Some(']') => {
                self.bump();
                return Ok(AttrSelector {
                    name,
                    op: AttrOp::Exists,
                    value: String::new(),
                });
            }
            Some('=') => {
                self.bump();
                AttrOp::Equals
            }
            Some(c @ ('~' | '*' | '^' | '$')) => {
                self.bump();
                if self.bump() != Some('=') {
                    return Err(SelectorError::UnexpectedChar {
                        found: c,
                        position: self.offset(),
                    });
                }
                match c {
                    '~' => AttrOp::Includes,
                    '*' => AttrOp::Contains,
                    '^' => AttrOp::Prefix,
                    _ => AttrOp::Suffix,
                }
            }
            None => return Err(SelectorError::UnterminatedAttribute(open)),
            Some(_) => return Err(self.unexpected()),
        };
        self.skip_ws();
        let value = match self.peek() {
            Some(q @ ('"' | '\'')) => {
                let quote_at = self.offset();
                self.bump();
                let mut v = String::new();
                loop {
                    match self.bump() {
                        Some(c) if c == q => break,
                        Some(c) => v.push(c),
                        None => return Err(SelectorError::UnterminatedQuote(quote_at)),
                    }
                }
                v
            }
            _ => {
                let mut v = String::new();
                while let Some(c) = self.peek() {
                    if c == ']' || c.is_whitespace() {
                        break;
                    }
                    v.push(c);
                    self.pos += 1;
                }
                v
            }
        };
        self.skip_ws();
        match self.bump() {
            Some(']') => Ok(AttrSelector { name, op, value }),
            _ => Err(SelectorError::UnterminatedAttribute(open)),
        }
    }
}

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '-' || c == '_'
}
