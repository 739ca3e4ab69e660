//! A small CSS selector engine.
//!
//! Supports selector lists, type and universal selectors, `#id`, `.class`,
//! attribute selectors (`[a]`, `=`, `~=`, `|=`, `^=`, `$=`, `*=`) and the
//! descendant and child combinators. Names are matched case-sensitively, as
//! they are in XML. Pseudo-classes and sibling combinators are rejected.

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use crate::error::{Error, ErrorKind, Result};
use crate::node::{Element, Node};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Operator {
    Exists,
    Equals(String),
    Includes(String),
    DashMatch(String),
    Prefix(String),
    Suffix(String),
    Substring(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct AttributeMatch {
    name: String,
    operator: Operator,
}

impl AttributeMatch {
    fn matches(&self, element: &Element) -> bool {
        let Some(value) = element.attributes.get(&self.name) else {
            return false;
        };
        match &self.operator {
            Operator::Exists => true,
            Operator::Equals(expected) => value == expected,
            Operator::Includes(expected) => value.split_ascii_whitespace().any(|word| word == expected),
            Operator::DashMatch(expected) => {
                value == expected || value.strip_prefix(expected.as_str()).is_some_and(|rest| rest.starts_with('-'))
            },
            Operator::Prefix(expected) => !expected.is_empty() && value.starts_with(expected.as_str()),
            Operator::Suffix(expected) => !expected.is_empty() && value.ends_with(expected.as_str()),
            Operator::Substring(expected) => !expected.is_empty() && value.contains(expected.as_str()),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Compound {
    /// `None` for the universal selector (or when omitted).
    name: Option<String>,
    ids: Vec<String>,
    classes: Vec<String>,
    attributes: Vec<AttributeMatch>,
}

impl Compound {
    fn matches(&self, element: &Element) -> bool {
        if self.name.as_ref().is_some_and(|name| *name != element.name) {
            return false;
        }
        if !self.ids.iter().all(|id| element.attributes.get("id") == Some(id.as_str())) {
            return false;
        }
        let classes = element.attributes.get("class").unwrap_or_default();
        if !self.classes.iter().all(|class| classes.split_ascii_whitespace().any(|c| c == class)) {
            return false;
        }
        self.attributes.iter().all(|attribute| attribute.matches(element))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Combinator {
    Descendant,
    Child,
}

/// One entry of a selector list. `combinators[i]` sits between
/// `compounds[i]` and `compounds[i + 1]`.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Complex {
    compounds: Vec<Compound>,
    combinators: Vec<Combinator>,
}

impl Complex {
    fn matches(&self, element: &Element, ancestors: &[&Element]) -> bool {
        self.matches_at(self.compounds.len() - 1, element, ancestors)
    }

    fn matches_at(&self, index: usize, element: &Element, ancestors: &[&Element]) -> bool {
        if !self.compounds[index].matches(element) {
            return false;
        }
        if index == 0 {
            return true;
        }
        match self.combinators[index - 1] {
            Combinator::Child => match ancestors.split_last() {
                Some((parent, rest)) => self.matches_at(index - 1, parent, rest),
                None => false,
            },
            Combinator::Descendant => {
                (0..ancestors.len()).rev().any(|i| self.matches_at(index - 1, ancestors[i], &ancestors[..i]))
            },
        }
    }
}

/// A parsed selector list.
///
/// ```
/// use iconsprite_dom::{Selector, parse};
///
/// let mut nodes = parse(r#"<svg><title>x</title><g><desc/><path/></g></svg>"#).unwrap();
/// let selector: Selector = "title, g > desc".parse().unwrap();
/// let svg = nodes[0].as_element_mut().unwrap();
/// assert_eq!(selector.remove_matching(svg), 2);
/// assert_eq!(svg.to_string(), "<svg><g><path></path></g></svg>");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selector {
    source: String,
    alternatives: Vec<Complex>,
}

impl Selector {
    pub fn parse(source: &str) -> Result<Self> {
        let alternatives = Parser { input: source, position: 0 }.selector_list().map_err(|reason| {
            Error::from(ErrorKind::InvalidSelector { selector: source.to_string(), reason })
        })?;
        Ok(Self { source: source.to_string(), alternatives })
    }

    /// Whether `element` matches, given its ancestors (outermost first).
    pub fn matches(&self, element: &Element, ancestors: &[&Element]) -> bool {
        self.alternatives.iter().any(|complex| complex.matches(element, ancestors))
    }

    /// Removes every descendant of `root` that matches, returning how many
    /// subtrees were removed. `root` itself is never removed, but it does take
    /// part in matching as an ancestor.
    pub fn remove_matching(&self, root: &mut Element) -> usize {
        let mut matched = Vec::new();
        collect(root, &mut Vec::new(), &mut Vec::new(), self, &mut matched);
        // Paths are in document order and never nested, so removing back to
        // front keeps every remaining path valid.
        for path in matched.iter().rev() {
            let Some((last, parents)) = path.split_last() else {
                continue;
            };
            if let Some(parent) = descend(root, parents) {
                parent.children.remove(*last);
            }
        }
        matched.len()
    }
}

fn collect<'a>(
    element: &'a Element,
    ancestors: &mut Vec<&'a Element>,
    path: &mut Vec<usize>,
    selector: &Selector,
    matched: &mut Vec<Vec<usize>>,
) {
    ancestors.push(element);
    for (index, child) in element.children.iter().enumerate() {
        let Node::Element(child) = child else {
            continue;
        };
        path.push(index);
        match selector.matches(child, ancestors) {
            true => matched.push(path.clone()),
            false => collect(child, ancestors, path, selector, matched),
        }
        path.pop();
    }
    ancestors.pop();
}

fn descend<'a>(mut element: &'a mut Element, path: &[usize]) -> Option<&'a mut Element> {
    for &index in path {
        element = element.children.get_mut(index)?.as_element_mut()?;
    }
    Some(element)
}

impl FromStr for Selector {
    type Err = Error;

    fn from_str(source: &str) -> Result<Self> {
        Self::parse(source)
    }
}

impl Display for Selector {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

type ParseResult<T> = std::result::Result<T, String>;

struct Parser<'a> {
    input: &'a str,
    position: usize,
}

fn is_name_char(c: char) -> bool {
    c.is_alphanumeric() || c == '-' || c == '_' || !c.is_ascii()
}

impl Parser<'_> {
    fn peek(&self) -> Option<char> {
        self.input[self.position..].chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.position += c.len_utf8();
        Some(c)
    }

    fn expect(&mut self, expected: char) -> ParseResult<()> {
        match self.bump() {
            Some(c) if c == expected => Ok(()),
            Some(c) => Err(format!("expected '{expected}', found '{c}'")),
            None => Err(format!("expected '{expected}', found end of input")),
        }
    }

    /// Returns whether any whitespace was skipped.
    fn skip_whitespace(&mut self) -> bool {
        let start = self.position;
        while self.peek().is_some_and(char::is_whitespace) {
            self.bump();
        }
        self.position != start
    }

    fn name(&mut self, extra: impl Fn(char) -> bool) -> ParseResult<String> {
        let start = self.position;
        while self.peek().is_some_and(|c| is_name_char(c) || extra(c)) {
            self.bump();
        }
        match self.position == start {
            true => Err(match self.peek() {
                Some(c) => format!("expected a name, found '{c}'"),
                None => "expected a name, found end of input".to_string(),
            }),
            false => Ok(self.input[start..self.position].to_string()),
        }
    }

    fn selector_list(&mut self) -> ParseResult<Vec<Complex>> {
        let mut alternatives = Vec::new();
        loop {
            self.skip_whitespace();
            alternatives.push(self.complex()?);
            self.skip_whitespace();
            match self.bump() {
                None => return Ok(alternatives),
                Some(',') => continue,
                Some(c) => return Err(format!("unexpected '{c}'")),
            }
        }
    }

    fn complex(&mut self) -> ParseResult<Complex> {
        let mut compounds = vec![self.compound()?];
        let mut combinators = Vec::new();
        loop {
            let spaced = self.skip_whitespace();
            let combinator = match self.peek() {
                None | Some(',') => break,
                Some('>') => {
                    self.bump();
                    self.skip_whitespace();
                    Combinator::Child
                },
                Some(_) if spaced => Combinator::Descendant,
                Some(c) => return Err(format!("unsupported syntax at '{c}'")),
            };
            combinators.push(combinator);
            compounds.push(self.compound()?);
        }
        Ok(Complex { compounds, combinators })
    }

    fn compound(&mut self) -> ParseResult<Compound> {
        let mut compound = Compound::default();
        let mut universal = false;
        match self.peek() {
            Some('*') => {
                self.bump();
                universal = true;
            },
            Some(c) if is_name_char(c) => compound.name = Some(self.name(|_| false)?),
            _ => {},
        }
        loop {
            match self.peek() {
                Some('#') => {
                    self.bump();
                    compound.ids.push(self.name(|_| false)?);
                },
                Some('.') => {
                    self.bump();
                    compound.classes.push(self.name(|_| false)?);
                },
                Some('[') => {
                    self.bump();
                    compound.attributes.push(self.attribute()?);
                },
                _ => break,
            }
        }
        match universal || compound != Compound::default() {
            true => Ok(compound),
            false => Err(match self.peek() {
                Some(c) => format!("unsupported syntax at '{c}'"),
                None => "unexpected end of input".to_string(),
            }),
        }
    }

    fn attribute(&mut self) -> ParseResult<AttributeMatch> {
        self.skip_whitespace();
        // Namespaced XML attributes (`xlink:href`) are written as-is.
        let name = self.name(|c| c == ':')?;
        self.skip_whitespace();
        let operator: fn(String) -> Operator = match self.bump() {
            Some(']') => return Ok(AttributeMatch { name, operator: Operator::Exists }),
            Some('=') => Operator::Equals,
            Some(c @ ('~' | '|' | '^' | '$' | '*')) => {
                self.expect('=')?;
                match c {
                    '~' => Operator::Includes,
                    '|' => Operator::DashMatch,
                    '^' => Operator::Prefix,
                    '$' => Operator::Suffix,
                    _ => Operator::Substring,
                }
            },
            Some(c) => return Err(format!("unexpected '{c}' in attribute selector")),
            None => return Err("unterminated attribute selector".to_string()),
        };
        self.skip_whitespace();
        let value = match self.peek() {
            Some(quote @ ('"' | '\'')) => {
                self.bump();
                let start = self.position;
                while self.peek().is_some_and(|c| c != quote) {
                    self.bump();
                }
                let value = self.input[start..self.position].to_string();
                self.expect(quote)?;
                value
            },
            _ => self.name(|_| false)?,
        };
        self.skip_whitespace();
        self.expect(']')?;
        Ok(AttributeMatch { name, operator: operator(value) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::parse;
    use rstest::rstest;

    fn remove(markup: &str, selector: &str) -> (usize, String) {
        let mut nodes = parse(markup).unwrap();
        let root = nodes[0].as_element_mut().unwrap();
        let removed = Selector::parse(selector).unwrap().remove_matching(root);
        (removed, root.to_string())
    }

    #[rstest]
    #[case("title", "<svg><title>t</title><path></path></svg>", 1, "<svg><path></path></svg>")]
    #[case("title, desc", "<svg><title></title><desc></desc><g></g></svg>", 2, "<svg><g></g></svg>")]
    #[case("g path", "<svg><path></path><g><g><path></path></g></g></svg>", 1, "<svg><path></path><g><g></g></g></svg>")]
    #[case("svg > path", "<svg><path></path><g><path></path></g></svg>", 1, "<svg><g><path></path></g></svg>")]
    #[case("svg>g>path", "<svg><path></path><g><path></path></g></svg>", 1, "<svg><path></path><g></g></svg>")]
    #[case("#a", r#"<svg><rect id="a"></rect><rect id="b"></rect></svg>"#, 1, r#"<svg><rect id="b"></rect></svg>"#)]
    #[case(".x.y", r#"<svg><g class="x"></g><g class="y x"></g></svg>"#, 1, r#"<svg><g class="x"></g></svg>"#)]
    #[case("[fill]", r#"<svg><path fill="red"></path><path></path></svg>"#, 1, "<svg><path></path></svg>")]
    #[case("[fill=none]", r#"<svg><path fill="none"></path><path fill="red"></path></svg>"#, 1, r#"<svg><path fill="red"></path></svg>"#)]
    #[case("[data-a^='fo']", r#"<svg><g data-a="foo"></g><g data-a="bar"></g></svg>"#, 1, r#"<svg><g data-a="bar"></g></svg>"#)]
    #[case("[data-a$=\"ar\"]", r#"<svg><g data-a="foo"></g><g data-a="bar"></g></svg>"#, 1, r#"<svg><g data-a="foo"></g></svg>"#)]
    #[case("[data-a*=o]", r#"<svg><g data-a="foo"></g><g data-a="bar"></g></svg>"#, 1, r#"<svg><g data-a="bar"></g></svg>"#)]
    #[case("[lang|=en]", r#"<svg><g lang="en-GB"></g><g lang="english"></g></svg>"#, 1, r#"<svg><g lang="english"></g></svg>"#)]
    #[case("[class~=b]", r#"<svg><g class="a b"></g><g class="ab"></g></svg>"#, 1, r#"<svg><g class="ab"></g></svg>"#)]
    #[case("[xlink:href]", r##"<svg><use xlink:href="#a"></use></svg>"##, 1, "<svg></svg>")]
    #[case("*", "<svg><g><path></path></g><rect></rect></svg>", 2, "<svg></svg>")]
    #[case("svg", "<svg><svg></svg></svg>", 1, "<svg></svg>")]
    #[case("Title", "<svg><title></title></svg>", 0, "<svg><title></title></svg>")]
    fn test_remove_matching(
        #[case] selector: &str,
        #[case] markup: &str,
        #[case] count: usize,
        #[case] expected: &str,
    ) {
        assert_eq!(remove(markup, selector), (count, expected.to_string()));
    }

    #[test]
    fn root_is_never_removed() {
        let (removed, markup) = remove("<svg><g></g></svg>", "svg");
        assert_eq!(removed, 0);
        assert_eq!(markup, "<svg><g></g></svg>");
    }

    #[test]
    fn removes_siblings_in_any_position() {
        let (removed, markup) = remove("<svg><a></a><b></b><a></a><c><a></a></c><a></a></svg>", "a");
        assert_eq!(removed, 4);
        assert_eq!(markup, "<svg><b></b><c></c></svg>");
    }

    #[rstest]
    #[case("")]
    #[case("   ")]
    #[case("a,")]
    #[case("a:hover")]
    #[case("a + b")]
    #[case("a ~ b")]
    #[case("[x")]
    #[case("[x=]")]
    #[case("[x==y]")]
    #[case("[x='y]")]
    #[case("#")]
    #[case("> a")]
    fn test_invalid(#[case] selector: &str) {
        let err = Selector::parse(selector).unwrap_err();
        assert!(matches!(&*err, ErrorKind::InvalidSelector { .. }), "{selector}");
    }

    #[test]
    fn displays_source() {
        let selector: Selector = "g > path".parse().unwrap();
        assert_eq!(selector.to_string(), "g > path");
    }
}
