use std::collections::BTreeMap;

use iconsprite_dom::{Element, Node};

use crate::Processor;
use crate::consts::{URL_REFERENCE, WHITESPACE_RUN};

/// Prefixes every id and class name with `"<context id>--"`, so several icons
/// can live in one document without their gradients, clip paths and styles
/// colliding.
///
/// Names are collected from the DOM and from `<style>` blocks (selectors and
/// `url(#…)` references), including names that only ever appear in CSS. The
/// same rename table is then applied to `id`/`class` attributes, to the style
/// text, and to every other attribute holding a `#id` or `url(#id)`
/// reference.
///
/// In style text, `#name`/`.name` are only treated as selectors in rule
/// preludes; declaration blocks are only searched for `url()` references, so
/// hex colours and decimals stay intact.
pub fn css_prefix() -> Processor {
    Processor::from_fn("css-prefix", |svg, context| {
        apply_prefix(svg, &format!("{}--", context.id));
        Ok(())
    })
}

struct Renames<'p> {
    prefix: &'p str,
    ids: BTreeMap<String, String>,
    classes: BTreeMap<String, String>,
}

impl<'p> Renames<'p> {
    fn new(prefix: &'p str) -> Self {
        Self { prefix, ids: BTreeMap::new(), classes: BTreeMap::new() }
    }

    fn id(&mut self, name: &str) -> String {
        let prefix = self.prefix;
        self.ids.entry(name.to_string()).or_insert_with(|| format!("{prefix}{name}")).clone()
    }

    fn class(&mut self, name: &str) -> String {
        let prefix = self.prefix;
        self.classes.entry(name.to_string()).or_insert_with(|| format!("{prefix}{name}")).clone()
    }

    fn record(&mut self, sigil: char, name: &str) -> String {
        match sigil {
            '#' => self.id(name),
            _ => self.class(name),
        }
    }

    fn lookup(&self, sigil: char, name: &str) -> Option<String> {
        let table = match sigil {
            '#' => &self.ids,
            _ => &self.classes,
        };
        table.get(name).cloned()
    }

    fn scan_css(&mut self, css: &str) {
        for segment in split_rules(css) {
            if let Segment::Prelude(prelude) = segment {
                map_selector_names(prelude, |sigil, name| {
                    self.record(sigil, name);
                    None
                });
            }
        }
        for captures in URL_REFERENCE.captures_iter(css) {
            self.id(&captures[2]);
        }
    }

    fn rewrite_css(&self, css: &str) -> String {
        let mut out = String::with_capacity(css.len() + css.len() / 4);
        for segment in split_rules(css) {
            match segment {
                Segment::Prelude(prelude) => {
                    out.push_str(&map_selector_names(prelude, |sigil, name| self.lookup(sigil, name)))
                },
                Segment::Other(text) => out.push_str(&self.rewrite_urls(text)),
            }
        }
        out
    }

    fn rewrite_urls(&self, text: &str) -> String {
        URL_REFERENCE
            .replace_all(text, |captures: &regex::Captures<'_>| match self.ids.get(&captures[2]) {
                Some(renamed) => format!("{}{renamed}{}", &captures[1], &captures[3]),
                None => captures[0].to_string(),
            })
            .into_owned()
    }

    fn rewrite_reference(&self, value: &str) -> Option<String> {
        let mut rewritten = None;
        if URL_REFERENCE.is_match(value) {
            let replaced = self.rewrite_urls(value);
            if replaced != value {
                rewritten = Some(replaced);
            }
        }
        if let Some(renamed) = value.strip_prefix('#').and_then(|id| self.ids.get(id)) {
            rewritten = Some(format!("#{renamed}"));
        }
        rewritten
    }
}

fn apply_prefix(svg: &mut Element, prefix: &str) {
    let mut renames = Renames::new(prefix);
    // The root is left alone: its id belongs to whoever embeds the icon.
    for child in svg.children.iter().filter_map(Node::as_element) {
        child.walk(&mut |element| {
            if element.name == "style" {
                for text in style_text(element) {
                    renames.scan_css(text);
                }
            }
        });
    }

    for child in svg_children_mut(svg) {
        child.walk_mut(&mut |element| {
            if let Some(id) = element.attributes.get("id") {
                let renamed = renames.id(id);
                element.attributes.set("id", renamed);
            }
            if let Some(classes) = element.attributes.get("class") {
                let renamed = WHITESPACE_RUN
                    .split(classes)
                    .map(|class| match class.is_empty() {
                        true => String::new(),
                        false => renames.class(class),
                    })
                    .collect::<Vec<_>>()
                    .join(" ");
                element.attributes.set("class", renamed);
            }
        });
    }

    for child in svg_children_mut(svg) {
        child.walk_mut(&mut |element| {
            if element.name == "style" {
                for node in &mut element.children {
                    if let Node::Text(css) | Node::CData(css) = node {
                        *css = renames.rewrite_css(css);
                    }
                }
            }
            for (name, value) in element.attributes.values_mut() {
                if name == "id" || name == "class" {
                    continue;
                }
                if let Some(rewritten) = renames.rewrite_reference(value) {
                    *value = rewritten;
                }
            }
        });
    }
}

fn svg_children_mut(svg: &mut Element) -> impl Iterator<Item = &mut Element> {
    svg.children.iter_mut().filter_map(Node::as_element_mut)
}

fn style_text(style: &Element) -> impl Iterator<Item = &str> {
    style.children.iter().filter_map(|child| match child {
        Node::Text(css) | Node::CData(css) => Some(css.as_str()),
        _ => None,
    })
}

enum Segment<'a> {
    /// Selector text in front of a `{`.
    Prelude(&'a str),
    /// Declarations, braces, at-rule preludes and anything else.
    Other(&'a str),
}

/// Length of a comment or quoted string at the start of `text`, if any.
fn opaque_len(text: &str) -> Option<usize> {
    if let Some(rest) = text.strip_prefix("/*") {
        return Some(rest.find("*/").map_or(text.len(), |end| end + 4));
    }
    let quote = text.chars().next().filter(|c| matches!(c, '"' | '\''))?;
    Some(text[1..].find(quote).map_or(text.len(), |end| end + 2))
}

/// Splits style text into rule preludes and everything else. Every byte of
/// the input ends up in exactly one segment, in order.
fn split_rules(css: &str) -> Vec<Segment<'_>> {
    let mut segments = Vec::new();
    let mut start = 0;
    let mut position = 0;
    while position < css.len() {
        if let Some(len) = opaque_len(&css[position..]) {
            position += len;
            continue;
        }
        let Some(c) = css[position..].chars().next() else {
            break;
        };
        match c {
            '{' => {
                let prelude = &css[start..position];
                segments.push(match prelude.trim_start().starts_with('@') {
                    true => Segment::Other(prelude),
                    false => Segment::Prelude(prelude),
                });
                segments.push(Segment::Other("{"));
                start = position + 1;
            },
            ';' | '}' => {
                segments.push(Segment::Other(&css[start..=position]));
                start = position + 1;
            },
            _ => {},
        }
        position += c.len_utf8();
    }
    if start < css.len() {
        segments.push(Segment::Other(&css[start..]));
    }
    segments
}

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-' || c == '_'
}

/// Rebuilds a selector prelude, offering every `#id` and `.class` name to
/// `rename`. A `.` directly after a digit is a decimal point, not a class.
fn map_selector_names(prelude: &str, mut rename: impl FnMut(char, &str) -> Option<String>) -> String {
    let mut out = String::with_capacity(prelude.len());
    let mut rest = prelude;
    let mut previous = None;
    while let Some(c) = rest.chars().next() {
        if let Some(len) = opaque_len(rest) {
            out.push_str(&rest[..len]);
            rest = &rest[len..];
            previous = None;
            continue;
        }
        out.push(c);
        rest = &rest[c.len_utf8()..];
        let sigil = c == '#' || (c == '.' && !previous.is_some_and(|p: char| p.is_ascii_digit()));
        previous = Some(c);
        if !sigil {
            continue;
        }
        let end = rest.find(|c: char| !is_name_char(c)).unwrap_or(rest.len());
        if end == 0 {
            continue;
        }
        let name = &rest[..end];
        match rename(c, name) {
            Some(renamed) => out.push_str(&renamed),
            None => out.push_str(name),
        }
        // `.` right after a name starts a class.
        previous = None;
        rest = &rest[end..];
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builtin::testing::apply;
    use rstest::rstest;

    async fn prefixed(markup: &str) -> String {
        apply(&css_prefix(), markup, "test").await
    }

    #[rstest]
    #[case(
        r#"<svg><rect id="rect1" /><circle id="circle1" /></svg>"#,
        r#"<svg><rect id="test--rect1"></rect><circle id="test--circle1"></circle></svg>"#
    )]
    #[case(
        r#"<svg><rect class="shape red" /><circle class="shape blue" /></svg>"#,
        r#"<svg><rect class="test--shape test--red"></rect><circle class="test--shape test--blue"></circle></svg>"#
    )]
    #[case(
        r#"<svg><rect class="" /><circle class="  " /></svg>"#,
        r#"<svg><rect class=""></rect><circle class=" "></circle></svg>"#
    )]
    #[case(
        r#"<svg><rect class="shape  red   big" /></svg>"#,
        r#"<svg><rect class="test--shape test--red test--big"></rect></svg>"#
    )]
    #[case(
        r#"<svg><linearGradient id="gradient1" /><rect fill="url(#gradient1)" /></svg>"#,
        r#"<svg><linearGradient id="test--gradient1"></linearGradient><rect fill="url(#test--gradient1)"></rect></svg>"#
    )]
    #[case(
        r##"<svg><clipPath id="clip1" /><use href="#clip1" /></svg>"##,
        r##"<svg><clipPath id="test--clip1"></clipPath><use href="#test--clip1"></use></svg>"##
    )]
    #[case(
        r##"<svg><pattern id="p1" /><rect xlink:href="#p1" /></svg>"##,
        r##"<svg><pattern id="test--p1"></pattern><rect xlink:href="#test--p1"></rect></svg>"##
    )]
    #[case(
        r#"<svg><g id="group1"><rect id="rect1" class="shape" /></g></svg>"#,
        r#"<svg><g id="test--group1"><rect id="test--rect1" class="test--shape"></rect></g></svg>"#
    )]
    #[case(
        r#"<svg><rect x="10" width="30" stroke="blue" /></svg>"#,
        r#"<svg><rect x="10" width="30" stroke="blue"></rect></svg>"#
    )]
    #[case(
        r##"<svg><rect fill="url('#missing')" href="#missing" /></svg>"##,
        r##"<svg><rect fill="url('#missing')" href="#missing"></rect></svg>"##
    )]
    #[case(
        r#"<svg id="root" class="icon"><rect id="a" /></svg>"#,
        r#"<svg id="root" class="icon"><rect id="test--a"></rect></svg>"#
    )]
    #[tokio::test]
    async fn test_dom(#[case] markup: &str, #[case] expected: &str) {
        assert_eq!(prefixed(markup).await, expected);
    }

    #[rstest]
    #[case(".shape{fill:url(#g1)}", ".test--shape{fill:url(#test--g1)}")]
    #[case("#rect1 { fill: red; } .shape { stroke: blue; }", "#test--rect1 { fill: red; } .test--shape { stroke: blue; }")]
    #[case(
        "#rect1:hover { fill: red; } .shape > .inner { stroke: blue; }",
        "#test--rect1:hover { fill: red; } .test--shape > .test--inner { stroke: blue; }"
    )]
    #[case(
        "#rect1.shape, .container > .inner, .outer #circle1 { fill: red; }",
        "#test--rect1.test--shape, .test--container > .test--inner, .test--outer #test--circle1 { fill: red; }"
    )]
    #[case(
        r##".c1{filter:url(#f1)}.c2{fill:url("#f2")}.c3{mask:url( #f3 )}.c4{mask:url( '#f4' )}"##,
        r##".test--c1{filter:url(#test--f1)}.test--c2{fill:url("#test--f2")}.test--c3{mask:url( #test--f3 )}.test--c4{mask:url( '#test--f4' )}"##
    )]
    #[case(
        "@media (min-width: 768px) { .shape { fill: red; } } @keyframes anim1 { from { opacity: 0; } 50.5% { opacity: 0.5; } }",
        "@media (min-width: 768px) { .test--shape { fill: red; } } @keyframes anim1 { from { opacity: 0; } 50.5% { opacity: 0.5; } }"
    )]
    #[case(".a { fill: #fff; opacity: .5 }", ".test--a { fill: #fff; opacity: .5 }")]
    #[case(".icon2.active, #g3.on { }", ".test--icon2.test--active, #test--g3.test--on { }")]
    #[case(r#"/* .note { } */ .a[data-x=".b"] { }"#, r#"/* .note { } */ .test--a[data-x=".b"] { }"#)]
    #[tokio::test]
    async fn test_style(#[case] css: &str, #[case] expected: &str) {
        let markup = format!("<svg><style>{css}</style><rect /></svg>");
        let expected = format!("<svg><style>{expected}</style><rect></rect></svg>");
        assert_eq!(prefixed(&markup).await, expected);
    }

    #[tokio::test]
    async fn css_only_names_and_dom_names_share_one_table() {
        let markup = concat!(
            r#"<svg><style>#gradient1 { stop-color: red; } .shape { fill: url(#gradient1); }</style>"#,
            r#"<linearGradient id="gradient1" /><rect class="shape" /><circle fill="url(#gradient1)" /></svg>"#,
        );
        let expected = concat!(
            r#"<svg><style>#test--gradient1 { stop-color: red; } .test--shape { fill: url(#test--gradient1); }</style>"#,
            r#"<linearGradient id="test--gradient1"></linearGradient><rect class="test--shape"></rect>"#,
            r#"<circle fill="url(#test--gradient1)"></circle></svg>"#,
        );
        assert_eq!(prefixed(markup).await, expected);
    }

    #[tokio::test]
    async fn style_only_url_reference_renames_later_attribute() {
        // `g1` never appears as a DOM id, but the attribute still follows the CSS.
        let markup = r#"<svg><style>.a { fill: url(#g1) }</style><rect mask="url(#g1)" /></svg>"#;
        let expected = r#"<svg><style>.test--a { fill: url(#test--g1) }</style><rect mask="url(#test--g1)"></rect></svg>"#;
        assert_eq!(prefixed(markup).await, expected);
    }

    #[tokio::test]
    async fn cdata_style_blocks_are_rewritten() {
        let markup = "<svg><style><![CDATA[.a > #b { }]]></style><g id=\"b\" class=\"a\" /></svg>";
        let expected =
            "<svg><style><![CDATA[.test--a > #test--b { }]]></style><g id=\"test--b\" class=\"test--a\"></g></svg>";
        assert_eq!(prefixed(markup).await, expected);
    }

    #[tokio::test]
    async fn uses_the_context_id() {
        let out = apply(&css_prefix(), r#"<svg><rect id="a" /></svg>"#, "icon").await;
        assert_eq!(out, r#"<svg><rect id="icon--a"></rect></svg>"#);
    }
}
