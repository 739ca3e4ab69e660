use std::borrow::Cow;

use exn::ResultExt;
use quick_xml::encoding::Decoder;
use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;
use tracing::instrument;

use crate::error::{ErrorKind, Result};
use crate::node::{Attributes, Element, Node};

/// Parses markup into a list of top-level nodes.
///
/// Mismatched end tags are an error; elements still open at the end of input
/// are closed implicitly. Attributes without a value (`<svg data-flag>`) are
/// accepted and get an empty value.
#[instrument(level = "trace", skip(markup), fields(markup_size = markup.len()))]
pub fn parse(markup: &str) -> Result<Vec<Node>> {
    let mut reader = Reader::from_str(markup);
    let mut open: Vec<Element> = Vec::new();
    let mut nodes: Vec<Node> = Vec::new();
    loop {
        let event = reader
            .read_event()
            .or_raise(|| ErrorKind::Malformed(reader.error_position()))?;
        match event {
            Event::Start(start) => open.push(element(&start, reader.decoder(), reader.buffer_position())?),
            Event::Empty(start) => {
                let element = element(&start, reader.decoder(), reader.buffer_position())?;
                append(&mut open, &mut nodes, element.into());
            },
            Event::End(_) => {
                if let Some(element) = open.pop() {
                    append(&mut open, &mut nodes, element.into());
                }
            },
            Event::Text(text) => append(&mut open, &mut nodes, Node::Text(lossy(&text))),
            Event::CData(data) => append(&mut open, &mut nodes, Node::CData(lossy(&data))),
            Event::Comment(comment) => append(&mut open, &mut nodes, Node::Comment(lossy(&comment))),
            Event::Decl(_) | Event::PI(_) | Event::DocType(_) => {},
            Event::Eof => break,
        }
    }
    while let Some(element) = open.pop() {
        tracing::trace!(element = %element.name, "closing unterminated element");
        append(&mut open, &mut nodes, element.into());
    }
    Ok(nodes)
}

fn lossy(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

fn append(open: &mut [Element], nodes: &mut Vec<Node>, node: Node) {
    match open.last_mut() {
        Some(parent) => parent.children.push(node),
        None => nodes.push(node),
    }
}

fn element(start: &BytesStart<'_>, decoder: Decoder, position: u64) -> Result<Element> {
    let mut attributes = Attributes::new();
    for attribute in start.html_attributes() {
        let attribute = attribute.or_raise(|| ErrorKind::Malformed(position))?;
        // Unknown entities (`&nbsp;` and friends) aren't fatal, keep the raw text.
        let value = attribute
            .decode_and_unescape_value(decoder)
            .map(Cow::into_owned)
            .unwrap_or_else(|_| lossy(&attribute.value));
        attributes.set(lossy(attribute.key.as_ref()), value);
    }
    Ok(Element { name: lossy(start.name().as_ref()), attributes, children: Vec::new() })
}
