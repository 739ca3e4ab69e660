use exn::ResultExt;
use iconsprite_dom::Selector;

use crate::Processor;
use crate::error::{ErrorKind, Result};

/// Removes every element matching any of the given selectors.
///
/// Selectors are parsed up front, so a typo fails here rather than halfway
/// through a build. Plain tag names work, as do attribute selectors and the
/// descendant and child combinators (`rect[fill="red"]`, `g > text`).
pub fn remove_tags<I, S>(tags: I) -> Result<Processor>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let selectors = tags
        .into_iter()
        .map(|tag| Selector::parse(tag.as_ref()).or_raise(|| ErrorKind::InvalidOptions("remove-tags")))
        .collect::<Result<Vec<_>>>()?;
    Ok(Processor::from_fn("remove-tags", move |svg, _| {
        for selector in &selectors {
            let removed = selector.remove_matching(svg);
            tracing::trace!(%selector, removed, "removed matching elements");
        }
        Ok(())
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builtin::testing::apply;
    use rstest::rstest;

    #[rstest]
    #[case(&["title"], r#"<svg><title>SVG Title</title><rect width="100" /></svg>"#, r#"<svg><rect width="100"></rect></svg>"#)]
    #[case(
        &["title", "desc"],
        "<svg><title>t</title><metadata>m</metadata><desc>d</desc></svg>",
        "<svg><metadata>m</metadata></svg>"
    )]
    #[case(&["circle"], r#"<svg><circle r="1"/><rect/><circle r="2"/></svg>"#, "<svg><rect></rect></svg>")]
    #[case(&["g"], "<svg><g><circle/><g><text>x</text></g></g><circle/></svg>", "<svg><circle></circle></svg>")]
    #[case(
        &[r#"rect[fill="red"]"#],
        r#"<svg><rect fill="red"/><rect fill="blue"/></svg>"#,
        r#"<svg><rect fill="blue"></rect></svg>"#
    )]
    #[case(
        &[r#"rect[fill="red"]"#, "circle", "g > text"],
        r#"<svg><rect fill="red"/><circle/><g><text>a</text><rect/></g><text>b</text></svg>"#,
        "<svg><g><rect></rect></g><text>b</text></svg>"
    )]
    #[case(&[], "<svg><rect/></svg>", "<svg><rect></rect></svg>")]
    #[tokio::test]
    async fn test_remove_tags(#[case] tags: &[&str], #[case] markup: &str, #[case] expected: &str) {
        let processor = remove_tags(tags).unwrap();
        assert_eq!(apply(&processor, markup, "x").await, expected);
    }

    #[test]
    fn invalid_selector_fails_up_front() {
        let err = remove_tags(["title", "a:hover"]).unwrap_err();
        assert_eq!(*err, ErrorKind::InvalidOptions("remove-tags"));
    }
}
