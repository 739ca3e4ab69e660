use crate::Processor;

pub const DEFAULT_KEEP_COLOR_ATTRIBUTE: &str = "data-keep-color";

const COLOR_ATTRIBUTES: [&str; 2] = ["stroke", "fill"];

/// Rewrites every `stroke` and `fill` to `currentColor` so the icon takes the
/// text colour of wherever it's used.
///
/// Elements carrying the ignore attribute (`data-keep-color` unless another
/// name is given) are left alone, and the attribute itself is stripped. If the
/// root carries it, nothing in the icon is rewritten. Empty values, `none` and
/// `transparent` are never touched.
pub fn force_current_color(ignore_attribute: Option<&str>) -> Processor {
    let ignore = ignore_attribute.unwrap_or(DEFAULT_KEEP_COLOR_ATTRIBUTE).to_string();
    Processor::from_fn("force-current-color", move |svg, _| {
        if svg.attributes.remove(&ignore).is_some() {
            return Ok(());
        }
        svg.walk_mut(&mut |element| {
            if element.attributes.remove(&ignore).is_some() {
                return;
            }
            for (name, value) in element.attributes.values_mut() {
                if COLOR_ATTRIBUTES.contains(&name) && !matches!(value.as_str(), "" | "none" | "transparent") {
                    *value = "currentColor".to_string();
                }
            }
        });
        Ok(())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builtin::testing::apply;
    use rstest::rstest;

    #[rstest]
    #[case(
        r#"<svg><path stroke="blue" fill="red" /></svg>"#,
        r#"<svg><path stroke="currentColor" fill="currentColor"></path></svg>"#
    )]
    #[case(
        r##"<svg><rect stroke="green" /><circle fill="#000" /></svg>"##,
        r#"<svg><rect stroke="currentColor"></rect><circle fill="currentColor"></circle></svg>"#
    )]
    #[case(
        r#"<svg data-keep-color><path stroke="blue" fill="red"/></svg>"#,
        r#"<svg><path stroke="blue" fill="red"></path></svg>"#
    )]
    #[case(
        r#"<svg><path stroke="blue" fill="red" /><rect stroke="green" data-keep-color /></svg>"#,
        r#"<svg><path stroke="currentColor" fill="currentColor"></path><rect stroke="green"></rect></svg>"#
    )]
    #[case(r#"<svg><path stroke="" fill="" /></svg>"#, r#"<svg><path stroke="" fill=""></path></svg>"#)]
    #[case(
        r#"<svg><path fill="none" stroke="transparent" /></svg>"#,
        r#"<svg><path fill="none" stroke="transparent"></path></svg>"#
    )]
    #[case(
        r#"<svg><g data-keep-color fill="red"><circle fill="red" /></g><rect fill="green" /></svg>"#,
        r#"<svg><g fill="red"><circle fill="currentColor"></circle></g><rect fill="currentColor"></rect></svg>"#
    )]
    #[case(
        r#"<svg><filter><feFlood flood-color="red" /></filter></svg>"#,
        r#"<svg><filter><feFlood flood-color="red"></feFlood></filter></svg>"#
    )]
    #[case(r#"<svg fill="black"></svg>"#, r#"<svg fill="currentColor"></svg>"#)]
    #[tokio::test]
    async fn test_default_attribute(#[case] markup: &str, #[case] expected: &str) {
        assert_eq!(apply(&force_current_color(None), markup, "x").await, expected);
    }

    #[rstest]
    #[case(
        r#"<svg data-preserve-colors><path stroke="blue" fill="red" /></svg>"#,
        r#"<svg><path stroke="blue" fill="red"></path></svg>"#
    )]
    #[case(
        r#"<svg><path stroke="blue" data-preserve-colors /><circle fill="green" data-keep-color /></svg>"#,
        r#"<svg><path stroke="blue"></path><circle fill="currentColor" data-keep-color=""></circle></svg>"#
    )]
    #[tokio::test]
    async fn test_custom_attribute(#[case] markup: &str, #[case] expected: &str) {
        assert_eq!(apply(&force_current_color(Some("data-preserve-colors")), markup, "x").await, expected);
    }
}
