//! The processors that ship with iconsprite.

mod css_prefix;
mod force_current_color;
mod remove_sizes;
mod remove_tags;

pub use self::css_prefix::css_prefix;
pub use self::force_current_color::{DEFAULT_KEEP_COLOR_ATTRIBUTE, force_current_color};
pub use self::remove_sizes::remove_sizes;
pub use self::remove_tags::remove_tags;

#[cfg(test)]
pub(crate) mod testing {
    use crate::{Processor, ProcessorContext};
    use iconsprite_dom::{find_mut, parse};

    /// Parses `markup`, runs `processor` on its `<svg>` and serializes the
    /// whole document again.
    pub(crate) async fn apply(processor: &Processor, markup: &str, id: &str) -> String {
        let mut nodes = parse(markup).unwrap();
        let svg = find_mut(&mut nodes, "svg").unwrap();
        processor.run(svg, &ProcessorContext::sprite(id)).await.unwrap();
        nodes.iter().map(ToString::to_string).collect()
    }
}
