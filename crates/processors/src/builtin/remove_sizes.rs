use crate::Processor;

/// Drops `width` and `height` from the root element, so the icon scales with
/// its container. Nested elements keep their sizes.
pub fn remove_sizes() -> Processor {
    Processor::from_fn("remove-sizes", |svg, _| {
        svg.attributes.remove("width");
        svg.attributes.remove("height");
        Ok(())
    })
}
