use crate::error::Result;
use crate::{Pipeline, Processor, builtin};

/// A built-in processor described as data, as found in configuration files.
///
/// ```toml
/// process_sprite_symbol = [
///     { kind = "remove-sizes" },
///     { kind = "force-current-color", ignore_attribute = "data-original" },
///     { kind = "remove-tags", tags = ["title", "desc"] },
///     { kind = "css-prefix" },
/// ]
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "kind", rename_all = "kebab-case"))]
pub enum ProcessorSpec {
    RemoveSizes,
    ForceCurrentColor {
        #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
        ignore_attribute: Option<String>,
    },
    RemoveTags {
        tags: Vec<String>,
    },
    CssPrefix,
}

impl ProcessorSpec {
    /// Builds the processor. Fails when the options are unusable (an invalid
    /// selector in `remove-tags`, for example).
    pub fn build(&self) -> Result<Processor> {
        Ok(match self {
            Self::RemoveSizes => builtin::remove_sizes(),
            Self::ForceCurrentColor { ignore_attribute } => builtin::force_current_color(ignore_attribute.as_deref()),
            Self::RemoveTags { tags } => builtin::remove_tags(tags)?,
            Self::CssPrefix => builtin::css_prefix(),
        })
    }
}

impl TryFrom<&ProcessorSpec> for Processor {
    type Error = crate::error::Error;

    fn try_from(spec: &ProcessorSpec) -> Result<Self> {
        spec.build()
    }
}

impl Pipeline {
    /// Builds a pipeline from processor descriptions, failing on the first
    /// unusable one.
    pub fn from_specs<'a>(specs: impl IntoIterator<Item = &'a ProcessorSpec>) -> Result<Self> {
        specs.into_iter().map(ProcessorSpec::build).collect()
    }
}
