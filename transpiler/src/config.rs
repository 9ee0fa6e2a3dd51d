use serde::Deserialize;

/// Output formatting options for the HTML renderer.
///
/// Formatting never changes the meaning of the document, only the whitespace
/// placed between tags.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RenderConfig {
    /// Put every element on its own indented line.
    pub pretty: bool,
    /// Spaces per nesting level when `pretty` is set.
    pub indent_width: u8,
}

impl RenderConfig {
    pub fn compact() -> Self {
        RenderConfig::default()
    }

    pub fn pretty(indent_width: u8) -> Self {
        RenderConfig {
            pretty: true,
            indent_width,
        }
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        RenderConfig {
            pretty: false,
            indent_width: 2,
        }
    }
}
