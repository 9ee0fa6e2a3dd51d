pub mod config;
pub mod escape;
pub mod renderer;

pub use config::RenderConfig;
pub use renderer::render;

use btml::ParseError;

/// Parse BTML source and render it to HTML in one step.
pub fn compile(source: &str, config: &RenderConfig) -> Result<String, ParseError> {
    let document = btml::parse(source)?;
    Ok(render(&document, config))
}
