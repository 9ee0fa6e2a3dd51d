use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::debug;
use transpiler::RenderConfig;

/// Contents of a `btml.toml` configuration file.
///
/// ```toml
/// [render]
/// pretty = true
/// indent_width = 4
/// ```
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub render: RenderConfig,
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("cannot read config '{}'", path.display()))?;
        let config: Config = toml::from_str(&text)
            .with_context(|| format!("invalid config '{}'", path.display()))?;
        debug!(path = %path.display(), ?config, "loaded config");
        Ok(config)
    }
}

/// Build the render configuration: config file first, then command line
/// flags on top.
pub fn resolve_render_config(
    config_path: Option<&Path>,
    pretty: bool,
    indent_width: Option<u8>,
) -> Result<RenderConfig> {
    let mut render = match config_path {
        Some(path) => Config::load(path)?.render,
        None => RenderConfig::default(),
    };
    if pretty {
        render.pretty = true;
    }
    if let Some(width) = indent_width {
        render.indent_width = width;
    }
    Ok(render)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn config_file(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn defaults_without_file() {
        let render = resolve_render_config(None, false, None).unwrap();
        assert_eq!(render, RenderConfig::default());
    }

    #[test]
    fn file_values_are_used() {
        let file = config_file("[render]\npretty = true\nindent_width = 4\n");
        let render = resolve_render_config(Some(file.path()), false, None).unwrap();
        assert_eq!(render, RenderConfig::pretty(4));
    }

    #[test]
    fn flags_override_file() {
        let file = config_file("[render]\nindent_width = 4\n");
        let render = resolve_render_config(Some(file.path()), true, Some(1)).unwrap();
        assert_eq!(render, RenderConfig::pretty(1));
    }

    #[test]
    fn indent_width_out_of_range_is_an_error() {
        let file = config_file("[render]\nindent_width = 100000\n");
        let err = resolve_render_config(Some(file.path()), true, None).unwrap_err();
        assert!(err.to_string().starts_with("invalid config"));
    }

    #[test]
    fn empty_file_is_default() {
        let file = config_file("");
        let render = resolve_render_config(Some(file.path()), false, None).unwrap();
        assert_eq!(render, RenderConfig::default());
    }

    #[test]
    fn bad_files_are_errors() {
        let file = config_file("[render]\npretty = \"yes\"\n");
        let err = resolve_render_config(Some(file.path()), false, None).unwrap_err();
        assert!(err.to_string().starts_with("invalid config"));

        let missing = Path::new("/definitely/not/here/btml.toml");
        let err = resolve_render_config(Some(missing), false, None).unwrap_err();
        assert!(err.to_string().starts_with("cannot read config"));
    }
}
