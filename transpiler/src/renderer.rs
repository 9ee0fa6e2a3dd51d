use btml::{Content, Document, Element};
use tracing::debug;

use crate::config::RenderConfig;
use crate::escape::{escape_attribute, escape_text};

const DOCTYPE: &str = "<!DOCTYPE html>";

/// Render a parsed document to HTML.
///
/// Total: every Document the parser can build has an HTML form.
pub fn render(document: &Document, config: &RenderConfig) -> String {
    let mut writer = HtmlWriter::new(config);
    if document.has_doctype {
        writer.out.push_str(DOCTYPE);
        writer.out.push('\n');
    }
    writer.element(&document.root, 0);

    debug!(
        bytes = writer.out.len(),
        pretty = config.pretty,
        "rendered html"
    );
    writer.out
}

struct HtmlWriter<'c> {
    config: &'c RenderConfig,
    out: String,
}

impl<'c> HtmlWriter<'c> {
    fn new(config: &'c RenderConfig) -> Self {
        HtmlWriter {
            config,
            out: String::new(),
        }
    }

    fn indent(&mut self, depth: usize) {
        if self.config.pretty {
            let width = depth.saturating_mul(usize::from(self.config.indent_width));
            self.out.extend(std::iter::repeat_n(' ', width));
        }
    }

    fn newline(&mut self) {
        if self.config.pretty {
            self.out.push('\n');
        }
    }

    fn open_tag(&mut self, element: &Element) {
        self.out.push('<');
        self.out.push_str(&element.tag);
        for attribute in &element.attributes {
            self.out.push(' ');
            self.out.push_str(&attribute.name);
            self.out.push_str("=\"");
            self.out.push_str(&escape_attribute(&attribute.value));
            self.out.push('"');
        }
    }

    fn close_tag(&mut self, element: &Element) {
        self.out.push_str("</");
        self.out.push_str(&element.tag);
        self.out.push('>');
    }

    /// Write `element` starting at the current position. The caller places
    /// it on a fresh line in pretty mode.
    fn element(&mut self, element: &Element, depth: usize) {
        self.indent(depth);
        self.open_tag(element);

        match &element.content {
            Content::SelfClosing => self.out.push_str(" />"),
            Content::Text(text) => {
                self.out.push('>');
                self.out.push_str(&escape_text(text));
                self.close_tag(element);
            }
            Content::Children(children) if children.is_empty() => {
                self.out.push('>');
                self.close_tag(element);
            }
            Content::Children(children) => {
                self.out.push('>');
                for child in children {
                    self.newline();
                    self.element(child, depth + 1);
                }
                self.newline();
                self.indent(depth);
                self.close_tag(element);
            }
        }
    }
}
