use std::fmt;

/// Indentation used by the canonical BTML formatter.
const FORMAT_INDENT: &str = "    ";

/// HTML elements that never have a closing tag.
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

/// Check whether `tag` names an HTML void element (case-insensitive).
pub fn is_void_element(tag: &str) -> bool {
    VOID_ELEMENTS.iter().any(|v| v.eq_ignore_ascii_case(tag))
}

/// A parsed BTML document: one root element, optionally preceded by `!html!`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub has_doctype: bool,
    pub root: Element,
}

impl Document {
    pub fn new(root: Element) -> Self {
        Document {
            has_doctype: false,
            root,
        }
    }

    pub fn with_doctype(root: Element) -> Self {
        Document {
            has_doctype: true,
            root,
        }
    }

    /// Total number of elements in the tree, root included.
    pub fn element_count(&self) -> usize {
        self.root.descendant_count() + 1
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: String,
    /// Decoded value. Escaped only when rendered.
    pub value: String,
}

impl Attribute {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Attribute {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// What an element holds. Exactly one form per element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Content {
    /// `tag { ... }`, possibly empty.
    Children(Vec<Element>),
    /// `tag "text"`.
    Text(String),
    /// `tag.`
    SelfClosing,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub tag: String,
    /// In source order. Names may repeat.
    pub attributes: Vec<Attribute>,
    pub content: Content,
}

impl Element {
    pub fn new(tag: impl Into<String>, content: Content) -> Self {
        Element {
            tag: tag.into(),
            attributes: Vec::new(),
            content,
        }
    }

    pub fn text(tag: impl Into<String>, text: impl Into<String>) -> Self {
        Element::new(tag, Content::Text(text.into()))
    }

    pub fn block(tag: impl Into<String>, children: Vec<Element>) -> Self {
        Element::new(tag, Content::Children(children))
    }

    pub fn self_closing(tag: impl Into<String>) -> Self {
        Element::new(tag, Content::SelfClosing)
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push(Attribute::new(name, value));
        self
    }

    /// Value of the first attribute called `name`.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.name == name)
            .map(|a| a.value.as_str())
    }

    pub fn children(&self) -> &[Element] {
        match &self.content {
            Content::Children(children) => children,
            Content::Text(_) | Content::SelfClosing => &[],
        }
    }

    fn descendant_count(&self) -> usize {
        self.children()
            .iter()
            .map(|c| c.descendant_count() + 1)
            .sum()
    }
}

// Display writes canonical BTML source, which parses back to an equal tree.

impl fmt::Display for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.has_doctype {
            writeln!(f, "!html!")?;
        }
        write_element(f, &self.root, 0)?;
        writeln!(f)
    }
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_element(f, self, 0)
    }
}

fn write_element(f: &mut fmt::Formatter<'_>, element: &Element, depth: usize) -> fmt::Result {
    write!(f, "{}", element.tag)?;

    if !element.attributes.is_empty() {
        write!(f, "[")?;
        for (i, attribute) in element.attributes.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}=", attribute.name)?;
            write_quoted(f, &attribute.value)?;
        }
        write!(f, "]")?;
    }

    match &element.content {
        Content::SelfClosing => write!(f, "."),
        Content::Text(text) => {
            write!(f, " ")?;
            write_quoted(f, text)
        }
        Content::Children(children) if children.is_empty() => write!(f, " {{ }}"),
        Content::Children(children) => {
            writeln!(f, " {{")?;
            for child in children {
                write!(f, "{}", FORMAT_INDENT.repeat(depth + 1))?;
                write_element(f, child, depth + 1)?;
                writeln!(f)?;
            }
            write!(f, "{}}}", FORMAT_INDENT.repeat(depth))
        }
    }
}

fn write_quoted(f: &mut fmt::Formatter<'_>, value: &str) -> fmt::Result {
    write!(f, "\"")?;
    for ch in value.chars() {
        match ch {
            '"' => write!(f, "\\\"")?,
            '\\' => write!(f, "\\\\")?,
            _ => write!(f, "{}", ch)?,
        }
    }
    write!(f, "\"")
}
