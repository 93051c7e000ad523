//! # Stanza
//!
//! One discrete structured message unit on the hub stream.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Well-known element and attribute names used on the Harmony stream.
pub mod names {
    /// Query element carrying requests and replies.
    pub const IQ: &str = "iq";
    /// Message element carrying pushed events.
    pub const MESSAGE: &str = "message";
    /// Payload child of requests and replies.
    pub const OA: &str = "oa";
    /// Event child of pushed notifications.
    pub const EVENT: &str = "event";
    /// Correlation identifier attribute.
    pub const ID: &str = "id";
    /// Event type / query type attribute.
    pub const TYPE: &str = "type";
}

/// A structured stanza: element name, ordered attributes, children and text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stanza {
    name: String,
    attrs: Vec<(String, String)>,
    children: Vec<Stanza>,
    text: Option<String>,
}

impl Stanza {
    /// Create an empty element with the given name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Start building an element with the given name.
    #[must_use]
    pub fn builder(name: impl Into<String>) -> StanzaBuilder {
        StanzaBuilder {
            stanza: Self::new(name),
        }
    }

    /// Element name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Value of an attribute, if present.
    #[must_use]
    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// All attributes in insertion order.
    pub fn attrs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.attrs.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// The `id` attribute.
    #[must_use]
    pub fn id(&self) -> Option<&str> {
        self.attr(names::ID)
    }

    /// First direct child with the given name.
    #[must_use]
    pub fn child(&self, name: &str) -> Option<&Stanza> {
        self.children.iter().find(|c| c.name == name)
    }

    /// All direct children.
    #[must_use]
    pub fn children(&self) -> &[Stanza] {
        &self.children
    }

    /// Text content of this element.
    #[must_use]
    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    /// Text content of the first direct child with the given name.
    #[must_use]
    pub fn child_text(&self, name: &str) -> Option<&str> {
        self.child(name).and_then(Stanza::text)
    }
}

/// Fluent builder for [`Stanza`].
#[derive(Debug, Clone)]
pub struct StanzaBuilder {
    stanza: Stanza,
}

impl StanzaBuilder {
    /// Set an attribute. An existing attribute with the same key is replaced.
    #[must_use]
    pub fn attr(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let key = key.into();
        let value = value.into();
        match self.stanza.attrs.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.stanza.attrs.push((key, value)),
        }
        self
    }

    /// Append a child element.
    #[must_use]
    pub fn child(mut self, child: Stanza) -> Self {
        self.stanza.children.push(child);
        self
    }

    /// Set the text content.
    #[must_use]
    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.stanza.text = Some(text.into());
        self
    }

    /// Set the text content when present.
    #[must_use]
    pub fn maybe_text(mut self, text: Option<impl Into<String>>) -> Self {
        self.stanza.text = text.map(Into::into);
        self
    }

    /// Finish the stanza.
    #[must_use]
    pub fn build(self) -> Stanza {
        self.stanza
    }
}

fn write_escaped(f: &mut fmt::Formatter<'_>, raw: &str) -> fmt::Result {
    for c in raw.chars() {
        match c {
            '&' => f.write_str("&amp;")?,
            '<' => f.write_str("&lt;")?,
            '>' => f.write_str("&gt;")?,
            '"' => f.write_str("&quot;")?,
            '\'' => f.write_str("&apos;")?,
            _ => write!(f, "{c}")?,
        }
    }
    Ok(())
}

/// Renders an XML-like form for logs.
impl fmt::Display for Stanza {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}", self.name)?;
        for (k, v) in &self.attrs {
            write!(f, " {k}=\"")?;
            write_escaped(f, v)?;
            f.write_str("\"")?;
        }
        if self.text.is_none() && self.children.is_empty() {
            return f.write_str("/>");
        }
        f.write_str(">")?;
        if let Some(text) = &self.text {
            write_escaped(f, text)?;
        }
        for child in &self.children {
            write!(f, "{child}")?;
        }
        write!(f, "</{}>", self.name)
    }
}
