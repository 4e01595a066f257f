//! Typed queries over a parsed HTML tree.
//!
//! Every lookup that is expected to hit returns a [`Result`] and fails with
//! [`ExtractError::StructureMismatch`] naming the query, instead of yielding an
//! empty value that would surface later as a confusing validation error.

use scraper::{ElementRef, Html, Node as HtmlNode, Selector};

use crate::error::ExtractError;

/// A compiled CSS query that remembers its source text for error reporting.
#[derive(Debug, Clone)]
pub struct Query {
    css: String,
    selector: Selector,
}

impl Query {
    pub fn parse(css: &str) -> Result<Self, ExtractError> {
        let selector = Selector::parse(css).map_err(|e| ExtractError::Selector {
            selector: css.to_string(),
            message: e.to_string(),
        })?;
        Ok(Self {
            css: css.to_string(),
            selector,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.css
    }
}

#[derive(Debug)]
pub struct Document {
    html: Html,
}

impl Document {
    pub fn parse(body: &str) -> Self {
        Self {
            html: Html::parse_document(body),
        }
    }

    pub fn root(&self) -> Node<'_> {
        Node(self.html.root_element())
    }

    /// First element matching `query`.
    pub fn one(&self, query: &Query) -> Result<Node<'_>, ExtractError> {
        self.root().one(query)
    }

    /// All elements matching `query`, in document order. May be empty.
    pub fn all(&self, query: &Query) -> Vec<Node<'_>> {
        self.root().all(query)
    }
}

/// An element inside a [`Document`].
#[derive(Debug, Clone, Copy)]
pub struct Node<'a>(ElementRef<'a>);

impl<'a> Node<'a> {
    pub fn one(&self, query: &Query) -> Result<Node<'a>, ExtractError> {
        self.0
            .select(&query.selector)
            .next()
            .map(Node)
            .ok_or_else(|| ExtractError::missing(query.as_str()))
    }

    pub fn all(&self, query: &Query) -> Vec<Node<'a>> {
        self.0.select(&query.selector).map(Node).collect()
    }

    pub fn name(&self) -> &'a str {
        self.0.value().name()
    }

    /// Concatenated text of all descendants.
    pub fn text(&self) -> String {
        self.0.text().collect()
    }

    /// Individual descendant text fragments, including whitespace-only ones.
    pub fn strings(&self) -> Vec<&'a str> {
        self.0.text().collect()
    }

    pub fn attr(&self, name: &str) -> Result<&'a str, ExtractError> {
        self.0.value().attr(name).ok_or_else(|| {
            ExtractError::missing(format!("attribute '{name}' on <{}>", self.name()))
        })
    }

    /// Concatenated text of all descendants, skipping anything inside a `tag` element.
    pub fn text_excluding(&self, tag: &str) -> String {
        let mut out = String::new();
        for node in self.0.descendants() {
            let HtmlNode::Text(text) = node.value() else {
                continue;
            };
            let inside_excluded = node
                .ancestors()
                .take_while(|ancestor| ancestor.id() != self.0.id())
                .any(|ancestor| {
                    ancestor
                        .value()
                        .as_element()
                        .is_some_and(|el| el.name() == tag)
                });
            if !inside_excluded {
                out.push_str(text);
            }
        }
        out
    }
}
