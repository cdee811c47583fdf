//! Visual document tree produced by the template layouts.
//!
//! The tree is the single source for both outputs: it serializes to HTML for the
//! preview and the static bundle, and it is flowed by `layout::flow` into paint
//! operations for the PDF snapshot. Only the style properties the snapshot
//! understands are typed; everything else lives in the utility `class` string.

use std::fmt::Write as _;

use crate::render::qr::QrBlock;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tag {
    Div,
    Section,
    Header,
    H1,
    H2,
    H3,
    P,
    Span,
    A,
    Img,
}

impl Tag {
    pub fn name(&self) -> &'static str {
        match self {
            Tag::Div => "div",
            Tag::Section => "section",
            Tag::Header => "header",
            Tag::H1 => "h1",
            Tag::H2 => "h2",
            Tag::H3 => "h3",
            Tag::P => "p",
            Tag::Span => "span",
            Tag::A => "a",
            Tag::Img => "img",
        }
    }

    pub fn is_inline(&self) -> bool {
        matches!(self, Tag::Span | Tag::A)
    }

    fn is_void(&self) -> bool {
        matches!(self, Tag::Img)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Align {
    #[default]
    Left,
    Center,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BorderSide {
    All,
    Left,
    Bottom,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Border {
    pub side: BorderSide,
    pub width: f32,
    pub color: String,
}

/// Style properties shared by the HTML serializer and the snapshot layout.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Style {
    pub color: Option<String>,
    pub background: Option<String>,
    pub border: Option<Border>,
    pub padding: Option<f32>,
    pub size: Option<(f32, f32)>,
    pub font_size: Option<f32>,
    pub align: Align,
}

impl Style {
    pub fn color(mut self, color: &str) -> Self {
        self.color = Some(color.to_string());
        self
    }

    pub fn background(mut self, color: &str) -> Self {
        self.background = Some(color.to_string());
        self
    }

    pub fn border(mut self, side: BorderSide, width: f32, color: &str) -> Self {
        self.border = Some(Border {
            side,
            width,
            color: color.to_string(),
        });
        self
    }

    pub fn padding(mut self, px: f32) -> Self {
        self.padding = Some(px);
        self
    }

    pub fn size(mut self, width: f32, height: f32) -> Self {
        self.size = Some((width, height));
        self
    }

    pub fn font_size(mut self, px: f32) -> Self {
        self.font_size = Some(px);
        self
    }

    pub fn centered(mut self) -> Self {
        self.align = Align::Center;
        self
    }

    fn to_css(&self) -> String {
        let mut css = String::new();
        if let Some(color) = &self.color {
            let _ = write!(css, "color:{color};");
        }
        if let Some(bg) = &self.background {
            let _ = write!(css, "background-color:{bg};");
        }
        if let Some(border) = &self.border {
            let property = match border.side {
                BorderSide::All => "border",
                BorderSide::Left => "border-left",
                BorderSide::Bottom => "border-bottom",
            };
            let _ = write!(css, "{property}:{}px solid {};", border.width, border.color);
        }
        if let Some(padding) = self.padding {
            let _ = write!(css, "padding:{padding}px;");
        }
        if let Some((w, h)) = self.size {
            let _ = write!(css, "width:{w}px;height:{h}px;");
        }
        if let Some(font_size) = self.font_size {
            let _ = write!(css, "font-size:{font_size}px;");
        }
        if self.align == Align::Center {
            css.push_str("text-align:center;");
        }
        css
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    pub tag: Tag,
    pub class: String,
    pub style: Style,
    pub attrs: Vec<(&'static str, String)>,
    pub children: Vec<Node>,
}

impl Element {
    pub fn new(tag: Tag) -> Self {
        Self {
            tag,
            class: String::new(),
            style: Style::default(),
            attrs: vec![],
            children: vec![],
        }
    }

    pub fn class(mut self, class: &str) -> Self {
        self.class = class.to_string();
        self
    }

    pub fn style(mut self, style: Style) -> Self {
        self.style = style;
        self
    }

    pub fn attr(mut self, name: &'static str, value: impl Into<String>) -> Self {
        self.attrs.push((name, value.into()));
        self
    }

    pub fn child(mut self, node: impl Into<Node>) -> Self {
        self.children.push(node.into());
        self
    }

    pub fn children<I, N>(mut self, nodes: I) -> Self
    where
        I: IntoIterator<Item = N>,
        N: Into<Node>,
    {
        self.children.extend(nodes.into_iter().map(Into::into));
        self
    }

    pub fn text(self, text: impl Into<String>) -> Self {
        self.child(Node::Text(text.into()))
    }

    pub fn get_attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, v)| v.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Element(Element),
    Text(String),
    Qr(QrBlock),
}

impl From<Element> for Node {
    fn from(element: Element) -> Self {
        Node::Element(element)
    }
}

impl From<QrBlock> for Node {
    fn from(qr: QrBlock) -> Self {
        Node::Qr(qr)
    }
}

impl Node {
    /// Concatenated text content of the subtree, in document order.
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        match self {
            Node::Text(text) => {
                if !out.is_empty() {
                    out.push(' ');
                }
                out.push_str(text);
            }
            Node::Element(element) => {
                for child in &element.children {
                    child.collect_text(out);
                }
            }
            Node::Qr(_) => {}
        }
    }

    /// Depth-first search for the first element carrying `data-testid == id`.
    pub fn find_by_test_id(&self, id: &str) -> Option<&Element> {
        match self {
            Node::Element(element) => {
                if element.get_attr("data-testid") == Some(id) {
                    return Some(element);
                }
                element.children.iter().find_map(|c| c.find_by_test_id(id))
            }
            _ => None,
        }
    }

    pub fn to_html(&self) -> String {
        let mut out = String::new();
        self.write_html(&mut out);
        out
    }

    fn write_html(&self, out: &mut String) {
        match self {
            Node::Text(text) => out.push_str(&escape_html(text)),
            Node::Qr(qr) => out.push_str(&qr.to_svg()),
            Node::Element(element) => {
                let _ = write!(out, "<{}", element.tag.name());
                if !element.class.is_empty() {
                    let _ = write!(out, " class=\"{}\"", escape_html(&element.class));
                }
                let css = element.style.to_css();
                if !css.is_empty() {
                    let _ = write!(out, " style=\"{}\"", escape_html(&css));
                }
                for (name, value) in &element.attrs {
                    let _ = write!(out, " {name}=\"{}\"", escape_html(value));
                }
                out.push('>');
                if element.tag.is_void() {
                    return;
                }
                for child in &element.children {
                    child.write_html(out);
                }
                let _ = write!(out, "</{}>", element.tag.name());
            }
        }
    }
}

pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html(r#"<a href="x">Tom & 'Jerry'</a>"#),
            "&lt;a href=&quot;x&quot;&gt;Tom &amp; &#39;Jerry&#39;&lt;/a&gt;"
        );
    }

    #[test]
    fn test_element_serializes_class_style_and_attrs() {
        let node: Node = Element::new(Tag::A)
            .class("link")
            .style(Style::default().color("#3b82f6"))
            .attr("href", "https://github.com/jd")
            .text("GitHub")
            .into();
        assert_eq!(
            node.to_html(),
            r#"<a class="link" style="color:#3b82f6;" href="https://github.com/jd">GitHub</a>"#
        );
    }

    #[test]
    fn test_img_is_void() {
        let node: Node = Element::new(Tag::Img).attr("src", "data:x").into();
        assert_eq!(node.to_html(), r#"<img src="data:x">"#);
    }

    #[test]
    fn test_text_is_escaped_in_output() {
        let node: Node = Element::new(Tag::P).text("<script>").into();
        assert_eq!(node.to_html(), "<p>&lt;script&gt;</p>");
    }

    #[test]
    fn test_text_content_and_find_by_test_id() {
        let node: Node = Element::new(Tag::Div)
            .child(Element::new(Tag::H1).attr("data-testid", "name").text("Jean"))
            .child(Element::new(Tag::P).text("Dev"))
            .into();
        assert_eq!(node.text_content(), "Jean Dev");
        assert_eq!(
            node.find_by_test_id("name").map(|e| e.tag),
            Some(Tag::H1)
        );
        assert!(node.find_by_test_id("missing").is_none());
    }
}
