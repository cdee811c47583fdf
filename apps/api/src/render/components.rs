//! Building blocks shared by the four layouts.

use crate::portfolio::model::{initials, PortfolioData, Project};
use crate::render::node::{Element, Node, Style, Tag};
use crate::render::qr::{QrBlock, QrLevel};
use crate::render::RenderContext;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContactKind {
    LinkedIn,
    GitHub,
    Email,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactLink {
    pub kind: ContactKind,
    pub label: String,
    pub href: String,
    pub test_id: &'static str,
}

/// Contact links in display order, skipping blank fields.
pub fn contact_links(data: &PortfolioData) -> Vec<ContactLink> {
    let mut links = Vec::new();
    if let Some(href) = data.linkedin_url() {
        links.push(ContactLink {
            kind: ContactKind::LinkedIn,
            label: "LinkedIn".to_string(),
            href,
            test_id: "link-linkedin",
        });
    }
    if let Some(href) = data.github_url() {
        links.push(ContactLink {
            kind: ContactKind::GitHub,
            label: "GitHub".to_string(),
            href,
            test_id: "link-github",
        });
    }
    if let Some(email) = data.email_address() {
        links.push(ContactLink {
            kind: ContactKind::Email,
            label: "Email".to_string(),
            href: format!("mailto:{email}"),
            test_id: "link-email",
        });
    }
    links
}

/// Appends a two-digit hex alpha to `#rgb` / `#rrggbb`; other inputs pass through.
pub fn with_alpha(color: &str, alpha: &str) -> String {
    let Some(hex) = color
        .strip_prefix('#')
        .filter(|h| h.chars().all(|c| c.is_ascii_hexdigit()))
    else {
        return color.to_string();
    };
    match hex.len() {
        6 => format!("#{hex}{alpha}"),
        3 => {
            let expanded: String = hex.chars().flat_map(|c| [c, c]).collect();
            format!("#{expanded}{alpha}")
        }
        _ => color.to_string(),
    }
}

/// Round avatar: the profile image when present, initials otherwise.
pub fn avatar(data: &PortfolioData, size: f32, border: Option<&str>, tint: Option<&str>) -> Element {
    let mut style = Style::default().size(size, size);
    if let Some(color) = border {
        style = style.border(crate::render::node::BorderSide::All, 4.0, color);
    }

    let inner: Node = match data.profile_image.as_deref().filter(|s| !s.is_empty()) {
        Some(src) => Element::new(Tag::Img)
            .class("h-full w-full rounded-full object-cover")
            .style(Style::default().size(size, size))
            .attr("src", src)
            .attr("alt", data.full_name.clone())
            .into(),
        None => {
            let mut fallback = Style::default()
                .size(size, size)
                .font_size(size * 0.3)
                .centered();
            if let Some(color) = tint {
                fallback = fallback.background(&with_alpha(color, "20")).color(color);
            } else {
                fallback = fallback.background("#f1f5f9");
            }
            Element::new(Tag::Div)
                .class("flex h-full w-full items-center justify-center rounded-full")
                .style(fallback)
                .attr("data-testid", "avatar-initials")
                .text(initials(&data.full_name))
                .into()
        }
    };

    Element::new(Tag::Div)
        .class("shrink-0 overflow-hidden rounded-full")
        .style(style)
        .attr("data-testid", "avatar")
        .child(inner)
}

/// QR code for the person's canonical URL. Falls back to the plain URL when the
/// value cannot be encoded (e.g. an absurdly long name).
pub fn qr_code(
    data: &PortfolioData,
    ctx: &RenderContext,
    size: f32,
    fg_color: &str,
    level: QrLevel,
    caption: &str,
) -> Element {
    let url = data.public_url(&ctx.public_base_url);
    let code: Node = match QrBlock::encode(&url, size, fg_color, level) {
        Ok(qr) => qr.into(),
        Err(e) => {
            tracing::warn!("QR encoding failed for {url}: {e}");
            Element::new(Tag::P).class("text-xs break-all").text(url.clone()).into()
        }
    };

    let mut wrapper = Element::new(Tag::Div)
        .class("flex flex-col items-center gap-2")
        .attr("data-testid", "qr-code")
        .attr("data-qr-url", url)
        .child(code);
    if !caption.is_empty() {
        wrapper = wrapper.child(
            Element::new(Tag::P)
                .class("text-xs text-muted-foreground")
                .style(Style::default().color("#64748b").font_size(11.0))
                .text(caption),
        );
    }
    wrapper
}

pub fn project_image(project: &Project, height: f32, class: &str) -> Option<Element> {
    project
        .image
        .as_deref()
        .filter(|s| !s.is_empty())
        .map(|src| {
            Element::new(Tag::Img)
                .class(class)
                .style(Style::default().size(480.0, height))
                .attr("src", src)
                .attr("alt", project.title.clone())
        })
}

pub fn project_link(project: &Project, index: usize, color: &str) -> Option<Element> {
    project
        .link
        .as_deref()
        .filter(|s| !s.is_empty())
        .map(|href| {
            Element::new(Tag::A)
                .class("text-sm underline")
                .style(Style::default().color(color))
                .attr("href", href)
                .attr("target", "_blank")
                .attr("rel", "noopener noreferrer")
                .attr("data-testid", format!("link-project-{index}"))
                .text("Voir le projet")
        })
}

/// Heading text, bio paragraph etc. in the person's own words.
pub fn paragraph(text: &str, class: &str, style: Style) -> Element {
    Element::new(Tag::P).class(class).style(style).text(text)
}
