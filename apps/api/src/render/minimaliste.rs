use crate::portfolio::model::{PortfolioData, Template};
use crate::render::components::{avatar, contact_links, paragraph, project_image, project_link, qr_code};
use crate::render::node::{BorderSide, Element, Node, Style, Tag};
use crate::render::qr::QrLevel;
use crate::render::{Layout, RenderContext};

const INK: &str = "#0f172a";
const MUTED: &str = "#64748b";
const RULE: &str = "#e2e8f0";

/// Centered, monochrome. Colors only touch the link accents.
pub struct MinimalisteLayout;

impl Layout for MinimalisteLayout {
    fn template(&self) -> Template {
        Template::Minimaliste
    }

    fn render(&self, data: &PortfolioData, ctx: &RenderContext) -> Node {
        let mut root = Element::new(Tag::Div)
            .class("mx-auto max-w-3xl space-y-12")
            .style(Style::default().padding(48.0))
            .child(header(data));

        if let Some(bio) = data.bio_text() {
            root = root.child(
                section("section-bio", "À propos").child(
                    paragraph(bio, "leading-relaxed text-slate-700", Style::default().color("#334155"))
                        .attr("data-testid", "text-bio"),
                ),
            );
        }

        let skills = data.skill_tags();
        if !skills.is_empty() {
            root = root.child(
                section("section-skills", "Compétences").child(tag_row(
                    skills.iter().enumerate().map(|(i, s)| tag(s, &format!("badge-skill-{i}"))),
                )),
            );
        }

        if !data.tools.is_empty() {
            root = root.child(
                section("section-tools", "Outils").child(tag_row(
                    data.tools.iter().enumerate().map(|(i, t)| tag(t, &format!("badge-tool-{i}"))),
                )),
            );
        }

        if !data.projects.is_empty() {
            let entries = data.projects.iter().enumerate().map(|(i, project)| {
                let mut entry = Element::new(Tag::Div)
                    .class("space-y-2 border-b pb-6")
                    .style(Style::default().border(BorderSide::Bottom, 1.0, RULE))
                    .attr("data-testid", format!("card-project-{i}"));
                if let Some(img) = project_image(project, 160.0, "w-full h-40 object-cover") {
                    entry = entry.child(img);
                }
                entry = entry
                    .child(
                        Element::new(Tag::H3)
                            .class("text-lg font-medium")
                            .style(Style::default().color(INK))
                            .text(project.title.clone()),
                    )
                    .child(paragraph(
                        &project.description,
                        "text-sm text-slate-600",
                        Style::default().color("#475569"),
                    ));
                if !project.technologies.is_empty() {
                    entry = entry.child(
                        Element::new(Tag::P)
                            .class("text-xs text-slate-400")
                            .style(Style::default().color("#94a3b8").font_size(11.0))
                            .text(project.technologies.join(" · ")),
                    );
                }
                if let Some(link) = project_link(project, i, &data.primary_color) {
                    entry = entry.child(link);
                }
                entry
            });
            root = root.child(
                section("section-projects", "Projets")
                    .child(Element::new(Tag::Div).class("space-y-6").children(entries)),
            );
        }

        root.child(
            Element::new(Tag::Div)
                .class("flex justify-center pt-8")
                .style(Style::default().centered())
                .child(qr_code(data, ctx, 100.0, "#000000", QrLevel::M, "")),
        )
        .into()
    }
}

fn header(data: &PortfolioData) -> Element {
    let links = contact_links(data).into_iter().map(|link| {
        Element::new(Tag::A)
            .class("text-sm hover:underline")
            .style(Style::default().color(MUTED))
            .attr("href", link.href)
            .attr("target", "_blank")
            .attr("rel", "noopener noreferrer")
            .attr("data-testid", link.test_id)
            .text(link.label)
    });

    Element::new(Tag::Header)
        .class("space-y-4 text-center")
        .style(Style::default().centered())
        .child(avatar(data, 96.0, None, None))
        .child(
            Element::new(Tag::H1)
                .class("text-4xl font-light tracking-tight")
                .style(Style::default().color(INK).font_size(36.0).centered())
                .attr("data-testid", "text-fullname")
                .text(data.full_name.clone()),
        )
        .child(
            Element::new(Tag::P)
                .class("text-lg text-slate-500")
                .style(Style::default().color(MUTED).font_size(18.0).centered())
                .attr("data-testid", "text-specialty")
                .text(data.specialty.clone()),
        )
        .child(
            Element::new(Tag::Div)
                .class("flex justify-center gap-6")
                .style(Style::default().centered())
                .children(links),
        )
}

fn section(test_id: &str, title: &str) -> Element {
    Element::new(Tag::Section)
        .class("space-y-4")
        .attr("data-testid", test_id.to_string())
        .child(
            Element::new(Tag::H2)
                .class("text-sm font-medium uppercase tracking-widest text-slate-400")
                .style(Style::default().color("#94a3b8").font_size(12.0))
                .text(title.to_uppercase()),
        )
}

fn tag(text: &str, test_id: &str) -> Element {
    Element::new(Tag::Span)
        .class("border px-3 py-1 text-sm")
        .style(Style::default().border(BorderSide::All, 1.0, RULE).color("#334155"))
        .attr("data-testid", test_id.to_string())
        .text(text)
}

fn tag_row(tags: impl Iterator<Item = Element>) -> Element {
    Element::new(Tag::Div).class("flex flex-wrap gap-2").children(tags)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::tests::sample;

    #[test]
    fn test_qr_is_black_and_last() {
        let tree = MinimalisteLayout.render(&sample(), &RenderContext::default());
        let Node::Element(root) = &tree else {
            panic!("root must be an element");
        };
        let last: Node = root.children.last().cloned().unwrap();
        assert!(last.find_by_test_id("qr-code").is_some());
        assert!(last.to_html().contains("fill=\"#000000\""));
    }

    #[test]
    fn test_titles_are_uppercased() {
        let html = MinimalisteLayout
            .render(&sample(), &RenderContext::default())
            .to_html();
        assert!(html.contains("À PROPOS"));
        assert!(html.contains("OUTILS"));
    }
}
