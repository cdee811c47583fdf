use crate::portfolio::model::{PortfolioData, Template};
use crate::render::components::{
    avatar, contact_links, paragraph, project_image, project_link, qr_code, with_alpha,
};
use crate::render::node::{BorderSide, Element, Node, Style, Tag};
use crate::render::qr::QrLevel;
use crate::render::{Layout, RenderContext};

/// Bold color blocks, alternating primary and secondary accents.
pub struct CreatifLayout;

impl Layout for CreatifLayout {
    fn template(&self) -> Template {
        Template::Creatif
    }

    fn render(&self, data: &PortfolioData, ctx: &RenderContext) -> Node {
        let primary = data.primary_color.as_str();
        let secondary = data.secondary_color.as_str();

        let mut body = Element::new(Tag::Div)
            .class("space-y-10 p-10")
            .style(Style::default().padding(40.0));

        if let Some(bio) = data.bio_text() {
            body = body.child(
                block("section-bio", "Mon histoire", primary).child(
                    paragraph(bio, "text-lg leading-relaxed", Style::default().color("#1e293b"))
                        .attr("data-testid", "text-bio"),
                ),
            );
        }

        let skills = data.skill_tags();
        if !skills.is_empty() {
            body = body.child(
                block("section-skills", "Mes super-pouvoirs", secondary).child(
                    Element::new(Tag::Div).class("flex flex-wrap gap-3").children(
                        skills.iter().enumerate().map(|(i, skill)| {
                            // Alternate accent per badge.
                            let color = if i % 2 == 0 { primary } else { secondary };
                            pill(skill, color, &format!("badge-skill-{i}"))
                        }),
                    ),
                ),
            );
        }

        if !data.tools.is_empty() {
            body = body.child(
                block("section-tools", "Ma boîte à outils", primary).child(
                    Element::new(Tag::Div).class("flex flex-wrap gap-3").children(
                        data.tools
                            .iter()
                            .enumerate()
                            .map(|(i, tool)| pill(tool, secondary, &format!("badge-tool-{i}"))),
                    ),
                ),
            );
        }

        if !data.projects.is_empty() {
            let cards = data.projects.iter().enumerate().map(|(i, project)| {
                let accent = if i % 2 == 0 { primary } else { secondary };
                let mut card = Element::new(Tag::Div)
                    .class("rounded-3xl p-6 space-y-3")
                    .style(
                        Style::default()
                            .background(&with_alpha(accent, "15"))
                            .border(BorderSide::All, 3.0, accent)
                            .padding(24.0),
                    )
                    .attr("data-testid", format!("card-project-{i}"));
                if let Some(img) = project_image(project, 176.0, "w-full h-44 rounded-2xl object-cover") {
                    card = card.child(img);
                }
                card = card
                    .child(
                        Element::new(Tag::H3)
                            .class("text-2xl font-black")
                            .style(Style::default().color(accent))
                            .text(project.title.clone()),
                    )
                    .child(paragraph(&project.description, "", Style::default().color("#334155")));
                if !project.technologies.is_empty() {
                    card = card.child(
                        Element::new(Tag::Div).class("flex flex-wrap gap-2").children(
                            project.technologies.iter().map(|tech| {
                                Element::new(Tag::Span)
                                    .class("rounded-full px-3 py-1 text-xs font-bold text-white")
                                    .style(Style::default().background(accent).color("#ffffff"))
                                    .text(tech.clone())
                            }),
                        ),
                    );
                }
                if let Some(link) = project_link(project, i, accent) {
                    card = card.child(link);
                }
                card
            });
            body = body.child(
                block("section-projects", "Mes réalisations", secondary)
                    .child(Element::new(Tag::Div).class("grid gap-6 md:grid-cols-2").children(cards)),
            );
        }

        Element::new(Tag::Div)
            .class("overflow-hidden rounded-3xl")
            .child(header(data, ctx))
            .child(body)
            .into()
    }
}

fn header(data: &PortfolioData, ctx: &RenderContext) -> Element {
    let primary = data.primary_color.as_str();

    let links = contact_links(data).into_iter().map(|link| {
        Element::new(Tag::A)
            .class("rounded-full bg-white px-5 py-2 text-sm font-bold")
            .style(Style::default().background("#ffffff").color(primary))
            .attr("href", link.href)
            .attr("target", "_blank")
            .attr("rel", "noopener noreferrer")
            .attr("data-testid", link.test_id)
            .text(link.label)
    });

    Element::new(Tag::Header)
        .class("flex items-center gap-10 p-12 text-white")
        .style(Style::default().background(primary).padding(48.0))
        .child(avatar(data, 144.0, Some("#ffffff"), None))
        .child(
            Element::new(Tag::Div)
                .class("flex-1 space-y-4")
                .child(
                    Element::new(Tag::H1)
                        .class("text-6xl font-black")
                        .style(Style::default().color("#ffffff").font_size(56.0))
                        .attr("data-testid", "text-fullname")
                        .text(data.full_name.clone()),
                )
                .child(
                    Element::new(Tag::P)
                        .class("inline-block rounded-full px-6 py-2 text-xl font-bold")
                        .style(
                            Style::default()
                                .background(&data.secondary_color)
                                .color("#ffffff")
                                .font_size(20.0),
                        )
                        .attr("data-testid", "text-specialty")
                        .text(data.specialty.clone()),
                )
                .child(Element::new(Tag::Div).class("flex flex-wrap gap-3").children(links)),
        )
        .child(
            Element::new(Tag::Div)
                .class("rounded-2xl bg-white p-3")
                .style(Style::default().background("#ffffff").padding(12.0))
                .child(qr_code(data, ctx, 150.0, primary, QrLevel::H, "")),
        )
}

fn block(test_id: &str, title: &str, color: &str) -> Element {
    Element::new(Tag::Section)
        .class("space-y-5")
        .attr("data-testid", test_id.to_string())
        .child(
            Element::new(Tag::H2)
                .class("text-4xl font-black")
                .style(Style::default().color(color).font_size(36.0))
                .text(title),
        )
}

fn pill(text: &str, color: &str, test_id: &str) -> Element {
    Element::new(Tag::Span)
        .class("rounded-full px-5 py-2 font-bold text-white")
        .style(Style::default().background(color).color("#ffffff"))
        .attr("data-testid", test_id.to_string())
        .text(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::tests::sample;

    #[test]
    fn test_qr_uses_high_correction_and_larger_size() {
        let data = sample();
        let tree = CreatifLayout.render(&data, &RenderContext::default());
        let html = tree.to_html();
        assert!(html.contains("width=\"150\""));
        assert!(html.contains(&format!("fill=\"{}\"", data.primary_color)));
    }

    #[test]
    fn test_header_uses_primary_background() {
        let data = PortfolioData {
            primary_color: "#112233".into(),
            ..sample()
        };
        let tree = CreatifLayout.render(&data, &RenderContext::default());
        let Node::Element(root) = &tree else {
            panic!("root must be an element");
        };
        let Node::Element(header) = &root.children[0] else {
            panic!("header must be an element");
        };
        assert_eq!(header.style.background.as_deref(), Some("#112233"));
    }
}
