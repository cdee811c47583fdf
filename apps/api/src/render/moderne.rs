use crate::portfolio::model::{PortfolioData, Template};
use crate::render::components::{
    avatar, contact_links, paragraph, project_image, project_link, qr_code, with_alpha,
};
use crate::render::node::{BorderSide, Element, Node, Style, Tag};
use crate::render::qr::QrLevel;
use crate::render::{Layout, RenderContext};

/// Gradient header, tinted badges, cards for projects.
pub struct ModerneLayout;

impl Layout for ModerneLayout {
    fn template(&self) -> Template {
        Template::Moderne
    }

    fn render(&self, data: &PortfolioData, ctx: &RenderContext) -> Node {
        let primary = data.primary_color.as_str();
        let secondary = data.secondary_color.as_str();

        let mut root = Element::new(Tag::Div)
            .class("space-y-8")
            .style(Style::default().padding(48.0))
            .child(header(data, ctx));

        if let Some(bio) = data.bio_text() {
            root = root.child(
                section("section-bio", "À propos", primary).child(
                    paragraph(bio, "text-lg leading-relaxed", Style::default().color("#334155"))
                        .attr("data-testid", "text-bio"),
                ),
            );
        }

        let skills = data.skill_tags();
        if !skills.is_empty() {
            root = root.child(section("section-skills", "Compétences", primary).child(
                badge_row(skills.iter().enumerate().map(|(i, skill)| {
                    badge(skill, primary, &format!("badge-skill-{i}"))
                })),
            ));
        }

        if !data.tools.is_empty() {
            root = root.child(section("section-tools", "Outils maîtrisés", primary).child(
                badge_row(data.tools.iter().enumerate().map(|(i, tool)| {
                    badge(tool, secondary, &format!("badge-tool-{i}"))
                })),
            ));
        }

        if !data.projects.is_empty() {
            let cards = data.projects.iter().enumerate().map(|(i, project)| {
                let mut card = Element::new(Tag::Div)
                    .class("rounded-lg border overflow-hidden")
                    .style(Style::default().border(BorderSide::All, 1.0, "#e2e8f0"))
                    .attr("data-testid", format!("card-project-{i}"));
                if let Some(img) = project_image(project, 192.0, "w-full h-48 object-cover") {
                    card = card.child(img);
                }
                let mut body = Element::new(Tag::Div)
                    .class("p-6 space-y-3")
                    .style(Style::default().padding(24.0))
                    .child(
                        Element::new(Tag::H3)
                            .class("text-xl font-bold")
                            .style(Style::default().color(primary))
                            .text(project.title.clone()),
                    )
                    .child(paragraph(
                        &project.description,
                        "text-slate-600",
                        Style::default().color("#475569"),
                    ));
                if !project.technologies.is_empty() {
                    body = body.child(badge_row(project.technologies.iter().map(|tech| {
                        Element::new(Tag::Span)
                            .class("rounded px-2 py-1 text-xs")
                            .style(Style::default().background("#f1f5f9").color("#475569"))
                            .text(tech.clone())
                    })));
                }
                if let Some(link) = project_link(project, i, primary) {
                    body = body.child(link);
                }
                card.child(body)
            });
            root = root.child(
                section("section-projects", "Projets", primary)
                    .child(Element::new(Tag::Div).class("grid gap-6 md:grid-cols-2").children(cards)),
            );
        }

        root.into()
    }
}

fn header(data: &PortfolioData, ctx: &RenderContext) -> Element {
    let primary = data.primary_color.as_str();
    let secondary = data.secondary_color.as_str();

    let links = contact_links(data).into_iter().map(|link| {
        Element::new(Tag::A)
            .class("rounded-md border px-4 py-2 text-sm font-medium")
            .style(
                Style::default()
                    .color(primary)
                    .border(BorderSide::All, 1.0, primary),
            )
            .attr("href", link.href)
            .attr("target", "_blank")
            .attr("rel", "noopener noreferrer")
            .attr("data-testid", link.test_id)
            .text(link.label)
    });

    let identity = Element::new(Tag::Div)
        .class("flex-1 space-y-3")
        .child(
            Element::new(Tag::H1)
                .class("text-5xl font-bold")
                .style(Style::default().color(primary).font_size(48.0))
                .attr("data-testid", "text-fullname")
                .text(data.full_name.clone()),
        )
        .child(
            Element::new(Tag::P)
                .class("text-2xl")
                .style(Style::default().color(secondary).font_size(24.0))
                .attr("data-testid", "text-specialty")
                .text(data.specialty.clone()),
        )
        .child(Element::new(Tag::Div).class("flex flex-wrap gap-3").children(links));

    Element::new(Tag::Header)
        .class("flex items-center gap-8 rounded-2xl p-8")
        .style(
            Style::default()
                .background(&with_alpha(primary, "15"))
                .padding(32.0),
        )
        .child(avatar(data, 128.0, Some(primary), Some(primary)))
        .child(identity)
        .child(qr_code(data, ctx, 100.0, primary, QrLevel::M, "Scannez-moi"))
}

fn section(test_id: &str, title: &str, color: &str) -> Element {
    Element::new(Tag::Section)
        .class("space-y-4")
        .attr("data-testid", test_id.to_string())
        .child(
            Element::new(Tag::H2)
                .class("text-3xl font-bold")
                .style(Style::default().color(color))
                .text(title),
        )
}

fn badge(text: &str, color: &str, test_id: &str) -> Element {
    Element::new(Tag::Span)
        .class("rounded-full px-4 py-2 text-sm font-medium")
        .style(
            Style::default()
                .background(&with_alpha(color, "20"))
                .color(color),
        )
        .attr("data-testid", test_id.to_string())
        .text(text)
}

fn badge_row(badges: impl Iterator<Item = Element>) -> Element {
    Element::new(Tag::Div).class("flex flex-wrap gap-2").children(badges)
}
