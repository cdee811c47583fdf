use crate::portfolio::model::{PortfolioData, Template};
use crate::render::components::{avatar, contact_links, paragraph, project_image, project_link, qr_code};
use crate::render::node::{BorderSide, Element, Node, Style, Tag};
use crate::render::qr::QrLevel;
use crate::render::{Layout, RenderContext};

const INK: &str = "#111827";
const BODY: &str = "#374151";

/// CV-style: dense header with a textual contact line, ruled upper-case sections.
pub struct ProfessionnelLayout;

impl Layout for ProfessionnelLayout {
    fn template(&self) -> Template {
        Template::Professionnel
    }

    fn render(&self, data: &PortfolioData, ctx: &RenderContext) -> Node {
        let primary = data.primary_color.as_str();

        let mut root = Element::new(Tag::Div)
            .class("space-y-8")
            .style(Style::default().padding(48.0))
            .child(header(data, ctx));

        if let Some(bio) = data.bio_text() {
            root = root.child(
                section("section-bio", "RÉSUMÉ PROFESSIONNEL", primary).child(
                    paragraph(bio, "text-justify leading-relaxed", Style::default().color(BODY))
                        .attr("data-testid", "text-bio"),
                ),
            );
        }

        let skills = data.skill_tags();
        if !skills.is_empty() {
            root = root.child(
                section("section-skills", "COMPÉTENCES CLÉS", primary).child(
                    Element::new(Tag::Div).class("grid grid-cols-2 gap-2").children(
                        skills.iter().enumerate().map(|(i, skill)| {
                            Element::new(Tag::Span)
                                .class("text-sm")
                                .style(Style::default().color(BODY))
                                .attr("data-testid", format!("badge-skill-{i}"))
                                .text(skill.clone())
                        }),
                    ),
                ),
            );
        }

        if !data.tools.is_empty() {
            root = root.child(
                section("section-tools", "OUTILS & TECHNOLOGIES", primary).child(
                    Element::new(Tag::Div).class("flex flex-wrap gap-2").children(
                        data.tools.iter().enumerate().map(|(i, tool)| {
                            Element::new(Tag::Span)
                                .class("rounded border px-3 py-1 text-sm")
                                .style(
                                    Style::default()
                                        .border(BorderSide::All, 1.0, "#d1d5db")
                                        .color(BODY),
                                )
                                .attr("data-testid", format!("badge-tool-{i}"))
                                .text(tool.clone())
                        }),
                    ),
                ),
            );
        }

        if !data.projects.is_empty() {
            let entries = data.projects.iter().enumerate().map(|(i, project)| {
                let mut entry = Element::new(Tag::Div)
                    .class("space-y-2 border-l-4 pl-4")
                    .style(Style::default().border(BorderSide::Left, 4.0, primary))
                    .attr("data-testid", format!("card-project-{i}"))
                    .child(
                        Element::new(Tag::H3)
                            .class("text-lg font-bold")
                            .style(Style::default().color(INK))
                            .text(project.title.clone()),
                    );
                if !project.technologies.is_empty() {
                    entry = entry.child(
                        Element::new(Tag::P)
                            .class("text-xs font-semibold uppercase")
                            .style(Style::default().color(primary).font_size(11.0))
                            .text(project.technologies.join(" | ")),
                    );
                }
                entry = entry.child(paragraph(&project.description, "text-sm", Style::default().color(BODY)));
                if let Some(img) = project_image(project, 144.0, "h-36 w-full object-cover") {
                    entry = entry.child(img);
                }
                if let Some(link) = project_link(project, i, primary) {
                    entry = entry.child(link);
                }
                entry
            });
            root = root.child(
                section("section-projects", "PROJETS RÉALISÉS", primary)
                    .child(Element::new(Tag::Div).class("space-y-6").children(entries)),
            );
        }

        root.into()
    }
}

fn header(data: &PortfolioData, ctx: &RenderContext) -> Element {
    let primary = data.primary_color.as_str();

    let contact_line = contact_links(data).into_iter().map(|link| {
        let label = match link.href.strip_prefix("mailto:") {
            Some(email) => email.to_string(),
            None => link.href.trim_start_matches("https://").to_string(),
        };
        Element::new(Tag::A)
            .class("text-sm")
            .style(Style::default().color(BODY))
            .attr("href", link.href)
            .attr("data-testid", link.test_id)
            .text(label)
    });

    Element::new(Tag::Header)
        .class("flex items-start justify-between gap-6 border-b-2 pb-6")
        .style(Style::default().border(BorderSide::Bottom, 2.0, primary))
        .child(
            Element::new(Tag::Div)
                .class("flex items-center gap-6")
                .child(avatar(data, 112.0, None, Some(primary)))
                .child(
                    Element::new(Tag::Div)
                        .class("space-y-2")
                        .child(
                            Element::new(Tag::H1)
                                .class("text-4xl font-bold uppercase tracking-wide")
                                .style(Style::default().color(INK).font_size(36.0))
                                .attr("data-testid", "text-fullname")
                                .text(data.full_name.clone()),
                        )
                        .child(
                            Element::new(Tag::P)
                                .class("text-xl font-semibold")
                                .style(Style::default().color(primary).font_size(20.0))
                                .attr("data-testid", "text-specialty")
                                .text(data.specialty.clone()),
                        )
                        .child(
                            Element::new(Tag::Div)
                                .class("flex flex-wrap gap-4")
                                .children(contact_line),
                        ),
                ),
        )
        .child(qr_code(data, ctx, 100.0, INK, QrLevel::M, ""))
}

fn section(test_id: &str, title: &str, color: &str) -> Element {
    Element::new(Tag::Section)
        .class("space-y-4")
        .attr("data-testid", test_id.to_string())
        .child(
            Element::new(Tag::H2)
                .class("border-b-2 pb-2 text-lg font-bold tracking-wider")
                .style(
                    Style::default()
                        .color(INK)
                        .font_size(18.0)
                        .border(BorderSide::Bottom, 2.0, color),
                )
                .text(title),
        )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::tests::sample;

    #[test]
    fn test_contact_line_is_textual() {
        let tree = ProfessionnelLayout.render(&sample(), &RenderContext::default());
        let github = tree.find_by_test_id("link-github").unwrap();
        assert_eq!(github.get_attr("href"), Some("https://github.com/jdupont"));
        assert_eq!(
            Node::Element(github.clone()).text_content(),
            "github.com/jdupont"
        );
    }

    #[test]
    fn test_projects_have_primary_left_rule() {
        let data = PortfolioData {
            primary_color: "#0ea5e9".into(),
            ..sample()
        };
        let tree = ProfessionnelLayout.render(&data, &RenderContext::default());
        let card = tree.find_by_test_id("card-project-0").unwrap();
        let border = card.style.border.as_ref().unwrap();
        assert_eq!(border.side, BorderSide::Left);
        assert_eq!(border.color, "#0ea5e9");
    }
}
