pub mod components;
pub mod creatif;
pub mod minimaliste;
pub mod moderne;
pub mod node;
pub mod professionnel;
pub mod qr;

use crate::portfolio::model::{PortfolioData, Template};
use crate::render::node::{Element, Node, Tag};

pub use creatif::CreatifLayout;
pub use minimaliste::MinimalisteLayout;
pub use moderne::ModerneLayout;
pub use professionnel::ProfessionnelLayout;

pub const DEFAULT_PUBLIC_BASE_URL: &str = "https://portfolio.example.com";

/// Inputs a layout needs beyond the record itself.
#[derive(Debug, Clone)]
pub struct RenderContext {
    /// Base of the canonical portfolio URL encoded in the QR code.
    pub public_base_url: String,
}

impl Default for RenderContext {
    fn default() -> Self {
        Self {
            public_base_url: DEFAULT_PUBLIC_BASE_URL.to_string(),
        }
    }
}

/// A pure mapping from a record to a visual tree.
///
/// Implementations must be referentially transparent: the same record and
/// context always yield the same tree.
pub trait Layout: Send + Sync {
    fn template(&self) -> Template;

    fn render(&self, data: &PortfolioData, ctx: &RenderContext) -> Node;
}

pub fn layout_for(template: Template) -> &'static dyn Layout {
    match template {
        Template::Moderne => &ModerneLayout,
        Template::Minimaliste => &MinimalisteLayout,
        Template::Creatif => &CreatifLayout,
        Template::Professionnel => &ProfessionnelLayout,
    }
}

/// Renders the record with the layout selected by its `template` field, wrapped
/// in the preview card that the exporters snapshot.
pub fn render_portfolio(data: &PortfolioData, ctx: &RenderContext) -> Node {
    let layout = layout_for(data.template);
    Element::new(Tag::Div)
        .class("bg-white")
        .attr("id", "portfolio-preview")
        .attr("data-testid", "card-portfolio-preview")
        .attr("data-template", layout.template().as_str())
        .child(layout.render(data, ctx))
        .into()
}
