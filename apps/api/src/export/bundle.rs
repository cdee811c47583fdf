//! Static source bundle: a standalone `index.html` plus a `README.md`, zipped.

use std::io::{Cursor, Write};

use zip::{write::FileOptions, CompressionMethod, ZipWriter};

use crate::export::ExportError;
use crate::portfolio::model::PortfolioData;
use crate::render::components::contact_links;
use crate::render::node::{escape_html, Node};

pub const TAILWIND_CDN: &str = "https://cdn.tailwindcss.com";

/// Wraps the rendered tree in a complete HTML page. The utility CSS framework
/// is loaded from its CDN at view time, never bundled.
pub fn index_html(data: &PortfolioData, tree: &Node) -> String {
    format!(
        "<!DOCTYPE html>\n\
         <html lang=\"fr\">\n\
         <head>\n\
         <meta charset=\"UTF-8\">\n\
         <meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\">\n\
         <title>{title} - Portfolio</title>\n\
         <script src=\"{TAILWIND_CDN}\"></script>\n\
         </head>\n\
         <body class=\"bg-gray-50\">\n\
         <main class=\"max-w-4xl mx-auto py-8\">\n\
         {body}\n\
         </main>\n\
         </body>\n\
         </html>\n",
        title = escape_html(&data.full_name),
        body = tree.to_html(),
    )
}

pub fn readme(data: &PortfolioData) -> String {
    let mut out = format!("# {}\n\n{}\n", data.full_name, data.specialty);

    let links = contact_links(data);
    if !links.is_empty() {
        out.push_str("\n## Contact\n\n");
        for link in links {
            out.push_str(&format!("- {}: {}\n", link.label, link.href));
        }
    }

    out.push_str(
        "\n## Utilisation\n\n\
         Ouvrez `index.html` dans un navigateur. La mise en forme est chargée \
         depuis le CDN Tailwind CSS, une connexion internet est donc nécessaire.\n",
    );
    out
}

/// Zips `index.html` and `README.md` in memory.
pub fn write_bundle(data: &PortfolioData, tree: &Node) -> Result<Vec<u8>, ExportError> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = FileOptions::default().compression_method(CompressionMethod::Deflated);

    zip.start_file("index.html", options)?;
    zip.write_all(index_html(data, tree).as_bytes())?;

    zip.start_file("README.md", options)?;
    zip.write_all(readme(data).as_bytes())?;

    Ok(zip.finish()?.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::{render_portfolio, RenderContext};
    use std::io::Read;
    use zip::ZipArchive;

    fn data() -> PortfolioData {
        PortfolioData {
            full_name: "Jean <Dupont>".into(),
            specialty: "Développeur".into(),
            skills: "Rust, SQL, Docker".into(),
            github: Some("github.com/jd".into()),
            email: Some("jd@example.com".into()),
            ..Default::default()
        }
    }

    #[test]
    fn test_index_html_references_cdn_and_escapes_title() {
        let data = data();
        let tree = render_portfolio(&data, &RenderContext::default());
        let html = index_html(&data, &tree);
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("<script src=\"https://cdn.tailwindcss.com\"></script>"));
        assert!(html.contains("<title>Jean &lt;Dupont&gt; - Portfolio</title>"));
        assert!(html.contains("card-portfolio-preview"));
    }

    #[test]
    fn test_readme_lists_contact_links() {
        let readme = readme(&data());
        assert!(readme.starts_with("# Jean <Dupont>\n\nDéveloppeur\n"));
        assert!(readme.contains("- GitHub: https://github.com/jd"));
        assert!(readme.contains("- Email: mailto:jd@example.com"));
        assert!(!readme.contains("LinkedIn"));
    }

    #[test]
    fn test_bundle_contains_both_files() {
        let data = data();
        let tree = render_portfolio(&data, &RenderContext::default());
        let bytes = write_bundle(&data, &tree).unwrap();

        let mut archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
        let mut names: Vec<String> = archive.file_names().map(str::to_string).collect();
        names.sort();
        assert_eq!(names, vec!["README.md", "index.html"]);

        let mut html = String::new();
        archive
            .by_name("index.html")
            .unwrap()
            .read_to_string(&mut html)
            .unwrap();
        assert_eq!(html, index_html(&data, &tree));
    }
}
