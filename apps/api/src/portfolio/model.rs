use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

pub const DEFAULT_PRIMARY_COLOR: &str = "#3b82f6";
pub const DEFAULT_SECONDARY_COLOR: &str = "#64748b";

static WHITESPACE_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid regex"));
static URL_SCHEME: Lazy<Regex> = Lazy::new(|| Regex::new(r"^https?://").expect("valid regex"));

// ────────────────────────────────────────────────────────────────────────────
// Template
// ────────────────────────────────────────────────────────────────────────────

/// The four render layouts. Closed set: adding one must touch every `match`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Template {
    #[default]
    Moderne,
    Minimaliste,
    Creatif,
    Professionnel,
}

impl Template {
    pub const ALL: [Template; 4] = [
        Template::Moderne,
        Template::Minimaliste,
        Template::Creatif,
        Template::Professionnel,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Template::Moderne => "moderne",
            Template::Minimaliste => "minimaliste",
            Template::Creatif => "creatif",
            Template::Professionnel => "professionnel",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Template::Moderne => "Moderne",
            Template::Minimaliste => "Minimaliste",
            Template::Creatif => "Créatif",
            Template::Professionnel => "Professionnel",
        }
    }

    /// Parses a template code, falling back to `Moderne` for anything unknown.
    pub fn from_code(code: &str) -> Self {
        match code.trim().to_lowercase().as_str() {
            "minimaliste" => Template::Minimaliste,
            "creatif" | "créatif" => Template::Creatif,
            "professionnel" => Template::Professionnel,
            _ => Template::Moderne,
        }
    }
}

impl fmt::Display for Template {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn lenient_template<'de, D>(deserializer: D) -> Result<Template, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.map(|s| Template::from_code(&s)).unwrap_or_default())
}

// ────────────────────────────────────────────────────────────────────────────
// Portfolio record
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: String,
    pub title: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    #[serde(default, alias = "languages")]
    pub technologies: Vec<String>,
}

impl Project {
    /// A blank project with a freshly generated id.
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            title: title.into(),
            description: description.into(),
            image: None,
            link: None,
            technologies: vec![],
        }
    }
}

/// The canonical portfolio record shared by the form, the stores and the renderer.
///
/// Wire format is camelCase so drafts written by the web client deserialize as-is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioData {
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub specialty: String,
    #[serde(default)]
    pub skills: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub linkedin: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub github: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default)]
    pub ai_keyword: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(default)]
    pub projects: Vec<Project>,
    #[serde(default)]
    pub tools: Vec<String>,
    #[serde(default, deserialize_with = "lenient_template")]
    pub template: Template,
    #[serde(default = "default_primary_color")]
    pub primary_color: String,
    #[serde(default = "default_secondary_color")]
    pub secondary_color: String,
}

fn default_primary_color() -> String {
    DEFAULT_PRIMARY_COLOR.to_string()
}

fn default_secondary_color() -> String {
    DEFAULT_SECONDARY_COLOR.to_string()
}

impl Default for PortfolioData {
    fn default() -> Self {
        Self {
            full_name: String::new(),
            specialty: String::new(),
            skills: String::new(),
            profile_image: None,
            linkedin: None,
            github: None,
            email: None,
            ai_keyword: String::new(),
            bio: None,
            projects: vec![],
            tools: vec![],
            template: Template::default(),
            primary_color: default_primary_color(),
            secondary_color: default_secondary_color(),
        }
    }
}

impl PortfolioData {
    /// Skill tags: comma-split, trimmed, empty entries dropped.
    pub fn skill_tags(&self) -> Vec<String> {
        split_skills(&self.skills)
    }

    /// Bio text when present and non-blank.
    pub fn bio_text(&self) -> Option<&str> {
        self.bio.as_deref().filter(|b| !b.trim().is_empty())
    }

    pub fn linkedin_url(&self) -> Option<String> {
        non_blank(&self.linkedin).map(|v| format!("https://{v}"))
    }

    pub fn github_url(&self) -> Option<String> {
        non_blank(&self.github).map(|v| format!("https://{v}"))
    }

    pub fn email_address(&self) -> Option<&str> {
        non_blank(&self.email)
    }

    /// Canonical public URL of the portfolio, encoded in every template's QR code.
    pub fn public_url(&self, base_url: &str) -> String {
        format!("{}/{}", base_url.trim_end_matches('/'), name_slug(&self.full_name))
    }

    /// Applies the storage transforms: scheme stripping on profile links and
    /// blank optionals collapsed to `None`.
    pub fn normalized(mut self) -> Self {
        self.linkedin = self.linkedin.map(|v| strip_scheme(&v)).filter(|v| !v.is_empty());
        self.github = self.github.map(|v| strip_scheme(&v)).filter(|v| !v.is_empty());
        self.email = self.email.filter(|v| !v.trim().is_empty());
        self.profile_image = self.profile_image.filter(|v| !v.trim().is_empty());
        for project in &mut self.projects {
            project.image = project.image.take().filter(|v| !v.trim().is_empty());
            project.link = project.link.take().filter(|v| !v.trim().is_empty());
        }
        self
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.trim().is_empty())
}

pub fn split_skills(skills: &str) -> Vec<String> {
    skills
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Strips one leading `http://` or `https://`; anything else is returned unchanged.
pub fn strip_scheme(url: &str) -> String {
    URL_SCHEME.replace(url, "").into_owned()
}

/// Lower-cased name with whitespace runs replaced by `-`.
pub fn name_slug(full_name: &str) -> String {
    WHITESPACE_RUN.replace_all(full_name, "-").to_lowercase()
}

/// File stem shared by both export artifacts: whitespace runs become one `_`.
pub fn file_stem(full_name: &str) -> String {
    WHITESPACE_RUN.replace_all(full_name, "_").into_owned()
}

/// Up to two upper-cased initials, one per space-separated word.
pub fn initials(full_name: &str) -> String {
    full_name
        .split(' ')
        .filter_map(|word| word.chars().next())
        .flat_map(char::to_uppercase)
        .take(2)
        .collect()
}
