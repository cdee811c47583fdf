use std::collections::HashSet;
use std::fmt;

use email_address::EmailAddress;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::portfolio::model::PortfolioData;

const MIN_FULL_NAME: usize = 2;
const MIN_SPECIALTY: usize = 2;
const MIN_SKILLS: usize = 10;
const MIN_AI_KEYWORD: usize = 2;

// Upper bounds keep one record within a single exportable page.
pub const MAX_SHORT_TEXT: usize = 120;
pub const MAX_SKILLS: usize = 1_000;
pub const MAX_LONG_TEXT: usize = 2_000;
pub const MAX_SKILL_TAGS: usize = 40;
pub const MAX_TOOLS: usize = 40;
pub const MAX_PROJECTS: usize = 20;
pub const MAX_TECHNOLOGIES: usize = 20;
/// Decoded size of an uploaded image.
pub const MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;

static HEX_COLOR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^#(?:[0-9a-fA-F]{3}|[0-9a-fA-F]{6})$").expect("valid regex"));

/// A single field-level validation failure, attached to the offending field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// All field errors collected for one submission attempt.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationErrors {
    pub errors: Vec<FieldError>,
}

impl ValidationErrors {
    pub fn single(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            errors: vec![FieldError::new(field, message)],
        }
    }

    pub fn push(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors.push(FieldError::new(field, message));
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn for_field(&self, field: &str) -> Option<&FieldError> {
        self.errors.iter().find(|e| e.field == field)
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let joined = self
            .errors
            .iter()
            .map(|e| format!("{}: {}", e.field, e.message))
            .collect::<Vec<_>>()
            .join("; ");
        f.write_str(&joined)
    }
}

impl std::error::Error for ValidationErrors {}

fn too_short(value: &str, min: usize) -> bool {
    value.chars().count() < min
}

fn too_long(value: &str, max: usize) -> bool {
    value.chars().count() > max
}

/// Decoded byte length of a base64 data URI, without decoding it.
/// `None` for anything that is not a base64 data URI.
fn data_uri_decoded_len(value: &str) -> Option<usize> {
    let (meta, payload) = value.strip_prefix("data:")?.split_once(',')?;
    if !meta.ends_with(";base64") {
        return None;
    }
    let payload = payload.trim();
    let padding = payload.bytes().rev().take_while(|b| *b == b'=').count();
    Some((payload.len() / 4 * 3 + payload.len() % 4 * 3 / 4).saturating_sub(padding))
}

fn image_too_large(value: Option<&str>) -> bool {
    value
        .and_then(data_uri_decoded_len)
        .is_some_and(|len| len > MAX_IMAGE_BYTES)
}

/// Validates a record against the submission rules.
///
/// Rules:
/// - `fullName` ≥ 2 chars, `specialty` ≥ 2, `skills` ≥ 10, `aiKeyword` ≥ 2
/// - `email` empty or a syntactically valid address
/// - every project has a title and description; project ids are unique
/// - colors are `#rgb` or `#rrggbb`
/// - text, list and image sizes stay under the `MAX_*` bounds
pub fn validate_portfolio(data: &PortfolioData) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::default();

    if too_short(&data.full_name, MIN_FULL_NAME) {
        errors.push("fullName", "Le nom doit contenir au moins 2 caractères");
    }
    if too_short(&data.specialty, MIN_SPECIALTY) {
        errors.push("specialty", "La spécialité est requise");
    }
    if too_short(&data.skills, MIN_SKILLS) {
        errors.push("skills", "Décrivez vos compétences (min. 10 caractères)");
    }
    if too_short(&data.ai_keyword, MIN_AI_KEYWORD) {
        errors.push("aiKeyword", "Le mot-clé est requis");
    }

    for (field, value) in [
        ("fullName", &data.full_name),
        ("specialty", &data.specialty),
        ("aiKeyword", &data.ai_keyword),
    ] {
        if too_long(value, MAX_SHORT_TEXT) {
            errors.push(field, format!("{MAX_SHORT_TEXT} caractères maximum"));
        }
    }
    if too_long(&data.skills, MAX_SKILLS) {
        errors.push("skills", format!("{MAX_SKILLS} caractères maximum"));
    } else if data.skill_tags().len() > MAX_SKILL_TAGS {
        errors.push("skills", format!("{MAX_SKILL_TAGS} compétences maximum"));
    }
    if data.bio.as_deref().is_some_and(|b| too_long(b, MAX_LONG_TEXT)) {
        errors.push("bio", format!("{MAX_LONG_TEXT} caractères maximum"));
    }
    if image_too_large(data.profile_image.as_deref()) {
        errors.push("profileImage", "L'image ne doit pas dépasser 5 Mo");
    }
    if data.tools.len() > MAX_TOOLS {
        errors.push("tools", format!("{MAX_TOOLS} outils maximum"));
    }
    if data.projects.len() > MAX_PROJECTS {
        errors.push("projects", format!("{MAX_PROJECTS} projets maximum"));
    }

    if let Some(email) = data.email.as_deref() {
        if !email.is_empty() && !EmailAddress::is_valid(email) {
            errors.push("email", "Email invalide");
        }
    }

    let mut seen_ids = HashSet::new();
    for (index, project) in data.projects.iter().enumerate() {
        if project.title.is_empty() {
            errors.push(format!("projects.{index}.title"), "Le titre est requis");
        }
        if project.description.is_empty() {
            errors.push(
                format!("projects.{index}.description"),
                "La description est requise",
            );
        }
        if too_long(&project.title, MAX_SHORT_TEXT) {
            errors.push(
                format!("projects.{index}.title"),
                format!("{MAX_SHORT_TEXT} caractères maximum"),
            );
        }
        if too_long(&project.description, MAX_LONG_TEXT) {
            errors.push(
                format!("projects.{index}.description"),
                format!("{MAX_LONG_TEXT} caractères maximum"),
            );
        }
        if project.technologies.len() > MAX_TECHNOLOGIES {
            errors.push(
                format!("projects.{index}.technologies"),
                format!("{MAX_TECHNOLOGIES} technologies maximum"),
            );
        }
        if image_too_large(project.image.as_deref()) {
            errors.push(
                format!("projects.{index}.image"),
                "L'image ne doit pas dépasser 5 Mo",
            );
        }
        if !seen_ids.insert(project.id.as_str()) {
            errors.push(
                format!("projects.{index}.id"),
                format!("Identifiant de projet dupliqué: {}", project.id),
            );
        }
    }

    if !HEX_COLOR.is_match(&data.primary_color) {
        errors.push("primaryColor", "Couleur hexadécimale invalide");
    }
    if !HEX_COLOR.is_match(&data.secondary_color) {
        errors.push("secondaryColor", "Couleur hexadécimale invalide");
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
