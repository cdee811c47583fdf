use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::form::bio::{BioError, BioGenerator};
use crate::form::prompts::BIO_MISSING_INPUTS;
use crate::form::FormError;
use crate::portfolio::model::{PortfolioData, Project, Template};
use crate::portfolio::validation::{validate_portfolio, FieldError, ValidationErrors};

/// Form sections. Editable in any order; each owns a subset of fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Section {
    Profile,
    Projects,
    Tools,
    Design,
}

impl Section {
    pub const ALL: [Section; 4] = [
        Section::Profile,
        Section::Projects,
        Section::Tools,
        Section::Design,
    ];

    /// Field name (or `projects.` style prefix) owned by the section.
    fn owns(&self, field: &str) -> bool {
        match self {
            Section::Profile => matches!(
                field,
                "fullName"
                    | "specialty"
                    | "skills"
                    | "profileImage"
                    | "linkedin"
                    | "github"
                    | "email"
                    | "aiKeyword"
                    | "bio"
            ),
            Section::Projects => field.starts_with("projects"),
            Section::Tools => field.starts_with("tools"),
            Section::Design => matches!(field, "template" | "primaryColor" | "secondaryColor"),
        }
    }
}

/// One edit of a list or design field, as sent by the web form.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "op", rename_all = "camelCase")]
pub enum FormEdit {
    AddProject { title: String, description: String },
    RemoveProject { id: String },
    AddTool { name: String },
    RemoveTool { index: usize },
    SetTemplate { template: String },
    #[serde(rename_all = "camelCase")]
    SetColors {
        primary_color: String,
        secondary_color: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BioState {
    Idle,
    Generating,
}

/// Holds one draft while the user edits it and gates its submission.
#[derive(Debug, Clone)]
pub struct FormController {
    draft: PortfolioData,
    bio_state: BioState,
}

impl FormController {
    pub fn new(draft: PortfolioData) -> Self {
        Self {
            draft,
            bio_state: BioState::Idle,
        }
    }

    pub fn draft(&self) -> &PortfolioData {
        &self.draft
    }

    pub fn bio_state(&self) -> &BioState {
        &self.bio_state
    }

    /// Applies one edit. Removals of unknown ids or out-of-range indexes are no-ops.
    pub fn apply(&mut self, edit: FormEdit) {
        match edit {
            FormEdit::AddProject { title, description } => {
                self.add_project(&title, &description);
            }
            FormEdit::RemoveProject { id } => {
                self.remove_project(&id);
            }
            FormEdit::AddTool { name } => self.add_tool(&name),
            FormEdit::RemoveTool { index } => {
                self.remove_tool(index);
            }
            FormEdit::SetTemplate { template } => self.set_template(Template::from_code(&template)),
            FormEdit::SetColors {
                primary_color,
                secondary_color,
            } => self.set_colors(&primary_color, &secondary_color),
        }
    }

    // ── Projects ────────────────────────────────────────────────────────────

    /// Appends a project with a generated id and returns that id.
    pub fn add_project(&mut self, title: &str, description: &str) -> String {
        let project = Project::new(title, description);
        let id = project.id.clone();
        self.draft.projects.push(project);
        id
    }

    pub fn remove_project(&mut self, id: &str) -> bool {
        let before = self.draft.projects.len();
        self.draft.projects.retain(|p| p.id != id);
        self.draft.projects.len() != before
    }

    // ── Tools ───────────────────────────────────────────────────────────────

    /// Tools are positional; duplicates are kept.
    pub fn add_tool(&mut self, name: &str) {
        let name = name.trim();
        if !name.is_empty() {
            self.draft.tools.push(name.to_string());
        }
    }

    /// Removes the tool at `index`; later tools shift down by one.
    pub fn remove_tool(&mut self, index: usize) -> Option<String> {
        (index < self.draft.tools.len()).then(|| self.draft.tools.remove(index))
    }

    // ── Design ──────────────────────────────────────────────────────────────

    pub fn set_template(&mut self, template: Template) {
        self.draft.template = template;
    }

    pub fn set_colors(&mut self, primary: &str, secondary: &str) {
        self.draft.primary_color = primary.to_string();
        self.draft.secondary_color = secondary.to_string();
    }

    // ── Validation ──────────────────────────────────────────────────────────

    pub fn validate(&self) -> Result<(), ValidationErrors> {
        validate_portfolio(&self.draft)
    }

    /// Errors belonging to one section only.
    pub fn section_errors(&self, section: Section) -> Vec<FieldError> {
        match self.validate() {
            Ok(()) => vec![],
            Err(errors) => errors
                .errors
                .into_iter()
                .filter(|e| section.owns(&e.field))
                .collect(),
        }
    }

    /// The normalized record, or every field error when it is not submittable.
    pub fn submit(self) -> Result<PortfolioData, ValidationErrors> {
        self.validate()?;
        Ok(self.draft.normalized())
    }

    // ── Bio ─────────────────────────────────────────────────────────────────

    /// Fills `bio` from name, specialty and keyword.
    ///
    /// Missing inputs raise a field error on `aiKeyword` and change nothing.
    /// A generator failure restores the pre-generation draft and is retryable.
    pub async fn generate_bio(&mut self, generator: &dyn BioGenerator) -> Result<&str, FormError> {
        let missing = [
            &self.draft.full_name,
            &self.draft.specialty,
            &self.draft.ai_keyword,
        ]
        .iter()
        .any(|v| v.trim().is_empty());
        if missing {
            return Err(FormError::Validation(ValidationErrors::single(
                "aiKeyword",
                BIO_MISSING_INPUTS,
            )));
        }

        let previous_bio = self.draft.bio.clone();
        self.bio_state = BioState::Generating;

        let result = generator
            .generate(
                &self.draft.full_name,
                &self.draft.specialty,
                &self.draft.ai_keyword,
            )
            .await
            .and_then(|bio| {
                if bio.trim().is_empty() {
                    Err(BioError::Empty)
                } else {
                    Ok(bio)
                }
            });
        self.bio_state = BioState::Idle;

        match result {
            Ok(bio) => {
                info!("Bio generated for {}", self.draft.full_name);
                self.draft.bio = Some(bio);
                Ok(self.draft.bio.as_deref().unwrap_or_default())
            }
            Err(e) => {
                warn!("Bio generation failed: {e}");
                self.draft.bio = previous_bio;
                Err(FormError::Bio(e))
            }
        }
    }
}
