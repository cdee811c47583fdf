use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::models::portfolio::PortfolioRow;
use crate::portfolio::model::{
    name_slug, PortfolioData, Project, Template, DEFAULT_PRIMARY_COLOR, DEFAULT_SECONDARY_COLOR,
};
use crate::store::StoreError;

/// A durably stored portfolio owned by one user.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    pub module_id: Option<Uuid>,
    pub data: PortfolioData,
    pub slug: String,
    pub is_published: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PortfolioRecord {
    pub fn new(user_id: Uuid, module_id: Option<Uuid>, data: PortfolioData, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            module_id,
            slug: portfolio_slug(&data.full_name, now),
            data,
            is_published: false,
            created_at: now,
            updated_at: now,
        }
    }

    /// Theme fields persisted together in the `template_settings` column.
    pub fn template_settings(&self) -> Value {
        json!({
            "template": self.data.template.as_str(),
            "primaryColor": self.data.primary_color,
            "secondaryColor": self.data.secondary_color,
        })
    }

    pub fn summary(&self) -> PortfolioSummary {
        PortfolioSummary {
            id: self.id,
            full_name: self.data.full_name.clone(),
            specialty: self.data.specialty.clone(),
            slug: self.slug.clone(),
            is_published: self.is_published,
            profile_image: self.data.profile_image.clone(),
            template: self.data.template,
            created_at: self.created_at,
        }
    }
}

/// List entry for the "my portfolios" view.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioSummary {
    pub id: Uuid,
    pub full_name: String,
    pub specialty: String,
    pub slug: String,
    pub is_published: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile_image: Option<String>,
    pub template: Template,
    pub created_at: DateTime<Utc>,
}

/// `<name-slug>-<unix millis>`, unique per user in practice.
pub fn portfolio_slug(full_name: &str, at: DateTime<Utc>) -> String {
    format!("{}-{}", name_slug(full_name), at.timestamp_millis())
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TemplateSettings {
    template: Option<String>,
    primary_color: Option<String>,
    secondary_color: Option<String>,
}

fn json_or_default<T>(value: Value, id: Uuid, column: &str) -> Result<T, StoreError>
where
    T: serde::de::DeserializeOwned + Default,
{
    if value.is_null() {
        return Ok(T::default());
    }
    serde_json::from_value(value).map_err(|e| StoreError::Corrupt {
        id: id.to_string(),
        reason: format!("{column}: {e}"),
    })
}

impl TryFrom<PortfolioRow> for PortfolioRecord {
    type Error = StoreError;

    fn try_from(row: PortfolioRow) -> Result<Self, Self::Error> {
        let projects: Vec<Project> = json_or_default(row.projects, row.id, "projects")?;
        let tools: Vec<String> = json_or_default(row.tools, row.id, "tools")?;
        let settings: TemplateSettings =
            json_or_default(row.template_settings, row.id, "template_settings")?;

        let data = PortfolioData {
            full_name: row.full_name,
            specialty: row.specialty,
            skills: row.skills.unwrap_or_default(),
            profile_image: row.profile_image,
            linkedin: row.linkedin,
            github: row.github,
            email: row.email,
            ai_keyword: row.ai_keyword.unwrap_or_default(),
            bio: row.bio,
            projects,
            tools,
            template: settings
                .template
                .as_deref()
                .map(Template::from_code)
                .unwrap_or_default(),
            primary_color: settings
                .primary_color
                .unwrap_or_else(|| DEFAULT_PRIMARY_COLOR.to_string()),
            secondary_color: settings
                .secondary_color
                .unwrap_or_else(|| DEFAULT_SECONDARY_COLOR.to_string()),
        };

        Ok(Self {
            id: row.id,
            user_id: row.user_id,
            module_id: row.module_id,
            slug: row
                .slug
                .unwrap_or_else(|| portfolio_slug(&data.full_name, row.created_at)),
            data,
            is_published: row.is_published,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn row() -> PortfolioRow {
        let at = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        PortfolioRow {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            module_id: None,
            full_name: "Jean Dupont".into(),
            specialty: "Développeur".into(),
            skills: Some("Rust, SQL, Docker".into()),
            ai_keyword: Some("innovation".into()),
            bio: None,
            profile_image: None,
            linkedin: Some("linkedin.com/in/jd".into()),
            github: None,
            email: None,
            projects: json!([{"id": "p1", "title": "T", "description": "D", "languages": ["Rust"]}]),
            tools: json!(["Git"]),
            template_settings: json!({"template": "creatif", "primaryColor": "#ff0000"}),
            is_published: false,
            slug: None,
            created_at: at,
            updated_at: at,
        }
    }

    #[test]
    fn test_slug_uses_name_and_millis() {
        let at = Utc.timestamp_millis_opt(1_700_000_000_123).unwrap();
        assert_eq!(portfolio_slug("Jean  Dupont", at), "jean-dupont-1700000000123");
    }

    #[test]
    fn test_row_converts_into_typed_record() {
        let record = PortfolioRecord::try_from(row()).unwrap();
        assert_eq!(record.data.template, Template::Creatif);
        assert_eq!(record.data.primary_color, "#ff0000");
        assert_eq!(record.data.secondary_color, DEFAULT_SECONDARY_COLOR);
        assert_eq!(record.data.projects[0].technologies, vec!["Rust"]);
        assert_eq!(record.data.tools, vec!["Git"]);
        assert!(record.slug.starts_with("jean-dupont-"));
    }

    #[test]
    fn test_null_json_columns_default_to_empty() {
        let mut raw = row();
        raw.projects = Value::Null;
        raw.tools = Value::Null;
        raw.template_settings = Value::Null;
        let record = PortfolioRecord::try_from(raw).unwrap();
        assert!(record.data.projects.is_empty());
        assert_eq!(record.data.template, Template::Moderne);
    }

    #[test]
    fn test_malformed_projects_are_rejected() {
        let mut raw = row();
        raw.projects = json!({"not": "a list"});
        let err = PortfolioRecord::try_from(raw).unwrap_err();
        assert!(matches!(err, StoreError::Corrupt { .. }));
    }

    #[test]
    fn test_template_settings_round_trip_shape() {
        let record = PortfolioRecord::try_from(row()).unwrap();
        let settings = record.template_settings();
        assert_eq!(settings["template"], "creatif");
        assert_eq!(settings["primaryColor"], "#ff0000");
    }
}
