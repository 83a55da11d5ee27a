//! Site-builder rows and request bodies: projects, pages and blocks.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use hostdeck_core::{AccountId, BlockId, PageId, ProjectId, SectionKey, Slug};

/// A site project owned by one account.
#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct Project {
    pub id: ProjectId,
    #[serde(skip)]
    pub account_id: AccountId,
    pub name: String,
    pub template_slug: String,
    pub is_published: bool,
    pub domain: String,
    pub settings: Option<Value>,
    /// Number of pages, computed by the query.
    pub pages_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A page inside a project.
#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct Page {
    pub id: PageId,
    #[serde(rename = "project")]
    pub project_id: ProjectId,
    pub name: String,
    pub slug: String,
    pub path: String,
    pub position: i32,
    pub meta_title: String,
    pub meta_description: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A content block on a page.
#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct Block {
    pub id: BlockId,
    #[serde(rename = "page")]
    pub page_id: PageId,
    pub key: SectionKey,
    pub enabled: bool,
    pub position: i32,
    pub props: Option<Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Request bodies
// =============================================================================

const MAX_NAME_LEN: usize = 120;
const MAX_TEXT_LEN: usize = 255;

fn check_name(field: &str, value: &str) -> Result<String, String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(format!("{field} cannot be blank."));
    }
    if trimmed.chars().count() > MAX_NAME_LEN {
        return Err(format!("{field} exceeds {MAX_NAME_LEN} characters."));
    }
    Ok(trimmed.to_owned())
}

fn check_len(field: &str, value: &str, max: usize) -> Result<(), String> {
    if value.chars().count() > max {
        return Err(format!("{field} exceeds {max} characters."));
    }
    Ok(())
}

fn check_position(value: i32) -> Result<i32, String> {
    if value < 0 {
        return Err("position cannot be negative.".to_owned());
    }
    Ok(value)
}

fn check_path(value: &str) -> Result<String, String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err("path cannot be blank.".to_owned());
    }
    check_len("path", trimmed, MAX_TEXT_LEN)?;
    Ok(trimmed.to_owned())
}

/// Fields accepted when creating a project.
#[derive(Debug, Clone, Deserialize)]
pub struct NewProject {
    pub name: String,
    #[serde(default)]
    pub template_slug: String,
    #[serde(default)]
    pub is_published: bool,
    #[serde(default)]
    pub domain: String,
    #[serde(default)]
    pub settings: Option<Value>,
}

impl NewProject {
    /// Trim and check field lengths.
    ///
    /// # Errors
    ///
    /// Returns a message naming the first invalid field.
    pub fn validate(mut self) -> Result<Self, String> {
        self.name = check_name("name", &self.name)?;
        self.template_slug = self.template_slug.trim().to_owned();
        check_len("template_slug", &self.template_slug, MAX_NAME_LEN)?;
        self.domain = self.domain.trim().to_lowercase();
        check_len("domain", &self.domain, MAX_TEXT_LEN)?;
        Ok(self)
    }
}

/// Fields accepted when updating a project. Absent fields are unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProjectChanges {
    pub name: Option<String>,
    pub template_slug: Option<String>,
    pub is_published: Option<bool>,
    pub domain: Option<String>,
    pub settings: Option<Value>,
}

impl ProjectChanges {
    /// Trim and check the fields that are present.
    ///
    /// # Errors
    ///
    /// Returns a message naming the first invalid field.
    pub fn validate(mut self) -> Result<Self, String> {
        if let Some(name) = self.name.as_deref() {
            self.name = Some(check_name("name", name)?);
        }
        if let Some(slug) = self.template_slug.as_deref() {
            let slug = slug.trim().to_owned();
            check_len("template_slug", &slug, MAX_NAME_LEN)?;
            self.template_slug = Some(slug);
        }
        if let Some(domain) = self.domain.as_deref() {
            let domain = domain.trim().to_lowercase();
            check_len("domain", &domain, MAX_TEXT_LEN)?;
            self.domain = Some(domain);
        }
        Ok(self)
    }
}

/// Fields accepted when creating a page.
#[derive(Debug, Clone, Deserialize)]
pub struct NewPage {
    pub project: ProjectId,
    pub name: String,
    pub slug: String,
    #[serde(default = "default_path")]
    pub path: String,
    #[serde(default)]
    pub position: i32,
    #[serde(default)]
    pub meta_title: String,
    #[serde(default)]
    pub meta_description: String,
}

fn default_path() -> String {
    "/".to_owned()
}

impl NewPage {
    /// Check slug, path, position and lengths.
    ///
    /// # Errors
    ///
    /// Returns a message naming the first invalid field.
    pub fn validate(mut self) -> Result<Self, String> {
        self.name = check_name("name", &self.name)?;
        self.slug = Slug::parse(self.slug.trim())
            .map_err(|e| format!("slug: {e}."))?
            .into();
        self.path = check_path(&self.path)?;
        self.position = check_position(self.position)?;
        check_len("meta_title", &self.meta_title, MAX_TEXT_LEN)?;
        Ok(self)
    }
}

/// Fields accepted when updating a page. Absent fields are unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PageChanges {
    pub project: Option<ProjectId>,
    pub name: Option<String>,
    pub slug: Option<String>,
    pub path: Option<String>,
    pub position: Option<i32>,
    pub meta_title: Option<String>,
    pub meta_description: Option<String>,
}

impl PageChanges {
    /// Check the fields that are present.
    ///
    /// # Errors
    ///
    /// Returns a message naming the first invalid field.
    pub fn validate(mut self) -> Result<Self, String> {
        if let Some(name) = self.name.as_deref() {
            self.name = Some(check_name("name", name)?);
        }
        if let Some(slug) = self.slug.as_deref() {
            let slug = Slug::parse(slug.trim()).map_err(|e| format!("slug: {e}."))?;
            self.slug = Some(slug.into());
        }
        if let Some(path) = self.path.as_deref() {
            self.path = Some(check_path(path)?);
        }
        if let Some(position) = self.position {
            check_position(position)?;
        }
        if let Some(title) = self.meta_title.as_deref() {
            check_len("meta_title", title, MAX_TEXT_LEN)?;
        }
        Ok(self)
    }
}

/// Fields accepted when creating a block.
#[derive(Debug, Clone, Deserialize)]
pub struct NewBlock {
    pub page: PageId,
    pub key: String,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default)]
    pub position: i32,
    #[serde(default)]
    pub props: Option<Value>,
}

const fn default_enabled() -> bool {
    true
}

/// A block create request after validation.
#[derive(Debug, Clone)]
pub struct ValidBlock {
    pub page: PageId,
    pub key: SectionKey,
    pub enabled: bool,
    pub position: i32,
    pub props: Option<Value>,
}

impl NewBlock {
    /// Check the section key and position.
    ///
    /// # Errors
    ///
    /// Returns a message naming the first invalid field.
    pub fn validate(self) -> Result<ValidBlock, String> {
        let key = self
            .key
            .parse::<SectionKey>()
            .map_err(|_| "Unknown block key.".to_owned())?;
        Ok(ValidBlock {
            page: self.page,
            key,
            enabled: self.enabled,
            position: check_position(self.position)?,
            props: self.props.filter(|p| !p.is_null()),
        })
    }
}

/// Fields accepted when updating a block. Absent fields are unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BlockChanges {
    pub page: Option<PageId>,
    pub key: Option<String>,
    pub enabled: Option<bool>,
    pub position: Option<i32>,
    pub props: Option<Value>,
}

/// A block update after validation.
#[derive(Debug, Clone, Default)]
pub struct ValidBlockChanges {
    pub page: Option<PageId>,
    pub key: Option<SectionKey>,
    pub enabled: Option<bool>,
    pub position: Option<i32>,
    pub props: Option<Value>,
}

impl BlockChanges {
    /// Check the fields that are present.
    ///
    /// # Errors
    ///
    /// Returns a message naming the first invalid field.
    pub fn validate(self) -> Result<ValidBlockChanges, String> {
        let key = self
            .key
            .map(|k| k.parse::<SectionKey>())
            .transpose()
            .map_err(|_| "Unknown block key.".to_owned())?;
        let position = self.position.map(check_position).transpose()?;
        Ok(ValidBlockChanges {
            page: self.page,
            key,
            enabled: self.enabled,
            position,
            props: self.props,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_new_page_defaults_and_validation() {
        let page: NewPage =
            serde_json::from_value(json!({"project": 1, "name": " Home ", "slug": "home"})).unwrap();
        let page = page.validate().unwrap();
        assert_eq!(page.name, "Home");
        assert_eq!(page.path, "/");
        assert_eq!(page.position, 0);

        let bad: NewPage =
            serde_json::from_value(json!({"project": 1, "name": "Home", "slug": "home page"}))
                .unwrap();
        assert!(bad.validate().unwrap_err().starts_with("slug:"));

        let bad: NewPage = serde_json::from_value(
            json!({"project": 1, "name": "Home", "slug": "home", "position": -2}),
        )
        .unwrap();
        assert_eq!(bad.validate().unwrap_err(), "position cannot be negative.");
    }

    #[test]
    fn test_new_block_rejects_unknown_key() {
        let block: NewBlock = serde_json::from_value(json!({"page": 4, "key": "banner"})).unwrap();
        assert_eq!(block.validate().unwrap_err(), "Unknown block key.");

        let block: NewBlock = serde_json::from_value(json!({"page": 4, "key": "hero"})).unwrap();
        let block = block.validate().unwrap();
        assert!(block.enabled);
        assert_eq!(block.key, SectionKey::Hero);
    }

    #[test]
    fn test_project_changes_trim() {
        let changes = ProjectChanges {
            name: Some("  Shop ".to_owned()),
            domain: Some(" Shop.EXAMPLE ".to_owned()),
            ..ProjectChanges::default()
        }
        .validate()
        .unwrap();
        assert_eq!(changes.name.as_deref(), Some("Shop"));
        assert_eq!(changes.domain.as_deref(), Some("shop.example"));

        let blank = ProjectChanges {
            name: Some("   ".to_owned()),
            ..ProjectChanges::default()
        };
        assert!(blank.validate().is_err());
    }

    #[test]
    fn test_block_serializes_parent_as_page() {
        let block = Block {
            id: BlockId::new(1),
            page_id: PageId::new(9),
            key: SectionKey::Faq,
            enabled: true,
            position: 2,
            props: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let json = serde_json::to_value(&block).unwrap();
        assert_eq!(json["page"], 9);
        assert_eq!(json["key"], "faq");
    }
}
