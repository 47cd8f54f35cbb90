//! Course model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Who may see a course
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccessType {
    /// Visible to everyone
    #[default]
    Public,
    /// Visible only to groups linked through a group-course record
    Restricted,
}

impl AccessType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Public => "public",
            Self::Restricted => "restricted",
        }
    }
}

impl std::fmt::Display for AccessType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for AccessType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "public" => Ok(Self::Public),
            "restricted" => Ok(Self::Restricted),
            _ => Err(anyhow::anyhow!("Invalid access type: {}", s)),
        }
    }
}

/// Course model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Course {
    pub id: String,
    pub title: String,
    pub description: String,
    pub access_type: AccessType,
    /// `None` while the course is unpublished
    pub published_at: Option<DateTime<Utc>>,
    pub owner_id: String,
}

impl Course {
    pub fn new(
        id: String,
        title: String,
        description: String,
        access_type: AccessType,
        owner_id: String,
    ) -> Self {
        Self {
            id,
            title,
            description,
            access_type,
            published_at: None,
            owner_id,
        }
    }

    pub fn is_published(&self) -> bool {
        self.published_at.is_some()
    }
}

/// Input for creating a course
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateCourseInput {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub access_type: String,
    pub owner_id: String,
}

/// Input for updating a course; `None` leaves the stored value untouched
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateCourseInput {
    pub title: Option<String>,
    pub description: Option<String>,
    pub access_type: Option<String>,
}

/// Validated course patch handed to the repository
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CoursePatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub access_type: Option<AccessType>,
}
