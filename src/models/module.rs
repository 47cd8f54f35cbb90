//! Course module model

use serde::{Deserialize, Serialize};

/// A module inside a course. `position` orders modules within the course.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Module {
    pub id: String,
    pub title: String,
    pub description: String,
    pub position: i64,
    pub course_id: String,
}

impl Module {
    /// A module that has not been positioned yet
    pub fn new(id: String, title: String, description: String, course_id: String) -> Self {
        Self {
            id,
            title,
            description,
            position: 0,
            course_id,
        }
    }
}

/// Input for creating a module
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateModuleInput {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub course_id: String,
}

/// Input for updating a module
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct UpdateModuleInput {
    pub title: Option<String>,
    pub description: Option<String>,
}
