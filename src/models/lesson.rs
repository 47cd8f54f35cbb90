//! Lesson model

use serde::{Deserialize, Serialize};

/// A lesson inside a module, ordered by `position`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lesson {
    pub id: String,
    pub title: String,
    pub description: String,
    pub content: String,
    pub position: i64,
    pub module_id: String,
}

impl Lesson {
    pub fn new(
        id: String,
        title: String,
        description: String,
        content: String,
        module_id: String,
    ) -> Self {
        Self {
            id,
            title,
            description,
            content,
            position: 0,
            module_id,
        }
    }
}

/// Input for creating a lesson
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateLessonInput {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub content: String,
    pub module_id: String,
}

/// Input for updating a lesson
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct UpdateLessonInput {
    pub title: Option<String>,
    pub description: Option<String>,
    pub content: Option<String>,
}
