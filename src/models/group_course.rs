//! Group-course access link

use serde::{Deserialize, Serialize};

/// Grants a group access to a restricted course
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupCourse {
    pub id: String,
    pub course_id: String,
    pub group_id: String,
}

/// Input for creating a link
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateGroupCourseInput {
    pub course_id: String,
    pub group_id: String,
}

/// Input for re-pointing a link
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct UpdateGroupCourseInput {
    pub course_id: Option<String>,
    pub group_id: Option<String>,
}
