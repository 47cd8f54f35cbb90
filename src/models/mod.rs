//! Data models
//!
//! This module contains the data structures used throughout the course catalog.
//! Models represent:
//! - Database entities (Course, Module, Lesson, GroupCourse)
//! - Service inputs for create and patch-update operations

mod course;
mod group_course;
mod lesson;
mod module;

pub use course::{AccessType, Course, CoursePatch, CreateCourseInput, UpdateCourseInput};
pub use group_course::{CreateGroupCourseInput, GroupCourse, UpdateGroupCourseInput};
pub use lesson::{CreateLessonInput, Lesson, UpdateLessonInput};
pub use module::{CreateModuleInput, Module, UpdateModuleInput};
