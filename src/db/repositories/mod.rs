//! Database repositories
//!
//! Repository pattern implementations for database access.
//! Each repository handles the persistence operations for one entity and
//! hides soft-deleted rows from every read.

pub mod course;
pub mod group_course;
pub mod lesson;
pub mod module;

pub use course::{CourseRepository, SqlxCourseRepository};
pub use group_course::{GroupCourseRepository, SqlxGroupCourseRepository};
pub use lesson::{LessonRepository, SqlxLessonRepository};
pub use module::{ModuleRepository, SqlxModuleRepository};
