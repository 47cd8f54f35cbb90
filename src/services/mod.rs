//! Services layer - Business logic
//!
//! Services sit between the request handlers and the repositories. They are
//! responsible for:
//! - Generating identifiers for new records
//! - Validating input
//! - Bounding every store call by the per-call deadline
//! - Turning missing records into `ServiceError::NotFound`

pub mod course;
pub mod error;
pub mod group_course;
pub mod lesson;
pub mod module;

pub use course::CourseService;
pub use error::{ServiceError, ServiceResult};
pub use group_course::GroupCourseService;
pub use lesson::LessonService;
pub use module::ModuleService;

use std::future::Future;
use std::time::Duration;

/// Deadline applied to each store interaction unless configured otherwise
pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(2);

/// Run a store call under `limit`. On expiry the call's future is dropped,
/// which cancels the query and rolls back an open transaction.
pub(crate) async fn with_deadline<T, F>(limit: Duration, call: F) -> ServiceResult<T>
where
    F: Future<Output = anyhow::Result<T>>,
{
    match tokio::time::timeout(limit, call).await {
        Ok(result) => result.map_err(ServiceError::from),
        Err(_) => {
            tracing::warn!(?limit, "Store call exceeded deadline");
            Err(ServiceError::DeadlineExceeded(limit))
        }
    }
}

/// Reject blank required fields
pub(crate) fn require(field: &str, value: &str) -> ServiceResult<()> {
    if value.trim().is_empty() {
        return Err(ServiceError::Validation(format!("{} is required", field)));
    }
    Ok(())
}

/// An empty patch value means "leave unchanged"
pub(crate) fn supplied(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

/// Like [`supplied`], but a required field may not be patched to blank
pub(crate) fn supplied_required(
    field: &str,
    value: Option<String>,
) -> ServiceResult<Option<String>> {
    let value = supplied(value);
    if let Some(v) = &value {
        require(field, v)?;
    }
    Ok(value)
}

pub(crate) fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_with_deadline_passes_result_through() {
        let ok = with_deadline(Duration::from_secs(1), async { Ok::<_, anyhow::Error>(7) }).await;
        assert_eq!(ok.unwrap(), 7);

        let err = with_deadline(Duration::from_secs(1), async {
            Err::<(), _>(anyhow::anyhow!("boom"))
        })
        .await;
        assert!(matches!(err, Err(ServiceError::Persistence(_))));
    }

    #[tokio::test]
    async fn test_with_deadline_expires() {
        let limit = Duration::from_millis(20);
        let result = with_deadline(limit, async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok::<_, anyhow::Error>(())
        })
        .await;
        assert!(matches!(result, Err(ServiceError::DeadlineExceeded(d)) if d == limit));
    }

    #[test]
    fn test_require() {
        assert!(require("title", "Rust").is_ok());
        assert!(matches!(require("title", "  "), Err(ServiceError::Validation(_))));
    }

    #[test]
    fn test_supplied() {
        assert_eq!(supplied(Some("x".into())), Some("x".to_string()));
        assert_eq!(supplied(Some(String::new())), None);
        assert_eq!(supplied(None), None);
    }

    #[test]
    fn test_supplied_required() {
        assert_eq!(supplied_required("title", None).unwrap(), None);
        assert_eq!(supplied_required("title", Some(String::new())).unwrap(), None);
        assert_eq!(
            supplied_required("title", Some("Rust".into())).unwrap(),
            Some("Rust".to_string())
        );
        assert!(matches!(
            supplied_required("title", Some(" \t ".into())),
            Err(ServiceError::Validation(_))
        ));
    }

    #[test]
    fn test_new_id_is_uuid() {
        let id = new_id();
        assert!(uuid::Uuid::parse_str(&id).is_ok());
        assert_ne!(id, new_id());
    }
}
