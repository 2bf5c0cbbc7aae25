use async_trait::async_trait;
use mongodb::{bson::doc, Collection};
use serde::{Deserialize, Serialize};

#[cfg(test)]
use mockall::automock;

use crate::{db::Database, errors::AppResult};

/// Read-only view of the course catalog owned elsewhere in the platform.
/// The assessment engine only needs the owning instructor for access checks.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait CourseRepository: Send + Sync {
    async fn instructor_for_course(&self, course_id: &str) -> AppResult<Option<String>>;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct CourseRecord {
    id: String,
    instructor_id: String,
}

pub struct MongoCourseRepository {
    collection: Collection<CourseRecord>,
}

impl MongoCourseRepository {
    pub fn new(db: &Database) -> Self {
        let collection = db.get_collection("courses");
        Self { collection }
    }
}

#[async_trait]
impl CourseRepository for MongoCourseRepository {
    async fn instructor_for_course(&self, course_id: &str) -> AppResult<Option<String>> {
        let course = self.collection.find_one(doc! { "id": course_id }).await?;
        Ok(course.map(|c| c.instructor_id))
    }
}
