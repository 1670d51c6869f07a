use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::courses::repo::Course;
use crate::media::{media_url, RequestContext};

/// Incoming Course payload for create and partial update. Every field is
/// optional; what "missing" means differs per operation and is decided in
/// the validation layer. `created_at`/`updated_at` are server-assigned and
/// simply not part of the payload, so caller-supplied values are ignored.
#[derive(Debug, Default, Deserialize)]
pub struct CoursePayload {
    pub title: Option<String>,
    pub description: Option<String>,
    pub image: Option<String>,
    pub video: Option<String>,
    pub duration: Option<String>,
    pub level: Option<String>,
    pub category: Option<String>,
}

/// JSON representation of a Course. Media references are resolved against
/// the request context: absolute URLs when a Host is known, rooted relative
/// paths otherwise, null when no file is stored.
#[derive(Debug, Serialize)]
pub struct CourseJson {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub image: Option<String>,
    pub video: Option<String>,
    pub duration: String,
    pub level: String,
    pub category: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl CourseJson {
    pub fn from_row(course: Course, media_prefix: &str, ctx: Option<&RequestContext>) -> Self {
        Self {
            id: course.id,
            title: course.title,
            description: course.description,
            image: media_url(media_prefix, course.image.as_deref(), ctx),
            video: media_url(media_prefix, course.video.as_deref(), ctx),
            duration: course.duration,
            level: course.level,
            category: course.category,
            created_at: course.created_at,
            updated_at: course.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ListEnvelope {
    pub status: &'static str,
    pub count: usize,
    pub results: Vec<CourseJson>,
}

#[derive(Debug, Serialize)]
pub struct CourseEnvelope {
    pub status: &'static str,
    pub message: &'static str,
    pub data: CourseJson,
}
