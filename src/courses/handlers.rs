use axum::{
    async_trait,
    body::Bytes,
    extract::{FromRequestParts, Path, State},
    http::{request::Parts, HeaderMap, StatusCode},
    routing::get,
    Json, Router,
};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::{
    auth::sessions::SessionUser,
    courses::{
        dto::{CourseEnvelope, CourseJson, CoursePayload, ListEnvelope},
        repo::Course,
        services::validate_payload,
    },
    error::{parse_json_body, parse_json_body_or_default, ApiError},
    media::RequestContext,
    state::AppState,
};

/// Course id path segment. An id that is not a UUID cannot name any course,
/// so it reports the same not-found envelope instead of the framework's
/// plain-text rejection.
pub struct CourseId(pub Uuid);

fn parse_course_id(raw: &str) -> Result<Uuid, ApiError> {
    raw.parse().map_err(|_| ApiError::NotFound("Course"))
}

#[async_trait]
impl<S> FromRequestParts<S> for CourseId
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(raw) = Path::<String>::from_request_parts(parts, state)
            .await
            .map_err(|_| ApiError::NotFound("Course"))?;
        Ok(CourseId(parse_course_id(&raw)?))
    }
}

fn classify_update_error(err: sqlx::Error) -> ApiError {
    match err {
        // The row can vanish between the find and the update.
        sqlx::Error::RowNotFound => ApiError::NotFound("Course"),
        other => ApiError::from_write_error(other),
    }
}

pub fn course_routes() -> Router<AppState> {
    Router::new()
        .route("/courses/", get(list_courses).post(create_course))
        .route(
            "/courses/:id/",
            get(get_course)
                .put(update_course)
                .patch(update_course)
                .delete(delete_course),
        )
}

/// GET /courses/ — open to any caller.
#[instrument(skip(state, headers))]
pub async fn list_courses(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<ListEnvelope>, ApiError> {
    let rows = Course::list_all(&state.db)
        .await
        .map_err(|e| ApiError::server("Failed to fetch courses", e))?;

    let ctx = RequestContext::from_headers(&headers);
    let results: Vec<CourseJson> = rows
        .into_iter()
        .map(|c| CourseJson::from_row(c, &state.config.media_url, ctx.as_ref()))
        .collect();

    Ok(Json(ListEnvelope {
        status: "success",
        count: results.len(),
        results,
    }))
}

/// GET /courses/:id/ — open to any caller; bare representation, no envelope.
#[instrument(skip(state, headers))]
pub async fn get_course(
    State(state): State<AppState>,
    headers: HeaderMap,
    CourseId(id): CourseId,
) -> Result<Json<CourseJson>, ApiError> {
    let course = Course::find(&state.db, id)
        .await?
        .ok_or(ApiError::NotFound("Course"))?;
    let ctx = RequestContext::from_headers(&headers);
    Ok(Json(CourseJson::from_row(
        course,
        &state.config.media_url,
        ctx.as_ref(),
    )))
}

/// POST /courses/ — authenticated.
#[instrument(skip(state, user, headers, body))]
pub async fn create_course(
    State(state): State<AppState>,
    SessionUser(user): SessionUser,
    headers: HeaderMap,
    body: Bytes,
) -> Result<(StatusCode, Json<CourseEnvelope>), ApiError> {
    let payload: CoursePayload = parse_json_body(&body)?;
    let fields = validate_payload(payload, None).map_err(|errors| {
        warn!(user_id = %user.id, "course payload failed validation");
        ApiError::Validation(errors)
    })?;

    let course = Course::insert(&state.db, &fields)
        .await
        .map_err(ApiError::from_write_error)?;

    info!(course_id = %course.id, user_id = %user.id, "course created");
    let ctx = RequestContext::from_headers(&headers);
    Ok((
        StatusCode::CREATED,
        Json(CourseEnvelope {
            status: "success",
            message: "Course created successfully",
            data: CourseJson::from_row(course, &state.config.media_url, ctx.as_ref()),
        }),
    ))
}

/// PUT/PATCH /courses/:id/ — authenticated, partial payloads accepted.
#[instrument(skip(state, user, headers, body))]
pub async fn update_course(
    State(state): State<AppState>,
    SessionUser(user): SessionUser,
    headers: HeaderMap,
    CourseId(id): CourseId,
    body: Bytes,
) -> Result<Json<CourseEnvelope>, ApiError> {
    // Empty and partial payloads are both fine here; unspecified fields keep
    // their current values.
    let payload: CoursePayload = parse_json_body_or_default(&body)?;

    let current = Course::find(&state.db, id)
        .await?
        .ok_or(ApiError::NotFound("Course"))?;
    let fields = validate_payload(payload, Some(&current)).map_err(ApiError::Validation)?;

    let course = Course::update(&state.db, id, &fields)
        .await
        .map_err(classify_update_error)?;

    info!(course_id = %course.id, user_id = %user.id, "course updated");
    let ctx = RequestContext::from_headers(&headers);
    Ok(Json(CourseEnvelope {
        status: "success",
        message: "Course updated successfully",
        data: CourseJson::from_row(course, &state.config.media_url, ctx.as_ref()),
    }))
}

/// DELETE /courses/:id/ — authenticated. A 204 carries no body, so the
/// success envelope is dropped here (see DESIGN.md).
#[instrument(skip(state, user))]
pub async fn delete_course(
    State(state): State<AppState>,
    SessionUser(user): SessionUser,
    CourseId(id): CourseId,
) -> Result<StatusCode, ApiError> {
    if !Course::delete(&state.db, id).await? {
        return Err(ApiError::NotFound("Course"));
    }
    info!(course_id = %id, user_id = %user.id, "course deleted");
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn malformed_course_id_maps_to_not_found() {
        assert!(matches!(
            parse_course_id("abc"),
            Err(ApiError::NotFound("Course"))
        ));
        assert!(matches!(parse_course_id("123"), Err(ApiError::NotFound(_))));

        let id = Uuid::new_v4();
        assert_eq!(parse_course_id(&id.to_string()).unwrap(), id);
    }

    #[test]
    fn update_of_vanished_row_maps_to_not_found() {
        assert!(matches!(
            classify_update_error(sqlx::Error::RowNotFound),
            ApiError::NotFound("Course")
        ));
        // Other write failures keep their usual classification.
        assert!(matches!(
            classify_update_error(sqlx::Error::PoolTimedOut),
            ApiError::Server { .. }
        ));
    }
}
