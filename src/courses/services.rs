use crate::courses::dto::CoursePayload;
use crate::courses::repo::{Course, CourseFields};
use crate::error::FieldErrors;

const MAX_TITLE: usize = 200;
const MAX_DURATION: usize = 50;
const MAX_LEVEL: usize = 50;
const MAX_CATEGORY: usize = 100;

/// Validate a payload into insertable column values. For create `current` is
/// None and every text field must be present; for partial update the current
/// row fills in whatever the payload leaves out.
pub fn validate_payload(
    payload: CoursePayload,
    current: Option<&Course>,
) -> Result<CourseFields, FieldErrors> {
    let mut errors = FieldErrors::new();

    let title = text_field(
        &mut errors,
        "title",
        payload.title,
        current.map(|c| c.title.clone()),
        Some(MAX_TITLE),
    );
    let description = text_field(
        &mut errors,
        "description",
        payload.description,
        current.map(|c| c.description.clone()),
        None,
    );
    let duration = text_field(
        &mut errors,
        "duration",
        payload.duration,
        current.map(|c| c.duration.clone()),
        Some(MAX_DURATION),
    );
    let level = text_field(
        &mut errors,
        "level",
        payload.level,
        current.map(|c| c.level.clone()),
        Some(MAX_LEVEL),
    );
    let category = text_field(
        &mut errors,
        "category",
        payload.category,
        current.map(|c| c.category.clone()),
        Some(MAX_CATEGORY),
    );

    // Media references are optional; a blank string clears the field.
    let image = media_field(payload.image, current.and_then(|c| c.image.clone()));
    let video = media_field(payload.video, current.and_then(|c| c.video.clone()));

    if !errors.is_empty() {
        return Err(errors);
    }
    Ok(CourseFields {
        title: title.unwrap_or_default(),
        description: description.unwrap_or_default(),
        image,
        video,
        duration: duration.unwrap_or_default(),
        level: level.unwrap_or_default(),
        category: category.unwrap_or_default(),
    })
}

fn text_field(
    errors: &mut FieldErrors,
    name: &str,
    supplied: Option<String>,
    current: Option<String>,
    max_chars: Option<usize>,
) -> Option<String> {
    let supplied_explicitly = supplied.is_some();
    let value = supplied.or(current);
    let mut reasons = Vec::new();

    match &value {
        None => reasons.push("This field is required.".to_string()),
        Some(v) => {
            if supplied_explicitly && v.trim().is_empty() {
                reasons.push("This field may not be blank.".to_string());
            }
            if let Some(max) = max_chars {
                if v.chars().count() > max {
                    reasons.push(format!(
                        "Ensure this field has no more than {max} characters."
                    ));
                }
            }
        }
    }

    if !reasons.is_empty() {
        errors.insert(name.to_string(), reasons);
        return None;
    }
    value
}

fn media_field(supplied: Option<String>, current: Option<String>) -> Option<String> {
    match supplied {
        Some(v) if v.trim().is_empty() => None,
        Some(v) => Some(v),
        None => current,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;
    use uuid::Uuid;

    fn payload() -> CoursePayload {
        CoursePayload {
            title: Some("Intro to Rust".into()),
            description: Some("Ownership without tears".into()),
            image: Some("course_images/rust.png".into()),
            video: None,
            duration: Some("6 weeks".into()),
            level: Some("Beginner".into()),
            category: Some("Programming".into()),
        }
    }

    fn existing() -> Course {
        Course {
            id: Uuid::new_v4(),
            title: "Old title".into(),
            description: "Old description".into(),
            image: Some("course_images/old.png".into()),
            video: Some("course_videos/old.mp4".into()),
            duration: "4 weeks".into(),
            level: "Advanced".into(),
            category: "Databases".into(),
            created_at: datetime!(2024-05-01 12:00 UTC),
            updated_at: datetime!(2024-05-01 12:00 UTC),
        }
    }

    #[test]
    fn create_with_all_fields_passes() {
        let fields = validate_payload(payload(), None).unwrap();
        assert_eq!(fields.title, "Intro to Rust");
        assert_eq!(fields.image.as_deref(), Some("course_images/rust.png"));
        assert_eq!(fields.video, None);
    }

    #[test]
    fn create_missing_fields_lists_each_one() {
        let errors = validate_payload(CoursePayload::default(), None).unwrap_err();
        for field in ["title", "description", "duration", "level", "category"] {
            assert_eq!(errors[field], vec!["This field is required.".to_string()]);
        }
        assert!(!errors.contains_key("image"));
        assert!(!errors.contains_key("video"));
    }

    #[test]
    fn blank_title_is_rejected() {
        let mut p = payload();
        p.title = Some("   ".into());
        let errors = validate_payload(p, None).unwrap_err();
        assert_eq!(errors["title"], vec!["This field may not be blank.".to_string()]);
    }

    #[test]
    fn overlong_title_is_rejected() {
        let mut p = payload();
        p.title = Some("x".repeat(201));
        let errors = validate_payload(p, None).unwrap_err();
        assert_eq!(
            errors["title"],
            vec!["Ensure this field has no more than 200 characters.".to_string()]
        );
    }

    #[test]
    fn overlong_category_is_rejected() {
        let mut p = payload();
        p.category = Some("c".repeat(101));
        let errors = validate_payload(p, None).unwrap_err();
        assert!(errors["category"][0].contains("100 characters"));
    }

    #[test]
    fn partial_update_keeps_unspecified_fields() {
        let p = CoursePayload {
            title: Some("New title".into()),
            ..Default::default()
        };
        let fields = validate_payload(p, Some(&existing())).unwrap();
        assert_eq!(fields.title, "New title");
        assert_eq!(fields.description, "Old description");
        assert_eq!(fields.image.as_deref(), Some("course_images/old.png"));
        assert_eq!(fields.duration, "4 weeks");
    }

    #[test]
    fn partial_update_can_clear_media() {
        let p = CoursePayload {
            image: Some(String::new()),
            ..Default::default()
        };
        let fields = validate_payload(p, Some(&existing())).unwrap();
        assert_eq!(fields.image, None);
        assert_eq!(fields.video.as_deref(), Some("course_videos/old.mp4"));
    }

    #[test]
    fn partial_update_still_validates_supplied_values() {
        let p = CoursePayload {
            level: Some(String::new()),
            ..Default::default()
        };
        let errors = validate_payload(p, Some(&existing())).unwrap_err();
        assert_eq!(errors["level"], vec!["This field may not be blank.".to_string()]);
    }
}
