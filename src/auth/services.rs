use lazy_static::lazy_static;
use regex::Regex;

/// Validate a username against the account rules. Returns the specific
/// reason on failure so the endpoint can echo it to the caller.
pub fn validate_username(username: &str) -> Result<(), String> {
    lazy_static! {
        static ref USERNAME_RE: Regex = Regex::new(r"^[a-zA-Z0-9_]+$").unwrap();
    }
    if username.is_empty() {
        return Err("Username is required".into());
    }
    if username.chars().count() < 3 || username.chars().count() > 30 {
        return Err("Username must be between 3 and 30 characters".into());
    }
    if !USERNAME_RE.is_match(username) {
        return Err("Username can only contain letters, numbers, and underscores".into());
    }
    Ok(())
}

pub fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

// Head of the usual leaked-password lists; enough to stop the worst choices.
const COMMON_PASSWORDS: &[&str] = &[
    "password", "passw0rd", "password1", "password123", "123456", "1234567", "12345678",
    "123456789", "1234567890", "123123", "111111", "654321", "qwerty", "qwerty123", "qwertyuiop",
    "abc123", "abcd1234", "letmein", "trustno1", "iloveyou", "welcome", "welcome1", "admin",
    "monkey", "dragon", "sunshine", "princess", "football", "baseball", "superman", "starwars",
    "whatever", "freedom", "shadow", "master", "hello123", "michael", "charlie", "zaq12wsx",
];

/// Validate a password against the strength policy. Collects every violated
/// rule rather than stopping at the first one.
pub fn validate_password(
    password: &str,
    username: &str,
    email: &str,
    min_length: usize,
) -> Result<(), Vec<String>> {
    let mut violations = Vec::new();

    if password.chars().count() < min_length {
        violations.push(format!(
            "This password is too short. It must contain at least {min_length} characters."
        ));
    }
    if !password.is_empty() && password.chars().all(|c| c.is_ascii_digit()) {
        violations.push("This password is entirely numeric.".into());
    }
    if is_too_similar(password, username) {
        violations.push("The password is too similar to the username.".into());
    }
    let email_local = email.split('@').next().unwrap_or(email);
    if is_too_similar(password, email_local) {
        violations.push("The password is too similar to the email address.".into());
    }
    if COMMON_PASSWORDS.contains(&password.to_lowercase().as_str()) {
        violations.push("This password is too common.".into());
    }

    if violations.is_empty() {
        Ok(())
    } else {
        Err(violations)
    }
}

// Case-insensitive containment in either direction stands in for the usual
// sequence-similarity check; short attributes are skipped to avoid matching
// on noise.
fn is_too_similar(password: &str, attribute: &str) -> bool {
    if attribute.chars().count() < 4 || password.is_empty() {
        return false;
    }
    let pw = password.to_lowercase();
    let attr = attribute.to_lowercase();
    pw.contains(&attr) || attr.contains(&pw)
}

#[cfg(test)]
mod username_tests {
    use super::*;

    #[test]
    fn too_short_is_rejected() {
        let err = validate_username("ab").unwrap_err();
        assert_eq!(err, "Username must be between 3 and 30 characters");
    }

    #[test]
    fn too_long_is_rejected() {
        let err = validate_username("this_username_is_way_too_long_to_be_valid_ok").unwrap_err();
        assert_eq!(err, "Username must be between 3 and 30 characters");
    }

    #[test]
    fn invalid_characters_are_rejected() {
        let err = validate_username("bad name!").unwrap_err();
        assert_eq!(
            err,
            "Username can only contain letters, numbers, and underscores"
        );
    }

    #[test]
    fn empty_is_required() {
        assert_eq!(validate_username("").unwrap_err(), "Username is required");
    }

    #[test]
    fn valid_username_is_accepted() {
        assert!(validate_username("valid_123").is_ok());
    }
}

#[cfg(test)]
mod email_tests {
    use super::*;

    #[test]
    fn accepts_plain_addresses() {
        assert!(is_valid_email("student@example.com"));
        assert!(is_valid_email("a.b+c@sub.example.org"));
    }

    #[test]
    fn rejects_malformed_addresses() {
        assert!(!is_valid_email("not-an-email"));
        assert!(!is_valid_email("missing@tld"));
        assert!(!is_valid_email("two@@example.com"));
        assert!(!is_valid_email("spaces in@example.com"));
    }
}

#[cfg(test)]
mod password_tests {
    use super::*;

    fn check(pw: &str) -> Result<(), Vec<String>> {
        validate_password(pw, "valid_123", "student@example.com", 8)
    }

    #[test]
    fn short_password_is_rejected() {
        let errs = check("short").unwrap_err();
        assert!(errs
            .iter()
            .any(|e| e.contains("too short") && e.contains("8 characters")));
    }

    #[test]
    fn numeric_password_is_rejected() {
        let errs = check("8529637412").unwrap_err();
        assert!(errs.contains(&"This password is entirely numeric.".to_string()));
    }

    #[test]
    fn common_password_is_rejected() {
        let errs = check("Password123").unwrap_err();
        assert!(errs.contains(&"This password is too common.".to_string()));
    }

    #[test]
    fn username_lookalike_is_rejected() {
        let errs = check("xxvalid_123xx").unwrap_err();
        assert!(errs.contains(&"The password is too similar to the username.".to_string()));
    }

    #[test]
    fn email_lookalike_is_rejected() {
        let errs = validate_password("studentstudent", "someone", "student@example.com", 8)
            .unwrap_err();
        assert!(errs.contains(&"The password is too similar to the email address.".to_string()));
    }

    #[test]
    fn every_violation_is_listed() {
        // Short and entirely numeric at once; both rules must appear.
        let errs = check("12345").unwrap_err();
        assert_eq!(errs.len(), 2);
    }

    #[test]
    fn strong_password_passes() {
        assert!(check("correct-horse-battery").is_ok());
    }

    #[test]
    fn min_length_is_configurable() {
        assert!(validate_password("abcd-efgh", "user_one", "a@b.co", 12).is_err());
        assert!(validate_password("abcd-efgh-ijkl", "user_one", "a@b.co", 12).is_ok());
    }
}
