//! Input validation rules.
//!
//! Validators collect one message per offending field.

use std::collections::BTreeMap;
use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

pub const POST_TEXT_MAX: usize = 300;
pub const NAME_MIN: usize = 2;
pub const NAME_MAX: usize = 30;
pub const PASSWORD_MIN: usize = 6;
pub const PASSWORD_MAX: usize = 30;
pub const EMAIL_MAX: usize = 254;

// Dot-separated domain labels, at least two, none empty or hyphen-edged.
static EMAIL_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^[A-Za-z0-9.!#$%&'*+/=?^_`{|}~-]+@[A-Za-z0-9](?:[A-Za-z0-9-]*[A-Za-z0-9])?(?:\.[A-Za-z0-9](?:[A-Za-z0-9-]*[A-Za-z0-9])?)+$",
    )
    .expect("compile email regex")
});

/// Field name to error message.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(BTreeMap<&'static str, String>);

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an error for `field`. The first message per field wins.
    pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
        self.0.entry(field).or_insert_with(|| message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &str)> {
        self.0.iter().map(|(k, v)| (*k, v.as_str()))
    }

    pub fn into_result(self) -> Result<(), ValidationErrors> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, message) in self.iter() {
            if !first {
                f.write_str(", ")?;
            }
            write!(f, "{field}: {message}")?;
            first = false;
        }
        Ok(())
    }
}

/// Rules shared by posts and comments.
pub fn validate_post_text(text: &str) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::new();
    let trimmed = text.trim();

    if trimmed.is_empty() {
        errors.add("text", "Text field is required");
    } else if trimmed.chars().count() > POST_TEXT_MAX {
        errors.add(
            "text",
            format!("Text must not exceed {POST_TEXT_MAX} characters"),
        );
    }

    errors.into_result()
}

pub fn validate_registration(
    name: &str,
    email: &str,
    password: &str,
    password_confirmation: &str,
) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::new();

    let name_len = name.trim().chars().count();
    if name_len == 0 {
        errors.add("name", "Name field is required");
    } else if !(NAME_MIN..=NAME_MAX).contains(&name_len) {
        errors.add(
            "name",
            format!("Name must be between {NAME_MIN} and {NAME_MAX} characters"),
        );
    }

    check_email(&mut errors, email);

    let password_len = password.chars().count();
    if password_len == 0 {
        errors.add("password", "Password field is required");
    } else if !(PASSWORD_MIN..=PASSWORD_MAX).contains(&password_len) {
        errors.add(
            "password",
            format!("Password must be between {PASSWORD_MIN} and {PASSWORD_MAX} characters"),
        );
    }

    if password_confirmation.is_empty() {
        errors.add("password2", "Confirm password field is required");
    } else if password != password_confirmation {
        errors.add("password2", "Passwords must match");
    }

    errors.into_result()
}

pub fn validate_login(email: &str, password: &str) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::new();
    check_email(&mut errors, email);
    if password.is_empty() {
        errors.add("password", "Password field is required");
    }
    errors.into_result()
}

fn check_email(errors: &mut ValidationErrors, email: &str) {
    let email = email.trim();
    if email.is_empty() {
        errors.add("email", "Email field is required");
    } else if !is_valid_email(email) {
        errors.add("email", "Email is invalid");
    }
}

fn is_valid_email(email: &str) -> bool {
    email.len() <= EMAIL_MAX && EMAIL_REGEX.is_match(email)
}
