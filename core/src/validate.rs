//! Form validation shared by every entry point.
//!
//! Each validator collects all field errors instead of stopping at the first
//! one so a form can render them inline at once. Messages are user-facing.

use std::fmt;

use crate::types::{Listing, ListingInput, NewInterest, ProfileUpdate};

/// One rejected field.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// All field errors produced by one validation pass, in field order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors(Vec<ValidationError>);

impl ValidationErrors {
    pub fn push(&mut self, error: ValidationError) {
        self.0.push(error);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn first(&self) -> Option<&ValidationError> {
        self.0.first()
    }

    /// Message for `field`, if that field was rejected.
    pub fn get(&self, field: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|e| e.field == field)
            .map(|e| e.message.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &ValidationError> {
        self.0.iter()
    }

    fn check(&mut self, ok: bool, field: &'static str, message: &str) {
        if !ok {
            self.push(ValidationError::new(field, message));
        }
    }

    fn into_result(self) -> Result<(), ValidationErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, e) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{e}")?;
        }
        Ok(())
    }
}

/// Validates the add/edit crop form.
pub fn listing(input: &ListingInput) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::default();
    errors.check(!input.name.trim().is_empty(), "name", "Crop name is required");
    errors.check(input.crop_type.is_some(), "type", "Crop type is required");
    errors.check(
        input.price_per_unit.is_finite() && input.price_per_unit > 0.0,
        "pricePerUnit",
        "Valid price is required",
    );
    errors.check(
        input.quantity.is_finite() && input.quantity > 0.0,
        "quantity",
        "Valid quantity is required",
    );
    errors.check(
        !input.description.trim().is_empty(),
        "description",
        "Description is required",
    );
    errors.check(!input.location.trim().is_empty(), "location", "Location is required");
    if let Some(image) = input.image.as_deref().filter(|s| !s.is_empty()) {
        errors.check(is_http_url(image), "image", "Please enter a valid URL");
    }
    errors.into_result()
}

/// Validates an interest against the listing it targets, when known.
pub fn interest(input: &NewInterest, listing: Option<&Listing>) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::default();
    errors.check(input.quantity > 0, "quantity", "Valid quantity is required");
    if let Some(listing) = listing {
        errors.check(
            f64::from(input.quantity) <= listing.quantity,
            "quantity",
            "Quantity exceeds what is available",
        );
        errors.check(
            !listing.is_owned_by(&input.user_email),
            "cropId",
            "You cannot send interest on your own crop",
        );
    }
    errors.into_result()
}

/// Validates a profile edit. Only present fields are checked.
pub fn profile_update(update: &ProfileUpdate) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::default();
    if let Some(name) = &update.name {
        check_name(&mut errors, name);
    }
    if let Some(photo_url) = update.photo_url.as_deref().filter(|s| !s.is_empty()) {
        errors.check(is_http_url(photo_url), "photoURL", "Please enter a valid URL");
    }
    errors.into_result()
}

/// Registration form handed to the identity provider.
#[derive(Debug, Clone, Default)]
pub struct Registration {
    pub full_name: String,
    pub email: String,
    pub photo_url: String,
    pub password: String,
}

pub fn registration(form: &Registration) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::default();
    check_name(&mut errors, &form.full_name);
    if form.email.is_empty() {
        errors.push(ValidationError::new("email", "Email is required"));
    } else {
        errors.check(is_email(&form.email), "email", "Email is invalid");
    }
    if !form.photo_url.is_empty() {
        errors.check(is_http_url(&form.photo_url), "photoURL", "Please enter a valid URL");
    }
    let missing = password_gaps(&form.password);
    if !missing.is_empty() {
        errors.push(ValidationError::new(
            "password",
            format!("Password must contain {}", missing.join(", ")),
        ));
    }
    errors.into_result()
}

/// Requirements the password does not meet yet, in display order.
pub fn password_gaps(password: &str) -> Vec<&'static str> {
    let mut gaps = Vec::new();
    if password.chars().count() < 6 {
        gaps.push("at least 6 characters");
    }
    if !password.chars().any(|c| c.is_ascii_uppercase()) {
        gaps.push("one uppercase letter");
    }
    if !password.chars().any(|c| c.is_ascii_lowercase()) {
        gaps.push("one lowercase letter");
    }
    gaps
}

fn check_name(errors: &mut ValidationErrors, name: &str) {
    let name = name.trim();
    if name.is_empty() {
        errors.push(ValidationError::new("name", "Full name is required"));
    } else if name.chars().count() < 2 {
        errors.push(ValidationError::new("name", "Full name must be at least 2 characters"));
    }
}

/// `local@domain.tld` with no whitespace in any part.
pub fn is_email(s: &str) -> bool {
    if s.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = s.split_once('@') else {
        return false;
    };
    if local.is_empty() {
        return false;
    }
    match domain.rsplit_once('.') {
        Some((host, tld)) => !host.is_empty() && !tld.is_empty(),
        None => false,
    }
}

/// `http://` or `https://` followed by something containing a dot.
pub fn is_http_url(s: &str) -> bool {
    let rest = s
        .strip_prefix("https://")
        .or_else(|| s.strip_prefix("http://"));
    match rest.and_then(|r| r.split_once('.')) {
        Some((head, tail)) => !head.is_empty() && !tail.is_empty(),
        None => false,
    }
}
