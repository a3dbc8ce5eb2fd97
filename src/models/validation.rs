//! Field-level validation of post input
//!
//! Rich-text content counts as empty when it has no visible text, which is
//! what an editor leaves behind after clearing its contents (`<p><br></p>`).

use serde::{Deserialize, Serialize};

pub const TITLE_REQUIRED: &str = "Title is required";
pub const SLUG_REQUIRED: &str = "URL is required";
pub const CONTENT_REQUIRED: &str = "Content is required";
pub const GALLERY_TYPE: &str = "Only JPG and PNG images are allowed";

/// A validation message attached to one input field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

/// Ordered collection of field errors
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldErrors(Vec<FieldError>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn single(field: &str, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.push(field, message);
        errors
    }

    pub fn push(&mut self, field: &str, message: impl Into<String>) {
        self.0.push(FieldError {
            field: field.to_string(),
            message: message.into(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// First message recorded for `field`
    pub fn get(&self, field: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|e| e.field == field)
            .map(|e| e.message.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldError> {
        self.0.iter()
    }

    pub fn into_result(self) -> Result<(), FieldErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl std::fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let parts: Vec<String> = self
            .0
            .iter()
            .map(|e| format!("{}: {}", e.field, e.message))
            .collect();
        write!(f, "{}", parts.join("; "))
    }
}

pub fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

/// True when the markup renders no visible text
pub fn is_blank_html(html: &str) -> bool {
    if is_blank(html) {
        return true;
    }
    let text = ammonia::Builder::empty().clean(html).to_string();
    text.replace("&nbsp;", " ")
        .chars()
        .all(|c| c.is_whitespace() || c == '\u{a0}')
}

/// Gallery references must point at a JPEG or PNG file
pub fn is_jpeg_or_png(reference: &str) -> bool {
    let path = reference
        .split(['?', '#'])
        .next()
        .unwrap_or(reference)
        .to_ascii_lowercase();
    [".jpg", ".jpeg", ".png"]
        .iter()
        .any(|ext| path.ends_with(ext))
}

/// Required-field checks shared by the wizard's first step and the service
pub fn validate_post_fields(title: &str, slug: &str, content: &str) -> FieldErrors {
    let mut errors = FieldErrors::new();
    if is_blank(title) {
        errors.push("title", TITLE_REQUIRED);
    }
    if is_blank(slug) {
        errors.push("slug", SLUG_REQUIRED);
    }
    if is_blank_html(content) {
        errors.push("content", CONTENT_REQUIRED);
    }
    errors
}

pub fn validate_gallery(images: &[String]) -> FieldErrors {
    let mut errors = FieldErrors::new();
    if images.iter().any(|image| !is_jpeg_or_png(image)) {
        errors.push("gallery_images", GALLERY_TYPE);
    }
    errors
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_fields_present() {
        assert!(validate_post_fields("Title", "https://naa.edu.az/x", "<p>Body</p>").is_empty());
    }

    #[test]
    fn test_each_missing_field_is_reported() {
        let errors = validate_post_fields("  ", "", "");
        assert_eq!(errors.len(), 3);
        assert_eq!(errors.get("title"), Some(TITLE_REQUIRED));
        assert_eq!(errors.get("slug"), Some(SLUG_REQUIRED));
        assert_eq!(errors.get("content"), Some(CONTENT_REQUIRED));
    }

    #[test]
    fn test_empty_editor_markup_is_blank() {
        assert!(is_blank_html("<p><br></p>"));
        assert!(is_blank_html("<p>&nbsp;</p>"));
        assert!(is_blank_html("<p> </p><p></p>"));
        assert!(!is_blank_html("<p>Salam</p>"));
        assert!(!is_blank_html("plain text"));
    }

    #[test]
    fn test_gallery_types() {
        assert!(is_jpeg_or_png("/uploads/a.JPG"));
        assert!(is_jpeg_or_png("https://cdn.example.az/b.png?w=200"));
        assert!(is_jpeg_or_png("c.jpeg"));
        assert!(!is_jpeg_or_png("d.gif"));
        assert!(!is_jpeg_or_png("png"));

        let errors = validate_gallery(&["a.png".to_string(), "b.webp".to_string()]);
        assert_eq!(errors.get("gallery_images"), Some(GALLERY_TYPE));
        assert!(validate_gallery(&[]).is_empty());
    }

    #[test]
    fn test_field_errors_serialize_as_list() {
        let errors = FieldErrors::single("title", TITLE_REQUIRED);
        let json = serde_json::to_value(&errors).unwrap();
        assert_eq!(
            json,
            serde_json::json!([{ "field": "title", "message": "Title is required" }])
        );
        assert_eq!(errors.to_string(), "title: Title is required");
        assert!(errors.clone().into_result().is_err());
        assert!(FieldErrors::new().into_result().is_ok());
    }
}
