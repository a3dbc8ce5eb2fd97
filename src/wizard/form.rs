//! Step forms of the submission wizard

use serde::{Deserialize, Serialize};

use crate::models::validation::{validate_gallery, validate_post_fields};
use crate::models::{FieldErrors, Post, PostCategory};

/// First step: the post's text fields and cover image
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentForm {
    pub title: String,
    pub slug: String,
    pub category: PostCategory,
    /// Newly chosen cover. In edit mode `None` keeps the current one.
    pub cover_image: Option<String>,
    pub content: String,
}

impl ContentForm {
    pub fn new(
        title: impl Into<String>,
        slug: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            slug: slug.into(),
            content: content.into(),
            ..Self::default()
        }
    }

    pub fn with_category(mut self, category: PostCategory) -> Self {
        self.category = category;
        self
    }

    pub fn with_cover_image(mut self, cover_image: impl Into<String>) -> Self {
        self.cover_image = Some(cover_image.into());
        self
    }

    /// Prefill for editing. The cover is left unset so the stored one is kept.
    pub fn from_post(post: &Post) -> Self {
        Self {
            title: post.title.clone(),
            slug: post.slug.clone(),
            category: post.category,
            cover_image: None,
            content: post.content.clone(),
        }
    }

    pub fn validate(&self) -> FieldErrors {
        validate_post_fields(&self.title, &self.slug, &self.content)
    }
}

/// Second step: ordered gallery images, possibly none
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GalleryForm {
    pub images: Vec<String>,
}

impl GalleryForm {
    pub fn new(images: Vec<String>) -> Self {
        Self { images }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn validate(&self) -> FieldErrors {
        validate_gallery(&self.images)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_form_reports_missing_fields() {
        let errors = ContentForm::default().validate();
        assert_eq!(errors.len(), 3);
        assert_eq!(errors.get("title"), Some("Title is required"));

        let errors = ContentForm::new("Başlıq", "", "<p>Mətn</p>").validate();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors.get("slug"), Some("URL is required"));
    }

    #[test]
    fn test_gallery_form_accepts_empty_and_images() {
        assert!(GalleryForm::empty().validate().is_empty());
        let form = GalleryForm::new(vec!["a.JPG".into(), "b.jpeg".into(), "c.png?v=2".into()]);
        assert!(form.validate().is_empty());
        assert!(!GalleryForm::new(vec!["d.webp".into()]).validate().is_empty());
    }
}
