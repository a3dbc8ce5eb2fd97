//! Post submission wizard
//!
//! Two-step create/edit flow. Step one collects the text fields and cover
//! image, step two the gallery. Both are merged with the selected language
//! into one `PostPayload` and sent through a `PostGateway`.
//!
//! ```ignore
//! let mut wizard = Wizard::new();
//! wizard.open_create()?;
//! wizard.submit_content(ContentForm::new("Title", "title", "<p>Body</p>"))?;
//! let post = wizard.submit(GalleryForm::empty(), &gateway, &RetryPolicy::default()).await?;
//! let outcome = wizard.acknowledge()?;
//! ```
//!
//! A failed submission returns the wizard to the gallery step with every
//! entered value kept and the error held in `last_error` until dismissed.

mod form;
mod retry;

pub use form::{ContentForm, GalleryForm};
pub use retry::RetryPolicy;

use crate::models::{FieldErrors, Language, Post, PostPayload};
use crate::services::gateway::{GatewayError, PostGateway};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WizardStep {
    #[default]
    Closed,
    /// Step one: text fields and cover image
    Content,
    /// Step two: gallery images
    Gallery,
    Submitting,
    Success,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WizardMode {
    #[default]
    Create,
    Edit { post_id: i64 },
}

impl WizardMode {
    pub fn is_edit(&self) -> bool {
        matches!(self, WizardMode::Edit { .. })
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum WizardError {
    /// A submission is in flight
    #[error("a submission is in progress")]
    Busy,

    #[error("cannot {action} while {step:?}")]
    InvalidTransition {
        step: WizardStep,
        action: &'static str,
    },

    #[error("validation failed: {0}")]
    Validation(FieldErrors),

    #[error("submission failed: {0}")]
    Submission(GatewayError),
}

/// What the caller should do once the wizard closes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CloseOutcome {
    /// A post was saved, so the list must be fetched again
    pub refresh_list: bool,
    /// The wizard was editing a post
    pub exit_edit_mode: bool,
}

/// A merged payload ready to be sent
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    pub mode: WizardMode,
    pub payload: PostPayload,
}

impl Submission {
    /// Create or update, depending on the mode
    pub async fn send<G>(&self, gateway: &G) -> Result<Post, GatewayError>
    where
        G: PostGateway + ?Sized,
    {
        match self.mode {
            WizardMode::Create => gateway.create_post(&self.payload).await,
            WizardMode::Edit { post_id } => gateway.update_post(post_id, &self.payload).await,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Wizard {
    step: WizardStep,
    mode: WizardMode,
    language: Language,
    content: Option<ContentForm>,
    gallery: Option<GalleryForm>,
    /// Cover of the post being edited, kept unless a new one is chosen
    existing_cover: Option<String>,
    field_errors: FieldErrors,
    last_error: Option<GatewayError>,
    saved: Option<Post>,
}

impl Wizard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn step(&self) -> WizardStep {
        self.step
    }

    pub fn mode(&self) -> WizardMode {
        self.mode
    }

    pub fn language(&self) -> Language {
        self.language
    }

    pub fn content(&self) -> Option<&ContentForm> {
        self.content.as_ref()
    }

    pub fn gallery(&self) -> Option<&GalleryForm> {
        self.gallery.as_ref()
    }

    pub fn existing_cover(&self) -> Option<&str> {
        self.existing_cover.as_deref()
    }

    pub fn field_errors(&self) -> &FieldErrors {
        &self.field_errors
    }

    /// Error of the last failed submission, until dismissed
    pub fn last_error(&self) -> Option<&GatewayError> {
        self.last_error.as_ref()
    }

    /// The post returned by the last successful submission
    pub fn saved_post(&self) -> Option<&Post> {
        self.saved.as_ref()
    }

    pub fn is_open(&self) -> bool {
        self.step != WizardStep::Closed
    }

    pub fn is_busy(&self) -> bool {
        self.step == WizardStep::Submitting
    }

    /// Start a new post with empty fields
    pub fn open_create(&mut self) -> Result<(), WizardError> {
        self.require_closed("open")?;
        *self = Self {
            step: WizardStep::Content,
            ..Self::default()
        };
        Ok(())
    }

    /// Edit `post`, always starting from step one
    pub fn open_edit(&mut self, post: &Post) -> Result<(), WizardError> {
        self.require_closed("open")?;
        *self = Self {
            step: WizardStep::Content,
            mode: WizardMode::Edit { post_id: post.id },
            language: post.language,
            content: Some(ContentForm::from_post(post)),
            gallery: Some(GalleryForm::new(post.gallery_images.clone())),
            existing_cover: post.cover_image.clone(),
            ..Self::default()
        };
        Ok(())
    }

    /// Validate and store step one, then move to the gallery step.
    /// On failure the form is still kept so nothing typed is lost.
    pub fn submit_content(&mut self, form: ContentForm) -> Result<(), WizardError> {
        self.require(WizardStep::Content, "submit content")?;

        let errors = form.validate();
        self.content = Some(form);
        if !errors.is_empty() {
            self.field_errors = errors.clone();
            return Err(WizardError::Validation(errors));
        }

        self.field_errors = FieldErrors::new();
        self.step = WizardStep::Gallery;
        Ok(())
    }

    /// Return from the gallery step to step one, keeping both steps' data
    pub fn back(&mut self) -> Result<(), WizardError> {
        self.require(WizardStep::Gallery, "go back")?;
        self.field_errors = FieldErrors::new();
        self.step = WizardStep::Content;
        Ok(())
    }

    pub fn select_language(&mut self, language: Language) -> Result<(), WizardError> {
        match self.step {
            WizardStep::Submitting => Err(WizardError::Busy),
            WizardStep::Content | WizardStep::Gallery => {
                self.language = language;
                Ok(())
            }
            step => Err(WizardError::InvalidTransition {
                step,
                action: "select language",
            }),
        }
    }

    /// Merge both steps into a payload and enter `Submitting`
    pub fn begin_submit(&mut self, gallery: GalleryForm) -> Result<Submission, WizardError> {
        self.require(WizardStep::Gallery, "submit")?;

        let errors = gallery.validate();
        self.gallery = Some(gallery);
        if !errors.is_empty() {
            self.field_errors = errors.clone();
            return Err(WizardError::Validation(errors));
        }

        let content = self.content.clone().unwrap_or_default();
        let gallery_images = self
            .gallery
            .as_ref()
            .map(|g| g.images.clone())
            .unwrap_or_default();
        let payload = PostPayload {
            title: content.title,
            slug: content.slug,
            category: content.category,
            content: content.content,
            cover_image: content.cover_image,
            gallery_images,
            language: self.language,
        };

        self.field_errors = FieldErrors::new();
        self.last_error = None;
        self.step = WizardStep::Submitting;
        Ok(Submission {
            mode: self.mode,
            payload,
        })
    }

    /// Record the outcome of the in-flight submission
    pub fn finish_submit(
        &mut self,
        result: Result<Post, GatewayError>,
    ) -> Result<Post, WizardError> {
        self.require(WizardStep::Submitting, "finish submission")?;

        match result {
            Ok(post) => {
                tracing::info!("Post {} saved", post.id);
                if self.mode.is_edit() {
                    self.existing_cover = post.cover_image.clone();
                }
                self.saved = Some(post.clone());
                self.step = WizardStep::Success;
                Ok(post)
            }
            Err(e) => {
                tracing::error!("Post submission failed: {}", e);
                if let GatewayError::Validation(fields) = &e {
                    self.field_errors = fields.clone();
                }
                self.last_error = Some(e.clone());
                self.step = WizardStep::Gallery;
                Err(WizardError::Submission(e))
            }
        }
    }

    /// Submit the gallery step through `gateway`, retrying transient
    /// failures per `policy`. The wizard stays borrowed until the request
    /// settles, so overlapping submissions cannot happen.
    pub async fn submit<G>(
        &mut self,
        gallery: GalleryForm,
        gateway: &G,
        policy: &RetryPolicy,
    ) -> Result<Post, WizardError>
    where
        G: PostGateway + ?Sized,
    {
        let submission = self.begin_submit(gallery)?;
        let result = policy.run(|| submission.send(gateway)).await;
        self.finish_submit(result)
    }

    /// Close the wizard. Unsaved input is discarded. Closing after a
    /// successful submission is the same as acknowledging it.
    pub fn close(&mut self) -> Result<CloseOutcome, WizardError> {
        match self.step {
            WizardStep::Submitting => Err(WizardError::Busy),
            WizardStep::Success => self.acknowledge(),
            WizardStep::Closed => Ok(CloseOutcome::default()),
            WizardStep::Content | WizardStep::Gallery => {
                let outcome = CloseOutcome {
                    refresh_list: false,
                    exit_edit_mode: self.mode.is_edit(),
                };
                self.reset();
                Ok(outcome)
            }
        }
    }

    /// Confirm the success view and reset everything
    pub fn acknowledge(&mut self) -> Result<CloseOutcome, WizardError> {
        self.require(WizardStep::Success, "acknowledge")?;
        let outcome = CloseOutcome {
            refresh_list: true,
            exit_edit_mode: self.mode.is_edit(),
        };
        self.reset();
        Ok(outcome)
    }

    pub fn dismiss_error(&mut self) {
        self.last_error = None;
    }

    fn reset(&mut self) {
        *self = Self::default();
    }

    fn require(&self, step: WizardStep, action: &'static str) -> Result<(), WizardError> {
        if self.step == step {
            return Ok(());
        }
        if self.step == WizardStep::Submitting {
            return Err(WizardError::Busy);
        }
        Err(WizardError::InvalidTransition {
            step: self.step,
            action,
        })
    }

    fn require_closed(&self, action: &'static str) -> Result<(), WizardError> {
        self.require(WizardStep::Closed, action)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::create_cache;
    use crate::config::CacheConfig;
    use crate::db::repositories::{Latency, MockPostRepository};
    use crate::models::{
        ListParams, PagedResult, PostCategory, PostFilter, PostStatus, PublishStatus,
    };
    use crate::services::PostService;
    use async_trait::async_trait;
    use proptest::prelude::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    async fn service(count: u32) -> PostService {
        let repo = MockPostRepository::seeded(count, Latency::none()).boxed();
        let cache = create_cache(&CacheConfig::default()).await.unwrap();
        PostService::new(repo, cache, "admin")
    }

    fn valid_content() -> ContentForm {
        ContentForm::new(
            "Aviatikada Qadınlar Günü",
            "aviatikada-qadinlar-gunu",
            "<p>Tədbir</p>",
        )
        .with_category(PostCategory::Announcement)
    }

    fn fast_retries(max_retries: u32) -> RetryPolicy {
        RetryPolicy {
            max_retries,
            initial_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(2),
            multiplier: 2.0,
        }
    }

    /// Fails create calls with a transport error a fixed number of times
    struct FlakyGateway {
        inner: PostService,
        failures_left: AtomicU32,
        calls: AtomicU32,
    }

    #[async_trait]
    impl PostGateway for FlakyGateway {
        async fn list_posts(
            &self,
            params: &ListParams,
            filter: &PostFilter,
        ) -> Result<PagedResult<Post>, GatewayError> {
            self.inner.list_posts(params, filter).await
        }

        async fn get_post(&self, id: i64) -> Result<Post, GatewayError> {
            self.inner.get_post(id).await
        }

        async fn create_post(&self, payload: &PostPayload) -> Result<Post, GatewayError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let left = self.failures_left.load(Ordering::SeqCst);
            if left > 0 {
                self.failures_left.store(left - 1, Ordering::SeqCst);
                return Err(GatewayError::Transport("connection reset".into()));
            }
            self.inner.create_post(payload).await
        }

        async fn update_post(&self, id: i64, payload: &PostPayload) -> Result<Post, GatewayError> {
            self.inner.update_post(id, payload).await
        }

        async fn delete_post(&self, id: i64) -> Result<(), GatewayError> {
            self.inner.delete_post(id).await
        }

        async fn set_publish_status(
            &self,
            id: i64,
            publish_status: PublishStatus,
        ) -> Result<Post, GatewayError> {
            PostGateway::set_publish_status(&self.inner, id, publish_status).await
        }

        async fn set_status(&self, id: i64, status: PostStatus) -> Result<Post, GatewayError> {
            PostGateway::set_status(&self.inner, id, status).await
        }
    }

    #[test]
    fn test_open_create_defaults() {
        let mut wizard = Wizard::new();
        assert!(!wizard.is_open());
        wizard.open_create().unwrap();

        assert_eq!(wizard.step(), WizardStep::Content);
        assert_eq!(wizard.mode(), WizardMode::Create);
        assert_eq!(wizard.language(), Language::Az);
        assert!(wizard.content().is_none());
    }

    #[test]
    fn test_invalid_content_stays_on_first_step() {
        let mut wizard = Wizard::new();
        wizard.open_create().unwrap();

        let err = wizard
            .submit_content(ContentForm::new("Başlıq", "", "<p><br></p>"))
            .unwrap_err();
        assert!(matches!(err, WizardError::Validation(_)));
        assert_eq!(wizard.step(), WizardStep::Content);
        assert_eq!(wizard.field_errors().get("slug"), Some("URL is required"));
        assert_eq!(wizard.field_errors().get("content"), Some("Content is required"));
        assert_eq!(wizard.content().map(|c| c.title.as_str()), Some("Başlıq"));
    }

    #[test]
    fn test_back_keeps_first_step_data() {
        let mut wizard = Wizard::new();
        wizard.open_create().unwrap();
        wizard.submit_content(valid_content()).unwrap();
        assert_eq!(wizard.step(), WizardStep::Gallery);

        wizard.back().unwrap();
        assert_eq!(wizard.step(), WizardStep::Content);
        assert_eq!(wizard.content(), Some(&valid_content()));
    }

    #[test]
    fn test_transitions_out_of_order_are_rejected() {
        let mut wizard = Wizard::new();
        assert!(matches!(
            wizard.submit_content(valid_content()),
            Err(WizardError::InvalidTransition { step: WizardStep::Closed, .. })
        ));
        assert!(wizard.back().is_err());
        assert!(wizard.acknowledge().is_err());

        wizard.open_create().unwrap();
        assert!(wizard.open_create().is_err());
        assert!(wizard.begin_submit(GalleryForm::empty()).is_err());
    }

    #[test]
    fn test_open_edit_prefills_first_step() {
        let post = crate::db::repositories::seed_posts(2).remove(1);
        let mut wizard = Wizard::new();
        wizard.open_edit(&post).unwrap();

        assert_eq!(wizard.step(), WizardStep::Content);
        assert_eq!(wizard.mode(), WizardMode::Edit { post_id: 2 });
        let content = wizard.content().unwrap();
        assert_eq!(content.title, post.title);
        assert_eq!(content.slug, post.slug);
        assert_eq!(content.category, post.category);
        assert_eq!(content.content, post.content);
        assert_eq!(content.cover_image, None);
        assert_eq!(wizard.existing_cover(), post.cover_image.as_deref());
    }

    #[test]
    fn test_busy_while_submitting() {
        let mut wizard = Wizard::new();
        wizard.open_create().unwrap();
        wizard.submit_content(valid_content()).unwrap();
        wizard.select_language(Language::En).unwrap();
        let submission = wizard.begin_submit(GalleryForm::empty()).unwrap();

        assert_eq!(submission.payload.language, Language::En);
        assert_eq!(submission.payload.category, PostCategory::Announcement);
        assert!(wizard.is_busy());
        assert_eq!(wizard.close(), Err(WizardError::Busy));
        assert_eq!(wizard.select_language(Language::Az), Err(WizardError::Busy));
        assert!(matches!(wizard.begin_submit(GalleryForm::empty()), Err(WizardError::Busy)));
    }

    #[test]
    fn test_failed_submission_keeps_data() {
        let mut wizard = Wizard::new();
        wizard.open_create().unwrap();
        wizard.submit_content(valid_content()).unwrap();
        let gallery = GalleryForm::new(vec!["/uploads/a.png".into()]);
        wizard.begin_submit(gallery.clone()).unwrap();

        let err = wizard
            .finish_submit(Err(GatewayError::Server {
                status: 500,
                message: "boom".into(),
            }))
            .unwrap_err();
        assert!(matches!(err, WizardError::Submission(_)));
        assert_eq!(wizard.step(), WizardStep::Gallery);
        assert_eq!(wizard.content(), Some(&valid_content()));
        assert_eq!(wizard.gallery(), Some(&gallery));
        assert!(wizard.last_error().is_some());

        wizard.dismiss_error();
        assert!(wizard.last_error().is_none());
    }

    #[test]
    fn test_close_discards_input() {
        let mut wizard = Wizard::new();
        wizard.open_create().unwrap();
        wizard.submit_content(valid_content()).unwrap();

        let outcome = wizard.close().unwrap();
        assert_eq!(outcome, CloseOutcome::default());
        assert_eq!(wizard.step(), WizardStep::Closed);
        assert!(wizard.content().is_none());
    }

    #[tokio::test]
    async fn test_create_then_acknowledge_resets() {
        let gateway = service(0).await;
        let mut wizard = Wizard::new();
        wizard.open_create().unwrap();
        wizard.submit_content(valid_content()).unwrap();
        wizard.select_language(Language::En).unwrap();

        let post = wizard
            .submit(GalleryForm::empty(), &gateway, &RetryPolicy::none())
            .await
            .unwrap();
        assert_eq!(post.language, Language::En);
        assert_eq!(wizard.step(), WizardStep::Success);

        let outcome = wizard.acknowledge().unwrap();
        assert_eq!(
            outcome,
            CloseOutcome {
                refresh_list: true,
                exit_edit_mode: false
            }
        );
        assert_eq!(wizard.step(), WizardStep::Closed);
        assert!(wizard.content().is_none());
        assert!(wizard.gallery().is_none());
        assert_eq!(wizard.language(), Language::Az);
    }

    #[tokio::test]
    async fn test_edit_updates_and_keeps_cover() {
        let gateway = service(3).await;
        let post = gateway.get_post(3).await.unwrap();
        let mut wizard = Wizard::new();
        wizard.open_edit(&post).unwrap();

        let mut content = wizard.content().cloned().unwrap();
        content.title = "Yenilənmiş başlıq".to_string();
        wizard.submit_content(content).unwrap();
        let updated = wizard
            .submit(GalleryForm::new(vec!["/uploads/1.jpg".into()]), &gateway, &RetryPolicy::none())
            .await
            .unwrap();

        assert_eq!(updated.id, 3);
        assert_eq!(updated.title, "Yenilənmiş başlıq");
        assert_eq!(updated.cover_image, post.cover_image);
        assert_eq!(updated.gallery_images, vec!["/uploads/1.jpg".to_string()]);

        let outcome = wizard.close().unwrap();
        assert!(outcome.refresh_list);
        assert!(outcome.exit_edit_mode);
    }

    #[tokio::test]
    async fn test_transient_failures_are_retried() {
        let gateway = FlakyGateway {
            inner: service(0).await,
            failures_left: AtomicU32::new(2),
            calls: AtomicU32::new(0),
        };
        let mut wizard = Wizard::new();
        wizard.open_create().unwrap();
        wizard.submit_content(valid_content()).unwrap();

        let post = wizard
            .submit(GalleryForm::empty(), &gateway, &fast_retries(3))
            .await
            .unwrap();
        assert_eq!(post.id, 1);
        assert_eq!(gateway.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_conflict_is_not_retried() {
        let gateway = FlakyGateway {
            inner: service(0).await,
            failures_left: AtomicU32::new(0),
            calls: AtomicU32::new(0),
        };
        gateway
            .inner
            .create(PostPayload {
                title: "a".into(),
                slug: valid_content().slug,
                content: "<p>a</p>".into(),
                ..PostPayload::default()
            })
            .await
            .unwrap();

        let mut wizard = Wizard::new();
        wizard.open_create().unwrap();
        wizard.submit_content(valid_content()).unwrap();
        let err = wizard
            .submit(GalleryForm::empty(), &gateway, &fast_retries(3))
            .await
            .unwrap_err();

        assert!(matches!(err, WizardError::Submission(GatewayError::Conflict(_))));
        assert_eq!(gateway.calls.load(Ordering::SeqCst), 1);
        assert_eq!(wizard.step(), WizardStep::Gallery);
    }

    proptest! {
        #[test]
        fn prop_first_step_advances_only_when_complete(
            title in prop::option::of("[a-zA-Z ]{0,12}"),
            slug in prop::option::of("[a-z-]{0,12}"),
            content in prop::option::of("[a-z ]{0,12}"),
        ) {
            let title = title.unwrap_or_default();
            let slug = slug.unwrap_or_default();
            let content = content.unwrap_or_default();
            let complete = !title.trim().is_empty()
                && !slug.trim().is_empty()
                && !content.trim().is_empty();

            let mut wizard = Wizard::new();
            wizard.open_create().unwrap();
            let form = ContentForm::new(title.clone(), slug.clone(), content.clone());
            let result = wizard.submit_content(form);

            if complete {
                prop_assert!(result.is_ok());
                prop_assert_eq!(wizard.step(), WizardStep::Gallery);
            } else {
                prop_assert!(result.is_err());
                prop_assert_eq!(wizard.step(), WizardStep::Content);
                let errors = wizard.field_errors();
                prop_assert_eq!(errors.get("title").is_some(), title.trim().is_empty());
                prop_assert_eq!(errors.get("slug").is_some(), slug.trim().is_empty());
                prop_assert_eq!(errors.get("content").is_some(), content.trim().is_empty());
            }
        }
    }
}
