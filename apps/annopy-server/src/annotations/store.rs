//! Annotation persistence boundary
//!
//! The session only ever talks to an [`AnnotationBackend`]: one fetch per
//! document load and one round trip per write. Write outcomes are
//! human-readable notices; the caller shows them and does not retry.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::anchoring::is_valid_path;

use super::categories::CategoryRegistry;
use super::summary::{summarize, AnnotationSummary};
use super::templates::TemplateLibrary;
use super::types::{Annotation, AnnotationForm};

pub const MSG_ADDED: &str = "Annotation added";
pub const MSG_EDITED: &str = "Annotation edited";
pub const MSG_DELETED: &str = "Annotation deleted";
pub const MSG_INVALID: &str = "Annotation invalid";
pub const MSG_NOT_ALLOWED: &str = "No permissions to do this.";
pub const MSG_TYPE_DELETED: &str = "Annotation type deleted";
pub const MSG_SUBMISSION_UPDATED: &str = "Submission updated";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BackendError {
    /// The store refused the write; the message is shown as is
    #[error("{0}")]
    Rejected(String),

    #[error("Transport error: {0}")]
    Transport(String),
}

/// Success message of a write, with the annotation to focus afterwards
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub annotation_id: Option<u64>,
}

impl Notice {
    pub fn new(message: &str, annotation_id: Option<u64>) -> Self {
        Self {
            message: message.to_string(),
            annotation_id,
        }
    }
}

/// External store the session reads from and writes to
#[async_trait]
pub trait AnnotationBackend: Send + Sync {
    /// Annotations of a submission, optionally only those by `author`
    async fn fetch_annotations(
        &self,
        submission: u64,
        author: Option<u64>,
    ) -> Result<Vec<Annotation>, BackendError>;

    /// Create (`annotationid == 0`) or update an annotation as `user`
    async fn submit(&self, user: u64, form: &AnnotationForm) -> Result<Notice, BackendError>;

    /// Delete an annotation as `user`
    async fn delete(&self, user: u64, annotation: u64) -> Result<Notice, BackendError>;
}

#[async_trait]
impl<T: AnnotationBackend + ?Sized> AnnotationBackend for Arc<T> {
    async fn fetch_annotations(
        &self,
        submission: u64,
        author: Option<u64>,
    ) -> Result<Vec<Annotation>, BackendError> {
        (**self).fetch_annotations(submission, author).await
    }

    async fn submit(&self, user: u64, form: &AnnotationForm) -> Result<Notice, BackendError> {
        (**self).submit(user, form).await
    }

    async fn delete(&self, user: u64, annotation: u64) -> Result<Notice, BackendError> {
        (**self).delete(user, annotation).await
    }
}

/// An uploaded text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Submission {
    pub id: u64,
    pub author: u64,
    pub title: String,
    /// HTML as uploaded
    pub content: String,
    /// Starts at 1 and goes up by one on every edit
    pub currentversion: u32,
    pub timecreated: i64,
    /// 0 until the first edit
    pub timemodified: i64,
}

#[derive(Debug, Default)]
struct StoreInner {
    submissions: BTreeMap<u64, Submission>,
    annotations: BTreeMap<u64, Annotation>,
    next_submission: u64,
    next_annotation: u64,
}

/// In-process store for submissions, annotations and types
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: RwLock<StoreInner>,
    categories: RwLock<CategoryRegistry>,
    templates: RwLock<TemplateLibrary>,
}

fn next_id(counter: &mut u64) -> u64 {
    *counter = (*counter).max(1);
    let id = *counter;
    *counter += 1;
    id
}

impl MemoryStore {
    pub fn new(categories: CategoryRegistry) -> Self {
        Self {
            inner: RwLock::new(StoreInner::default()),
            categories: RwLock::new(categories),
            templates: RwLock::new(TemplateLibrary::new()),
        }
    }

    pub fn categories(&self) -> &RwLock<CategoryRegistry> {
        &self.categories
    }

    pub fn templates(&self) -> &RwLock<TemplateLibrary> {
        &self.templates
    }

    pub fn add_submission(&self, author: u64, title: &str, content: &str) -> Submission {
        let mut inner = self.inner.write();
        let id = next_id(&mut inner.next_submission);
        let submission = Submission {
            id,
            author,
            title: title.to_string(),
            content: content.to_string(),
            currentversion: 1,
            timecreated: Utc::now().timestamp(),
            timemodified: 0,
        };
        inner.submissions.insert(id, submission.clone());
        tracing::info!(submission = id, author, "Submission added");
        submission
    }

    pub fn submission(&self, id: u64) -> Option<Submission> {
        self.inner.read().submissions.get(&id).cloned()
    }

    /// Replace the text of a submission as its author
    ///
    /// Annotations are left as they are; on the next load they re-anchor
    /// against the new text or fail.
    pub fn update_submission(
        &self,
        id: u64,
        user: u64,
        title: Option<&str>,
        content: &str,
    ) -> Result<Submission, BackendError> {
        let mut inner = self.inner.write();
        let Some(submission) = inner.submissions.get_mut(&id) else {
            return Err(BackendError::Rejected(MSG_INVALID.to_string()));
        };
        if submission.author != user {
            return Err(BackendError::Rejected(MSG_NOT_ALLOWED.to_string()));
        }

        if let Some(title) = title {
            submission.title = title.to_string();
        }
        submission.content = content.to_string();
        submission.currentversion += 1;
        submission.timemodified = Utc::now().timestamp();

        tracing::info!(
            submission = id,
            user,
            version = submission.currentversion,
            "Submission updated"
        );
        Ok(submission.clone())
    }

    pub fn annotation(&self, id: u64) -> Option<Annotation> {
        self.inner.read().annotations.get(&id).cloned()
    }

    /// Annotations of a submission with their category color filled in
    pub fn annotations_for(&self, submission: u64, author: Option<u64>) -> Vec<Annotation> {
        let inner = self.inner.read();
        let categories = self.categories.read();
        inner
            .annotations
            .values()
            .filter(|a| a.submission == submission)
            .filter(|a| author.map_or(true, |u| a.user_id == u))
            .map(|a| {
                let mut a = a.clone();
                a.color = categories.get(a.type_id).map(|t| t.color.to_string());
                a
            })
            .collect()
    }

    /// Counts of a submission's annotations, optionally only those by `author`
    pub fn summary(&self, submission: u64, author: Option<u64>) -> AnnotationSummary {
        let annotations = self.annotations_for(submission, author);
        summarize(&annotations, &self.categories.read())
    }

    fn create(&self, user: u64, form: &AnnotationForm) -> Result<Notice, BackendError> {
        let rejected = |msg: &str| Err(BackendError::Rejected(msg.to_string()));

        if !form.has_selectors() || form.exact.is_empty() {
            return rejected(MSG_INVALID);
        }
        if !self.categories.read().contains(form.type_id) {
            return rejected(MSG_TYPE_DELETED);
        }
        if !is_valid_path(&form.startcontainer) || !is_valid_path(&form.endcontainer) {
            return rejected(MSG_INVALID);
        }

        let mut inner = self.inner.write();
        if !inner.submissions.contains_key(&form.submission) {
            return rejected(MSG_INVALID);
        }
        let id = next_id(&mut inner.next_annotation);
        inner
            .annotations
            .insert(id, form.clone().into_annotation(id, user));

        tracing::info!(annotation = id, submission = form.submission, user, "Annotation created");
        Ok(Notice::new(MSG_ADDED, Some(id)))
    }

    fn update(&self, user: u64, form: &AnnotationForm) -> Result<Notice, BackendError> {
        let rejected = |msg: &str| Err(BackendError::Rejected(msg.to_string()));

        let type_exists = self.categories.read().contains(form.type_id);
        let mut inner = self.inner.write();
        let Some(annotation) = inner
            .annotations
            .get_mut(&form.annotationid)
            .filter(|a| a.submission == form.submission)
        else {
            return rejected(MSG_INVALID);
        };
        if annotation.user_id != user {
            return rejected(MSG_NOT_ALLOWED);
        }
        if !type_exists {
            return rejected(MSG_TYPE_DELETED);
        }

        // Selector columns are immutable after creation
        annotation.type_id = form.type_id;
        annotation.text = form.text.clone();
        annotation.time_modified = Utc::now().timestamp();

        tracing::info!(annotation = form.annotationid, user, "Annotation updated");
        Ok(Notice::new(MSG_EDITED, Some(form.annotationid)))
    }
}

#[async_trait]
impl AnnotationBackend for MemoryStore {
    async fn fetch_annotations(
        &self,
        submission: u64,
        author: Option<u64>,
    ) -> Result<Vec<Annotation>, BackendError> {
        Ok(self.annotations_for(submission, author))
    }

    async fn submit(&self, user: u64, form: &AnnotationForm) -> Result<Notice, BackendError> {
        if form.is_create() {
            self.create(user, form)
        } else {
            self.update(user, form)
        }
    }

    async fn delete(&self, user: u64, annotation: u64) -> Result<Notice, BackendError> {
        let mut inner = self.inner.write();
        let by_author = inner
            .annotations
            .get(&annotation)
            .is_some_and(|a| a.user_id == user);
        if !by_author {
            return Err(BackendError::Rejected(MSG_NOT_ALLOWED.to_string()));
        }

        inner.annotations.remove(&annotation);
        tracing::info!(annotation, user, "Annotation deleted");
        Ok(Notice::new(MSG_DELETED, None))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::anchoring::{RangeSelector, SelectorTriple, TextPositionSelector, TextQuoteSelector};
    use crate::annotations::{HexColor, TypeTemplate};

    fn triple() -> SelectorTriple {
        SelectorTriple {
            range: RangeSelector {
                start_container: "/p[1]".into(),
                start_offset: 4,
                end_container: "/p[1]".into(),
                end_offset: 9,
            },
            position: TextPositionSelector { start: 4, end: 9 },
            quote: TextQuoteSelector {
                exact: "quick".into(),
                prefix: "The ".into(),
                suffix: " brown fox".into(),
            },
        }
    }

    fn store() -> (MemoryStore, u64) {
        let registry = CategoryRegistry::from_templates(&[TypeTemplate {
            name: "Grammar".into(),
            color: HexColor::parse("FF0000").unwrap(),
        }]);
        let store = MemoryStore::new(registry);
        let submission = store.add_submission(1, "Essay", "<p>The quick brown fox</p>");
        (store, submission.id)
    }

    #[tokio::test]
    async fn test_create_and_fetch() {
        let (store, submission) = store();
        let notice = store
            .submit(5, &AnnotationForm::create(submission, &triple(), 1, "nice"))
            .await
            .unwrap();
        assert_eq!(notice.message, MSG_ADDED);
        let id = notice.annotation_id.unwrap();

        let all = store.fetch_annotations(submission, None).await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].id, id);
        assert_eq!(all[0].color.as_deref(), Some("FF0000"));
        assert_eq!(all[0].time_modified, 0);

        assert!(store.fetch_annotations(submission, Some(6)).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_create_rejections() {
        let (store, submission) = store();

        let mut unset = AnnotationForm::create(submission, &triple(), 1, "");
        unset.startoffset = -1;
        assert_eq!(
            store.submit(5, &unset).await,
            Err(BackendError::Rejected(MSG_INVALID.into()))
        );

        let mut bad_path = AnnotationForm::create(submission, &triple(), 1, "");
        bad_path.startcontainer = "/p[1] or 1=1".into();
        assert_eq!(
            store.submit(5, &bad_path).await,
            Err(BackendError::Rejected(MSG_INVALID.into()))
        );

        let missing_type = AnnotationForm::create(submission, &triple(), 42, "");
        assert_eq!(
            store.submit(5, &missing_type).await,
            Err(BackendError::Rejected(MSG_TYPE_DELETED.into()))
        );

        let missing_submission = AnnotationForm::create(999, &triple(), 1, "");
        assert!(store.submit(5, &missing_submission).await.is_err());
    }

    #[tokio::test]
    async fn test_update_rules() {
        let (store, submission) = store();
        let id = store
            .submit(5, &AnnotationForm::create(submission, &triple(), 1, "first"))
            .await
            .unwrap()
            .annotation_id
            .unwrap();
        let existing = store.annotation(id).unwrap();

        let mut form = AnnotationForm::update(&existing, 1, "second");
        form.startcontainer = "/p[7]".into();
        assert_eq!(
            store.submit(6, &form).await,
            Err(BackendError::Rejected(MSG_NOT_ALLOWED.into()))
        );

        let notice = store.submit(5, &form).await.unwrap();
        assert_eq!(notice.message, MSG_EDITED);
        let updated = store.annotation(id).unwrap();
        assert_eq!(updated.text, "second");
        assert_eq!(updated.start_container, "/p[1]");
        assert!(updated.time_modified > 0);

        let mut other_submission = form.clone();
        other_submission.submission = submission + 1;
        assert_eq!(
            store.submit(5, &other_submission).await,
            Err(BackendError::Rejected(MSG_INVALID.into()))
        );
    }

    #[tokio::test]
    async fn test_delete_only_by_author() {
        let (store, submission) = store();
        let id = store
            .submit(5, &AnnotationForm::create(submission, &triple(), 1, ""))
            .await
            .unwrap()
            .annotation_id
            .unwrap();

        assert!(store.delete(6, id).await.is_err());
        assert_eq!(store.delete(5, id).await.unwrap().message, MSG_DELETED);
        assert!(store.annotation(id).is_none());
        assert!(store.delete(5, id).await.is_err());
    }

    #[tokio::test]
    async fn test_update_submission_bumps_version() {
        let (store, submission) = store();
        store
            .submit(5, &AnnotationForm::create(submission, &triple(), 1, ""))
            .await
            .unwrap();

        assert_eq!(
            store.update_submission(submission, 5, None, "<p>x</p>"),
            Err(BackendError::Rejected(MSG_NOT_ALLOWED.into()))
        );
        assert_eq!(
            store.update_submission(99, 1, None, "<p>x</p>"),
            Err(BackendError::Rejected(MSG_INVALID.into()))
        );

        let before = store.submission(submission).unwrap();
        assert_eq!(before.currentversion, 1);
        assert_eq!(before.timemodified, 0);

        let after = store
            .update_submission(submission, 1, Some("Draft 2"), "<p>A quick brown fox</p>")
            .unwrap();
        assert_eq!(after.currentversion, 2);
        assert_eq!(after.title, "Draft 2");
        assert!(after.timemodified >= before.timecreated);
        assert_eq!(store.submission(submission).unwrap(), after);

        // Annotations survive the edit untouched
        assert_eq!(store.annotations_for(submission, None).len(), 1);
    }

    #[tokio::test]
    async fn test_summary_respects_author_filter() {
        let (store, submission) = store();
        for user in [5, 5, 6] {
            store
                .submit(user, &AnnotationForm::create(submission, &triple(), 1, ""))
                .await
                .unwrap();
        }

        let all = store.summary(submission, None);
        assert_eq!(all.total, 3);
        assert_eq!(all.participants.len(), 2);

        let mine = store.summary(submission, Some(6));
        assert_eq!(mine.total, 1);
        assert_eq!(mine.types[0].count, 1);
    }

    #[tokio::test]
    async fn test_removing_type_keeps_annotations() {
        let (store, submission) = store();
        store
            .submit(5, &AnnotationForm::create(submission, &triple(), 1, ""))
            .await
            .unwrap();

        store.categories().write().remove(1).unwrap();

        let all = store.fetch_annotations(submission, None).await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].type_id, 1);
        assert_eq!(all[0].color, None);
        assert!(store.categories().read().label(1).deleted);
    }
}
