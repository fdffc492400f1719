//! Console session: criteria, cached collection, visible results, status.
//!
//! A session lives for the lifetime of one console (server process or CLI
//! run). Searches never hold the state lock across a remote call, so a
//! superseding search simply overwrites whatever completed before it.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::Serialize;
use shelf_authz::AuthProvider;

use super::models::{BookDraft, BookId, BookRecord};
use super::search::{filter, SearchCriteria};
use super::source::{BookSource, GatewayError};
use super::validation::{validate, FieldError, Mode};

/// What the console should currently show.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum Status {
    #[default]
    Idle,
    Loading,
    Ready {
        count: usize,
    },
    NoResults,
    Failed {
        message: String,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("no books match the search criteria")]
    NoResults,

    #[error("write access required")]
    Forbidden,

    #[error("another submission is still in flight")]
    Busy,

    #[error("invalid input: {}", join_errors(.0))]
    Validation(Vec<FieldError>),

    #[error(transparent)]
    Gateway(#[from] GatewayError),
}

fn join_errors(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

#[derive(Debug, Default)]
struct SessionState {
    criteria: SearchCriteria,
    collection: Option<Vec<BookRecord>>,
    results: Vec<BookRecord>,
    status: Status,
}

/// `submitting` and `loading_detail` cover the work `status` does not:
/// an in-flight write and in-flight single-record loads.
#[derive(Debug, Clone, Serialize)]
pub struct Snapshot {
    pub status: Status,
    pub criteria: SearchCriteria,
    pub results: Vec<BookRecord>,
    pub submitting: bool,
    pub loading_detail: bool,
}

pub struct CatalogSession {
    source: Arc<dyn BookSource>,
    auth: Arc<AuthProvider>,
    state: Mutex<SessionState>,
    submitting: AtomicBool,
    detail_loads: AtomicUsize,
}

impl CatalogSession {
    pub fn new(source: Arc<dyn BookSource>, auth: Arc<AuthProvider>) -> Self {
        Self {
            source,
            auth,
            state: Mutex::new(SessionState::default()),
            submitting: AtomicBool::new(false),
            detail_loads: AtomicUsize::new(0),
        }
    }

    pub fn auth(&self) -> &Arc<AuthProvider> {
        &self.auth
    }

    /// Apply `criteria` to the collection, fetching it on first use.
    ///
    /// An empty match is reported as [`SessionError::NoResults`]; a remote
    /// failure as [`SessionError::Gateway`]. Both clear the visible results.
    pub async fn search(&self, criteria: SearchCriteria) -> Result<Vec<BookRecord>, SessionError> {
        let criteria = criteria.normalized();
        let cached = {
            let mut state = self.lock();
            state.criteria = criteria.clone();
            state.status = Status::Loading;
            state.collection.clone()
        };

        let collection = match cached {
            Some(collection) => collection,
            None => match self.source.fetch_all().await {
                Ok(collection) => {
                    self.lock().collection = Some(collection.clone());
                    collection
                }
                Err(err) => {
                    tracing::warn!(error = %err, "search failed");
                    let mut state = self.lock();
                    state.results.clear();
                    state.status = Status::Failed {
                        message: err.to_string(),
                    };
                    return Err(err.into());
                }
            },
        };

        let found = filter(&criteria, &collection);
        tracing::info!(
            total = collection.len(),
            matched = found.len(),
            "search complete"
        );

        let mut state = self.lock();
        state.results = found.clone();
        if found.is_empty() {
            state.status = Status::NoResults;
            Err(SessionError::NoResults)
        } else {
            state.status = Status::Ready { count: found.len() };
            Ok(found)
        }
    }

    /// Forget criteria, cached collection and results. Does not fetch.
    pub fn reset(&self) {
        *self.lock() = SessionState::default();
        tracing::debug!("search session reset");
    }

    pub fn snapshot(&self) -> Snapshot {
        let state = self.lock();
        Snapshot {
            status: state.status.clone(),
            criteria: state.criteria.clone(),
            results: state.results.clone(),
            submitting: self.submitting.load(Ordering::Acquire),
            loading_detail: self.detail_loads.load(Ordering::Acquire) > 0,
        }
    }

    pub fn status(&self) -> Status {
        self.lock().status.clone()
    }

    pub fn results(&self) -> Vec<BookRecord> {
        self.lock().results.clone()
    }

    pub async fn find(&self, id: BookId) -> Result<BookRecord, SessionError> {
        let _loading = self.begin_detail();
        Ok(self.source.fetch_by_id(id).await?)
    }

    pub async fn create(&self, draft: BookDraft) -> Result<BookId, SessionError> {
        let token = self.write_token()?;
        check(&draft, Mode::Create)?;
        let _submit = self.begin_submit()?;

        let id = self.source.create(&draft, &token).await?;
        self.lock().collection = None;

        tracing::info!(book_id = id, "book created");
        Ok(id)
    }

    /// Submit an edit against `version`; returns the new version.
    pub async fn update(
        &self,
        id: BookId,
        version: u32,
        draft: BookDraft,
    ) -> Result<u32, SessionError> {
        let token = self.write_token()?;
        check(&draft, Mode::Update)?;
        let _submit = self.begin_submit()?;

        let new_version = self.source.update(id, version, &draft, &token).await?;

        let mut state = self.lock();
        state.collection = None;
        if let Some(record) = state.results.iter_mut().find(|r| r.id == id) {
            apply_draft(record, &draft, new_version);
        }

        tracing::info!(book_id = id, version = new_version, "book updated");
        Ok(new_version)
    }

    /// Delete remotely, then drop exactly that record from the local sets.
    /// On failure the local sets are untouched.
    pub async fn delete(&self, id: BookId) -> Result<(), SessionError> {
        let token = self.write_token()?;
        let _submit = self.begin_submit()?;

        if let Err(err) = self.source.delete(id, &token).await {
            tracing::warn!(book_id = id, error = %err, "delete failed");
            return Err(err.into());
        }

        let mut state = self.lock();
        state.results.retain(|r| r.id != id);
        if let Some(collection) = state.collection.as_mut() {
            collection.retain(|r| r.id != id);
        }
        if matches!(state.status, Status::Ready { .. }) {
            state.status = match state.results.len() {
                0 => Status::NoResults,
                count => Status::Ready { count },
            };
        }

        tracing::info!(book_id = id, "book deleted");
        Ok(())
    }

    fn write_token(&self) -> Result<String, SessionError> {
        self.auth.write_token().map_err(|_| SessionError::Forbidden)
    }

    fn begin_submit(&self) -> Result<SubmitGuard<'_>, SessionError> {
        self.submitting
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| SessionError::Busy)?;
        Ok(SubmitGuard(&self.submitting))
    }

    fn begin_detail(&self) -> DetailGuard<'_> {
        self.detail_loads.fetch_add(1, Ordering::AcqRel);
        DetailGuard(&self.detail_loads)
    }

    fn lock(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Clears the in-flight flag when the submission ends, however it ends.
struct SubmitGuard<'a>(&'a AtomicBool);

impl Drop for SubmitGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

struct DetailGuard<'a>(&'a AtomicUsize);

impl Drop for DetailGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::AcqRel);
    }
}

fn check(draft: &BookDraft, mode: Mode) -> Result<(), SessionError> {
    let errors = validate(draft, mode);
    if errors.is_empty() {
        Ok(())
    } else {
        Err(SessionError::Validation(errors))
    }
}

/// Mirror what an update sends. The title is not part of it, so the
/// visible record keeps the catalog's title.
fn apply_draft(record: &mut BookRecord, draft: &BookDraft, version: u32) {
    record.version = version;
    record.isbn = draft.isbn.trim().to_string();
    record.kind = draft.kind;
    record.rating = draft.rating;
    record.price = draft.price;
    record.discount = draft.discount;
    record.available = draft.available;
    record.release_date = draft.release_date.clone();
    record.homepage = draft.homepage.clone();
    record.tags = draft.tags.clone();
}
