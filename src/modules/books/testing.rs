//! In-memory catalog and credentials for unit tests.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use shelf_authz::{AuthError, AuthProvider, MemoryTokenStore, NoopTokenStore, TokenIssuer};

use super::models::{BookDraft, BookId, BookKind, BookRecord, Title};
use super::source::{BookSource, GatewayError};

/// Payload `{"realm_access":{"roles":["buch-admin"]}}`.
pub const ADMIN_TOKEN: &str = "h.eyJyZWFsbV9hY2Nlc3MiOnsicm9sZXMiOlsiYnVjaC1hZG1pbiJdfX0.s";

pub fn book(id: BookId, title: &str, rating: u8, tags: &[&str]) -> BookRecord {
    BookRecord {
        id,
        version: 0,
        isbn: format!("978-{id}"),
        title: Title {
            title: title.to_string(),
            subtitle: None,
        },
        kind: BookKind::Hardcover,
        rating,
        price: 10.0,
        discount: 0.0,
        available: true,
        release_date: None,
        homepage: None,
        tags: tags.iter().map(|t| t.to_string()).collect(),
    }
}

struct RefusingIssuer;

#[async_trait]
impl TokenIssuer for RefusingIssuer {
    async fn issue(&self, _username: &str, _password: &str) -> Result<String, AuthError> {
        Err(AuthError::Rejected { status: 401 })
    }
}

pub fn admin_auth() -> Arc<AuthProvider> {
    Arc::new(AuthProvider::new(
        Arc::new(RefusingIssuer),
        Arc::new(MemoryTokenStore::with_token(ADMIN_TOKEN)),
        "buch-admin",
    ))
}

pub fn reader_auth() -> Arc<AuthProvider> {
    Arc::new(AuthProvider::new(
        Arc::new(RefusingIssuer),
        Arc::new(NoopTokenStore),
        "buch-admin",
    ))
}

#[derive(Default)]
pub struct FakeSource {
    books: Mutex<Vec<BookRecord>>,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
    fetches: AtomicUsize,
    writes: AtomicUsize,
    deleted: Mutex<Vec<BookId>>,
    last_draft: Mutex<Option<BookDraft>>,
}

impl FakeSource {
    pub fn with_books(books: Vec<BookRecord>) -> Self {
        Self {
            books: Mutex::new(books),
            ..Self::default()
        }
    }

    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    pub fn deleted(&self) -> Vec<BookId> {
        self.deleted.lock().unwrap().clone()
    }

    pub fn last_draft(&self) -> Option<BookDraft> {
        self.last_draft.lock().unwrap().clone()
    }

    fn unavailable() -> GatewayError {
        GatewayError::Network {
            message: "connection refused".to_string(),
        }
    }

    fn begin_write(&self, draft: Option<&BookDraft>) -> Result<(), GatewayError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        if let Some(draft) = draft {
            *self.last_draft.lock().unwrap() = Some(draft.clone());
        }
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(Self::unavailable());
        }
        Ok(())
    }
}

#[async_trait]
impl BookSource for FakeSource {
    async fn fetch_all(&self) -> Result<Vec<BookRecord>, GatewayError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(Self::unavailable());
        }
        Ok(self.books.lock().unwrap().clone())
    }

    async fn fetch_by_id(&self, id: BookId) -> Result<BookRecord, GatewayError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(Self::unavailable());
        }
        self.books
            .lock()
            .unwrap()
            .iter()
            .find(|b| b.id == id)
            .cloned()
            .ok_or(GatewayError::NotFound { id })
    }

    async fn create(&self, draft: &BookDraft, _token: &str) -> Result<BookId, GatewayError> {
        self.begin_write(Some(draft))?;
        let mut books = self.books.lock().unwrap();
        let id = books.iter().map(|b| b.id).max().unwrap_or(0) + 1;
        let mut record = book(id, &draft.title, draft.rating, &[]);
        record.discount = draft.discount;
        record.tags = draft.tags.clone();
        books.push(record);
        Ok(id)
    }

    async fn update(
        &self,
        id: BookId,
        version: u32,
        draft: &BookDraft,
        _token: &str,
    ) -> Result<u32, GatewayError> {
        self.begin_write(Some(draft))?;
        let mut books = self.books.lock().unwrap();
        let record = books
            .iter_mut()
            .find(|b| b.id == id)
            .ok_or(GatewayError::NotFound { id })?;
        if record.version != version {
            return Err(GatewayError::Rejected {
                message: format!("version {version} is outdated"),
            });
        }
        record.version += 1;
        record.rating = draft.rating;
        Ok(record.version)
    }

    async fn delete(&self, id: BookId, _token: &str) -> Result<(), GatewayError> {
        self.begin_write(None)?;
        let mut books = self.books.lock().unwrap();
        let before = books.len();
        books.retain(|b| b.id != id);
        if books.len() == before {
            return Err(GatewayError::NotFound { id });
        }
        self.deleted.lock().unwrap().push(id);
        Ok(())
    }
}
