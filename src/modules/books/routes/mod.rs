//! HTTP surface of the books module, mounted under `/api/books`.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use shelf_http::error::AppError;

use super::models::{BookDraft, BookId, BookKind, BookRecord};
use super::search::SearchCriteria;
use super::session::{CatalogSession, SessionError, Snapshot};
use super::source::GatewayError;
use super::validation::{parse_tags, FieldError};

pub fn router(session: Arc<CatalogSession>) -> Router {
    Router::new()
        .route("/", get(search_books).post(create_book))
        .route("/reset", post(reset_search))
        .route("/state", get(search_state))
        .route(
            "/{id}",
            get(show_book).put(update_book).delete(delete_book),
        )
        .with_state(session)
}

/// Query string of `GET /api/books`; `tags` is comma-separated.
///
/// Every field arrives as text so that a blank value such as `rating=`
/// imposes no constraint instead of failing extraction.
#[derive(Debug, Default, Deserialize)]
pub struct SearchQuery {
    pub id: Option<String>,
    pub title: Option<String>,
    pub rating: Option<String>,
    pub tags: Option<String>,
    pub category: Option<String>,
    pub available: Option<String>,
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

impl TryFrom<SearchQuery> for SearchCriteria {
    type Error = AppError;

    fn try_from(query: SearchQuery) -> Result<Self, Self::Error> {
        let kind = non_blank(&query.category)
            .map(str::parse::<BookKind>)
            .transpose()
            .map_err(AppError::bad_request)?;
        let rating = non_blank(&query.rating)
            .map(str::parse::<u8>)
            .transpose()
            .map_err(|err| AppError::bad_request(format!("invalid rating: {err}")))?;
        let available_only = non_blank(&query.available)
            .map(str::parse::<bool>)
            .transpose()
            .map_err(|err| AppError::bad_request(format!("invalid availability: {err}")))?
            .unwrap_or(false);

        Ok(SearchCriteria {
            id: query.id,
            title: query.title,
            rating,
            tags: query.tags.as_deref().map(parse_tags).unwrap_or_default(),
            kind,
            available_only,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdateRequest {
    pub version: u32,
    #[serde(flatten)]
    pub draft: BookDraft,
}

async fn search_books(
    State(session): State<Arc<CatalogSession>>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<BookRecord>>, AppError> {
    let criteria = SearchCriteria::try_from(query)?;
    let found = session.search(criteria).await.map_err(session_error)?;
    Ok(Json(found))
}

async fn reset_search(State(session): State<Arc<CatalogSession>>) -> Json<Snapshot> {
    session.reset();
    Json(session.snapshot())
}

async fn search_state(State(session): State<Arc<CatalogSession>>) -> Json<Snapshot> {
    Json(session.snapshot())
}

async fn show_book(
    State(session): State<Arc<CatalogSession>>,
    Path(id): Path<BookId>,
) -> Result<Json<BookRecord>, AppError> {
    let record = session.find(id).await.map_err(session_error)?;
    Ok(Json(record))
}

async fn create_book(
    State(session): State<Arc<CatalogSession>>,
    Json(draft): Json<BookDraft>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let id = session.create(draft).await.map_err(session_error)?;
    Ok((StatusCode::CREATED, Json(json!({ "id": id }))))
}

async fn update_book(
    State(session): State<Arc<CatalogSession>>,
    Path(id): Path<BookId>,
    Json(request): Json<UpdateRequest>,
) -> Result<Json<Value>, AppError> {
    let version = session
        .update(id, request.version, request.draft)
        .await
        .map_err(session_error)?;
    Ok(Json(json!({ "id": id, "version": version })))
}

async fn delete_book(
    State(session): State<Arc<CatalogSession>>,
    Path(id): Path<BookId>,
) -> Result<StatusCode, AppError> {
    session.delete(id).await.map_err(session_error)?;
    Ok(StatusCode::NO_CONTENT)
}

fn session_error(err: SessionError) -> AppError {
    match err {
        SessionError::Validation(errors) => {
            let message = err_message(&errors);
            let details = errors
                .iter()
                .map(|e| json!({ "field": e.field, "error": e.message }))
                .collect();
            AppError::validation(details, message)
        }
        SessionError::Forbidden => AppError::forbidden("write access required"),
        SessionError::Busy => AppError::conflict(vec![], "another submission is still in flight"),
        SessionError::NoResults => AppError::no_results("no books match the search criteria"),
        SessionError::Gateway(err) => gateway_error(err),
    }
}

fn gateway_error(err: GatewayError) -> AppError {
    match err {
        GatewayError::NotFound { .. } => AppError::not_found(err.to_string()),
        GatewayError::Rejected { message } => {
            // Stale edits come back as a GraphQL error mentioning the version.
            if message.to_lowercase().contains("version") {
                AppError::conflict(vec![], message)
            } else {
                AppError::bad_request(message)
            }
        }
        // A client that cannot be built is our fault, not the catalog's.
        GatewayError::Client { .. } => AppError::Internal(anyhow::Error::new(err)),
        other => AppError::upstream(other.to_string()),
    }
}

fn err_message(errors: &[FieldError]) -> String {
    match errors {
        [single] => single.to_string(),
        _ => format!("{} invalid fields", errors.len()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::books::testing::{admin_auth, book, reader_auth, FakeSource};
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use tower::ServiceExt;

    fn app(source: Arc<FakeSource>, admin: bool) -> Router {
        let auth = if admin { admin_auth() } else { reader_auth() };
        router(Arc::new(CatalogSession::new(source, auth)))
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn catalog() -> Arc<FakeSource> {
        Arc::new(FakeSource::with_books(vec![
            book(1, "Alpha", 5, &["JavaScript"]),
            book(2, "Beta", 5, &[]),
            book(3, "Gamma", 2, &["TYPESCRIPT"]),
        ]))
    }

    #[tokio::test]
    async fn search_filters_by_query_string() {
        let response = app(catalog(), false)
            .oneshot(
                Request::get("/?rating=5&tags=javascript")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body.as_array().unwrap().len(), 1);
        assert_eq!(body[0]["id"], 1);
        assert_eq!(body[0]["title"]["title"], "Alpha");
    }

    #[tokio::test]
    async fn empty_search_is_reported_as_no_results() {
        let response = app(catalog(), false)
            .oneshot(Request::get("/?title=zeta").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_json(response).await["error"]["code"], "no_results");
    }

    #[tokio::test]
    async fn failed_search_is_an_upstream_error() {
        let source = catalog();
        source.fail_reads(true);
        let response = app(source, false)
            .oneshot(Request::get("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(body_json(response).await["error"]["code"], "upstream_error");
    }

    #[tokio::test]
    async fn unknown_category_is_a_bad_request() {
        let response = app(catalog(), false)
            .oneshot(
                Request::get("/?category=audiobook")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn blank_rating_and_availability_impose_nothing() {
        let response = app(catalog(), false)
            .oneshot(
                Request::get("/?title=&rating=&available=&category=")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await.as_array().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn malformed_rating_is_a_bad_request_envelope() {
        let response = app(catalog(), false)
            .oneshot(Request::get("/?rating=five").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["error"]["code"], "bad_request");
    }

    #[test]
    fn client_configuration_failure_is_internal() {
        let err = gateway_error(GatewayError::Client {
            message: "invalid endpoint".to_string(),
        });
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.code(), "internal_error");

        let err = gateway_error(GatewayError::Status { status: 503 });
        assert_eq!(err.code(), "upstream_error");
    }

    #[tokio::test]
    async fn delete_requires_write_access() {
        let source = catalog();
        let response = app(source.clone(), false)
            .oneshot(Request::delete("/1").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert_eq!(source.write_count(), 0);
    }

    #[tokio::test]
    async fn delete_with_write_access_succeeds() {
        let source = catalog();
        let response = app(source.clone(), true)
            .oneshot(Request::delete("/2").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert_eq!(source.deleted(), vec![2]);
    }

    #[tokio::test]
    async fn update_with_bad_discount_is_unprocessable() {
        let source = catalog();
        let body = json!({
            "version": 0,
            "isbn": "978-1",
            "title": "Alpha",
            "discount": 1.5
        });
        let response = app(source.clone(), true)
            .oneshot(
                Request::put("/1")
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let body = body_json(response).await;
        assert_eq!(body["error"]["details"][0]["field"], "discount");
        assert_eq!(source.write_count(), 0);
    }

    #[tokio::test]
    async fn stale_update_is_a_conflict() {
        let body = json!({ "version": 7, "isbn": "978-1", "title": "Alpha" });
        let response = app(catalog(), true)
            .oneshot(
                Request::put("/1")
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn create_returns_new_id() {
        let body = json!({ "isbn": "978-9", "title": "Delta", "discount": 0.25 });
        let response = app(catalog(), true)
            .oneshot(
                Request::post("/")
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(body_json(response).await["id"], 4);
    }

    #[tokio::test]
    async fn show_unknown_book_is_not_found() {
        let response = app(catalog(), false)
            .oneshot(Request::get("/99").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_json(response).await["error"]["code"], "not_found");
    }

    #[tokio::test]
    async fn reset_returns_idle_snapshot() {
        let response = app(catalog(), false)
            .oneshot(Request::post("/reset").body(Body::empty()).unwrap())
            .await
            .unwrap();

        let body = body_json(response).await;
        assert_eq!(body["status"]["state"], "idle");
        assert!(body["results"].as_array().unwrap().is_empty());
    }
}
