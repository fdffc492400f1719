pub mod graphql;
pub mod models;
pub mod routes;
pub mod search;
pub mod session;
pub mod source;
pub mod validation;

#[cfg(test)]
pub(crate) mod testing;

use std::sync::Arc;

use async_trait::async_trait;
use axum::Router;
use shelf_kernel::{InitCtx, Module};

pub use models::{BookDraft, BookId, BookKind, BookRecord, Title};
pub use search::{filter, SearchCriteria};
pub use session::{CatalogSession, SessionError, Snapshot, Status};
pub use source::{BookSource, GatewayError, GraphQlCatalog};

/// Search, detail and write flows over the remote catalog.
pub struct BooksModule {
    session: Arc<CatalogSession>,
}

impl BooksModule {
    pub fn new(session: Arc<CatalogSession>) -> Self {
        Self { session }
    }
}

#[async_trait]
impl Module for BooksModule {
    fn name(&self) -> &'static str {
        "books"
    }

    async fn init(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(
            module = self.name(),
            environment = ?ctx.settings.environment,
            catalog = %ctx.settings.api.graphql_url(),
            "books module initialized"
        );
        Ok(())
    }

    fn routes(&self) -> Router {
        routes::router(self.session.clone())
    }

    fn openapi(&self) -> Option<serde_json::Value> {
        Some(serde_json::json!({
            "paths": {
                "/": {
                    "get": {
                        "summary": "Search books",
                        "description": "Filters the catalog client-side. Tags match when any listed tag is present.",
                        "tags": ["Books"],
                        "parameters": [
                            { "name": "id", "in": "query", "schema": { "type": "string" } },
                            { "name": "title", "in": "query", "schema": { "type": "string" } },
                            { "name": "rating", "in": "query", "schema": { "type": "integer", "minimum": 0, "maximum": 5 } },
                            { "name": "tags", "in": "query", "description": "Comma-separated", "schema": { "type": "string" } },
                            { "name": "category", "in": "query", "schema": { "$ref": "#/components/schemas/BookKind" } },
                            { "name": "available", "in": "query", "schema": { "type": "boolean" } }
                        ],
                        "responses": {
                            "200": {
                                "description": "Matching books",
                                "content": {
                                    "application/json": {
                                        "schema": { "type": "array", "items": { "$ref": "#/components/schemas/Book" } }
                                    }
                                }
                            },
                            "404": { "description": "No book matches (code `no_results`)" },
                            "502": { "description": "Catalog unavailable" }
                        }
                    },
                    "post": {
                        "summary": "Create a book",
                        "tags": ["Books"],
                        "requestBody": {
                            "required": true,
                            "content": { "application/json": { "schema": { "$ref": "#/components/schemas/BookDraft" } } }
                        },
                        "responses": {
                            "201": { "description": "Created" },
                            "403": { "description": "Write access required" },
                            "422": { "description": "Validation error" }
                        }
                    }
                },
                "/reset": {
                    "post": {
                        "summary": "Reset the search session",
                        "tags": ["Books"],
                        "responses": { "200": { "description": "Session snapshot" } }
                    }
                },
                "/state": {
                    "get": {
                        "summary": "Current search session",
                        "tags": ["Books"],
                        "responses": { "200": { "description": "Session snapshot with submitting and loading_detail flags" } }
                    }
                },
                "/{id}": {
                    "parameters": [
                        { "name": "id", "in": "path", "required": true, "schema": { "type": "integer" } }
                    ],
                    "get": {
                        "summary": "Book detail",
                        "tags": ["Books"],
                        "responses": {
                            "200": {
                                "description": "The book",
                                "content": { "application/json": { "schema": { "$ref": "#/components/schemas/Book" } } }
                            },
                            "404": { "description": "Unknown id" }
                        }
                    },
                    "put": {
                        "summary": "Edit a book",
                        "description": "The body carries the version last read; a stale version is a conflict.",
                        "tags": ["Books"],
                        "requestBody": {
                            "required": true,
                            "content": { "application/json": { "schema": { "$ref": "#/components/schemas/BookDraft" } } }
                        },
                        "responses": {
                            "200": { "description": "New version" },
                            "403": { "description": "Write access required" },
                            "409": { "description": "Stale version or submission in flight" },
                            "422": { "description": "Validation error" }
                        }
                    },
                    "delete": {
                        "summary": "Delete a book",
                        "tags": ["Books"],
                        "responses": {
                            "204": { "description": "Deleted" },
                            "403": { "description": "Write access required" },
                            "404": { "description": "Unknown id" }
                        }
                    }
                }
            },
            "components": {
                "schemas": {
                    "BookKind": {
                        "type": "string",
                        "enum": ["HARDCOVER", "PAPERBACK", "EBOOK", "DRUCKAUSGABE", "KINDLE"]
                    },
                    "Book": {
                        "type": "object",
                        "properties": {
                            "id": { "type": "integer" },
                            "version": { "type": "integer" },
                            "isbn": { "type": "string" },
                            "title": {
                                "type": "object",
                                "properties": {
                                    "title": { "type": "string" },
                                    "subtitle": { "type": "string" }
                                }
                            },
                            "kind": { "$ref": "#/components/schemas/BookKind" },
                            "rating": { "type": "integer" },
                            "price": { "type": "number" },
                            "discount": { "type": "number" },
                            "available": { "type": "boolean" },
                            "release_date": { "type": "string" },
                            "homepage": { "type": "string" },
                            "tags": { "type": "array", "items": { "type": "string" } }
                        },
                        "required": ["id", "isbn", "title"]
                    },
                    "BookDraft": {
                        "type": "object",
                        "properties": {
                            "version": { "type": "integer", "description": "Edit only" },
                            "isbn": { "type": "string" },
                            "title": { "type": "string" },
                            "subtitle": { "type": "string" },
                            "kind": { "$ref": "#/components/schemas/BookKind" },
                            "rating": { "type": "integer", "minimum": 0, "maximum": 5 },
                            "price": { "type": "number", "minimum": 0 },
                            "discount": { "type": "number", "minimum": 0, "maximum": 1 },
                            "available": { "type": "boolean" },
                            "release_date": { "type": "string" },
                            "homepage": { "type": "string" },
                            "tags": { "type": "array", "items": { "type": "string" } }
                        },
                        "required": ["isbn", "title"]
                    }
                }
            }
        }))
    }

    async fn start(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "books module started");
        Ok(())
    }

    async fn stop(&self) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "books module stopped");
        Ok(())
    }
}
