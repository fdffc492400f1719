//! GraphQL documents and envelopes of the remote catalog.

use serde::{Deserialize, Serialize};

use super::models::{BookId, BookRecord};

pub const ALL_BOOKS: &str = r#"
query Buecher {
  buecher {
    id version isbn rating art preis rabatt lieferbar datum homepage schlagwoerter
    titel { titel untertitel }
  }
}"#;

pub const BOOK_BY_ID: &str = r#"
query Buch($id: ID!) {
  buch(id: $id) {
    id version isbn rating art preis rabatt lieferbar datum homepage schlagwoerter
    titel { titel untertitel }
  }
}"#;

pub const CREATE_BOOK: &str = r#"
mutation Create($input: BuchInput!) {
  create(input: $input) { id }
}"#;

pub const UPDATE_BOOK: &str = r#"
mutation Update($input: BuchUpdateInput!) {
  update(input: $input) { version }
}"#;

pub const DELETE_BOOK: &str = r#"
mutation Delete($id: ID!) {
  delete(id: $id)
}"#;

#[derive(Debug, Serialize)]
pub struct Request<'a> {
    pub query: &'a str,
    pub variables: serde_json::Value,
}

#[derive(Debug, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct Response<T> {
    #[serde(default)]
    pub data: Option<T>,
    #[serde(default)]
    pub errors: Vec<ErrorEntry>,
}

#[derive(Debug, Deserialize)]
pub struct ErrorEntry {
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct AllBooks {
    #[serde(default)]
    pub buecher: Vec<BookRecord>,
}

#[derive(Debug, Deserialize)]
pub struct OneBook {
    pub buch: Option<BookRecord>,
}

#[derive(Debug, Deserialize)]
pub struct Created {
    pub create: CreatedId,
}

#[derive(Debug, Deserialize)]
pub struct CreatedId {
    #[serde(deserialize_with = "super::models::lenient::id")]
    pub id: BookId,
}

#[derive(Debug, Deserialize)]
pub struct Updated {
    pub update: UpdatedVersion,
}

#[derive(Debug, Deserialize)]
pub struct UpdatedVersion {
    #[serde(deserialize_with = "super::models::lenient::u32_or_zero")]
    pub version: u32,
}

#[derive(Debug, Deserialize)]
pub struct Deleted {
    pub delete: bool,
}
