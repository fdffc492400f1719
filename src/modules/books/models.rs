use serde::{Deserialize, Deserializer, Serialize};

pub type BookId = u64;

/// Edition of a book, as the remote catalog names it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookKind {
    #[default]
    Hardcover,
    Paperback,
    Ebook,
    /// Print edition
    #[serde(rename = "DRUCKAUSGABE")]
    Print,
    Kindle,
}

impl BookKind {
    pub const ALL: [BookKind; 5] = [
        BookKind::Hardcover,
        BookKind::Paperback,
        BookKind::Ebook,
        BookKind::Print,
        BookKind::Kindle,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BookKind::Hardcover => "HARDCOVER",
            BookKind::Paperback => "PAPERBACK",
            BookKind::Ebook => "EBOOK",
            BookKind::Print => "DRUCKAUSGABE",
            BookKind::Kindle => "KINDLE",
        }
    }
}

impl std::fmt::Display for BookKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for BookKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        BookKind::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| {
                format!(
                    "unknown category '{}'; expected one of HARDCOVER, PAPERBACK, EBOOK, DRUCKAUSGABE, KINDLE",
                    s
                )
            })
    }
}

/// Title and optional subtitle.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Title {
    #[serde(rename(deserialize = "titel"))]
    pub title: String,
    #[serde(
        rename(deserialize = "untertitel"),
        default,
        deserialize_with = "subtitle",
        skip_serializing_if = "Option::is_none"
    )]
    pub subtitle: Option<String>,
}

/// A book as returned by the remote catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookRecord {
    #[serde(deserialize_with = "lenient::id")]
    pub id: BookId,
    #[serde(default, deserialize_with = "lenient::u32_or_zero")]
    pub version: u32,
    #[serde(default)]
    pub isbn: String,
    #[serde(rename(deserialize = "titel"), default)]
    pub title: Title,
    #[serde(rename(deserialize = "art"), default)]
    pub kind: BookKind,
    #[serde(default, deserialize_with = "lenient::u8_or_zero")]
    pub rating: u8,
    #[serde(
        rename(deserialize = "preis"),
        default,
        deserialize_with = "lenient::f64_or_zero"
    )]
    pub price: f64,
    #[serde(
        rename(deserialize = "rabatt"),
        default,
        deserialize_with = "lenient::f64_or_zero"
    )]
    pub discount: f64,
    #[serde(rename(deserialize = "lieferbar"), default)]
    pub available: bool,
    #[serde(rename(deserialize = "datum"), default)]
    pub release_date: Option<String>,
    #[serde(default)]
    pub homepage: Option<String>,
    #[serde(
        rename(deserialize = "schlagwoerter"),
        default,
        deserialize_with = "lenient::tags"
    )]
    pub tags: Vec<String>,
}

impl BookRecord {
    /// Case-insensitive tag membership.
    pub fn has_tag(&self, tag: &str) -> bool {
        let wanted = tag.to_lowercase();
        self.tags.iter().any(|t| t.to_lowercase() == wanted)
    }
}

/// Form input shared by the create and edit flows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookDraft {
    pub isbn: String,
    pub title: String,
    #[serde(default)]
    pub subtitle: Option<String>,
    #[serde(default)]
    pub kind: BookKind,
    #[serde(default)]
    pub rating: u8,
    #[serde(default)]
    pub price: f64,
    #[serde(default)]
    pub discount: f64,
    #[serde(default)]
    pub available: bool,
    #[serde(default)]
    pub release_date: Option<String>,
    #[serde(default)]
    pub homepage: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl Default for BookDraft {
    fn default() -> Self {
        Self {
            isbn: String::new(),
            title: String::new(),
            subtitle: None,
            kind: BookKind::Hardcover,
            rating: 1,
            price: 0.0,
            discount: 0.0,
            available: false,
            release_date: None,
            homepage: None,
            tags: Vec::new(),
        }
    }
}

impl From<&BookRecord> for BookDraft {
    fn from(record: &BookRecord) -> Self {
        Self {
            isbn: record.isbn.clone(),
            title: record.title.title.clone(),
            subtitle: record.title.subtitle.clone(),
            kind: record.kind,
            rating: record.rating,
            price: record.price,
            discount: record.discount,
            available: record.available,
            release_date: record.release_date.clone(),
            homepage: record.homepage.clone(),
            tags: record.tags.clone(),
        }
    }
}

/// Wire input of the `create` mutation.
#[derive(Debug, Clone, Serialize)]
pub struct CreateInput<'a> {
    pub isbn: &'a str,
    pub rating: u8,
    pub art: BookKind,
    pub preis: f64,
    pub rabatt: f64,
    pub lieferbar: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub datum: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub homepage: Option<&'a str>,
    pub schlagwoerter: &'a [String],
    pub titel: TitleInput<'a>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TitleInput<'a> {
    pub titel: &'a str,
    pub untertitel: &'a str,
}

/// Wire input of the `update` mutation; `version` is the optimistic-lock token.
#[derive(Debug, Clone, Serialize)]
pub struct UpdateInput<'a> {
    pub id: String,
    pub version: u32,
    pub isbn: &'a str,
    pub rating: u8,
    pub art: BookKind,
    pub preis: f64,
    pub rabatt: f64,
    pub lieferbar: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub datum: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub homepage: Option<&'a str>,
    pub schlagwoerter: &'a [String],
}

impl BookDraft {
    pub fn create_input(&self) -> CreateInput<'_> {
        CreateInput {
            isbn: self.isbn.trim(),
            rating: self.rating,
            art: self.kind,
            preis: self.price,
            rabatt: self.discount,
            lieferbar: self.available,
            datum: self.release_date.as_deref(),
            homepage: self.homepage.as_deref(),
            schlagwoerter: &self.tags,
            titel: TitleInput {
                titel: self.title.trim(),
                untertitel: self.subtitle.as_deref().unwrap_or_default(),
            },
        }
    }

    pub fn update_input(&self, id: BookId, version: u32) -> UpdateInput<'_> {
        UpdateInput {
            id: id.to_string(),
            version,
            isbn: self.isbn.trim(),
            rating: self.rating,
            art: self.kind,
            preis: self.price,
            rabatt: self.discount,
            lieferbar: self.available,
            datum: self.release_date.as_deref(),
            homepage: self.homepage.as_deref(),
            schlagwoerter: &self.tags,
        }
    }
}

/// The catalog stores a missing subtitle as empty or as the string "null".
fn subtitle<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.filter(|s| !s.trim().is_empty() && s != "null"))
}

/// Decoders accepting JSON numbers or numeric strings; GraphQL IDs and
/// decimals arrive as strings.
pub(crate) mod lenient {
    use serde::de::Error;
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    fn number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Value::deserialize(deserializer)? {
            Value::Null => Ok(None),
            Value::Number(n) => Ok(n.as_f64()),
            Value::String(s) if s.trim().is_empty() => Ok(None),
            Value::String(s) => s
                .trim()
                .parse::<f64>()
                .map(Some)
                .map_err(|_| D::Error::custom(format!("expected a number, got '{}'", s))),
            other => Err(D::Error::custom(format!("expected a number, got {}", other))),
        }
    }

    pub fn id<'de, D>(deserializer: D) -> Result<u64, D::Error>
    where
        D: Deserializer<'de>,
    {
        match number(deserializer)? {
            Some(n) if n >= 0.0 && n.fract() == 0.0 => Ok(n as u64),
            Some(n) => Err(D::Error::custom(format!("invalid id {}", n))),
            None => Err(D::Error::custom("missing id")),
        }
    }

    pub fn u32_or_zero<'de, D>(deserializer: D) -> Result<u32, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(number(deserializer)?.map_or(0, |n| n.clamp(0.0, u32::MAX as f64) as u32))
    }

    pub fn u8_or_zero<'de, D>(deserializer: D) -> Result<u8, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(number(deserializer)?.map_or(0, |n| n.clamp(0.0, u8::MAX as f64) as u8))
    }

    pub fn f64_or_zero<'de, D>(deserializer: D) -> Result<f64, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(number(deserializer)?.unwrap_or(0.0))
    }

    pub fn tags<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(Option::<Vec<String>>::deserialize(deserializer)?.unwrap_or_default())
    }
}
