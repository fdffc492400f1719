//! Form validation run before any submission reaches the catalog.

use serde::Serialize;

use super::models::BookDraft;

pub const MAX_RATING: u8 = 5;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

impl FieldError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for FieldError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Create,
    Update,
}

/// Collect every field error of `draft`; empty means submittable.
pub fn validate(draft: &BookDraft, mode: Mode) -> Vec<FieldError> {
    let mut errors = Vec::new();

    if draft.isbn.trim().is_empty() {
        errors.push(FieldError::new("isbn", "ISBN is required"));
    }
    if mode == Mode::Create && draft.title.trim().is_empty() {
        errors.push(FieldError::new("title", "title is required"));
    }
    if !draft.price.is_finite() || draft.price < 0.0 {
        errors.push(FieldError::new("price", "price must be zero or more"));
    }
    if !(0.0..=1.0).contains(&draft.discount) {
        errors.push(FieldError::new(
            "discount",
            "discount must be between 0 and 1",
        ));
    }
    if draft.rating > MAX_RATING {
        errors.push(FieldError::new("rating", "rating must be between 0 and 5"));
    }

    errors
}

/// Split a comma-separated tag list, trimming and dropping empties.
pub fn parse_tags(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|tag| !tag.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft() -> BookDraft {
        BookDraft {
            isbn: "978-3-16-148410-0".to_string(),
            title: "Alpha".to_string(),
            price: 19.99,
            discount: 0.5,
            rating: 4,
            ..BookDraft::default()
        }
    }

    #[test]
    fn valid_draft_passes() {
        assert!(validate(&draft(), Mode::Create).is_empty());
    }

    #[test]
    fn discount_outside_unit_interval_is_rejected() {
        for discount in [1.5, -0.1, f64::NAN] {
            let errors = validate(
                &BookDraft {
                    discount,
                    ..draft()
                },
                Mode::Update,
            );
            assert_eq!(errors.len(), 1, "discount {discount}");
            assert_eq!(errors[0].field, "discount");
        }
    }

    #[test]
    fn discount_bounds_are_inclusive() {
        for discount in [0.0, 1.0] {
            assert!(validate(
                &BookDraft {
                    discount,
                    ..draft()
                },
                Mode::Create
            )
            .is_empty());
        }
    }

    #[test]
    fn all_field_errors_are_reported() {
        let errors = validate(
            &BookDraft {
                isbn: " ".to_string(),
                title: String::new(),
                price: -1.0,
                rating: 6,
                ..draft()
            },
            Mode::Create,
        );
        let fields: Vec<_> = errors.iter().map(|e| e.field).collect();
        assert_eq!(fields, vec!["isbn", "title", "price", "rating"]);
    }

    #[test]
    fn title_is_only_required_on_create() {
        let untitled = BookDraft {
            title: String::new(),
            ..draft()
        };
        assert!(validate(&untitled, Mode::Update).is_empty());
    }

    #[test]
    fn tags_are_trimmed_and_empties_dropped() {
        assert_eq!(
            parse_tags(" JAVASCRIPT, ,TYPESCRIPT,, "),
            vec!["JAVASCRIPT", "TYPESCRIPT"]
        );
        assert!(parse_tags("").is_empty());
    }
}
