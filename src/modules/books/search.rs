//! Search criteria and the client-side filter predicate.
//!
//! Every entry point (console routes, CLI) fetches the unfiltered collection
//! and narrows it here, so one criteria set always yields one result set.

use serde::{Deserialize, Serialize};

use super::models::{BookKind, BookRecord};

/// Sparse set of optional constraints. Absent fields impose nothing; present
/// fields are ANDed, while `tags` match when ANY listed tag is present.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchCriteria {
    /// Case-insensitive substring of the record id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Case-insensitive substring of the title.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<u8>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<BookKind>,
    /// When set, only available records match; unset imposes nothing.
    #[serde(default)]
    pub available_only: bool,
}

impl SearchCriteria {
    /// Drop blank text fields and blank tags so they impose no constraint.
    pub fn normalized(mut self) -> Self {
        fn non_blank(value: Option<String>) -> Option<String> {
            value
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
        }

        self.id = non_blank(self.id);
        self.title = non_blank(self.title);
        self.tags = self
            .tags
            .into_iter()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .collect();
        self
    }

    pub fn is_empty(&self) -> bool {
        *self == SearchCriteria::default()
    }

    pub fn matches(&self, record: &BookRecord) -> bool {
        self.id
            .as_deref()
            .is_none_or(|needle| contains_ignore_case(&record.id.to_string(), needle))
            && self
                .title
                .as_deref()
                .is_none_or(|needle| contains_ignore_case(&record.title.title, needle))
            && self.rating.is_none_or(|rating| record.rating == rating)
            && (self.tags.is_empty() || self.tags.iter().any(|tag| record.has_tag(tag)))
            && self.kind.is_none_or(|kind| record.kind == kind)
            && (!self.available_only || record.available)
    }
}

/// Records satisfying every active predicate, in collection order.
pub fn filter(criteria: &SearchCriteria, records: &[BookRecord]) -> Vec<BookRecord> {
    records
        .iter()
        .filter(|record| criteria.matches(record))
        .cloned()
        .collect()
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::books::models::Title;
    use proptest::prelude::*;

    fn record(id: u64, title: &str, rating: u8, tags: &[&str]) -> BookRecord {
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

    #[test]
    fn rating_and_tag_match_is_case_insensitive() {
        let books = vec![
            record(1, "Alpha", 5, &["JavaScript"]),
            record(2, "Beta", 5, &[]),
        ];
        let criteria = SearchCriteria {
            rating: Some(5),
            tags: vec!["javascript".to_string()],
            ..SearchCriteria::default()
        };

        let found = filter(&criteria, &books);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, 1);
    }

    #[test]
    fn tags_combine_with_or() {
        let books = vec![
            record(1, "Alpha", 4, &["JAVASCRIPT"]),
            record(2, "Beta", 4, &["TYPESCRIPT"]),
            record(3, "Gamma", 4, &["RUST"]),
        ];
        let criteria = SearchCriteria {
            tags: vec!["javascript".to_string(), "typescript".to_string()],
            ..SearchCriteria::default()
        };

        let ids: Vec<_> = filter(&criteria, &books).iter().map(|b| b.id).collect();
        assert_eq!(ids, vec![1, 2]);
    }

    #[test]
    fn title_and_id_are_substring_matches() {
        let books = vec![record(12, "Das Alpha-Buch", 3, &[]), record(3, "Beta", 3, &[])];

        let by_title = SearchCriteria {
            title: Some("alpha".to_string()),
            ..SearchCriteria::default()
        };
        assert_eq!(filter(&by_title, &books)[0].id, 12);

        let by_id = SearchCriteria {
            id: Some("2".to_string()),
            ..SearchCriteria::default()
        };
        assert_eq!(filter(&by_id, &books).len(), 1);
    }

    #[test]
    fn availability_only_applies_when_set() {
        let mut unavailable = record(1, "Alpha", 2, &[]);
        unavailable.available = false;
        let books = vec![unavailable, record(2, "Beta", 2, &[])];

        assert_eq!(filter(&SearchCriteria::default(), &books).len(), 2);
        let available = SearchCriteria {
            available_only: true,
            ..SearchCriteria::default()
        };
        assert_eq!(filter(&available, &books)[0].id, 2);
    }

    #[test]
    fn category_is_exact() {
        let mut kindle = record(1, "Alpha", 2, &[]);
        kindle.kind = BookKind::Kindle;
        let books = vec![kindle, record(2, "Beta", 2, &[])];
        let criteria = SearchCriteria {
            kind: Some(BookKind::Kindle),
            ..SearchCriteria::default()
        };
        assert_eq!(filter(&criteria, &books)[0].id, 1);
        assert_eq!(filter(&criteria, &books).len(), 1);
    }

    #[test]
    fn blank_fields_normalize_away() {
        let criteria = SearchCriteria {
            id: Some("  ".to_string()),
            title: Some(String::new()),
            tags: vec![" ".to_string()],
            ..SearchCriteria::default()
        }
        .normalized();
        assert!(criteria.is_empty());
    }

    fn arb_record() -> impl Strategy<Value = BookRecord> {
        (
            0u64..200,
            "[a-cA-C]{0,6}",
            0u8..=5,
            prop::collection::vec(prop::sample::select(vec!["JavaScript", "typescript", "RUST"]), 0..3),
            prop::sample::select(BookKind::ALL.to_vec()),
            any::<bool>(),
        )
            .prop_map(|(id, title, rating, tags, kind, available)| {
                let mut r = record(id, &title, rating, &tags);
                r.kind = kind;
                r.available = available;
                r
            })
    }

    fn arb_criteria() -> impl Strategy<Value = SearchCriteria> {
        (
            prop::option::of("[0-9]{1,2}"),
            prop::option::of("[a-cA-C]{1,2}"),
            prop::option::of(0u8..=5),
            prop::collection::vec(prop::sample::select(vec!["javascript", "TYPESCRIPT", "go"]), 0..3),
            prop::option::of(prop::sample::select(BookKind::ALL.to_vec())),
            any::<bool>(),
        )
            .prop_map(|(id, title, rating, tags, kind, available_only)| SearchCriteria {
                id,
                title,
                rating,
                tags: tags.into_iter().map(str::to_string).collect(),
                kind,
                available_only,
            })
    }

    proptest! {
        #[test]
        fn result_is_exactly_the_records_passing_every_predicate(
            records in prop::collection::vec(arb_record(), 0..20),
            criteria in arb_criteria(),
        ) {
            let found = filter(&criteria, &records);
            let expected: Vec<BookRecord> = records
                .iter()
                .filter(|r| {
                    let id_ok = criteria.id.as_ref().map_or(true, |n| r.id.to_string().contains(n.as_str()));
                    let title_ok = criteria.title.as_ref().map_or(true, |n| {
                        r.title.title.to_lowercase().contains(&n.to_lowercase())
                    });
                    let rating_ok = criteria.rating.map_or(true, |x| r.rating == x);
                    let tags_ok = criteria.tags.is_empty()
                        || criteria.tags.iter().any(|t| {
                            r.tags.iter().any(|rt| rt.eq_ignore_ascii_case(t))
                        });
                    let kind_ok = criteria.kind.map_or(true, |k| r.kind == k);
                    let available_ok = !criteria.available_only || r.available;
                    id_ok && title_ok && rating_ok && tags_ok && kind_ok && available_ok
                })
                .cloned()
                .collect();
            prop_assert_eq!(found, expected);
        }

        #[test]
        fn empty_criteria_returns_everything(records in prop::collection::vec(arb_record(), 0..20)) {
            prop_assert_eq!(filter(&SearchCriteria::default(), &records), records);
        }
    }
}
