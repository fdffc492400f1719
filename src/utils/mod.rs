//! Display formatting for book details (German locale conventions).

use time::macros::format_description;
use time::Date;

use crate::modules::books::{BookRecord, GatewayError};

const STAR_FILLED: &str = "★";
const STAR_EMPTY: &str = "☆";
const STAR_COUNT: u8 = 5;

/// `1234.5` → `1.234,50 €`
pub fn format_price(value: f64) -> String {
    let cents = (value * 100.0).round() as i64;
    let sign = if cents < 0 { "-" } else { "" };
    let cents = cents.unsigned_abs();

    let digits = (cents / 100).to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(ch);
    }

    format!("{sign}{grouped},{:02} €", cents % 100)
}

/// Five stars, filled up to the rating, space separated.
pub fn render_stars(rating: u8) -> String {
    (0..STAR_COUNT)
        .map(|i| if i < rating { STAR_FILLED } else { STAR_EMPTY })
        .collect::<Vec<_>>()
        .join(" ")
}

/// `0.1` → `10%`
pub fn format_discount(discount: f64) -> String {
    format!("{:.0}%", discount * 100.0)
}

/// `2022-02-01` (optionally followed by a time part) → `01.02.2022`.
pub fn format_date(value: &str) -> Option<String> {
    let day = value.get(..10)?;
    let date = Date::parse(day, format_description!("[year]-[month]-[day]")).ok()?;
    date.format(format_description!("[day].[month].[year]")).ok()
}

/// Labelled detail rows in display order.
pub fn detail_rows(record: &BookRecord) -> Vec<(&'static str, String)> {
    let mut rows = vec![
        ("ID", record.id.to_string()),
        ("Version", record.version.to_string()),
        ("Titel", record.title.title.clone()),
    ];
    if let Some(subtitle) = &record.title.subtitle {
        rows.push(("Untertitel", subtitle.clone()));
    }
    rows.extend([
        ("ISBN", record.isbn.clone()),
        ("Art", record.kind.to_string()),
        ("Bewertung", render_stars(record.rating)),
        ("Preis", format_price(record.price)),
        ("Rabatt", format_discount(record.discount)),
        (
            "Lieferbar",
            if record.available { "ja" } else { "nein" }.to_string(),
        ),
        (
            "Datum",
            record
                .release_date
                .as_deref()
                .and_then(format_date)
                .unwrap_or_else(|| "nicht verfügbar".to_string()),
        ),
        (
            "Homepage",
            record.homepage.clone().unwrap_or_else(|| "-".to_string()),
        ),
        ("Schlagwörter", record.tags.join(", ")),
    ]);
    rows
}

/// Short user-facing text for a remote failure.
pub fn describe_gateway_error(err: &GatewayError) -> String {
    match err {
        GatewayError::Network { .. } | GatewayError::Client { .. } => {
            "the catalog is unreachable, try again later".to_string()
        }
        other => other.to_string(),
    }
}
