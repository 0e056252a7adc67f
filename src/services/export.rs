use chrono::NaiveDate;

use crate::services::pricing::{Quote, ServiceDefinition};
use crate::services::sheet::{build_quote_row, row_width, QuoteRowContext};

/// Column headers mirroring the sink row layout, plus a trailing details
/// column with the human-readable itemization.
pub fn csv_header(catalog: &[ServiceDefinition]) -> Vec<String> {
    let mut header = Vec::with_capacity(row_width(catalog) + 1);
    header.extend([
        "Author".to_string(),
        "Channel".to_string(),
        "Quote Date".to_string(),
        "Client".to_string(),
        "Check-In".to_string(),
        "Check-Out".to_string(),
        "Nights".to_string(),
        "Guests".to_string(),
        "Rental".to_string(),
        "Avg Nightly".to_string(),
        "Cleaning".to_string(),
    ]);
    for definition in catalog {
        header.push(format!("{} Unit Price", definition.name));
        header.push(format!("{} Pax", definition.name));
        header.push(format!("{} Qty", definition.name));
        header.push(format!("{} Subtotal", definition.name));
    }
    header.push("Manual Discount".to_string());
    header.push("Total".to_string());
    header.push("Notes".to_string());
    header.push("Details".to_string());
    header
}

/// Render one quote as a two-line CSV document (header + row).
pub fn quote_csv_document(
    context: &QuoteRowContext<'_>,
    quote: &Quote,
    catalog: &[ServiceDefinition],
) -> String {
    let mut row = build_quote_row(context, quote, catalog);
    row.push(quote.summary_lines.join(" | "));

    let header_line = join_csv(&csv_header(catalog));
    let row_line = join_csv(&row);
    format!("{header_line}\r\n{row_line}\r\n")
}

/// Attachment filename derived from the client name and quote date, safe
/// for Content-Disposition.
pub fn export_filename(client_name: &str, quote_date: NaiveDate) -> String {
    let slug: String = client_name
        .trim()
        .chars()
        .map(|character| {
            if character.is_ascii_alphanumeric() {
                character
            } else {
                '_'
            }
        })
        .collect();
    let slug = if slug.is_empty() {
        "quote".to_string()
    } else {
        slug
    };
    format!("quote_{}_{}.csv", slug, quote_date.format("%Y-%m-%d"))
}

fn join_csv(fields: &[String]) -> String {
    fields
        .iter()
        .map(|field| escape_csv_field(field))
        .collect::<Vec<_>>()
        .join(",")
}

fn escape_csv_field(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}
