//! Match export helpers.

use std::fmt::Write as _;

use serde::{Deserialize, Serialize};

use crate::models::Match;

const MAPS_SEARCH_URL: &str = "https://www.google.com/maps/search/?api=1&query=";

/// Export output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExportFormat {
    Json,
    Markdown,
}

impl ExportFormat {
    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Markdown => "md",
        }
    }
}

/// Serializable match representation used in JSON and Markdown exports.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportMatch {
    pub id: String,
    pub name: String,
    pub rating: Option<f64>,
    pub user_ratings_total: Option<u32>,
    pub address: Option<String>,
    pub price: String,
    pub matched_at: i64,
    pub directions_url: String,
}

/// Google Maps search link for a match's name and address
#[must_use]
pub fn directions_url(item: &Match) -> String {
    let candidate = &item.candidate;
    let query = match candidate.address.as_deref() {
        Some(address) => format!("{} {address}", candidate.name),
        None => candidate.name.clone(),
    };
    format!("{MAPS_SEARCH_URL}{}", urlencoding::encode(&query))
}

#[must_use]
pub fn match_to_export_item(item: &Match) -> ExportMatch {
    let candidate = &item.candidate;
    ExportMatch {
        id: candidate.id.to_string(),
        name: candidate.name.clone(),
        rating: candidate.rating,
        user_ratings_total: candidate.user_ratings_total,
        address: candidate.address.clone(),
        price: candidate.price_label(),
        matched_at: item.matched_at,
        directions_url: directions_url(item),
    }
}

/// Render matches as pretty-printed JSON.
pub fn render_json_export(matches: &[Match]) -> serde_json::Result<String> {
    let items = matches
        .iter()
        .map(match_to_export_item)
        .collect::<Vec<ExportMatch>>();
    serde_json::to_string_pretty(&items)
}

/// Render matches in Markdown with frontmatter blocks.
#[must_use]
pub fn render_markdown_export(matches: &[Match]) -> String {
    let mut output = String::new();

    for (index, item) in matches.iter().enumerate() {
        if index > 0 {
            output.push('\n');
        }

        let export = match_to_export_item(item);
        let _ = writeln!(output, "---");
        let _ = writeln!(output, "id: {}", export.id);
        let _ = writeln!(output, "matched_at: {}", export.matched_at);
        if let Some(rating) = export.rating {
            let _ = writeln!(output, "rating: {rating}");
        }
        if let Some(total) = export.user_ratings_total {
            let _ = writeln!(output, "reviews: {total}");
        }
        let _ = writeln!(output, "price: {}", yaml_string(&export.price));
        if let Some(address) = &export.address {
            let _ = writeln!(output, "address: {}", yaml_string(address));
        }
        let _ = writeln!(output, "directions: {}", export.directions_url);
        let _ = writeln!(output, "---");
        let _ = writeln!(output);
        let _ = writeln!(output, "# {}", export.name);
    }

    output
}

/// Double-quoted scalar; JSON string escapes are valid YAML
fn yaml_string(value: &str) -> String {
    serde_json::Value::from(value).to_string()
}

/// Render matches based on selected export format.
pub fn render_matches_export(matches: &[Match], format: ExportFormat) -> serde_json::Result<String> {
    match format {
        ExportFormat::Json => render_json_export(matches),
        ExportFormat::Markdown => Ok(render_markdown_export(matches)),
    }
}

/// Build a deterministic default file name for export flows.
#[must_use]
pub fn suggested_export_file_name(format: ExportFormat, timestamp_ms: i64) -> String {
    format!("bitematch-matches-{timestamp_ms}.{}", format.extension())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Candidate, CandidateId, PriceLevel};

    fn sushi() -> Match {
        let mut candidate = Candidate::new(CandidateId::new("ChIJ2").unwrap(), "Sushi Zen");
        candidate.rating = Some(4.8);
        candidate.user_ratings_total = Some(85);
        candidate.address = Some("456 Maki Ave, Kyoto Dist".to_string());
        candidate.price_level = PriceLevel::new(3);
        Match {
            candidate,
            matched_at: 1_700_000_000_000,
        }
    }

    #[test]
    fn directions_url_encodes_name_and_address() {
        assert_eq!(
            directions_url(&sushi()),
            "https://www.google.com/maps/search/?api=1&query=Sushi%20Zen%20456%20Maki%20Ave%2C%20Kyoto%20Dist"
        );

        let mut bare = sushi();
        bare.candidate.address = None;
        assert!(directions_url(&bare).ends_with("query=Sushi%20Zen"));
    }

    #[test]
    fn render_markdown_export_includes_frontmatter_and_heading() {
        let rendered = render_markdown_export(&[sushi()]);
        assert!(rendered.starts_with("---\nid: ChIJ2\n"));
        assert!(rendered.contains("matched_at: 1700000000000"));
        assert!(rendered.contains("price: \"$$$\""));
        assert!(rendered.contains("address: \"456 Maki Ave, Kyoto Dist\""));
        assert!(rendered.contains("# Sushi Zen"));
    }

    #[test]
    fn render_markdown_export_quotes_addresses() {
        let mut suite = sushi();
        suite.candidate.address = Some(r#"#1 Main St: Suite "A""#.to_string());

        let rendered = render_markdown_export(&[suite]);
        assert!(rendered.contains(r##"address: "#1 Main St: Suite \"A\"""##));
    }

    #[test]
    fn render_json_export_lists_items() {
        let rendered = render_json_export(&[sushi()]).unwrap();
        let parsed: Vec<ExportMatch> = serde_json::from_str(&rendered).unwrap();
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].name, "Sushi Zen");
        assert_eq!(parsed[0].price, "$$$");
    }

    #[test]
    fn suggested_export_file_name_uses_format_extension() {
        assert_eq!(
            suggested_export_file_name(ExportFormat::Json, 123),
            "bitematch-matches-123.json"
        );
        assert_eq!(
            suggested_export_file_name(ExportFormat::Markdown, 456),
            "bitematch-matches-456.md"
        );
    }
}
