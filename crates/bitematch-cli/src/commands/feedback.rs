use std::str::FromStr;

use bitematch_core::content::{search_faq, search_topics, SEARCH_PLACEHOLDER};
use bitematch_core::models::{Feedback, ImprovementArea, Mood};

use crate::commands::common::CliContext;
use crate::error::CliError;

pub async fn run_feedback(
    ctx: &CliContext,
    rating: u8,
    areas: &[String],
    comment: Option<String>,
) -> Result<(), CliError> {
    let mood = Mood::try_from(rating)?;
    let areas = areas
        .iter()
        .map(|area| ImprovementArea::from_str(area))
        .collect::<Result<Vec<_>, _>>()?;
    let feedback = Feedback::new(mood, areas, comment)?;

    ctx.db.save_feedback(&feedback).await?;
    println!("{} Thanks for the feedback!", feedback.mood.symbol());
    Ok(())
}

/// Print help topics and questions matching `query`
pub fn run_help_center(query: Option<&str>) {
    for line in help_center_lines(query.unwrap_or_default()) {
        println!("{line}");
    }
}

pub fn help_center_lines(query: &str) -> Vec<String> {
    let topics = search_topics(query);
    let questions = search_faq(query);

    if topics.is_empty() && questions.is_empty() {
        return vec![format!("Nothing matches '{}'. {SEARCH_PLACEHOLDER}", query.trim())];
    }

    let mut lines = Vec::new();
    if !topics.is_empty() {
        lines.push("Topics".to_string());
        lines.extend(topics.iter().map(|topic| format!("  {}", topic.label())));
    }
    if !questions.is_empty() {
        lines.push("Frequently asked".to_string());
        lines.extend(questions.iter().map(|question| format!("  {question}")));
    }
    lines
}
