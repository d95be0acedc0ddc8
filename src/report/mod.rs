//! Report assembly: LLM summaries for the selected results, rendered to HTML or PDF.

pub mod html;
pub mod pdf;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use futures_util::future::try_join_all;
use serde::{Deserialize, Serialize};
use std::fmt::Write;

use crate::llm::prompts::{RESULT_ANALYSIS, TECHNOLOGY_SUMMARY};
use crate::llm::ChatBackend;
use crate::models::{ChatMessage, SearchResult};

pub const REPORT_TITLE: &str = "Incepta Technology Report";

#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    #[default]
    Pdf,
    Html,
}

#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub query: String,
    pub generated_at: DateTime<Utc>,
    /// Markdown overview across all selected technologies
    pub overview: String,
    pub sections: Vec<ReportSection>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReportSection {
    pub result: SearchResult,
    /// Markdown body
    pub summary: String,
}

impl Report {
    pub fn file_name(&self, format: ReportFormat) -> String {
        let ext = match format {
            ReportFormat::Pdf => "pdf",
            ReportFormat::Html => "html",
        };
        format!(
            "incepta-report-{}.{ext}",
            self.generated_at.format("%Y-%m-%d")
        )
    }
}

/// Summarize every selected result (concurrently) plus an overview of the set.
pub async fn build_report(
    chat: &dyn ChatBackend,
    query: &str,
    selected: &[SearchResult],
) -> Result<Report> {
    if selected.is_empty() {
        anyhow::bail!("No results selected");
    }

    let overview_prompt = vec![
        ChatMessage::system(RESULT_ANALYSIS),
        ChatMessage::user(format!(
            "Query: {query}\n\nResults:\n{}",
            describe_for_overview(selected)
        )),
    ];
    let section_prompts: Vec<Vec<ChatMessage>> = selected
        .iter()
        .map(|r| {
            vec![
                ChatMessage::system(TECHNOLOGY_SUMMARY),
                ChatMessage::user(describe_for_section(r)),
            ]
        })
        .collect();

    let (overview, summaries) = tokio::try_join!(
        chat.complete(&overview_prompt),
        try_join_all(section_prompts.iter().map(|p| chat.complete(p))),
    )
    .context("Failed to summarize selected results")?;

    tracing::info!("Built report with {} sections", summaries.len());

    Ok(Report {
        query: query.to_string(),
        generated_at: Utc::now(),
        overview,
        sections: selected
            .iter()
            .cloned()
            .zip(summaries)
            .map(|(result, summary)| ReportSection { result, summary })
            .collect(),
    })
}

fn describe_for_overview(results: &[SearchResult]) -> String {
    let mut out = String::new();
    for r in results {
        let _ = writeln!(
            out,
            "- title: {}\n  teaser: {}\n  score: {:.3}",
            r.title,
            r.teaser(),
            r.score
        );
    }
    out
}

fn describe_for_section(r: &SearchResult) -> String {
    let mut out = format!("Title: {}\n", r.title);
    for (label, value) in [
        ("Institution", r.university.as_str()),
        ("Reference", r.number.as_str()),
        ("Published", r.published_date.as_str()),
        ("Patents", r.patents.as_str()),
    ] {
        if !value.trim().is_empty() {
            let _ = writeln!(out, "{label}: {value}");
        }
    }
    let _ = write!(out, "Description: {}", r.description);
    if let Some(summary) = r.llm_summary.as_deref().filter(|s| !s.trim().is_empty()) {
        let _ = write!(out, "\nExisting summary: {summary}");
    }
    out
}
