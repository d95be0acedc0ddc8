use pulldown_cmark::{html, Event, Options, Parser};
use std::fmt::Write;

use crate::report::{Report, REPORT_TITLE};

const STYLE: &str = "\
body{font-family:Helvetica,Arial,sans-serif;color:#1f1235;max-width:800px;margin:40px auto;padding:0 24px;line-height:1.5}\
h1{color:#4c1d95;border-bottom:2px solid #c4b5fd;padding-bottom:8px}\
h2{color:#5b21b6;margin-top:32px}\
.meta{color:#6b7280;font-size:0.9em}\
.tech{border:1px solid #ddd6fe;border-radius:8px;padding:16px;margin:16px 0;page-break-inside:avoid}\
.fields{font-size:0.9em;color:#4b5563}";

/// Render the report as a standalone HTML document.
pub fn render_html(report: &Report) -> String {
    let mut out = String::with_capacity(4096);
    let _ = write!(
        out,
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
         <title>{REPORT_TITLE}</title>\n<style>{STYLE}</style>\n</head>\n<body>\n\
         <h1>{REPORT_TITLE}</h1>\n<p class=\"meta\">Query: {}<br>Generated {}</p>\n",
        escape_html(&report.query),
        report.generated_at.format("%B %-d, %Y"),
    );

    out.push_str("<h2>Overview</h2>\n");
    out.push_str(&markdown_to_html(&report.overview));

    out.push_str("<h2>Selected Technologies</h2>\n");
    for section in &report.sections {
        let r = &section.result;
        out.push_str("<div class=\"tech\">\n");
        let _ = writeln!(out, "<h3>{}</h3>", escape_html(&r.title));

        out.push_str("<p class=\"fields\">");
        let fields = [
            ("Institution", &r.university),
            ("Reference", &r.number),
            ("Published", &r.published_date),
            ("Patents", &r.patents),
        ];
        for (label, value) in fields.iter().filter(|(_, v)| !v.trim().is_empty()) {
            let _ = write!(out, "<strong>{label}:</strong> {}<br>", escape_html(value));
        }
        if !r.page_url.is_empty() {
            let url = escape_html(&r.page_url);
            let _ = write!(out, "<a href=\"{url}\">{url}</a>");
        }
        out.push_str("</p>\n");

        out.push_str(&markdown_to_html(&section.summary));
        out.push_str("</div>\n");
    }

    out.push_str("</body>\n</html>\n");
    out
}

fn markdown_to_html(markdown: &str) -> String {
    // LLM output is untrusted: raw HTML is shown as text, never passed through
    let parser = Parser::new_ext(markdown, Options::ENABLE_TABLES | Options::ENABLE_STRIKETHROUGH)
        .map(|event| match event {
            Event::Html(raw) | Event::InlineHtml(raw) => Event::Text(raw),
            other => other,
        });
    let mut out = String::new();
    html::push_html(&mut out, parser);
    out
}

pub(crate) fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SearchResult;
    use crate::report::ReportSection;

    fn sample() -> Report {
        Report {
            query: "cheap <hydrogen> storage".into(),
            generated_at: "2026-01-15T09:30:00Z".parse().unwrap(),
            overview: "Two **strong** candidates.\n\n- Metal hydrides\n- MOFs".into(),
            sections: vec![ReportSection {
                result: SearchResult {
                    title: "MOF Sponge & Tank".into(),
                    university: "Northwestern".into(),
                    page_url: "https://tech.example.edu/mof".into(),
                    ..Default::default()
                },
                summary: "Stores H2 at *low* pressure.".into(),
            }],
        }
    }

    #[test]
    fn test_renders_markdown() {
        let html = render_html(&sample());
        assert!(html.contains("<strong>strong</strong>"));
        assert!(html.contains("<li>Metal hydrides</li>"));
        assert!(html.contains("<em>low</em>"));
    }

    #[test]
    fn test_escapes_record_fields() {
        let html = render_html(&sample());
        assert!(html.contains("cheap &lt;hydrogen&gt; storage"));
        assert!(html.contains("<h3>MOF Sponge &amp; Tank</h3>"));
        assert!(!html.contains("<hydrogen>"));
    }

    #[test]
    fn test_raw_html_in_summaries_is_escaped() {
        let mut report = sample();
        report.overview = "<script>alert(1)</script>\n\nSee <img src=x onerror=alert(2)> here.".into();
        report.sections[0].summary = "Works <b>well</b>.".into();

        let html = render_html(&report);
        assert!(!html.contains("<script>"));
        assert!(!html.contains("<img"));
        assert!(!html.contains("<b>well</b>"));
        assert!(html.contains("&lt;script&gt;alert(1)&lt;/script&gt;"));
        assert!(html.contains("&lt;b&gt;well&lt;/b&gt;"));
    }

    #[test]
    fn test_includes_metadata_and_date() {
        let html = render_html(&sample());
        assert!(html.contains("<strong>Institution:</strong> Northwestern"));
        assert!(!html.contains("Patents:"));
        assert!(html.contains("href=\"https://tech.example.edu/mof\""));
        assert!(html.contains("January 15, 2026"));
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html(r#"<a href="x">'&'</a>"#), "&lt;a href=&quot;x&quot;&gt;&#39;&amp;&#39;&lt;/a&gt;");
    }
}
