use anyhow::{Context, Result};
use printpdf::{
    BuiltinFont, IndirectFontRef, Mm, PdfDocument, PdfDocumentReference, PdfLayerReference,
};
use pulldown_cmark::{Event, Parser, Tag, TagEnd};

use crate::report::{Report, REPORT_TITLE};

const PAGE_WIDTH_MM: f32 = 210.0;
const PAGE_HEIGHT_MM: f32 = 297.0;
const MARGIN_MM: f32 = 20.0;
const BODY_SIZE: f32 = 10.0;
const HEADING_SIZE: f32 = 13.0;
const TITLE_SIZE: f32 = 18.0;
/// Characters per line at body size within the margins (Helvetica averages ~0.5em).
const WRAP_COLUMNS: usize = 92;
const PT_TO_MM: f32 = 0.3528;

/// Render the report to PDF bytes (A4, built-in Helvetica).
pub fn render_pdf(report: &Report) -> Result<Vec<u8>> {
    let (doc, page, layer) = PdfDocument::new(
        REPORT_TITLE,
        Mm(PAGE_WIDTH_MM),
        Mm(PAGE_HEIGHT_MM),
        "Layer 1",
    );
    let regular = doc
        .add_builtin_font(BuiltinFont::Helvetica)
        .context("Failed to load Helvetica")?;
    let bold = doc
        .add_builtin_font(BuiltinFont::HelveticaBold)
        .context("Failed to load Helvetica Bold")?;

    {
        let mut writer = PageWriter {
            doc: &doc,
            layer: doc.get_page(page).get_layer(layer),
            y: PAGE_HEIGHT_MM - MARGIN_MM,
            regular,
            bold,
        };

        writer.line(REPORT_TITLE, TITLE_SIZE, true);
        writer.gap(2.0);
        writer.paragraph(&format!("Query: {}", report.query), BODY_SIZE, false);
        writer.paragraph(
            &format!("Generated {}", report.generated_at.format("%B %-d, %Y")),
            BODY_SIZE,
            false,
        );
        writer.gap(6.0);

        writer.line("Overview", HEADING_SIZE, true);
        writer.gap(1.0);
        for para in markdown_to_lines(&report.overview) {
            writer.paragraph(&para, BODY_SIZE, false);
        }

        for section in &report.sections {
            let r = &section.result;
            writer.gap(6.0);
            writer.paragraph(&r.title, HEADING_SIZE, true);
            for (label, value) in [
                ("Institution", &r.university),
                ("Reference", &r.number),
                ("Published", &r.published_date),
                ("Patents", &r.patents),
                ("Link", &r.page_url),
            ] {
                if !value.trim().is_empty() {
                    writer.paragraph(&format!("{label}: {value}"), BODY_SIZE, false);
                }
            }
            writer.gap(2.0);
            for para in markdown_to_lines(&section.summary) {
                writer.paragraph(&para, BODY_SIZE, false);
            }
        }
    }

    doc.save_to_bytes().context("Failed to serialize PDF")
}

struct PageWriter<'a> {
    doc: &'a PdfDocumentReference,
    layer: PdfLayerReference,
    /// Baseline of the next line, measured from the bottom edge
    y: f32,
    regular: IndirectFontRef,
    bold: IndirectFontRef,
}

impl PageWriter<'_> {
    fn line(&mut self, text: &str, size: f32, bold: bool) {
        let advance = size * PT_TO_MM * 1.4;
        if self.y - advance < MARGIN_MM {
            let (page, layer) = self
                .doc
                .add_page(Mm(PAGE_WIDTH_MM), Mm(PAGE_HEIGHT_MM), "Layer 1");
            self.layer = self.doc.get_page(page).get_layer(layer);
            self.y = PAGE_HEIGHT_MM - MARGIN_MM;
        }
        self.y -= advance;
        let font = if bold { &self.bold } else { &self.regular };
        self.layer
            .use_text(to_winansi(text), size, Mm(MARGIN_MM), Mm(self.y), font);
    }

    fn paragraph(&mut self, text: &str, size: f32, bold: bool) {
        let columns = (WRAP_COLUMNS as f32 * BODY_SIZE / size) as usize;
        for line in wrap(text, columns) {
            self.line(&line, size, bold);
        }
    }

    fn gap(&mut self, mm: f32) {
        self.y -= mm;
    }
}

/// Flatten markdown into plain-text paragraphs; list items become "- " lines.
fn markdown_to_lines(markdown: &str) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for event in Parser::new(markdown) {
        match event {
            Event::Start(Tag::Item) => {
                flush(&mut current, &mut lines);
                current.push_str("- ");
            }
            Event::End(TagEnd::Paragraph | TagEnd::Item | TagEnd::Heading(_) | TagEnd::CodeBlock) => {
                flush(&mut current, &mut lines);
            }
            Event::Text(text) | Event::Code(text) => current.push_str(&text),
            Event::SoftBreak => current.push(' '),
            Event::HardBreak => flush(&mut current, &mut lines),
            _ => {}
        }
    }
    flush(&mut current, &mut lines);
    lines
}

fn flush(current: &mut String, lines: &mut Vec<String>) {
    let trimmed = current.trim();
    if !trimmed.is_empty() && trimmed != "-" {
        lines.push(trimmed.to_string());
    }
    current.clear();
}

/// Greedy word wrap; words longer than `columns` are split.
fn wrap(text: &str, columns: usize) -> Vec<String> {
    let columns = columns.max(1);
    let mut lines = Vec::new();
    let mut line = String::new();

    for word in text.split_whitespace() {
        let mut word: Vec<char> = word.chars().collect();
        while word.len() > columns {
            if !line.is_empty() {
                lines.push(std::mem::take(&mut line));
            }
            let rest = word.split_off(columns);
            lines.push(word.into_iter().collect());
            word = rest;
        }
        let line_len = line.chars().count();
        if line_len > 0 && line_len + 1 + word.len() > columns {
            lines.push(std::mem::take(&mut line));
        }
        if !line.is_empty() {
            line.push(' ');
        }
        line.extend(word);
    }
    if !line.is_empty() {
        lines.push(line);
    }
    lines
}

/// Built-in PDF fonts only cover Latin-1; fold common typography and drop the rest.
fn to_winansi(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            '\u{2018}' | '\u{2019}' => '\'',
            '\u{201C}' | '\u{201D}' => '"',
            '\u{2013}' | '\u{2014}' => '-',
            '\u{2022}' => '-',
            '\u{00A0}' => ' ',
            c if (c as u32) < 0x20 => ' ',
            c if (c as u32) <= 0xFF => c,
            _ => '?',
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SearchResult;
    use crate::report::ReportSection;

    #[test]
    fn test_wrap_respects_columns() {
        let lines = wrap("the quick brown fox jumps over the lazy dog", 10);
        assert!(lines.iter().all(|l| l.chars().count() <= 10));
        assert_eq!(lines.join(" "), "the quick brown fox jumps over the lazy dog");
    }

    #[test]
    fn test_wrap_splits_long_words() {
        let lines = wrap("abcdefghijkl xy", 5);
        assert_eq!(lines, vec!["abcde", "fghij", "kl xy"]);
    }

    #[test]
    fn test_wrap_empty() {
        assert!(wrap("   ", 10).is_empty());
    }

    #[test]
    fn test_markdown_to_lines() {
        let lines = markdown_to_lines("# Heading\n\nSome **bold** text\nacross lines.\n\n- one\n- two `code`");
        assert_eq!(
            lines,
            vec![
                "Heading",
                "Some bold text across lines.",
                "- one",
                "- two code"
            ]
        );
    }

    #[test]
    fn test_to_winansi() {
        assert_eq!(to_winansi("“Café” – 10µm 水"), "\"Café\" - 10µm ?");
    }

    #[test]
    fn test_render_pdf_produces_pdf_bytes() {
        let long_summary = "Paragraph text that goes on. ".repeat(400);
        let report = Report {
            query: "desalination membranes".into(),
            generated_at: chrono::Utc::now(),
            overview: "A **short** overview.".into(),
            sections: vec![ReportSection {
                result: SearchResult {
                    title: "Graphene Oxide Membrane".into(),
                    university: "Manchester".into(),
                    patents: "GB 123".into(),
                    ..Default::default()
                },
                summary: long_summary,
            }],
        };
        let bytes = render_pdf(&report).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
        assert!(bytes.len() > 1000);
    }
}
