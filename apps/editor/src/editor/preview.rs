//! Markdown rendering of a document, matching the editor's live preview.

use crate::editor::blocks::{BlockData, Document};

/// Renders `document` in block order. Empty sections are skipped and
/// collapsed blocks still render (collapse is editor view state only).
pub fn render_document_to_md(document: &Document) -> String {
    let mut md = String::new();

    for block in document.iter() {
        match &block.data {
            BlockData::Personal(p) => {
                if !p.name.is_empty() {
                    md.push_str(&format!("# {}\n\n", p.name));
                }
                push_joined(&mut md, &[&p.email, &p.phone]);
                push_joined(&mut md, &[&p.linkedin, &p.github, &p.website]);
            }
            BlockData::Summary(s) if !s.text.is_empty() => {
                md.push_str(&format!("## Summary\n\n{}\n\n", s.text));
            }
            BlockData::Experience(list) if !list.is_empty() => {
                md.push_str("## Experience\n\n");
                for e in list {
                    let f = &e.fields;
                    push_heading(&mut md, &f.title, &f.company);
                    push_dates(&mut md, &f.start, &f.end);
                    push_line(&mut md, &f.description);
                    md.push('\n');
                }
            }
            BlockData::Education(list) if !list.is_empty() => {
                md.push_str("## Education\n\n");
                for e in list {
                    let f = &e.fields;
                    push_heading(&mut md, &f.degree, "");
                    push_line(&mut md, &f.school);
                    push_dates(&mut md, &f.start, &f.end);
                    push_line(&mut md, &f.description);
                    md.push('\n');
                }
            }
            BlockData::Projects(list) if !list.is_empty() => {
                md.push_str("## Projects\n\n");
                for e in list {
                    let f = &e.fields;
                    push_heading(&mut md, &f.name, "");
                    push_line(&mut md, &f.description);
                    if !f.technologies.is_empty() {
                        md.push_str(&format!("`{}`\n", f.technologies));
                    }
                    if !f.url.is_empty() {
                        md.push_str(&format!("<{}>\n", f.url));
                    }
                    md.push('\n');
                }
            }
            BlockData::Skills(skills) if !skills.is_empty() => {
                md.push_str(&format!("## Skills\n\n{}\n\n", skills.join(" · ")));
            }
            _ => {}
        }
    }

    md.trim_end().to_string()
}

fn push_joined(md: &mut String, parts: &[&String]) {
    let present: Vec<&str> = parts
        .iter()
        .map(|s| s.as_str())
        .filter(|s| !s.is_empty())
        .collect();
    if !present.is_empty() {
        md.push_str(&present.join(" • "));
        md.push_str("\n\n");
    }
}

fn push_heading(md: &mut String, title: &str, company: &str) {
    match (title.is_empty(), company.is_empty()) {
        (false, false) => md.push_str(&format!("### {title} @ {company}\n")),
        (false, true) => md.push_str(&format!("### {title}\n")),
        (true, false) => md.push_str(&format!("### @ {company}\n")),
        (true, true) => {}
    }
}

fn push_dates(md: &mut String, start: &str, end: &str) {
    if start.is_empty() && end.is_empty() {
        return;
    }
    let end = if end.is_empty() { "Present" } else { end };
    md.push_str(&format!("*{start} – {end}*\n"));
}

fn push_line(md: &mut String, text: &str) {
    if !text.is_empty() {
        md.push_str(text);
        md.push('\n');
    }
}
