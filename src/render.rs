//! Report presentation: text, JSON and shared escaping helpers

use crate::data::{Report, ResourceKind};
use crate::error::Result;
use crate::html;
use crate::outcome::SectionOutcome;
use chrono::{DateTime, Utc};
use regex::Regex;
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::sync::OnceLock;

/// Output format of a rendered report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Format {
    #[default]
    Text,
    Json,
    Html,
}

impl FromStr for Format {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" | "txt" | "md" => Ok(Format::Text),
            "json" => Ok(Format::Json),
            "html" => Ok(Format::Html),
            other => Err(format!("Unknown format: {}", other)),
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Format::Text => f.write_str("text"),
            Format::Json => f.write_str("json"),
            Format::Html => f.write_str("html"),
        }
    }
}

/// Presentation configuration
#[derive(Debug, Clone)]
pub struct RenderConfig {
    /// Page title for HTML output
    pub title: String,
    /// Upstream web host used for links the report has to build itself
    pub host: String,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            title: "GitHub Repository Analyzer".to_string(),
            host: crate::identifier::DEFAULT_HOST.to_string(),
        }
    }
}

/// Render a report in the requested format
pub fn render(report: &Report, format: Format, config: &RenderConfig) -> Result<String> {
    match format {
        Format::Text => Ok(render_text(report)),
        Format::Json => render_json(report),
        Format::Html => html::render_html(report, config),
    }
}

/// Render and write a report to `path`
pub fn write_report(report: &Report, format: Format, config: &RenderConfig, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    std::fs::write(path, render(report, format, config)?)?;
    Ok(())
}

/// Escape text for safe inclusion in HTML markup
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Release notes as HTML: escaped, markdown links turned into anchors and
/// newlines into `<br>`
pub fn release_notes_html(body: &str) -> Result<String> {
    let escaped = escape_html(body);
    let linked = link_pattern()?.replace_all(&escaped, r#"<a href="$2" target="_blank">$1</a>"#);
    Ok(linked.replace("\r\n", "\n").replace('\n', "<br>"))
}

/// Markdown link pattern, compiled once. Only http(s) targets match.
fn link_pattern() -> Result<&'static Regex> {
    static LINK: OnceLock<Regex> = OnceLock::new();
    if let Some(link) = LINK.get() {
        return Ok(link);
    }
    let link = Regex::new(r"\[([^\]\n]+)\]\((https?://[^)\s]+)\)")?;
    Ok(LINK.get_or_init(|| link))
}

/// Timestamp as shown in reports
pub fn format_date(date: &DateTime<Utc>) -> String {
    date.format("%Y-%m-%d %H:%M UTC").to_string()
}

/// Week start (epoch seconds) as a calendar date
pub fn format_week(week_start: i64) -> String {
    DateTime::<Utc>::from_timestamp(week_start, 0)
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| week_start.to_string())
}

/// Serialize the report as pretty JSON
pub fn render_json(report: &Report) -> Result<String> {
    Ok(serde_json::to_string_pretty(report)?)
}

/// Render the report as a markdown-like text document
pub fn render_text(report: &Report) -> String {
    let mut output = String::new();

    output.push_str(&format!("# {}\n\n", report.repository));
    output.push_str(&format!("Generated: {}\n", format_date(&report.generated_at)));

    section(&mut output, ResourceKind::Details, &report.details, |out, d| {
        out.push_str(&format!("- Name: {}\n", d.name));
        out.push_str(&format!("- Description: {}\n", d.description.as_deref().unwrap_or("N/A")));
        out.push_str(&format!("- Stars: {}\n", d.stars));
        out.push_str(&format!("- Forks: {}\n", d.forks));
        out.push_str(&format!("- Open Issues: {}\n", d.open_issues));
        out.push_str(&format!("- Language: {}\n", d.language.as_deref().unwrap_or("N/A")));
        out.push_str(&format!("- Owner: {} ({})\n", d.owner.login, d.owner.profile_url));
        if let Some(created) = &d.created_at {
            out.push_str(&format!("- Created: {}\n", format_date(created)));
        }
        if let Some(pushed) = &d.last_push {
            out.push_str(&format!("- Last Push: {}\n", format_date(pushed)));
        }
        out.push_str(&format!("- URL: {}\n", d.url));
    });

    section(&mut output, ResourceKind::Commits, &report.commits, |out, commits| {
        for c in commits {
            out.push_str(&format!(
                "- `{}` {} ({}, {})\n",
                c.short_sha(),
                c.message,
                c.author_name,
                format_date(&c.date)
            ));
        }
    });

    section(&mut output, ResourceKind::Contributors, &report.contributors, |out, contributors| {
        for c in contributors {
            out.push_str(&format!("- {} ({} contributions)\n", c.login, c.contributions));
        }
    });

    section(&mut output, ResourceKind::Languages, &report.languages, |out, shares| {
        out.push_str("| Language | Bytes | Share |\n");
        out.push_str("|----------|-------|-------|\n");
        for s in shares {
            out.push_str(&format!("| {} | {} | {:.2}% |\n", s.language, s.bytes, s.percentage));
        }
    });

    section(&mut output, ResourceKind::Issues, &report.issues, |out, issues| {
        for i in issues {
            out.push_str(&format!("- #{} {} (by {})\n", i.number, i.title, i.author));
        }
    });

    section(&mut output, ResourceKind::Release, &report.release, |out, r| {
        let name = r.name.as_deref().unwrap_or(&r.tag_name);
        out.push_str(&format!("- {} ({})\n", name, r.tag_name));
        match &r.published_at {
            Some(published) => out.push_str(&format!("- Published: {}\n", format_date(published))),
            None => out.push_str("- Published: N/A\n"),
        }
        out.push_str(&format!("- URL: {}\n", r.url));
        if !r.body.trim().is_empty() {
            out.push('\n');
            for line in r.body.lines() {
                out.push_str(&format!("    {}\n", line));
            }
        }
    });

    section(&mut output, ResourceKind::Frequency, &report.frequency, |out, weeks| {
        out.push_str("| Week | Commits |\n");
        out.push_str("|------|---------|\n");
        for w in weeks {
            out.push_str(&format!("| {} | {} |\n", format_week(w.week_start), w.total_commits));
        }
    });

    output
}

fn section<T>(
    output: &mut String,
    kind: ResourceKind,
    outcome: &SectionOutcome<T>,
    content: impl FnOnce(&mut String, &T),
) {
    output.push_str(&format!("\n## {}\n\n", kind.title()));
    match outcome {
        SectionOutcome::Ok(value) => content(output, value),
        SectionOutcome::Empty => output.push_str(&format!("_{}_\n", kind.empty_message())),
        SectionOutcome::Pending(message) => output.push_str(&format!("Pending: {}\n", message)),
        SectionOutcome::Error(reason) => output.push_str(&format!("Error: {}\n", reason)),
    }
}
