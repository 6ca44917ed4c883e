//! Standalone HTML report page

use crate::data::{Report, ResourceKind};
use crate::error::Result;
use crate::outcome::SectionOutcome;
use crate::render::{escape_html, format_date, format_week, release_notes_html, RenderConfig};
use chrono::{DateTime, Utc};
use minijinja::{context, AutoEscape, Environment, Value};
use std::collections::BTreeMap;

/// HTML template for the repository report
const REPORT_TEMPLATE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{{ title|esc }} - {{ repo|esc }}</title>
    <style>
        :root {
            --bg-primary: #0d1117;
            --bg-secondary: #161b22;
            --bg-tertiary: #21262d;
            --text-primary: #c9d1d9;
            --text-secondary: #8b949e;
            --text-muted: #6e7681;
            --border-color: #30363d;
            --accent-blue: #58a6ff;
            --accent-green: #3fb950;
            --accent-red: #f85149;
            --accent-orange: #d29922;
        }

        * {
            margin: 0;
            padding: 0;
            box-sizing: border-box;
        }

        body {
            font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', 'Noto Sans', Helvetica, Arial, sans-serif;
            background: var(--bg-primary);
            color: var(--text-primary);
            line-height: 1.6;
        }

        .container {
            max-width: 1100px;
            margin: 0 auto;
            padding: 2rem;
        }

        header {
            text-align: center;
            margin-bottom: 2rem;
            padding: 2rem;
            background: var(--bg-secondary);
            border-radius: 16px;
            border: 1px solid var(--border-color);
        }

        .subtitle, .generated {
            color: var(--text-secondary);
        }

        a {
            color: var(--accent-blue);
            text-decoration: none;
        }

        a:hover {
            text-decoration: underline;
        }

        .section {
            background: var(--bg-secondary);
            border: 1px solid var(--border-color);
            border-radius: 12px;
            margin-bottom: 1.5rem;
            padding: 1.25rem 1.5rem;
        }

        .section h2 {
            font-size: 1.2rem;
            margin-bottom: 0.75rem;
        }

        .section li {
            list-style: none;
            padding: 0.4rem 0;
            border-top: 1px solid var(--border-color);
        }

        .sha {
            font-family: 'SF Mono', 'Fira Code', monospace;
            color: var(--accent-orange);
        }

        .muted, .placeholder {
            color: var(--text-muted);
        }

        .pending {
            color: var(--accent-orange);
        }

        .error {
            color: var(--accent-red);
        }

        .bar {
            display: inline-block;
            height: 0.8rem;
            background: var(--accent-green);
            border-radius: 3px;
            vertical-align: middle;
        }

        .avatar {
            width: 24px;
            height: 24px;
            border-radius: 50%;
            vertical-align: middle;
            margin-right: 0.5rem;
        }

        .release-notes {
            margin-top: 0.75rem;
            padding: 0.75rem;
            background: var(--bg-tertiary);
            border-radius: 8px;
        }
    </style>
</head>
<body>
{% macro placeholder(section, empty_message) %}
    {% if section.state == "empty" %}<p class="placeholder">{{ empty_message|esc }}</p>
    {% elif section.state == "pending" %}<p class="pending">{{ section.value|esc }}</p>
    {% elif section.state == "error" %}<p class="error">Error: {{ section.value|esc }}</p>
    {% endif %}
{% endmacro %}
    <div class="container">
        <header>
            <h1>{{ title|esc }}</h1>
            <p class="subtitle"><a href="{{ repo_url|esc }}" target="_blank">{{ repo|esc }}</a></p>
            <p class="generated">Generated {{ generated|esc }}</p>
        </header>

        <div class="section" id="details">
            <h2>{{ titles.details|esc }}</h2>
            {% if report.details.state == "ok" %}{% set d = report.details.value %}
            <p><strong>Name:</strong> <a href="{{ d.url|esc }}" target="_blank">{{ d.name|esc }}</a></p>
            <p><strong>Description:</strong> {{ d.description|esc or "N/A" }}</p>
            <p><strong>Stars:</strong> {{ d.stars }}</p>
            <p><strong>Forks:</strong> {{ d.forks }}</p>
            <p><strong>Open Issues:</strong> {{ d.open_issues }}</p>
            <p><strong>Language:</strong> {{ d.language|esc or "N/A" }}</p>
            <p><strong>Owner:</strong> <a href="{{ d.owner.profile_url|esc }}" target="_blank">{{ d.owner.login|esc }}</a></p>
            {% if d.created_at %}<p><strong>Created:</strong> {{ d.created_at|date }}</p>{% endif %}
            {% if d.last_push %}<p><strong>Last Push:</strong> {{ d.last_push|date }}</p>{% endif %}
            {% else %}{{ placeholder(report.details, empty.details) }}{% endif %}
        </div>

        <div class="section" id="commits">
            <h2>{{ titles.commits|esc }}</h2>
            {% if report.commits.state == "ok" %}
            <ul>
                {% for commit in report.commits.value %}
                <li>
                    <span class="sha">{{ commit.sha[:7]|esc }}</span> {{ commit.message|esc }}
                    <div class="muted">
                        {% if commit.author_profile_url %}<a href="{{ commit.author_profile_url|esc }}" target="_blank">{{ commit.author_name|esc }}</a>{% else %}{{ commit.author_name|esc }}{% endif %}
                        on {{ commit.date|date }}
                    </div>
                </li>
                {% endfor %}
            </ul>
            {% else %}{{ placeholder(report.commits, empty.commits) }}{% endif %}
        </div>

        <div class="section" id="contributors">
            <h2>{{ titles.contributors|esc }}</h2>
            {% if report.contributors.state == "ok" %}
            <ul>
                {% for c in report.contributors.value %}
                <li>
                    <img class="avatar" src="{{ c.avatar_url|esc }}" alt="">
                    <a href="{{ c.profile_url|esc }}" target="_blank">{{ c.login|esc }}</a>
                    <span class="muted">{{ c.contributions }} contributions</span>
                </li>
                {% endfor %}
            </ul>
            {% else %}{{ placeholder(report.contributors, empty.contributors) }}{% endif %}
        </div>

        <div class="section" id="languages">
            <h2>{{ titles.languages|esc }}</h2>
            {% if report.languages.state == "ok" %}
            <ul>
                {% for share in report.languages.value %}
                <li>
                    {{ share.language|esc }} <span class="muted">{{ share.percentage }}%</span>
                    <span class="bar" style="width: {{ share.percentage }}%"></span>
                </li>
                {% endfor %}
            </ul>
            {% else %}{{ placeholder(report.languages, empty.languages) }}{% endif %}
        </div>

        <div class="section" id="issues">
            <h2>{{ titles.issues|esc }}</h2>
            {% if report.issues.state == "ok" %}
            <ul>
                {% for issue in report.issues.value %}
                <li>
                    <a href="{{ issue.url|esc }}" target="_blank">#{{ issue.number }} {{ issue.title|esc }}</a>
                    <span class="muted">by {{ issue.author|esc }}{% if issue.created_at %} on {{ issue.created_at|date }}{% endif %}</span>
                </li>
                {% endfor %}
            </ul>
            {% else %}{{ placeholder(report.issues, empty.issues) }}{% endif %}
        </div>

        <div class="section" id="release">
            <h2>{{ titles.release|esc }}</h2>
            {% if report.release.state == "ok" %}{% set r = report.release.value %}
            <p><a href="{{ r.url|esc }}" target="_blank">{{ (r.name or r.tag_name)|esc }}</a> <span class="sha">{{ r.tag_name|esc }}</span></p>
            <p class="muted">Published: {% if r.published_at %}{{ r.published_at|date }}{% else %}N/A{% endif %}</p>
            {% if release_notes %}<div class="release-notes">{{ release_notes }}</div>{% endif %}
            {% else %}{{ placeholder(report.release, empty.release) }}{% endif %}
        </div>

        <div class="section" id="frequency">
            <h2>{{ titles.frequency|esc }}</h2>
            {% if report.frequency.state == "ok" %}
            <ul>
                {% for week in weeks %}
                <li>
                    {{ week.label|esc }} <span class="muted">{{ week.commits }} commits</span>
                    <span class="bar" style="width: {{ week.width }}%"></span>
                </li>
                {% endfor %}
            </ul>
            {% else %}{{ placeholder(report.frequency, empty.frequency) }}{% endif %}
        </div>
    </div>
</body>
</html>
"#;

/// Frequency bar for template rendering
#[derive(Debug, Clone, serde::Serialize)]
struct WeekBar {
    label: String,
    commits: u64,
    /// Bar width relative to the busiest week
    width: u64,
}

/// `esc` filter: escape any value, rendering none/undefined as empty
fn esc(value: Value) -> String {
    if value.is_none() || value.is_undefined() {
        return String::new();
    }
    escape_html(&value.to_string())
}

/// `date` filter: RFC 3339 timestamp to report format
fn date(value: String) -> String {
    match DateTime::parse_from_rfc3339(&value) {
        Ok(parsed) => format_date(&parsed.with_timezone(&Utc)),
        Err(_) => escape_html(&value),
    }
}

fn week_bars(report: &Report) -> Vec<WeekBar> {
    let Some(weeks) = report.frequency.as_ok() else {
        return Vec::new();
    };
    let busiest = weeks.iter().map(|w| w.total_commits).max().unwrap_or(0).max(1);
    weeks
        .iter()
        .map(|w| WeekBar {
            label: format_week(w.week_start),
            commits: w.total_commits,
            // Never exceeds 100 since busiest is the maximum
            width: (u128::from(w.total_commits) * 100 / u128::from(busiest)) as u64,
        })
        .collect()
}

/// Render the report as a standalone HTML page
pub fn render_html(report: &Report, config: &RenderConfig) -> Result<String> {
    let mut env = Environment::new();
    // Every text field goes through `esc` instead
    env.set_auto_escape_callback(|_| AutoEscape::None);
    env.add_filter("esc", esc);
    env.add_filter("date", date);
    env.add_template("report", REPORT_TEMPLATE)?;

    let template = env.get_template("report")?;

    let titles: BTreeMap<String, &str> = ResourceKind::ALL
        .iter()
        .map(|k| (k.to_string(), k.title()))
        .collect();
    let empty: BTreeMap<String, &str> = ResourceKind::ALL
        .iter()
        .map(|k| (k.to_string(), k.empty_message()))
        .collect();

    let release_notes = match &report.release {
        SectionOutcome::Ok(release) if !release.body.trim().is_empty() => {
            Some(release_notes_html(&release.body)?)
        }
        _ => None,
    };

    let html = template.render(context! {
        title => &config.title,
        repo => report.repository.to_string(),
        repo_url => report.repository.html_url(&config.host),
        generated => format_date(&report.generated_at),
        report => report,
        titles => titles,
        empty => empty,
        release_notes => release_notes,
        weeks => week_bars(report),
    })?;

    Ok(html)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::CommitFrequencyBucket;
    use crate::render::tests::sample_report;

    #[test]
    fn test_render_html_degraded_report() {
        let html = render_html(&sample_report(), &RenderConfig::default()).unwrap();

        assert!(html.contains("GitHub Repository Analyzer"));
        assert!(html.contains(r#"href="https://github.com/octocat/Hello-World""#));
        assert!(html.contains("<strong>Description:</strong> N/A"));
        assert!(html.contains("<strong>Language:</strong> N/A"));
        assert!(html.contains("6dcb09b"));
        assert!(html.contains("No contributor data found."));
        assert!(html.contains("Error: HTTP error: 500"));
        assert!(html.contains("still being calculated"));
        assert!(html.contains("2011-04-14 16:00 UTC"));
    }

    #[test]
    fn test_render_html_escapes_text() {
        let html = render_html(&sample_report(), &RenderConfig::default()).unwrap();

        assert!(html.contains("Fix &lt;script&gt; handling"));
        assert!(!html.contains("<script>"));
    }

    #[test]
    fn test_render_html_release_notes() {
        let html = render_html(&sample_report(), &RenderConfig::default()).unwrap();

        assert!(html.contains(
            r#"First release<br>See <a href="https://example.com/docs" target="_blank">docs</a>"#
        ));
        assert!(html.contains("Published: N/A"));
    }

    #[test]
    fn test_render_html_frequency_bars() {
        let mut report = sample_report();
        report.frequency = SectionOutcome::Ok(vec![
            CommitFrequencyBucket {
                week_start: 1_336_280_400,
                total_commits: 2,
            },
            CommitFrequencyBucket {
                week_start: 1_336_885_200,
                total_commits: 8,
            },
        ]);

        let html = render_html(&report, &RenderConfig::default()).unwrap();
        assert!(html.contains("2012-05-06"));
        assert!(html.contains("width: 25%"));
        assert!(html.contains("width: 100%"));
    }

    #[test]
    fn test_frequency_bars_with_huge_counts() {
        let mut report = sample_report();
        report.frequency = SectionOutcome::Ok(vec![
            CommitFrequencyBucket {
                week_start: 1_336_280_400,
                total_commits: u64::MAX,
            },
            CommitFrequencyBucket {
                week_start: 1_336_885_200,
                total_commits: u64::MAX / 2,
            },
        ]);

        let widths: Vec<u64> = week_bars(&report).iter().map(|w| w.width).collect();
        assert_eq!(widths, vec![100, 49]);
    }

    #[test]
    fn test_esc_filter_handles_none() {
        assert_eq!(esc(Value::from(())), "");
        assert_eq!(esc(Value::from("a<b")), "a&lt;b");
        assert_eq!(esc(Value::from(42)), "42");
    }
}
