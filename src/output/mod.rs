use std::path::Path;
use std::sync::OnceLock;

use colored::Colorize;
use regex::Regex;
use serde::Serialize;
use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;

use crate::aggregate::{MethodResult, Report};
use crate::executor::Outcome;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "text" | "txt" => Some(Self::Text),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

pub fn infer_format_from_path(path: &str) -> Option<OutputFormat> {
    let lower = path.trim().to_lowercase();
    if lower.ends_with(".json") {
        return Some(OutputFormat::Json);
    }
    if lower.ends_with(".txt") {
        return Some(OutputFormat::Text);
    }
    None
}

#[derive(Clone, Debug, Serialize)]
pub struct OutputRecord {
    pub endpoint: String,
    pub subdomain: String,
    pub method: String,
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

pub fn build_records(report: &Report) -> Vec<OutputRecord> {
    let mut out = Vec::with_capacity(report.len());
    for e in report.endpoints.iter() {
        for s in e.subdomains.iter() {
            for r in s.results.iter() {
                let (status, error) = match &r.outcome {
                    Outcome::Success { status } => (Some(*status), None),
                    Outcome::Failure { message } => (None, Some(message.clone())),
                };
                out.push(OutputRecord {
                    endpoint: e.endpoint.clone(),
                    subdomain: s.subdomain.clone(),
                    method: r.method.as_str().to_string(),
                    url: s.url.clone(),
                    status,
                    error,
                });
            }
        }
    }
    out
}

fn request_context_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"request to \S+:").unwrap())
}

/// Drops the `request to <url>:` context from a failure message. The report
/// already shows which url a line belongs to.
pub fn strip_request_context(message: &str) -> String {
    request_context_re()
        .replace_all(message, "request:")
        .into_owned()
}

fn describe(result: &MethodResult) -> String {
    match &result.outcome {
        Outcome::Success { status } => format!("{} {}", result.method, status),
        Outcome::Failure { message } => {
            format!("{} {}", result.method, strip_request_context(message))
        }
    }
}

fn colorize(result: &MethodResult) -> String {
    let method = result.method.as_str().bold().white();
    match &result.outcome {
        Outcome::Success { status } => {
            let code = status.to_string();
            let code = match *status {
                200..=299 => code.as_str().bold().green(),
                300..=399 => code.as_str().bold().cyan(),
                400..=499 => code.as_str().bold().yellow(),
                _ => code.as_str().bold().red(),
            };
            format!("{} {}", method, code)
        }
        Outcome::Failure { message } => {
            let message = strip_request_context(message);
            format!("{} {}", method, message.as_str().red())
        }
    }
}

fn render_with(report: &Report, line: fn(&MethodResult) -> String) -> String {
    let mut out = String::new();
    for e in report.endpoints.iter() {
        out.push_str(&format!("Endpoint: {}\n", e.endpoint));
        for s in e.subdomains.iter() {
            out.push_str(&format!("  Subdomain: {} ({})\n", s.subdomain, s.url));
            for r in s.results.iter() {
                out.push_str("    ");
                out.push_str(&line(r));
                out.push('\n');
            }
        }
    }
    out
}

pub fn render_text(report: &Report) -> Vec<u8> {
    render_with(report, describe).into_bytes()
}

pub fn render_json(report: &Report) -> Vec<u8> {
    let records = build_records(report);
    let mut out = serde_json::to_vec_pretty(&records).unwrap_or_else(|_| b"[]".to_vec());
    out.push(b'\n');
    out
}

pub fn render(report: &Report, format: OutputFormat) -> Vec<u8> {
    match format {
        OutputFormat::Text => render_text(report),
        OutputFormat::Json => render_json(report),
    }
}

/// The console rendering, status codes colored by class.
pub fn render_console(report: &Report) -> String {
    render_with(report, colorize)
}

pub fn print_report(report: &Report) {
    print!("{}", render_console(report));
}

/// The optional file destination. The file is created (truncated) when the
/// sink is opened, so an unwritable path fails before any request is sent.
#[derive(Debug)]
pub struct ReportSink {
    file: File,
    format: OutputFormat,
}

impl ReportSink {
    pub async fn create(path: &Path, format: OutputFormat) -> std::io::Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(path)
            .await?;
        Ok(Self { file, format })
    }

    pub fn format(&self) -> OutputFormat {
        self.format
    }

    pub async fn write(&mut self, report: &Report) -> std::io::Result<()> {
        let rendered = render(report, self.format);
        self.file.write_all(&rendered).await?;
        self.file.flush().await
    }
}
