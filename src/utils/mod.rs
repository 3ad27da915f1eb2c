use std::path::Path;

use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::executor::Method;

/// Turns a string of CRUD letters into methods. Unknown letters are ignored
/// and a repeated letter keeps its first position.
pub fn parse_method_letters(value: &str) -> Vec<Method> {
    let mut out: Vec<Method> = Vec::new();
    for method in value.chars().filter_map(Method::from_letter) {
        if !out.contains(&method) {
            out.push(method);
        }
    }
    out
}

pub fn method_letters(methods: &[Method]) -> String {
    methods.iter().map(|m| m.letter()).collect()
}

pub fn parse_subdomains_csv(value: &str) -> Vec<String> {
    clean_lines(value.split(','))
}

// trims every entry and drops the blank ones
pub fn clean_lines<I, S>(lines: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    lines
        .into_iter()
        .filter_map(|line| {
            let line = line.as_ref().trim();
            if line.is_empty() {
                None
            } else {
                Some(line.to_string())
            }
        })
        .collect()
}

pub async fn read_lines(path: &Path) -> std::io::Result<Vec<String>> {
    let handle = File::open(path).await?;
    let mut out = Vec::new();
    let mut lines = BufReader::new(handle).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        out.push(line.to_string());
    }
    Ok(out)
}

pub fn parse_header(value: &str) -> Result<(String, String), String> {
    let (name, val) = value
        .split_once(':')
        .ok_or_else(|| "expected 'Key: Value'".to_string())?;
    let name = name.trim();
    if name.is_empty() {
        return Err("header name is empty".to_string());
    }
    Ok((name.to_string(), val.trim().to_string()))
}
