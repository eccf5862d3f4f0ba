//! Result table — plain-text rendering, CSV export/import and JSON.
//!
//! CSV follows RFC 4180: a header row, one row per key, fields quoted only
//! when they contain a comma, quote or line break.

use std::fs;
use std::path::Path;

use crate::error::ReportError;
use crate::probe::{mask_key, ProbeResult, Verdict};

pub const HEADER: [&str; 3] = ["Key", "Detected Provider", "Status"];

/// One `(key, provider, status)` row, as exported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultRow {
    pub key: String,
    pub provider: String,
    pub status: Verdict,
}

impl From<&ProbeResult> for ResultRow {
    fn from(r: &ProbeResult) -> Self {
        Self {
            key: r.key.clone(),
            provider: r.provider.clone(),
            status: r.verdict.clone(),
        }
    }
}

// ── Table ───────────────────────────────────────────────────────────

/// Aligned plain-text table. Keys are masked unless `reveal` is set.
pub fn render_table(rows: &[ResultRow], reveal: bool) -> String {
    let rows: Vec<[String; 3]> = rows
        .iter()
        .map(|r| {
            let key = if reveal { r.key.clone() } else { mask_key(&r.key) };
            [key, r.provider.clone(), r.status.to_string()]
        })
        .collect();

    let mut widths = HEADER.map(|h| h.chars().count());
    for row in &rows {
        for (w, cell) in widths.iter_mut().zip(row) {
            *w = (*w).max(cell.chars().count());
        }
    }

    let mut out = String::new();
    push_row(&mut out, &HEADER.map(String::from), &widths);
    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    out.push_str(rule.join("  ").trim_end());
    out.push('\n');
    for row in &rows {
        push_row(&mut out, row, &widths);
    }
    out
}

fn push_row(out: &mut String, cells: &[String; 3], widths: &[usize; 3]) {
    let line: Vec<String> = cells
        .iter()
        .zip(widths)
        .map(|(cell, w)| format!("{:<width$}", cell, width = *w))
        .collect();
    out.push_str(line.join("  ").trim_end());
    out.push('\n');
}

// ── CSV ─────────────────────────────────────────────────────────────

fn escape_field(field: &str) -> String {
    if field.contains(&[',', '"', '\n', '\r'][..]) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

pub fn to_csv(results: &[ProbeResult]) -> String {
    let mut out = HEADER.join(",");
    out.push('\n');
    for r in results {
        let fields = [r.key.as_str(), r.provider.as_str(), &r.verdict.to_string()].map(escape_field);
        out.push_str(&fields.join(","));
        out.push('\n');
    }
    out
}

pub fn write_csv(path: &Path, results: &[ProbeResult]) -> Result<(), ReportError> {
    fs::write(path, to_csv(results))?;
    Ok(())
}

/// Split CSV text into records. Returns `(line, reason)` on malformed input.
fn split_records(text: &str) -> Result<Vec<(usize, Vec<String>)>, (usize, String)> {
    let mut records = Vec::new();
    let mut record = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut line = 1;
    let mut record_line = 1;
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        if in_quotes {
            match c {
                '"' if chars.peek() == Some(&'"') => {
                    chars.next();
                    field.push('"');
                }
                '"' => in_quotes = false,
                '\n' => {
                    line += 1;
                    field.push(c);
                }
                _ => field.push(c),
            }
            continue;
        }
        match c {
            '"' if field.is_empty() => in_quotes = true,
            '"' => return Err((line, "quote inside unquoted field".to_string())),
            ',' => record.push(std::mem::take(&mut field)),
            '\r' if chars.peek() == Some(&'\n') => {}
            '\n' => {
                record.push(std::mem::take(&mut field));
                records.push((record_line, std::mem::take(&mut record)));
                line += 1;
                record_line = line;
            }
            _ => field.push(c),
        }
    }

    if in_quotes {
        return Err((line, "unterminated quoted field".to_string()));
    }
    if !field.is_empty() || !record.is_empty() {
        record.push(field);
        records.push((record_line, record));
    }
    Ok(records)
}

/// Parse an exported report back into rows, in file order.
pub fn parse_csv(text: &str) -> Result<Vec<ResultRow>, ReportError> {
    let records = split_records(text).map_err(|(line, reason)| ReportError::BadRow { line, reason })?;
    let mut iter = records.into_iter();

    let (_, header) = iter.next().ok_or(ReportError::Empty)?;
    if header != HEADER {
        return Err(ReportError::BadHeader(header.join(",")));
    }

    iter.map(|(line, fields)| {
        let [key, provider, status]: [String; 3] = fields.try_into().map_err(|f: Vec<String>| {
            ReportError::BadRow {
                line,
                reason: format!("expected 3 fields, found {}", f.len()),
            }
        })?;
        let status = status.parse().map_err(|e: crate::probe::ParseVerdictError| {
            ReportError::BadRow { line, reason: e.to_string() }
        })?;
        Ok(ResultRow { key, provider, status })
    })
    .collect()
}

pub fn read_csv(path: &Path) -> Result<Vec<ResultRow>, ReportError> {
    parse_csv(&fs::read_to_string(path)?)
}

// ── JSON ────────────────────────────────────────────────────────────

pub fn to_json(results: &[ProbeResult]) -> serde_json::Result<String> {
    serde_json::to_string_pretty(results)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn result(key: &str, provider: &str, verdict: Verdict) -> ProbeResult {
        ProbeResult {
            key: key.to_string(),
            provider: provider.to_string(),
            verdict,
            attempts: 1,
            latency_ms: 12,
            checked_at: Utc::now(),
        }
    }

    fn sample() -> Vec<ProbeResult> {
        vec![
            result("gsk_0123456789", "Groq", Verdict::Valid),
            result("sk-nothing-here", "Unknown", Verdict::Invalid),
            result("AIzaSyThrottled", "Google Gemini", Verdict::RateLimited),
            result("key,with\"quotes\"", "DeepSeek", Verdict::Error("402".into())),
            result("sk-unreachable", "Unknown", Verdict::Unknown),
        ]
    }

    #[test]
    fn test_csv_layout() {
        let csv = to_csv(&sample()[..2]);
        assert_eq!(
            csv,
            "Key,Detected Provider,Status\n\
             gsk_0123456789,Groq,VALID\n\
             sk-nothing-here,Unknown,INVALID\n"
        );
    }

    #[test]
    fn test_csv_quotes_special_fields() {
        let csv = to_csv(&sample()[3..4]);
        assert!(csv.ends_with("\"key,with\"\"quotes\"\"\",DeepSeek,ERROR 402\n"), "{}", csv);
    }

    #[test]
    fn test_csv_export_then_parse_preserves_rows() {
        let results = sample();
        let parsed = parse_csv(&to_csv(&results)).unwrap();
        let expected: Vec<ResultRow> = results.iter().map(ResultRow::from).collect();
        assert_eq!(parsed, expected);
    }

    #[test]
    fn test_parse_accepts_crlf_and_embedded_newline() {
        let text = "Key,Detected Provider,Status\r\n\"multi\nline\",Groq,RATE LIMITED\r\n";
        let rows = parse_csv(text).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].key, "multi\nline");
        assert_eq!(rows[0].status, Verdict::RateLimited);
    }

    #[test]
    fn test_parse_rejects_bad_input() {
        assert!(matches!(parse_csv(""), Err(ReportError::Empty)));
        assert!(matches!(parse_csv("Key,API Type,Status\n"), Err(ReportError::BadHeader(_))));
        assert!(matches!(
            parse_csv("Key,Detected Provider,Status\na,b\n"),
            Err(ReportError::BadRow { line: 2, .. })
        ));
        assert!(matches!(
            parse_csv("Key,Detected Provider,Status\na,b,MAYBE\n"),
            Err(ReportError::BadRow { line: 2, .. })
        ));
        assert!(matches!(
            parse_csv("Key,Detected Provider,Status\n\"open,b,VALID\n"),
            Err(ReportError::BadRow { .. })
        ));
    }

    #[test]
    fn test_write_and_read_csv_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("results.csv");
        let results = sample();

        write_csv(&path, &results).unwrap();
        let rows = read_csv(&path).unwrap();
        assert_eq!(rows.len(), results.len());
        assert_eq!(rows[2].provider, "Google Gemini");
        assert_eq!(rows[2].status, Verdict::RateLimited);
    }

    #[test]
    fn test_table_masks_keys_by_default() {
        let rows: Vec<ResultRow> = sample()[..1].iter().map(ResultRow::from).collect();
        let table = render_table(&rows, false);
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("Key"));
        assert!(lines[0].contains("Detected Provider"));
        assert!(lines[2].contains("gsk...789"));
        assert!(!table.contains("gsk_0123456789"));
        assert!(lines[2].ends_with("VALID"));

        let revealed = render_table(&rows, true);
        assert!(revealed.contains("gsk_0123456789"));
    }

    #[test]
    fn test_json_uses_status_strings() {
        let json = to_json(&sample()[2..3]).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value[0]["status"], "RATE LIMITED");
        assert_eq!(value[0]["provider"], "Google Gemini");
        assert_eq!(value[0]["attempts"], 1);
    }
}
