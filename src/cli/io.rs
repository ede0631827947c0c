//! JSON-lines I/O for the CLI
//!
//! - input: one reading object per line, blank lines skipped
//! - output: one response object per line, UTF-8

use std::io::{BufRead, Write};

use serde_json::Value;

use super::errors::{CliError, CliResult};

/// Parsed lines with their 1-based line numbers. Blank lines are skipped.
pub fn read_lines<R: BufRead>(reader: R) -> impl Iterator<Item = CliResult<(usize, Value)>> {
    reader
        .lines()
        .enumerate()
        .filter_map(|(i, line)| match line {
            Err(e) => Some(Err(CliError::from(e))),
            Ok(line) if line.trim().is_empty() => None,
            Ok(line) => Some(
                serde_json::from_str(&line)
                    .map(|v| (i + 1, v))
                    .map_err(|e| CliError::input_error(i + 1, e)),
            ),
        })
}

pub fn write_response<W: Write>(out: &mut W, data: Value) -> CliResult<()> {
    let response = serde_json::json!({
        "status": "ok",
        "data": data
    });
    serde_json::to_writer(&mut *out, &response)?;
    writeln!(out)?;
    out.flush()?;
    Ok(())
}

pub fn write_error<W: Write>(out: &mut W, code: &str, message: &str) -> CliResult<()> {
    let response = serde_json::json!({
        "status": "error",
        "code": code,
        "message": message
    });
    serde_json::to_writer(&mut *out, &response)?;
    writeln!(out)?;
    out.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_lines_skips_blanks_and_numbers_lines() {
        let input = "{\"a\":1}\n\n{\"a\":2}\n";
        let lines: Vec<(usize, Value)> = read_lines(input.as_bytes()).map(|r| r.unwrap()).collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[1].0, 3);
        assert_eq!(lines[1].1["a"], 2);
    }

    #[test]
    fn test_bad_line_reports_line_number() {
        let input = "{\"a\":1}\nnot json\n";
        let err = read_lines(input.as_bytes()).nth(1).unwrap().unwrap_err();
        assert!(err.message().starts_with("line 2"));
    }

    #[test]
    fn test_response_shapes() {
        let mut out = Vec::new();
        write_response(&mut out, serde_json::json!({"tick": 1})).unwrap();
        write_error(&mut out, "AFDD_CLI_INPUT_ERROR", "bad").unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<Value> = text.lines().map(|l| serde_json::from_str(l).unwrap()).collect();
        assert_eq!(lines[0]["status"], "ok");
        assert_eq!(lines[0]["data"]["tick"], 1);
        assert_eq!(lines[1]["status"], "error");
        assert_eq!(lines[1]["code"], "AFDD_CLI_INPUT_ERROR");
    }
}
