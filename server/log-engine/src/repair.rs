//! Best-effort repair of damaged JSON object lines.
//!
//! Fixes the defects seen in provider debug logs: trailing commas, unbalanced
//! or mismatched brackets, raw control characters inside strings, junk around
//! the object, and lines cut off mid-value.

use serde_json::Value;

use crate::error::RepairFailure;

/// An open container while scanning.
#[derive(Debug, Clone, Copy)]
struct Frame {
  open: char,
  /// Output position just after the opening bracket.
  start: usize,
  /// Output position of the last comma that belongs to this container.
  last_comma: Option<usize>,
}

impl Frame {
  fn closer(self) -> char {
    if self.open == '{' {
      '}'
    } else {
      ']'
    }
  }
}

/// Produce a repaired candidate for `line`.
///
/// A candidate whose top-level object closed during the scan is returned as
/// is; the caller re-parses it. A truncated candidate is only returned once it
/// parses as JSON.
pub fn repair(line: &str) -> Result<String, RepairFailure> {
  let trimmed = line.trim();
  if trimmed.is_empty() {
    return Err(RepairFailure::Empty);
  }
  let start = trimmed.find('{').ok_or(RepairFailure::NoObject)?;
  let text = &trimmed[start..];

  let mut out = String::with_capacity(text.len() + 8);
  let mut stack: Vec<Frame> = Vec::new();
  let mut in_string = false;
  let mut escaped = false;

  for ch in text.chars() {
    if in_string {
      if escaped {
        escaped = false;
        if !matches!(ch, '"' | '\\' | '/' | 'b' | 'f' | 'n' | 'r' | 't' | 'u') {
          // Lone backslash: keep it literally.
          out.push('\\');
        }
        push_string_char(&mut out, ch);
        continue;
      }
      match ch {
        '\\' => {
          out.push('\\');
          escaped = true;
        }
        '"' => {
          out.push('"');
          in_string = false;
        }
        _ => push_string_char(&mut out, ch),
      }
      continue;
    }

    match ch {
      '"' => {
        out.push('"');
        in_string = true;
      }
      '{' | '[' => {
        out.push(ch);
        stack.push(Frame {
          open: ch,
          start: out.len(),
          last_comma: None,
        });
      }
      '}' | ']' => {
        let opener = if ch == '}' { '{' } else { '[' };
        if !stack.iter().any(|f| f.open == opener) {
          // Unmatched closer.
          continue;
        }
        while let Some(top) = stack.pop() {
          drop_trailing_comma(&mut out);
          out.push(top.closer());
          if top.open == opener {
            break;
          }
        }
        if stack.is_empty() {
          // Top-level object closed; anything after it is noise.
          return Ok(out);
        }
      }
      ',' => {
        if let Some(top) = stack.last_mut() {
          top.last_comma = Some(out.len());
        }
        out.push(',');
      }
      ' ' | '\t' | '\n' | '\r' => out.push(ch),
      c if c.is_control() => {}
      c => out.push(c),
    }
  }

  // Truncated input: close what is open.
  if in_string {
    if escaped {
      out.pop();
    }
    out.push('"');
  }

  let candidate = close_all(&out, &stack);
  if parses(&candidate) {
    return Ok(candidate);
  }

  // Drop the innermost incomplete member and retry, moving outward.
  for depth in (0..stack.len()).rev() {
    let frame = stack[depth];
    let cut = frame.last_comma.unwrap_or(frame.start);
    let candidate = close_all(&out[..cut], &stack[..=depth]);
    if parses(&candidate) {
      return Ok(candidate);
    }
  }

  Err(RepairFailure::StillInvalid)
}

fn push_string_char(out: &mut String, ch: char) {
  match ch {
    '\n' => out.push_str("\\n"),
    '\r' => out.push_str("\\r"),
    '\t' => out.push_str("\\t"),
    c if (c as u32) < 0x20 => out.push_str(&format!("\\u{:04x}", c as u32)),
    c => out.push(c),
  }
}

/// Remove a dangling `,` (and the whitespace after it) at the end of `out`.
fn drop_trailing_comma(out: &mut String) {
  let kept = out.trim_end().len();
  if out[..kept].ends_with(',') {
    out.truncate(kept - 1);
  }
}

fn close_all(prefix: &str, stack: &[Frame]) -> String {
  let mut s = prefix.to_string();
  for frame in stack.iter().rev() {
    let kept = s.trim_end().len();
    s.truncate(kept);
    if s.ends_with(',') {
      s.pop();
    } else if s.ends_with(':') {
      s.push_str("null");
    }
    s.push(frame.closer());
  }
  s
}

fn parses(candidate: &str) -> bool {
  serde_json::from_str::<Value>(candidate).is_ok()
}
