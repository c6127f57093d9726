//! Small utility helpers used across modules.

/// Very small and safe string templating.
/// Replaces occurrences of `{key}` in the template with provided values.
pub fn fill_template(tpl: &str, pairs: &[(&str, &str)]) -> String {
  let mut out = tpl.to_string();
  for (k, v) in pairs {
    let needle = format!("{{{}}}", k);
    out = out.replace(&needle, v);
  }
  out
}

/// Whitespace-separated word count.
pub fn word_count(s: &str) -> usize {
  s.split_whitespace().count()
}

/// Split a comma-separated tag list, trimming entries and dropping empty ones.
pub fn parse_tags(raw: &str) -> Vec<String> {
  raw
    .split(',')
    .map(str::trim)
    .filter(|t| !t.is_empty())
    .map(str::to_string)
    .collect()
}

/// `round((1 - summary / original) * 100)`, rounded half up. Negative when
/// the summary is longer than the original; 0 for an empty original.
pub fn compression_percent(original_words: usize, summary_words: usize) -> i64 {
  if original_words == 0 {
    return 0;
  }
  let o = original_words as i64;
  let saved = o - summary_words as i64;
  // floor((saved * 200 + o) / (2 * o)) rounds half up, also for negatives
  (saved * 200 + o).div_euclid(2 * o)
}

/// Log-safe truncation for large strings.
pub fn trunc_for_log(s: &str, max: usize) -> String {
  if s.chars().count() <= max {
    s.to_string()
  } else {
    let head: String = s.chars().take(max).collect();
    format!("{}… ({} bytes total)", head, s.len())
  }
}
