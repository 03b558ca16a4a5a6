use crate::state::{BrowserState, Display};
use mhprotocol::content::Entry;
use serde_json::Value;

/// Default column set for the variants table.  The full column list is
/// dynamic (see BrowserState::fields); this is the browsing view.
pub const VARIANT_COLUMNS: [&str; 16] = [
  "id",
  "rs",
  "gene_info",
  "chr",
  "pos_start",
  "pos_end",
  "location",
  "var_l",
  "clnsig",
  "mh_l",
  "mh_1l",
  "hom",
  "pam_mot",
  "pam_uniq",
  "guides_no_nmh",
  "max_indelphi_freq_mean",
];

pub const GUIDE_COLUMNS: [&str; 13] = [
  "id",
  "variant_id",
  "protospacer",
  "mm0",
  "m1_dist_1",
  "m1_dist_2",
  "mh_dist_1",
  "mh_dist_2",
  "nmh_score",
  "indelphi_freq_mean",
  "nb_nmh",
  "largest_nmh",
  "nmh_seq",
];

/// Cell text for one column value.  Nulls and absent columns both display
/// as NA, matching the TSV exports.
fn cell(entry: &Entry, column: &str) -> String {
  match entry.get(column) {
    None | Some(Value::Null) => "NA".to_string(),
    Some(Value::String(s)) => s.clone(),
    Some(v) => v.to_string(),
  }
}

/// Plain aligned-column table of the given entries.
pub fn render_table(entries: &[Entry], columns: &[&str]) -> String {
  if entries.is_empty() {
    return "No results found.\n".to_string();
  }

  let rows: Vec<Vec<String>> = entries
    .iter()
    .map(|e| columns.iter().map(|c| cell(e, c)).collect())
    .collect();

  let widths: Vec<usize> = columns
    .iter()
    .enumerate()
    .map(|(i, c)| {
      rows
        .iter()
        .map(|r| r[i].len())
        .chain(std::iter::once(c.len()))
        .max()
        .unwrap_or(0)
    })
    .collect();

  let mut out = String::new();
  for (i, c) in columns.iter().enumerate() {
    out.push_str(format!("{:<w$}  ", c, w = widths[i]).as_str());
  }
  out.push('\n');
  for r in rows {
    for (i, v) in r.iter().enumerate() {
      out.push_str(format!("{:<w$}  ", v, w = widths[i]).as_str());
    }
    out.push('\n');
  }
  out
}

/// Pagination and filter summary.  Totals carry a "~" while the count
/// fetches have not resolved; those numbers are approximate.
pub fn render_status(state: &BrowserState) -> String {
  let approx = if state.counts_pending() { "~" } else { "" };
  let vcount = state.approx_variant_count();
  let gcount = match state.guide_count {
    Some(c) => c.to_string(),
    None => state.guides.len().to_string(),
  };

  let mode = match state.display {
    Display::Variants => "variants",
    Display::Guides => "guides",
  };

  let mut line = format!(
    "[{}] page {} of {}{}  ({}{} variants, {}{} guides)  sort: {} {}",
    mode,
    state.page,
    state.total_pages(),
    approx,
    vcount,
    approx,
    gcount,
    approx,
    state.sort_by,
    state.sort_order
  );

  if let Some(ref chr) = state.chr {
    line.push_str(format!("  pos: {}:{}-{}", chr, state.start_pos, state.end_pos).as_str());
  }
  if !state.search_query.is_empty() {
    line.push_str(format!("  search: {} condition(s)", state.filters.len()).as_str());
  }
  line.push('\n');
  line
}

/// The whole view: one table plus the status line.
pub fn render(state: &BrowserState) -> String {
  let table = match state.display {
    Display::Variants => render_table(&state.variants, &VARIANT_COLUMNS),
    Display::Guides => render_table(&state.guides, &GUIDE_COLUMNS),
  };
  format!("{}{}", table, render_status(state))
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  fn entry(pairs: &[(&str, Value)]) -> Entry {
    let mut e = Entry::new();
    for (k, v) in pairs {
      e.insert(k.to_string(), v.clone());
    }
    e
  }

  #[test]
  fn test_cell_formatting() {
    let e = entry(&[
      ("id", json!(12)),
      ("gene_info", json!("BRCA1:672")),
      ("rs", json!(null)),
    ]);
    assert_eq!(cell(&e, "id"), "12");
    assert_eq!(cell(&e, "gene_info"), "BRCA1:672");
    assert_eq!(cell(&e, "rs"), "NA");
    assert_eq!(cell(&e, "missing"), "NA");
  }

  #[test]
  fn test_empty_table() {
    assert_eq!(render_table(&[], &["id"]), "No results found.\n");
  }

  #[test]
  fn test_table_alignment() {
    let entries = vec![
      entry(&[("id", json!(1)), ("chr", json!("chr10"))]),
      entry(&[("id", json!(220)), ("chr", json!("chr2"))]),
    ];
    let out = render_table(&entries, &["id", "chr"]);
    let lines: Vec<&str> = out.lines().collect();
    assert_eq!(lines[0], "id   chr    ");
    assert_eq!(lines[1], "1    chr10  ");
    assert_eq!(lines[2], "220  chr2   ");
  }
}
