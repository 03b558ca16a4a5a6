use crate::search::SortOrder;

/// The flat key-value parameter set shared by the list, count and export
/// endpoints.  Pure data; building the GET query from it has no side effects.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct SearchParams {
  pub sort_by: String,
  pub sort_order: SortOrder,
  pub chr: Option<String>,
  pub start: i64,
  pub end: i64,
  pub location: Vec<String>,
  pub min_mh_1l: i64,
  pub clinvar: bool,
  pub ngg_pam_avail: bool,
  pub unique_guide_avail: bool,
  /// The serialized advanced-search condition list; empty means no
  /// advanced search, which the backend treats as always-true.
  pub search_query: String,
}

impl SearchParams {
  /// Query pairs in the shape the backend expects.  List-valued parameters
  /// are comma-encoded; chr is omitted entirely when no chromosome is
  /// selected, rather than sending a value the backend would reject.
  pub fn query_pairs(&self) -> Vec<(String, String)> {
    let mut pairs = vec![
      ("sort_by".to_string(), self.sort_by.clone()),
      ("sort_order".to_string(), self.sort_order.to_string()),
    ];
    if let Some(ref chr) = self.chr {
      pairs.push(("chr".to_string(), chr.clone()));
    }
    pairs.push(("start".to_string(), self.start.to_string()));
    pairs.push(("end".to_string(), self.end.to_string()));
    pairs.push(("location".to_string(), self.location.join(",")));
    pairs.push(("min_mh_1l".to_string(), self.min_mh_1l.to_string()));
    pairs.push(("clinvar".to_string(), self.clinvar.to_string()));
    pairs.push(("ngg_pam_avail".to_string(), self.ngg_pam_avail.to_string()));
    pairs.push((
      "unique_guide_avail".to_string(),
      self.unique_guide_avail.to_string(),
    ));
    pairs.push(("search_query".to_string(), self.search_query.clone()));
    pairs
  }
}

/// Pagination parameters, appended to the search parameters for the two
/// list endpoints.
#[derive(Serialize, Deserialize, Debug, Clone, Copy)]
pub struct PageParams {
  pub page: i64,
  pub items_per_page: i64,
}

impl PageParams {
  pub fn query_pairs(&self) -> Vec<(String, String)> {
    vec![
      ("page".to_string(), self.page.to_string()),
      ("items_per_page".to_string(), self.items_per_page.to_string()),
    ]
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn params() -> SearchParams {
    SearchParams {
      sort_by: "id".to_string(),
      sort_order: SortOrder::Asc,
      chr: None,
      start: 0,
      end: 1000000000000,
      location: vec!["exonic".to_string(), "intronic".to_string()],
      min_mh_1l: 3,
      clinvar: false,
      ngg_pam_avail: true,
      unique_guide_avail: false,
      search_query: "".to_string(),
    }
  }

  #[test]
  fn test_query_pairs() {
    let pairs = params().query_pairs();
    assert!(!pairs.iter().any(|(k, _)| k == "chr"));
    assert!(pairs.contains(&("sort_order".to_string(), "ASC".to_string())));
    assert!(pairs.contains(&("location".to_string(), "exonic,intronic".to_string())));
    assert!(pairs.contains(&("min_mh_1l".to_string(), "3".to_string())));
    assert!(pairs.contains(&("ngg_pam_avail".to_string(), "true".to_string())));
    assert!(pairs.contains(&("clinvar".to_string(), "false".to_string())));
    assert!(pairs.contains(&("search_query".to_string(), "".to_string())));
  }

  #[test]
  fn test_query_pairs_with_chr() {
    let mut p = params();
    p.chr = Some("chrX".to_string());
    p.sort_order = SortOrder::Desc;
    let pairs = p.query_pairs();
    assert!(pairs.contains(&("chr".to_string(), "chrX".to_string())));
    assert!(pairs.contains(&("sort_order".to_string(), "DESC".to_string())));
  }

  #[test]
  fn test_page_pairs() {
    let pp = PageParams {
      page: 3,
      items_per_page: 100,
    };
    assert_eq!(
      pp.query_pairs(),
      vec![
        ("page".to_string(), "3".to_string()),
        ("items_per_page".to_string(), "100".to_string()),
      ]
    );
  }
}
