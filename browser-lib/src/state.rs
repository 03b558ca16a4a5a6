use mhprotocol::content::{Entry, FieldMeta, Metadata};
use mhprotocol::params::{PageParams, SearchParams};
use mhprotocol::search::{FilterList, SortOrder};
use regex::Regex;
use std::collections::BTreeMap;

pub const DEFAULT_MIN_MH_1L: i64 = 3;
pub const DEFAULT_ITEMS_PER_PAGE: i64 = 100;

const CHR_DOMAIN: &str = "^chr([1-9]|1[0-9]|2[0-2]|X|Y)$";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Display {
  Variants,
  Guides,
}

/// All mutable browsing state, owned by one Session.  Transitions return the
/// new state; nothing here talks to the network.
#[derive(Debug, Clone)]
pub struct BrowserState {
  pub page: i64,
  pub items_per_page: i64,
  pub sort_by: String,
  pub sort_order: SortOrder,
  pub display: Display,

  // quick filters
  pub chr: Option<String>,
  pub start_pos: i64,
  pub end_pos: i64,
  pub locations: Vec<String>,
  pub min_mh_1l: i64,
  pub clinvar: bool,
  pub ngg_pam_avail: bool,
  pub unique_guide_avail: bool,

  /// The advanced-search conditions being edited.
  pub filters: FilterList,
  /// The serialized condition list actually applied to queries.
  pub search_query: String,

  // loaded data, rebuilt on every reload
  pub variants: Vec<Entry>,
  pub guides: Vec<Entry>,
  /// None while a count fetch is outstanding; displayed totals are
  /// approximate within that window.
  pub variant_count: Option<i64>,
  pub guide_count: Option<i64>,

  pub fields: BTreeMap<String, FieldMeta>,
  pub metadata: Metadata,
}

impl BrowserState {
  pub fn new(
    metadata: Metadata,
    fields: BTreeMap<String, FieldMeta>,
    items_per_page: i64,
  ) -> BrowserState {
    BrowserState {
      page: 1,
      items_per_page: if items_per_page > 0 {
        items_per_page
      } else {
        DEFAULT_ITEMS_PER_PAGE
      },
      sort_by: "id".to_string(),
      sort_order: SortOrder::Asc,
      display: Display::Variants,
      chr: None,
      start_pos: metadata.min_pos,
      end_pos: metadata.max_pos,
      locations: metadata.location.clone(),
      min_mh_1l: DEFAULT_MIN_MH_1L,
      clinvar: false,
      ngg_pam_avail: false,
      unique_guide_avail: false,
      filters: FilterList::new(),
      search_query: "".to_string(),
      variants: Vec::new(),
      guides: Vec::new(),
      variant_count: None,
      guide_count: None,
      fields,
      metadata,
    }
  }

  // ---- pagination ----

  pub fn with_page(mut self, page: i64) -> BrowserState {
    self.page = page.max(1).min(self.total_pages());
    self
  }

  pub fn first_page(self) -> BrowserState {
    self.with_page(1)
  }

  pub fn prev_page(self) -> BrowserState {
    let p = self.page - 1;
    self.with_page(p)
  }

  pub fn next_page(self) -> BrowserState {
    let p = self.page + 1;
    self.with_page(p)
  }

  pub fn last_page(self) -> BrowserState {
    let p = self.total_pages();
    self.with_page(p)
  }

  pub fn set_items_per_page(mut self, n: i64) -> BrowserState {
    self.items_per_page = if n > 0 { n } else { DEFAULT_ITEMS_PER_PAGE };
    self.page = 1;
    self
  }

  /// Counts are approximate while a count fetch is outstanding: a full page
  /// implies at least one more entry past this page, otherwise what is
  /// loaded is all there is.
  pub fn approx_variant_count(&self) -> i64 {
    match self.variant_count {
      Some(c) => c,
      None => {
        if self.variants.len() as i64 >= self.items_per_page {
          self.page * self.items_per_page + 1
        } else {
          (self.page - 1) * self.items_per_page + self.variants.len() as i64
        }
      }
    }
  }

  pub fn counts_pending(&self) -> bool {
    self.variant_count.is_none() || self.guide_count.is_none()
  }

  pub fn total_pages(&self) -> i64 {
    let c = self.approx_variant_count();
    ((c + self.items_per_page - 1) / self.items_per_page).max(1)
  }

  // ---- sorting ----

  /// Sorting by the current column flips the direction; any other column
  /// becomes the new ascending sort.  Sorting returns to page 1.
  pub fn toggle_sort(mut self, column: &str) -> BrowserState {
    if self.sort_by == column {
      self.sort_order = self.sort_order.flip();
    } else {
      self.sort_by = column.to_string();
      self.sort_order = SortOrder::Asc;
    }
    self.page = 1;
    self
  }

  // ---- quick filters ----

  /// Parses a position query of the form "chr1" or "chr1:100-2000".
  /// Anything that does not name a valid chromosome clears the chromosome
  /// selection and restores the dataset position bounds; a chromosome
  /// without a usable range keeps the full bounds.
  pub fn set_position_query(mut self, text: &str) -> BrowserState {
    let cleaned = text.replace(' ', "");
    let parts: Vec<&str> = cleaned.split(':').collect();

    let chr = parts
      .get(0)
      .map(|c| c.to_lowercase().replace('x', "X").replace('y', "Y"))
      .unwrap_or_default();

    let valid = match Regex::new(CHR_DOMAIN) {
      Ok(re) => re.is_match(chr.as_str()),
      Err(_) => false,
    };

    if !valid || parts.len() > 2 {
      self.chr = None;
      self.start_pos = self.metadata.min_pos;
      self.end_pos = self.metadata.max_pos;
      return self;
    }

    self.chr = Some(chr);
    self.start_pos = self.metadata.min_pos;
    self.end_pos = self.metadata.max_pos;

    if let Some(range) = parts.get(1) {
      let bounds: Vec<&str> = range.split('-').collect();
      if bounds.len() == 2 {
        // bad numeric input falls back to the dataset bound
        self.start_pos = bounds[0].parse().unwrap_or(self.metadata.min_pos);
        self.end_pos = bounds[1].parse().unwrap_or(self.metadata.max_pos);
      }
    }
    self
  }

  /// Keeps only locations the dataset knows about; deselecting everything
  /// means no location filter, i.e. all of them.
  pub fn set_locations(mut self, locations: &[String]) -> BrowserState {
    let known: Vec<String> = locations
      .iter()
      .filter(|l| self.metadata.location.contains(l))
      .cloned()
      .collect();
    self.locations = if known.is_empty() {
      self.metadata.location.clone()
    } else {
      known
    };
    self
  }

  pub fn set_min_mh_1l(mut self, text: &str) -> BrowserState {
    self.min_mh_1l = text.trim().parse().unwrap_or(0).max(0);
    self
  }

  // ---- advanced search ----

  /// Applies the edited condition list, making it the search-query text used
  /// for requests.  An empty list clears the advanced search.
  pub fn save_search(mut self) -> BrowserState {
    self.search_query = if self.filters.is_empty() {
      "".to_string()
    } else {
      self.filters.serialize()
    };
    self
  }

  /// Replaces the condition list from raw search-query text; malformed text
  /// yields an empty list.
  pub fn set_search_query(mut self, text: &str) -> BrowserState {
    self.filters = FilterList::deserialize(text);
    self.search_query = text.to_string();
    self
  }

  /// Back to the defaults: full position range, every location, the stock
  /// MH-length threshold, no flags, no advanced search.
  pub fn reset_filters(mut self) -> BrowserState {
    self.chr = None;
    self.start_pos = self.metadata.min_pos;
    self.end_pos = self.metadata.max_pos;
    self.locations = self.metadata.location.clone();
    self.min_mh_1l = DEFAULT_MIN_MH_1L;
    self.clinvar = false;
    self.ngg_pam_avail = false;
    self.unique_guide_avail = false;
    self.filters = FilterList::new();
    self.search_query = "".to_string();
    self
  }

  // ---- request parameters ----

  pub fn search_params(&self) -> SearchParams {
    SearchParams {
      sort_by: self.sort_by.clone(),
      sort_order: self.sort_order,
      chr: self.chr.clone(),
      start: self.start_pos,
      end: self.end_pos,
      location: self.locations.clone(),
      min_mh_1l: self.min_mh_1l,
      clinvar: self.clinvar,
      ngg_pam_avail: self.ngg_pam_avail,
      unique_guide_avail: self.unique_guide_avail,
      search_query: self.search_query.clone(),
    }
  }

  pub fn page_params(&self) -> PageParams {
    PageParams {
      page: self.page,
      items_per_page: self.items_per_page,
    }
  }

  /// Field metadata for a condition's chosen field, if one is chosen.
  pub fn field_meta(&self, field: &str) -> Option<&FieldMeta> {
    if field.is_empty() {
      None
    } else {
      self.fields.get(field)
    }
  }
}
