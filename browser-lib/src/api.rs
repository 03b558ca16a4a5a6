use crate::error as mherr;
use futures_util::TryStreamExt;
use log::info;
use mhprotocol::content::{BugReport, Dataset, Entry, FieldMeta, Metadata, ReportReply, TokenReply};
use mhprotocol::params::{PageParams, SearchParams};
use reqwest::Url;
use std::collections::BTreeMap;
use std::path::Path;
use tokio_util::io::StreamReader;

fn convert_err(err: reqwest::Error) -> std::io::Error {
  std::io::Error::new(std::io::ErrorKind::Other, err)
}

/// Client for the variant-browser REST backend.  All heavy lifting (search,
/// counts, export generation) happens server side; this just shapes requests
/// and decodes replies.
pub struct ApiClient {
  client: reqwest::Client,
  base: String,
  dataset: String,
}

impl ApiClient {
  pub fn new(api_url: &str, dataset: &str) -> Result<ApiClient, mherr::Error> {
    let client = reqwest::Client::builder().build()?;
    Ok(ApiClient {
      client,
      base: api_url.trim_end_matches('/').to_string(),
      dataset: dataset.to_string(),
    })
  }

  fn url(&self, path: &str, pairs: &[(String, String)]) -> Result<Url, mherr::Error> {
    let mut url = Url::parse(format!("{}{}", self.base, path).as_str())
      .map_err(|e| mherr::Error::String(e.to_string()))?;
    for (k, v) in pairs {
      url.query_pairs_mut().append_pair(k, v);
    }
    Ok(url)
  }

  fn dataset_url(&self, path: &str, pairs: &[(String, String)]) -> Result<Url, mherr::Error> {
    self.url(format!("/datasets/{}{}", self.dataset, path).as_str(), pairs)
  }

  async fn get_json<T: serde::de::DeserializeOwned>(&self, url: Url) -> Result<T, mherr::Error> {
    let res = self.client.get(url).send().await?.error_for_status()?;
    Ok(res.json::<T>().await?)
  }

  pub async fn datasets(&self) -> Result<Vec<Dataset>, mherr::Error> {
    self.get_json(self.url("/datasets/", &[])?).await
  }

  pub async fn variants_page(
    &self,
    search: &SearchParams,
    page: &PageParams,
  ) -> Result<Vec<Entry>, mherr::Error> {
    let mut pairs = page.query_pairs();
    pairs.extend(search.query_pairs());
    self.get_json(self.dataset_url("/", &pairs)?).await
  }

  pub async fn guides_page(
    &self,
    search: &SearchParams,
    page: &PageParams,
  ) -> Result<Vec<Entry>, mherr::Error> {
    let mut pairs = page.query_pairs();
    pairs.extend(search.query_pairs());
    self.get_json(self.dataset_url("/guides", &pairs)?).await
  }

  pub async fn variants_entries(&self, search: &SearchParams) -> Result<i64, mherr::Error> {
    self
      .get_json(self.dataset_url("/variants/entries", &search.query_pairs())?)
      .await
  }

  pub async fn guides_entries(&self, search: &SearchParams) -> Result<i64, mherr::Error> {
    self
      .get_json(self.dataset_url("/guides/entries", &search.query_pairs())?)
      .await
  }

  pub async fn variant_fields(&self) -> Result<BTreeMap<String, FieldMeta>, mherr::Error> {
    self.get_json(self.dataset_url("/variants/fields", &[])?).await
  }

  pub async fn metadata(&self) -> Result<Metadata, mherr::Error> {
    self.get_json(self.dataset_url("/metadata", &[])?).await
  }

  /// Guides attached to one variant, for the detail view.
  pub async fn variant_guides(&self, variant_id: i64) -> Result<Vec<Entry>, mherr::Error> {
    self
      .get_json(self.dataset_url(format!("/variants/{}/guides", variant_id).as_str(), &[])?)
      .await
  }

  pub async fn token(&self) -> Result<TokenReply, mherr::Error> {
    self.get_json(self.url("/token", &[])?).await
  }

  pub async fn report(&self, report: &BugReport) -> Result<ReportReply, mherr::Error> {
    let res = self
      .client
      .post(self.url("/report", &[])?)
      .json(report)
      .send()
      .await?;
    // a rejected token comes back as a 400 with a reason body
    Ok(res.json::<ReportReply>().await?)
  }

  pub fn variants_tsv_url(&self, search: &SearchParams) -> Result<Url, mherr::Error> {
    self.dataset_url("/tsv", &search.query_pairs())
  }

  pub fn guides_tsv_url(
    &self,
    search: &SearchParams,
    with_variant_info: bool,
  ) -> Result<Url, mherr::Error> {
    let mut pairs = search.query_pairs();
    pairs.push((
      "guides_with_variant_info".to_string(),
      with_variant_info.to_string(),
    ));
    self.dataset_url("/guides/tsv", &pairs)
  }

  pub fn combined_tsv_url(
    &self,
    search: &SearchParams,
    with_variant_info: bool,
  ) -> Result<Url, mherr::Error> {
    let mut pairs = search.query_pairs();
    pairs.push((
      "guides_with_variant_info".to_string(),
      with_variant_info.to_string(),
    ));
    self.dataset_url("/combined/tsv", &pairs)
  }

  pub fn variant_guides_tsv_url(&self, variant_id: i64) -> Result<Url, mherr::Error> {
    self.dataset_url(format!("/variants/{}/guides/tsv", variant_id).as_str(), &[])
  }

  /// Streams a server-generated TSV export to a local file.  Exports can be
  /// large, so the body is never buffered whole.
  pub async fn download_tsv(&self, url: Url, dest: &Path) -> Result<(), mherr::Error> {
    info!("downloading {} to {:?}", url, dest);
    let res = self.client.get(url).send().await?.error_for_status()?;
    let rstream = res.bytes_stream().map_err(convert_err);
    let mut br = StreamReader::new(rstream);
    let mut f = tokio::fs::File::create(dest).await?;
    let written = tokio::io::copy(&mut br, &mut f).await?;
    info!("wrote {} bytes to {:?}", written, dest);
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use mhprotocol::search::SortOrder;

  fn search_params() -> SearchParams {
    SearchParams {
      sort_by: "id".to_string(),
      sort_order: SortOrder::Asc,
      chr: Some("chr2".to_string()),
      start: 100,
      end: 2000,
      location: vec!["exonic".to_string()],
      min_mh_1l: 3,
      clinvar: false,
      ngg_pam_avail: false,
      unique_guide_avail: false,
      search_query: "".to_string(),
    }
  }

  #[test]
  fn test_export_url_shape() {
    let api = ApiClient::new("https://mhcut.example.org/api/", "cas").unwrap();
    let url = api.variants_tsv_url(&search_params()).unwrap();
    assert_eq!(url.path(), "/api/datasets/cas/tsv");
    let pairs: Vec<(String, String)> = url
      .query_pairs()
      .map(|(k, v)| (k.to_string(), v.to_string()))
      .collect();
    assert!(pairs.contains(&("chr".to_string(), "chr2".to_string())));
    assert!(pairs.contains(&("sort_by".to_string(), "id".to_string())));
  }

  #[test]
  fn test_guides_export_url_carries_variant_info_flag() {
    let api = ApiClient::new("https://mhcut.example.org/api", "xcas").unwrap();
    let url = api.guides_tsv_url(&search_params(), false).unwrap();
    assert_eq!(url.path(), "/api/datasets/xcas/guides/tsv");
    assert!(url
      .query_pairs()
      .any(|(k, v)| k == "guides_with_variant_info" && v == "false"));
  }

  #[test]
  fn test_variant_guides_tsv_url() {
    let api = ApiClient::new("https://mhcut.example.org/api", "cas").unwrap();
    let url = api.variant_guides_tsv_url(1234).unwrap();
    assert_eq!(url.path(), "/api/datasets/cas/variants/1234/guides/tsv");
    assert_eq!(url.query(), None);
  }
}
