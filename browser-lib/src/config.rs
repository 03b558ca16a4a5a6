use serde_derive::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Config {
  pub api_url: String,
  pub dataset: String,
  pub items_per_page: i64,
  pub export_dir: PathBuf,
}
