use serde_json::Value;

/// One row of the variants or guides table.  Columns are dynamic; the set of
/// columns actually present is described by the FieldMeta map served by the
/// fields endpoint.
pub type Entry = serde_json::Map<String, Value>;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Dataset {
  pub id: String,
  pub name: String,
}

/// Column metadata as served by the variants/fields endpoint.  is_nullable
/// carries the SQL information-schema convention, "YES" or "NO".
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct FieldMeta {
  pub column_name: String,
  pub data_type: String,
  pub is_nullable: String,
}

impl FieldMeta {
  pub fn nullable(&self) -> bool {
    self.is_nullable == "YES"
  }
}

/// Dataset bounds and domains from the metadata endpoint.  Does not respect
/// filtering parameters.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Metadata {
  pub min_pos: i64,
  pub max_pos: i64,
  pub max_mh_l: Option<i64>,
  pub max_mh_1l: Option<i64>,
  pub chr: Vec<String>,
  pub location: Vec<String>,
  pub version: String,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct TokenReply {
  pub token: String,
  pub expiry: i64,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct BugReport {
  pub token: String,
  pub email: String,
  pub text: String,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ReportReply {
  pub success: bool,
  pub reason: Option<String>,
}
