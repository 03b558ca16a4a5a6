use crate::content::FieldMeta;
use std::fmt;

/// How a condition combines with the one before it.  The first condition's
/// value is ignored by the backend.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum AndOr {
  And,
  Or,
}

#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum SortOrder {
  Asc,
  Desc,
}

impl SortOrder {
  pub fn flip(self) -> SortOrder {
    match self {
      SortOrder::Asc => SortOrder::Desc,
      SortOrder::Desc => SortOrder::Asc,
    }
  }
}

impl fmt::Display for SortOrder {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      SortOrder::Asc => write!(f, "ASC"),
      SortOrder::Desc => write!(f, "DESC"),
    }
  }
}

/// The fixed operator vocabulary understood by the search endpoint, with the
/// wire spellings the backend expects.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
  #[serde(rename = "equals")]
  Equals,
  #[serde(rename = "<")]
  Lt,
  #[serde(rename = "<=")]
  Le,
  #[serde(rename = ">")]
  Gt,
  #[serde(rename = ">=")]
  Ge,
  #[serde(rename = "contains")]
  Contains,
  #[serde(rename = "starts_with")]
  StartsWith,
  #[serde(rename = "ends_with")]
  EndsWith,
  #[serde(rename = "is_null")]
  IsNull,
}

impl Operator {
  pub fn as_str(&self) -> &'static str {
    match self {
      Operator::Equals => "equals",
      Operator::Lt => "<",
      Operator::Le => "<=",
      Operator::Gt => ">",
      Operator::Ge => ">=",
      Operator::Contains => "contains",
      Operator::StartsWith => "starts_with",
      Operator::EndsWith => "ends_with",
      Operator::IsNull => "is_null",
    }
  }

  /// is_null takes no value; the value box is disabled for it.
  pub fn takes_value(&self) -> bool {
    *self != Operator::IsNull
  }
}

impl fmt::Display for Operator {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.as_str())
  }
}

/// Operators valid for every field type.
pub const BOTH_OPERATORS: [Operator; 5] = [
  Operator::Equals,
  Operator::Lt,
  Operator::Le,
  Operator::Gt,
  Operator::Ge,
];

/// Operators valid only for text fields.
pub const TEXT_OPERATORS: [Operator; 3] = [
  Operator::Contains,
  Operator::StartsWith,
  Operator::EndsWith,
];

/// Operators valid only for nullable fields.
pub const NULLABLE_OPERATORS: [Operator; 1] = [Operator::IsNull];

/// The operator vocabulary for a condition's chosen field: the base set, plus
/// the text set for text fields, plus is_null for nullable fields.  No field
/// chosen yields the base set alone.
pub fn allowed_operators(field: Option<&FieldMeta>) -> Vec<Operator> {
  let mut ops = BOTH_OPERATORS.to_vec();
  if let Some(fm) = field {
    if fm.data_type == "text" {
      ops.extend_from_slice(&TEXT_OPERATORS);
    }
    if fm.nullable() {
      ops.extend_from_slice(&NULLABLE_OPERATORS);
    }
  }
  ops
}

/// One user-authored search condition.  Serialized as a member of the JSON
/// array carried in the search_query parameter.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
pub struct FilterCondition {
  pub id: i64,
  pub boolean: AndOr,
  pub negated: bool,
  pub field: String,
  pub operator: Operator,
  pub value: String,
}

/// The ordered list of advanced search conditions, with the id counter used
/// to hand out fresh condition ids.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterList {
  conditions: Vec<FilterCondition>,
  next_id: i64,
}

impl FilterList {
  pub fn new() -> FilterList {
    FilterList {
      conditions: Vec::new(),
      next_id: 0,
    }
  }

  pub fn conditions(&self) -> &[FilterCondition] {
    &self.conditions
  }

  pub fn len(&self) -> usize {
    self.conditions.len()
  }

  pub fn is_empty(&self) -> bool {
    self.conditions.is_empty()
  }

  /// Appends a condition with default values and a fresh id; ids strictly
  /// increase from 0 and are never reused within a list.
  pub fn add(&mut self) -> i64 {
    let id = self.next_id;
    self.next_id += 1;
    self.conditions.push(FilterCondition {
      id,
      boolean: AndOr::And,
      negated: false,
      field: "".to_string(),
      operator: Operator::Equals,
      value: "".to_string(),
    });
    id
  }

  /// Removes the condition with the given id, keeping the relative order of
  /// the rest.  No-op if absent.
  pub fn remove(&mut self, id: i64) {
    self.conditions.retain(|c| c.id != id);
  }

  pub fn get_mut(&mut self, id: i64) -> Option<&mut FilterCondition> {
    self.conditions.iter_mut().find(|c| c.id == id)
  }

  /// The JSON array representation carried in the search-query text value.
  pub fn serialize(&self) -> String {
    serde_json::to_string(&self.conditions).unwrap_or("[]".to_string())
  }

  /// Parses a search-query text value back into a list.  Anything that is
  /// not a JSON array of complete conditions yields the empty list; a bad
  /// query is a user-correctable state, not an error.  The id counter
  /// resumes past the largest id present so later additions stay unique.
  pub fn deserialize(text: &str) -> FilterList {
    match serde_json::from_str::<Vec<FilterCondition>>(text) {
      Ok(conditions) => {
        let next_id = conditions.iter().map(|c| c.id + 1).max().unwrap_or(0);
        FilterList {
          conditions,
          next_id,
        }
      }
      Err(_) => FilterList::new(),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn field(data_type: &str, is_nullable: &str) -> FieldMeta {
    FieldMeta {
      column_name: "gene_info".to_string(),
      data_type: data_type.to_string(),
      is_nullable: is_nullable.to_string(),
    }
  }

  #[test]
  fn test_add_defaults() {
    let mut fl = FilterList::new();
    let id = fl.add();
    assert_eq!(id, 0);
    assert_eq!(
      fl.conditions()[0],
      FilterCondition {
        id: 0,
        boolean: AndOr::And,
        negated: false,
        field: "".to_string(),
        operator: Operator::Equals,
        value: "".to_string(),
      }
    );
    assert_eq!(fl.add(), 1);
    assert_eq!(fl.len(), 2);
  }

  #[test]
  fn test_ids_strictly_increase() {
    let mut fl = FilterList::new();
    let ids: Vec<i64> = (0..5).map(|_| fl.add()).collect();
    assert_eq!(ids, vec![0, 1, 2, 3, 4]);

    // removal does not free ids for reuse
    fl.remove(4);
    assert_eq!(fl.add(), 5);
  }

  #[test]
  fn test_remove_keeps_order() {
    let mut fl = FilterList::new();
    for _ in 0..4 {
      fl.add();
    }
    fl.remove(1);
    let ids: Vec<i64> = fl.conditions().iter().map(|c| c.id).collect();
    assert_eq!(ids, vec![0, 2, 3]);

    // removing an absent id is a no-op
    fl.remove(99);
    assert_eq!(fl.len(), 3);
  }

  #[test]
  fn test_serialize_roundtrip() {
    let mut fl = FilterList::new();
    fl.add();
    fl.add();
    {
      let c = fl.get_mut(1).unwrap();
      c.boolean = AndOr::Or;
      c.negated = true;
      c.field = "gene_info".to_string();
      c.operator = Operator::Contains;
      c.value = "BRCA".to_string();
    }
    let text = fl.serialize();
    assert_eq!(FilterList::deserialize(&text), fl);
  }

  #[test]
  fn test_serialized_shape() {
    let mut fl = FilterList::new();
    fl.add();
    let v: serde_json::Value = serde_json::from_str(&fl.serialize()).unwrap();
    assert_eq!(
      v,
      serde_json::json!([{
        "id": 0,
        "boolean": "AND",
        "negated": false,
        "field": "",
        "operator": "equals",
        "value": ""
      }])
    );
  }

  #[test]
  fn test_deserialize_bad_input() {
    assert!(FilterList::deserialize("not json").is_empty());
    // missing keys
    assert!(FilterList::deserialize(r#"[{"id":1}]"#).is_empty());
    // unknown operator
    assert!(FilterList::deserialize(
      r#"[{"id":0,"boolean":"AND","negated":false,"field":"","operator":"matches","value":""}]"#
    )
    .is_empty());
    // not an array
    assert!(FilterList::deserialize(r#"{"id":1}"#).is_empty());
  }

  #[test]
  fn test_deserialize_resumes_id_counter() {
    let mut fl = FilterList::deserialize(
      r#"[{"id":7,"boolean":"OR","negated":true,"field":"chr","operator":"equals","value":"chr1"}]"#,
    );
    assert_eq!(fl.len(), 1);
    assert_eq!(fl.add(), 8);
  }

  #[test]
  fn test_allowed_operators_no_field() {
    assert_eq!(allowed_operators(None), BOTH_OPERATORS.to_vec());
  }

  #[test]
  fn test_allowed_operators_text_nullable() {
    let ops = allowed_operators(Some(&field("text", "YES")));
    assert_eq!(&ops[0..5], &BOTH_OPERATORS);
    assert!(ops.contains(&Operator::Contains));
    assert!(ops.contains(&Operator::StartsWith));
    assert!(ops.contains(&Operator::EndsWith));
    assert!(ops.contains(&Operator::IsNull));
    assert_eq!(ops.len(), 9);
  }

  #[test]
  fn test_allowed_operators_integer_not_nullable() {
    let ops = allowed_operators(Some(&field("integer", "NO")));
    assert_eq!(ops, BOTH_OPERATORS.to_vec());
  }

  #[test]
  fn test_allowed_operators_nullable_only() {
    let ops = allowed_operators(Some(&field("integer", "YES")));
    assert_eq!(ops.len(), 6);
    assert!(ops.contains(&Operator::IsNull));
    assert!(!ops.contains(&Operator::Contains));
  }
}
