// production.rs
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProductKind {
  Egg,
  Milk,
  Other(String),
}

impl ProductKind {
  pub fn code(&self) -> &str {
    match self {
      ProductKind::Egg => "oeuf",
      ProductKind::Milk => "lait",
      ProductKind::Other(s) => s.as_str(),
    }
  }

  pub fn from_code(code: &str) -> Self {
    match code {
      "oeuf" => ProductKind::Egg,
      "lait" => ProductKind::Milk,
      other => ProductKind::Other(other.to_string()),
    }
  }
}

impl fmt::Display for ProductKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.code())
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Production {
  pub id: i64,
  pub kind: ProductKind,
  pub quantity: i64,
  pub farm_id: i64,
}

/// Producción generada por una noche, antes de tener id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewProduction {
  pub kind: ProductKind,
  pub quantity: i64,
  pub farm_id: i64,
}

impl NewProduction {
  pub fn into_production(self, id: i64) -> Production {
    Production { id, kind: self.kind, quantity: self.quantity, farm_id: self.farm_id }
  }
}
