// stock.rs
use crate::DomainError;
use serde::{Deserialize, Serialize};

/// Entrada de stock de alimento de una granja (p. ej. `paille`, `grain`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockEntry {
  pub id: i64,
  pub feed_type: String,
  pub quantity: i64,
  pub farm_id: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewStock {
  feed_type: String,
  quantity: i64,
  farm_id: i64,
}

impl NewStock {
  pub fn new(farm_id: i64, feed_type: &str, quantity: i64) -> Result<Self, DomainError> {
    if feed_type.trim().is_empty() {
      return Err(DomainError::ValidationError("El tipo de alimento no puede estar vacío".to_string()));
    }
    if quantity < 0 {
      return Err(DomainError::ValidationError(format!("Cantidad de stock inválida: {}", quantity)));
    }
    Ok(Self { feed_type: feed_type.trim().to_string(), quantity, farm_id })
  }

  pub fn feed_type(&self) -> &str {
    &self.feed_type
  }

  pub fn quantity(&self) -> i64 {
    self.quantity
  }

  pub fn farm_id(&self) -> i64 {
    self.farm_id
  }

  pub fn into_entry(self, id: i64) -> StockEntry {
    StockEntry { id, feed_type: self.feed_type, quantity: self.quantity, farm_id: self.farm_id }
  }
}
