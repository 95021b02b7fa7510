// farm.rs
use crate::DomainError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Saldo inicial en écus de toda granja nueva.
pub const DEFAULT_BALANCE: i64 = 1500;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Farm {
  pub id: i64,
  pub name: String,
  pub balance: i64,
}

/// Datos para crear una granja. Si `balance` es `None` se usa
/// `DEFAULT_BALANCE`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewFarm {
  name: String,
  balance: Option<i64>,
}

impl NewFarm {
  pub fn new(name: &str) -> Result<Self, DomainError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
      return Err(DomainError::ValidationError("El nombre de la granja no puede estar vacío".to_string()));
    }
    Ok(Self { name: trimmed.to_string(), balance: None })
  }

  pub fn with_balance(mut self, balance: i64) -> Self {
    self.balance = Some(balance);
    self
  }

  pub fn name(&self) -> &str {
    &self.name
  }

  pub fn balance(&self) -> Option<i64> {
    self.balance
  }

  pub fn balance_or_default(&self) -> i64 {
    self.balance.unwrap_or(DEFAULT_BALANCE)
  }
}

impl fmt::Display for Farm {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "Farm(#{} {}, {} écus)", self.id, self.name, self.balance)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn new_farm_rejects_blank_names() {
    assert!(matches!(NewFarm::new("   "), Err(DomainError::ValidationError(_))));
  }

  #[test]
  fn new_farm_defaults_balance() {
    let nf = NewFarm::new(" MaFermeTest ").unwrap();
    assert_eq!(nf.name(), "MaFermeTest");
    assert_eq!(nf.balance(), None);
    assert_eq!(nf.balance_or_default(), 1500);
    assert_eq!(nf.with_balance(20).balance_or_default(), 20);
  }
}
