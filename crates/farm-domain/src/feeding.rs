// feeding.rs
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Registro de alimentación: como máximo uno por animal y día.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedingEvent {
  pub id: i64,
  pub animal_id: i64,
  pub date: NaiveDate,
}
