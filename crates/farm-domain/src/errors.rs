// errors.rs
use chrono::NaiveDate;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum DomainError {
  #[error("El animal {animal_id} ya fue alimentado el {date}")]
  DuplicateFeeding { animal_id: i64, date: NaiveDate },
  #[error("No encontrado: {0}")]
  NotFound(String),
  #[error("Error de validación: {0}")]
  ValidationError(String),
  #[error("Error externo: {0}")]
  ExternalError(String),
}

