// Archivo: errors.rs
// Propósito: errores del simulador y el alias Result<T> usado por sus APIs.
use thiserror::Error;

/// Errores del simulador de granjas.
///
/// - `Domain`: errores del dominio o de la persistencia (incluye
///   `DuplicateFeeding`).
/// - `Config`: variable de entorno con valor inválido.
#[derive(Error, Debug)]
pub enum SimError {
    /// Errores originados por el dominio o el repositorio.
    #[error("Error de dominio: {0}")]
    Domain(#[from] farm_domain::DomainError),

    /// Configuración inválida (variable y motivo).
    #[error("Configuración inválida: {0}")]
    Config(String),
}

/// Alias de resultado usado por las APIs del crate.
pub type Result<T> = std::result::Result<T, SimError>;
