// Archivo: config.rs
// Propósito: cargar la configuración del simulador desde el entorno
// (`.env` vía dotenvy + variables `FARM_*`).
use crate::errors::{Result, SimError};
use farm_domain::TickConfig;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Configuración del simulador. Hoy sólo contiene los parámetros de la
/// noche; la URL de la base la lee directamente `farm-persistence`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SimConfig {
    pub tick: TickConfig,
}

impl SimConfig {
    /// Carga `.env` si existe y lee las variables del proceso.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Construye la configuración a partir de una función de búsqueda de
    /// variables; las ausentes toman el valor por defecto.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
        where F: Fn(&str) -> Option<String>
    {
        let defaults = TickConfig::default();
        let tick = TickConfig { decay_per_tick: parse_or(&lookup, "FARM_DECAY_RATE", defaults.decay_per_tick)?,
                                laying_min_weight: parse_or(&lookup, "FARM_LAYING_MIN_WEIGHT", defaults.laying_min_weight)?,
                                laying_min_age: parse_or(&lookup, "FARM_LAYING_MIN_AGE", defaults.laying_min_age)?,
                                milking_min_weight: parse_or(&lookup, "FARM_MILKING_MIN_WEIGHT", defaults.milking_min_weight)?,
                                milk_yield: parse_or(&lookup, "FARM_MILK_YIELD", defaults.milk_yield)? };
        tick.validate().map_err(|e| SimError::Config(e.to_string()))?;
        Ok(Self { tick })
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
    where F: Fn(&str) -> Option<String>,
          T: FromStr,
          T::Err: std::fmt::Display
{
    match lookup(key) {
        Some(raw) if !raw.trim().is_empty() => {
            raw.trim().parse::<T>().map_err(|e| SimError::Config(format!("{}='{}': {}", key, raw, e)))
        }
        _ => Ok(default),
    }
}
