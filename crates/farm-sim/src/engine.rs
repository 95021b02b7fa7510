// Archivo: engine.rs
// Propósito: implementar `TickEngine`, que serializa las noches y delega su
// ejecución atómica en el `FarmRepository`.
use crate::errors::Result;
use chrono::NaiveDate;
use farm_domain::{DomainError, FarmRepository, TickConfig, TickReport};
use std::sync::{Arc, Mutex};

/// Motor de noches.
///
/// Responsabilidades principales:
/// - Garantizar que dos noches lanzadas por el mismo motor no se solapen
///   (un `Mutex` envuelve cada ejecución).
/// - Pasar la fecha de forma explícita al repositorio: el motor no lee el
///   reloj.
/// - Registrar (log) el resultado de cada noche.
pub struct TickEngine<R>
    where R: FarmRepository
{
    repo: Arc<R>,
    config: TickConfig,
    /// Fecha de la última noche aplicada con éxito.
    last_night: Mutex<Option<NaiveDate>>,
}

impl<R> TickEngine<R> where R: FarmRepository
{
    pub fn new(repo: Arc<R>, config: TickConfig) -> Self {
        Self { repo, config, last_night: Mutex::new(None) }
    }

    pub fn config(&self) -> &TickConfig {
        &self.config
    }

    /// Aplica la noche `today` a todas las granjas.
    pub fn run_night(&self, today: NaiveDate) -> Result<TickReport> {
        let mut last = self.last_night
                           .lock()
                           .map_err(|e| DomainError::ExternalError(format!("mutex poisoned: {:?}", e)))?;
        if let Some(prev) = *last {
            if today <= prev {
                log::warn!("noche {} lanzada después de la del {}", today, prev);
            }
        }
        log::debug!("iniciando noche {} con {:?}", today, self.config);
        let report = self.repo.run_daily_tick(today, &self.config)?;
        *last = Some(today);
        Ok(report)
    }

    /// Aplica `nights` noches consecutivas empezando en `start`. Se detiene
    /// en el primer error; las noches anteriores quedan aplicadas.
    pub fn run_nights(&self, start: NaiveDate, nights: u32) -> Result<Vec<TickReport>> {
        let mut reports = Vec::new();
        let mut day = start;
        for _ in 0..nights {
            reports.push(self.run_night(day)?);
            day = day.succ_opt()
                     .ok_or_else(|| DomainError::ValidationError(format!("fecha fuera de rango tras {}", day)))?;
        }
        Ok(reports)
    }

    /// Fecha de la última noche aplicada por este motor, si la hay.
    pub fn last_night(&self) -> Option<NaiveDate> {
        *self.last_night.lock().unwrap_or_else(|e| e.into_inner())
    }
}
