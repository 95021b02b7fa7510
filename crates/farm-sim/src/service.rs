// Archivo: service.rs
// Propósito: implementar `FarmService`, la capa orquestadora que expone las
// operaciones de alto nivel sobre granjas (alta, alimentación, noches).
// Está pensada para ser invocada desde el CLI o desde un handler HTTP.
use crate::config::SimConfig;
use crate::engine::TickEngine;
use crate::errors::Result;
use chrono::NaiveDate;
use farm_domain::{
    Animal, DomainError, Farm, FarmRepository, FeedingEvent, NewAnimal, NewFarm, NewStock, Production, StockEntry,
    TickReport,
};
use serde::Serialize;
use std::sync::Arc;

/// Vista completa de una granja.
#[derive(Debug, Clone, Serialize)]
pub struct FarmOverview {
    pub farm: Farm,
    pub animals: Vec<Animal>,
    pub stock: Vec<StockEntry>,
    pub production: Vec<Production>,
}

/// Servicio de alto nivel sobre granjas.
pub struct FarmService<R> where R: FarmRepository
{
    repo: Arc<R>,
    engine: Arc<TickEngine<R>>,
}

impl<R> FarmService<R> where R: FarmRepository + 'static
{
    /// Crea el servicio inyectando el repositorio; el `TickEngine` se
    /// construye internamente con `config.tick`.
    pub fn new(repo: Arc<R>, config: SimConfig) -> Self {
        let engine = Arc::new(TickEngine::new(repo.clone(), config.tick));
        Self { repo, engine }
    }

    pub fn engine(&self) -> Arc<TickEngine<R>> {
        self.engine.clone()
    }

    /// Abre una granja; sin `balance` empieza con el saldo por defecto.
    pub fn open_farm(&self, name: &str, balance: Option<i64>) -> Result<Farm> {
        let mut new_farm = NewFarm::new(name)?;
        if let Some(b) = balance {
            new_farm = new_farm.with_balance(b);
        }
        Ok(self.repo.create_farm(new_farm)?)
    }

    pub fn farms(&self) -> Result<Vec<Farm>> {
        Ok(self.repo.list_farms()?)
    }

    pub fn close_farm(&self, farm_id: i64) -> Result<()> {
        Ok(self.repo.delete_farm(farm_id)?)
    }

    pub fn add_animal(&self, animal: NewAnimal) -> Result<Animal> {
        let created = self.repo.add_animal(animal)?;
        log::info!("nuevo animal {}", created);
        Ok(created)
    }

    pub fn add_stock(&self, farm_id: i64, feed_type: &str, quantity: i64) -> Result<StockEntry> {
        Ok(self.repo.add_stock(NewStock::new(farm_id, feed_type, quantity)?)?)
    }

    /// Alimenta un animal el día `date`. Un segundo intento el mismo día
    /// devuelve `DuplicateFeeding` sin reintentos.
    pub fn feed(&self, animal_id: i64, date: NaiveDate) -> Result<FeedingEvent> {
        Ok(self.repo.record_feeding(animal_id, date)?)
    }

    /// Alimenta todos los animales de una granja el día `date`. Los que ya
    /// habían comido ese día se omiten. Devuelve cuántos se alimentaron ahora.
    pub fn feed_farm(&self, farm_id: i64, date: NaiveDate) -> Result<usize> {
        if self.repo.get_farm(farm_id)?.is_none() {
            return Err(DomainError::NotFound(format!("granja {}", farm_id)).into());
        }
        let mut fed = 0;
        for animal in self.repo.list_animals(farm_id)? {
            match self.repo.record_feeding(animal.id, date) {
                Ok(_) => fed += 1,
                Err(DomainError::DuplicateFeeding { .. }) => {
                    log::debug!("animal {} ya había comido el {}", animal.id, date);
                }
                Err(e) => return Err(e.into()),
            }
        }
        log::info!("granja {}: {} animales alimentados el {}", farm_id, fed, date);
        Ok(fed)
    }

    pub fn run_night(&self, today: NaiveDate) -> Result<TickReport> {
        self.engine.run_night(today)
    }

    pub fn run_nights(&self, start: NaiveDate, nights: u32) -> Result<Vec<TickReport>> {
        self.engine.run_nights(start, nights)
    }

    pub fn farm_overview(&self, farm_id: i64) -> Result<FarmOverview> {
        let farm = self.repo
                       .get_farm(farm_id)?
                       .ok_or_else(|| DomainError::NotFound(format!("granja {}", farm_id)))?;
        Ok(FarmOverview { animals: self.repo.list_animals(farm_id)?,
                          stock: self.repo.list_stock(farm_id)?,
                          production: self.repo.list_production(farm_id)?,
                          farm })
    }
}
