use crate::tick::{advance_day, TickConfig, TickReport};
use crate::{Animal, DomainError, Farm, FeedingEvent, NewAnimal, NewFarm, NewStock, Production, StockEntry};
use chrono::NaiveDate;
use std::collections::{BTreeMap, HashSet};
use std::sync::{Mutex, MutexGuard};

/// Trait que define las operaciones de persistencia de las granjas.
///
/// Borrar una granja o un animal arrastra sus dependientes (animales,
/// stock, producción, registros de alimentación) en la misma operación.
pub trait FarmRepository: Send + Sync {
  /// Crea una granja; el saldo por defecto es `DEFAULT_BALANCE`.
  fn create_farm(&self, farm: NewFarm) -> Result<Farm, DomainError>;

  fn get_farm(&self, id: i64) -> Result<Option<Farm>, DomainError>;

  /// Lista todas las granjas ordenadas por id.
  fn list_farms(&self) -> Result<Vec<Farm>, DomainError>;

  /// Elimina una granja con sus animales, stock, producción y los
  /// registros de alimentación de sus animales. `NotFound` si no existe.
  fn delete_farm(&self, id: i64) -> Result<(), DomainError>;

  /// Da de alta un animal tal cual se recibe. `NotFound` si la granja no
  /// existe.
  fn add_animal(&self, animal: NewAnimal) -> Result<Animal, DomainError>;

  fn get_animal(&self, id: i64) -> Result<Option<Animal>, DomainError>;

  /// Animales de una granja ordenados por id.
  fn list_animals(&self, farm_id: i64) -> Result<Vec<Animal>, DomainError>;

  /// Retira un animal y sus registros de alimentación.
  fn remove_animal(&self, id: i64) -> Result<(), DomainError>;

  fn add_stock(&self, stock: NewStock) -> Result<StockEntry, DomainError>;

  fn list_stock(&self, farm_id: i64) -> Result<Vec<StockEntry>, DomainError>;

  /// Registra que `animal_id` comió el día `date`. Falla con
  /// `DuplicateFeeding` si ya existe un registro para ese día; el registro
  /// previo se mantiene.
  fn record_feeding(&self, animal_id: i64, date: NaiveDate) -> Result<FeedingEvent, DomainError>;

  fn list_feedings(&self, animal_id: i64) -> Result<Vec<FeedingEvent>, DomainError>;

  fn list_production(&self, farm_id: i64) -> Result<Vec<Production>, DomainError>;

  /// Ejecuta la noche `today` sobre todas las granjas de forma atómica: o
  /// se aplican los cinco pasos o el estado queda como estaba.
  fn run_daily_tick(&self, today: NaiveDate, config: &TickConfig) -> Result<TickReport, DomainError>;
}

#[derive(Default)]
struct MemoryState {
  last_id: i64,
  farms: BTreeMap<i64, Farm>,
  animals: BTreeMap<i64, Animal>,
  stock: BTreeMap<i64, StockEntry>,
  feedings: BTreeMap<i64, FeedingEvent>,
  production: BTreeMap<i64, Production>,
}

impl MemoryState {
  fn next_id(&mut self) -> i64 {
    self.last_id += 1;
    self.last_id
  }

  fn drop_feedings_of(&mut self, animal_ids: &HashSet<i64>) {
    self.feedings.retain(|_, f| !animal_ids.contains(&f.animal_id));
  }
}

/// Implementación en memoria para tests y desarrollo.
///
/// Todo el estado vive tras un único `Mutex`, de modo que cada operación
/// (y en particular la noche completa) es atómica respecto a las demás.
pub struct InMemoryFarmRepository {
  state: Mutex<MemoryState>,
}

impl InMemoryFarmRepository {
  pub fn new() -> Self {
    Self { state: Mutex::new(MemoryState::default()) }
  }

  fn lock(&self) -> Result<MutexGuard<'_, MemoryState>, DomainError> {
    self.state.lock().map_err(|e| DomainError::ExternalError(format!("Mutex 'state' poisoned: {}", e)))
  }
}

impl Default for InMemoryFarmRepository {
  fn default() -> Self {
    Self::new()
  }
}

impl FarmRepository for InMemoryFarmRepository {
  fn create_farm(&self, farm: NewFarm) -> Result<Farm, DomainError> {
    let mut st = self.lock()?;
    let id = st.next_id();
    let created = Farm { id, name: farm.name().to_string(), balance: farm.balance_or_default() };
    st.farms.insert(id, created.clone());
    Ok(created)
  }

  fn get_farm(&self, id: i64) -> Result<Option<Farm>, DomainError> {
    Ok(self.lock()?.farms.get(&id).cloned())
  }

  fn list_farms(&self) -> Result<Vec<Farm>, DomainError> {
    Ok(self.lock()?.farms.values().cloned().collect())
  }

  fn delete_farm(&self, id: i64) -> Result<(), DomainError> {
    let mut st = self.lock()?;
    if st.farms.remove(&id).is_none() {
      return Err(DomainError::NotFound(format!("granja {}", id)));
    }
    let animal_ids: HashSet<i64> = st.animals.values().filter(|a| a.farm_id == id).map(|a| a.id).collect();
    st.drop_feedings_of(&animal_ids);
    st.animals.retain(|_, a| a.farm_id != id);
    st.stock.retain(|_, s| s.farm_id != id);
    st.production.retain(|_, p| p.farm_id != id);
    Ok(())
  }

  fn add_animal(&self, animal: NewAnimal) -> Result<Animal, DomainError> {
    let mut st = self.lock()?;
    if !st.farms.contains_key(&animal.farm_id()) {
      return Err(DomainError::NotFound(format!("granja {}", animal.farm_id())));
    }
    let id = st.next_id();
    let created = animal.into_animal(id);
    st.animals.insert(id, created.clone());
    Ok(created)
  }

  fn get_animal(&self, id: i64) -> Result<Option<Animal>, DomainError> {
    Ok(self.lock()?.animals.get(&id).cloned())
  }

  fn list_animals(&self, farm_id: i64) -> Result<Vec<Animal>, DomainError> {
    Ok(self.lock()?.animals.values().filter(|a| a.farm_id == farm_id).cloned().collect())
  }

  fn remove_animal(&self, id: i64) -> Result<(), DomainError> {
    let mut st = self.lock()?;
    if st.animals.remove(&id).is_none() {
      return Err(DomainError::NotFound(format!("animal {}", id)));
    }
    st.drop_feedings_of(&HashSet::from([id]));
    Ok(())
  }

  fn add_stock(&self, stock: NewStock) -> Result<StockEntry, DomainError> {
    let mut st = self.lock()?;
    if !st.farms.contains_key(&stock.farm_id()) {
      return Err(DomainError::NotFound(format!("granja {}", stock.farm_id())));
    }
    let id = st.next_id();
    let created = stock.into_entry(id);
    st.stock.insert(id, created.clone());
    Ok(created)
  }

  fn list_stock(&self, farm_id: i64) -> Result<Vec<StockEntry>, DomainError> {
    Ok(self.lock()?.stock.values().filter(|s| s.farm_id == farm_id).cloned().collect())
  }

  fn record_feeding(&self, animal_id: i64, date: NaiveDate) -> Result<FeedingEvent, DomainError> {
    let mut st = self.lock()?;
    if !st.animals.contains_key(&animal_id) {
      return Err(DomainError::NotFound(format!("animal {}", animal_id)));
    }
    if st.feedings.values().any(|f| f.animal_id == animal_id && f.date == date) {
      return Err(DomainError::DuplicateFeeding { animal_id, date });
    }
    let id = st.next_id();
    let event = FeedingEvent { id, animal_id, date };
    st.feedings.insert(id, event.clone());
    Ok(event)
  }

  fn list_feedings(&self, animal_id: i64) -> Result<Vec<FeedingEvent>, DomainError> {
    Ok(self.lock()?.feedings.values().filter(|f| f.animal_id == animal_id).cloned().collect())
  }

  fn list_production(&self, farm_id: i64) -> Result<Vec<Production>, DomainError> {
    Ok(self.lock()?.production.values().filter(|p| p.farm_id == farm_id).cloned().collect())
  }

  fn run_daily_tick(&self, today: NaiveDate, config: &TickConfig) -> Result<TickReport, DomainError> {
    config.validate()?;
    let mut st = self.lock()?;
    let fed: HashSet<i64> = st.feedings.values().filter(|f| f.date == today).map(|f| f.animal_id).collect();
    let mut animals: Vec<Animal> = st.animals.values().cloned().collect();
    let report = advance_day(&mut animals, &fed, today, config);

    let dead: HashSet<i64> = report.dead.iter().copied().collect();
    st.drop_feedings_of(&dead);
    st.animals = animals.into_iter().map(|a| (a.id, a)).collect();
    for p in report.productions.iter().cloned() {
      let id = st.next_id();
      st.production.insert(id, p.into_production(id));
    }
    Ok(report)
  }
}
