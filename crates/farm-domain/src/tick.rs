// Archivo: tick.rs
// Propósito: reglas de la "noche" (tick diario) que hace avanzar todas las
// granjas un día: envejecimiento, pérdida de peso por hambre, mortalidad y
// producción de huevos y leche.
//
// `advance_day` es la versión pura sobre una lista de animales; los
// repositorios la aplican (en memoria) o la traducen a SQL (Diesel)
// respetando el mismo orden de pasos.
use crate::{Animal, DomainError, NewProduction, ProductKind, Species};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashSet};

/// Parámetros de la noche.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickConfig {
  /// Peso que pierde cada animal no alimentado en el día.
  pub decay_per_tick: f64,
  /// Peso mínimo de una gallina para poner huevos.
  pub laying_min_weight: f64,
  /// Edad mínima (ya envejecida) de una gallina ponedora.
  pub laying_min_age: i32,
  /// Peso mínimo de una vaca para dar leche.
  pub milking_min_weight: f64,
  /// Litros producidos por granja con al menos una vaca lechera.
  pub milk_yield: i64,
}

impl Default for TickConfig {
  fn default() -> Self {
    Self { decay_per_tick: 0.2, laying_min_weight: 2.5, laying_min_age: 5, milking_min_weight: 80.0, milk_yield: 8 }
  }
}

impl TickConfig {
  pub fn with_decay(mut self, decay_per_tick: f64) -> Self {
    self.decay_per_tick = decay_per_tick;
    self
  }

  pub fn validate(&self) -> Result<(), DomainError> {
    for (name, v) in [("decay_per_tick", self.decay_per_tick),
                      ("laying_min_weight", self.laying_min_weight),
                      ("milking_min_weight", self.milking_min_weight)]
    {
      if !v.is_finite() || v < 0.0 {
        return Err(DomainError::ValidationError(format!("{} debe ser un número finito >= 0 (recibido {})", name, v)));
      }
    }
    if self.laying_min_age < 0 {
      return Err(DomainError::ValidationError(format!("laying_min_age debe ser >= 0 (recibido {})",
                                                      self.laying_min_age)));
    }
    if self.milk_yield < 0 {
      return Err(DomainError::ValidationError(format!("milk_yield debe ser >= 0 (recibido {})", self.milk_yield)));
    }
    Ok(())
  }

  pub fn lays_eggs(&self, animal: &Animal) -> bool {
    animal.species == Species::Hen && animal.weight >= self.laying_min_weight && animal.age >= self.laying_min_age
  }

  pub fn gives_milk(&self, animal: &Animal) -> bool {
    animal.species == Species::Cow && animal.weight >= self.milking_min_weight
  }
}

/// Resumen de lo ocurrido durante una noche.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickReport {
  pub date: NaiveDate,
  /// Animales envejecidos (todos los vivos al empezar la noche).
  pub aged: usize,
  /// Animales que perdieron peso por no haber comido.
  pub starved: usize,
  /// Ids de los animales retirados por peso <= 0.
  pub dead: Vec<i64>,
  /// Filas de producción insertadas: huevos por granja y luego leche por
  /// granja, cada bloque ordenado por `farm_id`.
  pub productions: Vec<NewProduction>,
}

impl TickReport {
  pub fn eggs_for(&self, farm_id: i64) -> i64 {
    self.quantity_for(farm_id, &ProductKind::Egg)
  }

  pub fn milk_for(&self, farm_id: i64) -> i64 {
    self.quantity_for(farm_id, &ProductKind::Milk)
  }

  fn quantity_for(&self, farm_id: i64, kind: &ProductKind) -> i64 {
    self.productions.iter().filter(|p| p.farm_id == farm_id && &p.kind == kind).map(|p| p.quantity).sum()
  }
}

/// Aplica una noche completa sobre `animals` en el orden fijo
/// envejecer → hambre → mortalidad → huevos → leche. `fed` contiene los
/// ids de los animales con registro de alimentación en `today`.
///
/// Los animales muertos se eliminan de `animals`; el llamador es
/// responsable de borrar sus registros de alimentación.
pub fn advance_day(animals: &mut Vec<Animal>,
                   fed: &HashSet<i64>,
                   today: NaiveDate,
                   config: &TickConfig)
                   -> TickReport {
  let aged = animals.len();
  for a in animals.iter_mut() {
    a.age += 1;
  }

  let mut starved = 0;
  for a in animals.iter_mut().filter(|a| !fed.contains(&a.id)) {
    a.weight -= config.decay_per_tick;
    starved += 1;
  }

  let mut dead = Vec::new();
  animals.retain(|a| {
           if a.is_dead() {
             dead.push(a.id);
             false
           } else {
             true
           }
         });
  dead.sort_unstable();

  let mut layers: BTreeMap<i64, i64> = BTreeMap::new();
  let mut milkers: BTreeSet<i64> = BTreeSet::new();
  for a in animals.iter() {
    if config.lays_eggs(a) {
      *layers.entry(a.farm_id).or_default() += 1;
    }
    if config.gives_milk(a) {
      milkers.insert(a.farm_id);
    }
  }

  let mut productions: Vec<NewProduction> =
    layers.into_iter()
          .filter(|(_, count)| *count >= 1)
          .map(|(farm_id, quantity)| NewProduction { kind: ProductKind::Egg, quantity, farm_id })
          .collect();
  productions.extend(milkers.into_iter()
                            .map(|farm_id| NewProduction { kind: ProductKind::Milk, quantity: config.milk_yield, farm_id }));

  log::debug!("noche {}: {} envejecidos, {} sin comer, {} muertos, {} filas de producción",
              today,
              aged,
              starved,
              dead.len(),
              productions.len());

  TickReport { date: today, aged, starved, dead, productions }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{NewAnimal, Sex};

  fn day() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 3, 14).unwrap()
  }

  fn animal(id: i64, farm_id: i64, species: Species, weight: f64, age: i32) -> Animal {
    Animal { id, species, weight, age, sex: Some(Sex::Female), farm_id }
  }

  #[test]
  fn fed_animals_keep_weight_and_unfed_lose_it() {
    let mut animals = vec![animal(1, 1, Species::Hen, 2.5, 5), animal(2, 2, Species::Hen, 2.5, 5)];
    let fed: HashSet<i64> = [1].into_iter().collect();
    let report = advance_day(&mut animals, &fed, day(), &TickConfig::default());
    assert_eq!(report.aged, 2);
    assert_eq!(report.starved, 1);
    assert!(report.dead.is_empty());
    assert_eq!(animals[0].weight, 2.5);
    assert_eq!(animals[0].age, 6);
    assert!(animals[1].weight < 2.5);
    assert!((animals[1].weight - 2.3).abs() < 1e-9);
  }

  #[test]
  fn two_farm_night_produces_eggs_and_milk_only_for_the_fed_farm() {
    let mut animals = vec![animal(1, 1, Species::Hen, 2.5, 5),
                           animal(2, 2, Species::Hen, 2.5, 5),
                           animal(3, 1, Species::Cow, 80.0, 10)];
    let fed: HashSet<i64> = [1, 3].into_iter().collect();
    let report = advance_day(&mut animals, &fed, day(), &TickConfig::default());
    assert_eq!(report.eggs_for(1), 1);
    assert_eq!(report.eggs_for(2), 0);
    assert_eq!(report.milk_for(1), 8);
    assert_eq!(report.milk_for(2), 0);
    assert_eq!(report.productions.len(), 2);
    assert_eq!(report.productions[0].kind, ProductKind::Egg);
    assert_eq!(report.productions[1].kind, ProductKind::Milk);
  }

  #[test]
  fn starving_hen_dies_once_weight_reaches_zero() {
    let config = TickConfig::default().with_decay(0.5);
    let mut animals = vec![animal(9, 1, Species::Hen, 2.5, 5)];
    let fed = HashSet::new();
    for _ in 0..4 {
      let r = advance_day(&mut animals, &fed, day(), &config);
      assert!(r.dead.is_empty());
    }
    assert!((animals[0].weight - 0.5).abs() < 1e-9);
    let r = advance_day(&mut animals, &fed, day(), &config);
    assert_eq!(r.dead, vec![9]);
    assert!(animals.is_empty());
    assert!(r.productions.is_empty());
  }

  #[test]
  fn dead_animals_do_not_produce() {
    let config = TickConfig::default().with_decay(100.0);
    let mut animals = vec![animal(1, 1, Species::Cow, 80.0, 3), animal(2, 1, Species::Hen, 3.0, 8)];
    let report = advance_day(&mut animals, &HashSet::new(), day(), &config);
    assert_eq!(report.dead, vec![1, 2]);
    assert!(report.productions.is_empty());
  }

  #[test]
  fn young_or_light_hens_do_not_lay() {
    let mut animals = vec![animal(1, 1, Species::Hen, 2.5, 3),
                           animal(2, 1, Species::Hen, 2.4, 9),
                           animal(3, 1, Species::Hen, 2.6, 4)];
    let fed: HashSet<i64> = [1, 2, 3].into_iter().collect();
    let report = advance_day(&mut animals, &fed, day(), &TickConfig::default());
    // sólo la gallina 3 alcanza la edad (4 + 1) con peso suficiente
    assert_eq!(report.eggs_for(1), 1);
  }

  #[test]
  fn several_cows_in_one_farm_yield_a_single_milk_row() {
    let mut animals = vec![animal(1, 4, Species::Cow, 90.0, 3), animal(2, 4, Species::Cow, 85.0, 5)];
    let fed: HashSet<i64> = [1, 2].into_iter().collect();
    let report = advance_day(&mut animals, &fed, day(), &TickConfig::default());
    assert_eq!(report.productions,
               vec![NewProduction { kind: ProductKind::Milk, quantity: 8, farm_id: 4 }]);
  }

  #[test]
  fn config_validation_rejects_negative_values() {
    assert!(TickConfig::default().validate().is_ok());
    assert!(TickConfig::default().with_decay(-0.1).validate().is_err());
    assert!(TickConfig::default().with_decay(f64::INFINITY).validate().is_err());
    let mut c = TickConfig::default();
    c.milk_yield = -1;
    assert!(c.validate().is_err());
  }

  #[test]
  fn report_round_trips_through_json() {
    let mut animals = vec![animal(1, 1, Species::Hen, 2.5, 5), animal(2, 1, Species::Cow, 80.0, 3)];
    let fed: HashSet<i64> = [1, 2].into_iter().collect();
    let report = advance_day(&mut animals, &fed, day(), &TickConfig::default());
    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["date"], "2025-03-14");
    assert_eq!(json["aged"], 2);
    assert_eq!(json["productions"][0]["quantity"], 1);
    assert_eq!(json["productions"][1]["quantity"], 8);
    let back: TickReport = serde_json::from_value(json).unwrap();
    assert_eq!(back, report);
  }

  #[test]
  fn new_animal_helpers_feed_the_rules() {
    let config = TickConfig::default();
    let hen = NewAnimal::hen(1, 2.5, 5).unwrap().into_animal(1);
    let cow = NewAnimal::cow(1, 79.9, 5).unwrap().into_animal(2);
    assert!(config.lays_eggs(&hen));
    assert!(!config.gives_milk(&cow));
  }
}
