// animal.rs
use crate::DomainError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Especie de un animal. Los códigos persistidos son los del esquema
/// compartido con la API externa (`poule`, `vache`); cualquier otro texto se
/// conserva tal cual en `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Species {
  Hen,
  Cow,
  Other(String),
}

impl Species {
  pub fn code(&self) -> &str {
    match self {
      Species::Hen => "poule",
      Species::Cow => "vache",
      Species::Other(s) => s.as_str(),
    }
  }

  pub fn from_code(code: &str) -> Self {
    match code {
      "poule" => Species::Hen,
      "vache" => Species::Cow,
      other => Species::Other(other.to_string()),
    }
  }
}

impl fmt::Display for Species {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.code())
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Sex {
  Male,
  Female,
}

impl Sex {
  pub fn code(&self) -> &'static str {
    match self {
      Sex::Male => "male",
      Sex::Female => "femelle",
    }
  }
}

impl FromStr for Sex {
  type Err = DomainError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.trim() {
      "male" => Ok(Sex::Male),
      "femelle" => Ok(Sex::Female),
      other => Err(DomainError::ValidationError(format!("Sexo inválido '{}': se espera 'male' o 'femelle'", other))),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Animal {
  pub id: i64,
  pub species: Species,
  pub weight: f64,
  pub age: i32,
  pub sex: Option<Sex>,
  pub farm_id: i64,
}

impl Animal {
  /// Un animal con peso nulo o negativo está muerto y debe retirarse.
  pub fn is_dead(&self) -> bool {
    self.weight <= 0.0
  }
}

impl fmt::Display for Animal {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f,
           "Animal(#{} {} {:.2} kg, {} días, granja {})",
           self.id, self.species, self.weight, self.age, self.farm_id)
  }
}

/// Datos validados para dar de alta un animal en una granja.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewAnimal {
  species: Species,
  weight: f64,
  age: i32,
  sex: Option<Sex>,
  farm_id: i64,
}

impl NewAnimal {
  pub fn new(farm_id: i64, species: Species, weight: f64, age: i32, sex: Option<Sex>) -> Result<Self, DomainError> {
    if species.code().trim().is_empty() {
      return Err(DomainError::ValidationError("La especie no puede estar vacía".to_string()));
    }
    if !weight.is_finite() || weight <= 0.0 {
      return Err(DomainError::ValidationError(format!("Peso inválido: {}", weight)));
    }
    if age < 0 {
      return Err(DomainError::ValidationError(format!("Edad inválida: {}", age)));
    }
    Ok(Self { species, weight, age, sex, farm_id })
  }

  pub fn hen(farm_id: i64, weight: f64, age: i32) -> Result<Self, DomainError> {
    Self::new(farm_id, Species::Hen, weight, age, Some(Sex::Female))
  }

  pub fn cow(farm_id: i64, weight: f64, age: i32) -> Result<Self, DomainError> {
    Self::new(farm_id, Species::Cow, weight, age, Some(Sex::Female))
  }

  pub fn species(&self) -> &Species {
    &self.species
  }

  pub fn weight(&self) -> f64 {
    self.weight
  }

  pub fn age(&self) -> i32 {
    self.age
  }

  pub fn sex(&self) -> Option<Sex> {
    self.sex
  }

  pub fn farm_id(&self) -> i64 {
    self.farm_id
  }

  pub fn into_animal(self, id: i64) -> Animal {
    Animal { id, species: self.species, weight: self.weight, age: self.age, sex: self.sex, farm_id: self.farm_id }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn species_codes_round_trip_known_and_unknown() {
    assert_eq!(Species::from_code("poule"), Species::Hen);
    assert_eq!(Species::from_code("vache"), Species::Cow);
    assert_eq!(Species::from_code("cochon"), Species::Other("cochon".into()));
    assert_eq!(Species::Other("cochon".into()).code(), "cochon");
  }

  #[test]
  fn sex_only_accepts_schema_values() {
    assert_eq!("femelle".parse::<Sex>().unwrap(), Sex::Female);
    assert_eq!("male".parse::<Sex>().unwrap(), Sex::Male);
    assert!(matches!("female".parse::<Sex>(), Err(DomainError::ValidationError(_))));
  }

  #[test]
  fn new_animal_validates_weight_and_age() {
    assert!(NewAnimal::hen(1, 0.0, 5).is_err());
    assert!(NewAnimal::hen(1, f64::NAN, 5).is_err());
    assert!(NewAnimal::hen(1, 2.5, -1).is_err());
    assert!(NewAnimal::new(1, Species::Other(" ".into()), 3.0, 1, None).is_err());
    let a = NewAnimal::cow(7, 80.0, 10).unwrap().into_animal(3);
    assert_eq!(a.id, 3);
    assert_eq!(a.farm_id, 7);
    assert_eq!(a.species, Species::Cow);
    assert!(!a.is_dead());
  }
}
