//! Crate `farm-sim` — motor de noches y servicio de granjas
//!
//! Este crate orquesta un `farm_domain::FarmRepository` (en memoria o
//! Diesel/SQLite) para simular el paso de los días:
//!
//! - `TickEngine`: ejecuta noches de una en una, con la fecha explícita.
//! - `FarmService`: operaciones de alto nivel (alta de granjas y animales,
//!   alimentación, noches, vista de una granja).
//! - `SimConfig`: parámetros de la noche leídos del entorno.
//!
//! Ejemplo rápido:
//! ```rust
//! use farm_domain::{InMemoryFarmRepository, NewAnimal};
//! use farm_sim::{FarmService, SimConfig};
//! use std::sync::Arc;
//! let service = FarmService::new(Arc::new(InMemoryFarmRepository::new()), SimConfig::default());
//! let farm = service.open_farm("FermeTest", None).unwrap();
//! let hen = service.add_animal(NewAnimal::hen(farm.id, 2.5, 5).unwrap()).unwrap();
//! let day = chrono::NaiveDate::from_ymd_opt(2025, 3, 14).unwrap();
//! service.feed(hen.id, day).unwrap();
//! let report = service.run_night(day).unwrap();
//! assert_eq!(report.eggs_for(farm.id), 1);
//! ```
pub mod config;
pub mod engine;
pub mod errors;
pub mod service;

pub use config::SimConfig;
pub use engine::TickEngine;
pub use errors::{Result, SimError};
pub use service::{FarmOverview, FarmService};
