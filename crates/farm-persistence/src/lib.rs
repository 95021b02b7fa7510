//! Persistencia SQLite (Diesel) para el trait `FarmRepository`.
//! Este archivo expone el módulo `schema` y reexporta el repositorio Diesel;
//! la implementación detallada, incluida la noche en una única transacción,
//! está en `farm_persistence.rs`. Las tablas se crean con las migraciones
//! embebidas de `migrations/`.

mod farm_persistence;
pub mod schema;

pub use farm_persistence::{
  new_from_env, new_sqlite_for_test, DieselFarmRepository, DEFAULT_DB_URL, DEFAULT_POOL_SIZE, MIGRATIONS,
};
