mod animal;
mod errors;
mod farm;
mod feeding;
mod farm_repository;
mod production;
mod stock;
pub mod tick;

pub use animal::{Animal, NewAnimal, Sex, Species};
pub use errors::DomainError;
pub use farm::{Farm, NewFarm, DEFAULT_BALANCE};
pub use farm_repository::{FarmRepository, InMemoryFarmRepository};
pub use feeding::FeedingEvent;
pub use production::{NewProduction, ProductKind, Production};
pub use stock::{NewStock, StockEntry};
pub use tick::{TickConfig, TickReport};
