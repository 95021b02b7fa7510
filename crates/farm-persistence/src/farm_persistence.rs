use crate::schema;
use crate::schema::alimentation::dsl as al_dsl;
use crate::schema::animal::dsl as animal_dsl;
use crate::schema::ferme::dsl as ferme_dsl;
use crate::schema::production::dsl as prod_dsl;
use crate::schema::stock::dsl as stock_dsl;
use chrono::NaiveDate;
use diesel::connection::SimpleConnection;
use diesel::dsl::count_star;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, CustomizeConnection, Pool, PooledConnection};
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use diesel::sqlite::SqliteConnection;
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use farm_domain::{
  Animal, DomainError, Farm, FarmRepository, FeedingEvent, NewAnimal, NewFarm, NewProduction, NewStock, ProductKind,
  Production, Sex, Species, StockEntry, TickConfig, TickReport,
};
use std::sync::Arc;
pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("./migrations");
pub const DEFAULT_DB_URL: &str = "file:farmdb?mode=memory&cache=shared";
pub const DEFAULT_POOL_SIZE: u32 = 4;
type DbPool = Pool<ConnectionManager<SqliteConnection>>;
type DbConn = PooledConnection<ConnectionManager<SqliteConnection>>;

/// Pragmas applied to every pooled connection: SQLite only enforces the
/// `ON DELETE CASCADE` foreign keys when `foreign_keys` is on for that
/// connection.
#[derive(Debug)]
struct SqlitePragmas;
impl CustomizeConnection<SqliteConnection, diesel::r2d2::Error> for SqlitePragmas {
  fn on_acquire(&self, conn: &mut SqliteConnection) -> Result<(), diesel::r2d2::Error> {
    conn.batch_execute("PRAGMA foreign_keys = ON; PRAGMA busy_timeout = 5000;")
        .map_err(diesel::r2d2::Error::QueryError)
  }
}

/// Repo Diesel (SQLite) que implementa `FarmRepository`.
pub struct DieselFarmRepository {
  pool: Arc<DbPool>,
}
impl DieselFarmRepository {
  /// Builds the pool and applies the embedded migrations.
  pub fn new(database_url: &str, pool_size: u32) -> Result<Self, DomainError> {
    let manager = ConnectionManager::<SqliteConnection>::new(database_url);
    let pool = Pool::builder().max_size(pool_size.max(1))
                              .connection_customizer(Box::new(SqlitePragmas))
                              .build(manager)
                              .map_err(|e| DomainError::ExternalError(format!("pool: {}", e)))?;
    let repo = DieselFarmRepository { pool: Arc::new(pool) };
    let mut c = repo.conn()?;
    if !database_url.contains("mode=memory") && database_url != ":memory:" {
      map_db_err(c.batch_execute("PRAGMA journal_mode = WAL;"))?;
    }
    let applied = c.run_pending_migrations(MIGRATIONS)
                   .map_err(|e| DomainError::ExternalError(format!("migrations: {}", e)))?;
    log::debug!("farm store ready at {} ({} migrations applied)", database_url, applied.len());
    drop(c);
    Ok(repo)
  }
  fn conn(&self) -> Result<DbConn, DomainError> {
    self.pool.get().map_err(|e| DomainError::ExternalError(format!("pool: {}", e)))
  }
}

// Diesel row structs for the farm tables
#[derive(Debug, Queryable)]
struct FarmRow {
  pub id: i64,
  pub nom: String,
  pub solde_ecus: i64,
}
#[derive(Debug, Insertable)]
#[diesel(table_name = schema::ferme)]
struct NewFarmRow<'a> {
  pub nom: &'a str,
  // None inserts DEFAULT, i.e. the column default of 1500
  pub solde_ecus: Option<i64>,
}
#[derive(Debug, Queryable)]
struct AnimalRow {
  pub id: i64,
  pub type_: String,
  pub poids: f64,
  pub age: i32,
  pub sexe: Option<String>,
  pub ferme_id: i64,
}
#[derive(Debug, Insertable)]
#[diesel(table_name = schema::animal)]
struct NewAnimalRow<'a> {
  pub type_: &'a str,
  pub poids: f64,
  pub age: i32,
  pub sexe: Option<&'a str>,
  pub ferme_id: i64,
}
#[derive(Debug, Queryable)]
struct StockRow {
  pub id: i64,
  pub type_: String,
  pub quantite: i64,
  pub ferme_id: i64,
}
#[derive(Debug, Insertable)]
#[diesel(table_name = schema::stock)]
struct NewStockRow<'a> {
  pub type_: &'a str,
  pub quantite: i64,
  pub ferme_id: i64,
}
#[derive(Debug, Queryable)]
struct FeedingRow {
  pub id: i64,
  pub animal_id: i64,
  pub date_nourrissage: NaiveDate,
}
#[derive(Debug, Insertable)]
#[diesel(table_name = schema::alimentation)]
struct NewFeedingRow {
  pub animal_id: i64,
  pub date_nourrissage: NaiveDate,
}
#[derive(Debug, Queryable)]
struct ProductionRow {
  pub id: i64,
  pub type_: String,
  pub quantite: i64,
  pub ferme_id: i64,
}
#[derive(Debug, Insertable)]
#[diesel(table_name = schema::production)]
struct NewProductionRow<'a> {
  pub type_: &'a str,
  pub quantite: i64,
  pub ferme_id: i64,
}

impl From<FarmRow> for Farm {
  fn from(r: FarmRow) -> Self {
    Farm { id: r.id, name: r.nom, balance: r.solde_ecus }
  }
}
impl AnimalRow {
  fn into_domain(self) -> Result<Animal, DomainError> {
    let sex = self.sexe.as_deref().map(|s| s.parse::<Sex>()).transpose()?;
    Ok(Animal { id: self.id,
                species: Species::from_code(&self.type_),
                weight: self.poids,
                age: self.age,
                sex,
                farm_id: self.ferme_id })
  }
}
impl From<StockRow> for StockEntry {
  fn from(r: StockRow) -> Self {
    StockEntry { id: r.id, feed_type: r.type_, quantity: r.quantite, farm_id: r.ferme_id }
  }
}
impl From<FeedingRow> for FeedingEvent {
  fn from(r: FeedingRow) -> Self {
    FeedingEvent { id: r.id, animal_id: r.animal_id, date: r.date_nourrissage }
  }
}
impl From<ProductionRow> for Production {
  fn from(r: ProductionRow) -> Self {
    Production { id: r.id, kind: ProductKind::from_code(&r.type_), quantity: r.quantite, farm_id: r.ferme_id }
  }
}

fn map_db_err<T>(res: std::result::Result<T, DieselError>) -> Result<T, DomainError> {
  res.map_err(|e| DomainError::ExternalError(format!("db: {}", e)))
}

fn farm_exists(conn: &mut SqliteConnection, farm_id: i64) -> Result<bool, DomainError> {
  let found = ferme_dsl::ferme.filter(ferme_dsl::id.eq(farm_id))
                              .select(ferme_dsl::id)
                              .first::<i64>(conn)
                              .optional();
  Ok(map_db_err(found)?.is_some())
}

fn animal_exists(conn: &mut SqliteConnection, animal_id: i64) -> Result<bool, DomainError> {
  let found = animal_dsl::animal.filter(animal_dsl::id.eq(animal_id))
                                .select(animal_dsl::id)
                                .first::<i64>(conn)
                                .optional();
  Ok(map_db_err(found)?.is_some())
}

/// The five night steps, in order, on a connection already inside a
/// transaction.
fn night_in_transaction(conn: &mut SqliteConnection,
                        today: NaiveDate,
                        config: &TickConfig)
                        -> std::result::Result<TickReport, DieselError> {
  let aged = diesel::update(animal_dsl::animal).set(animal_dsl::age.eq(animal_dsl::age + 1)).execute(conn)?;

  let fed_today = al_dsl::alimentation.filter(al_dsl::date_nourrissage.eq(today)).select(al_dsl::animal_id);
  let starved = diesel::update(animal_dsl::animal.filter(animal_dsl::id.ne_all(fed_today)))
                  .set(animal_dsl::poids.eq(animal_dsl::poids - config.decay_per_tick))
                  .execute(conn)?;

  let dead: Vec<i64> =
    animal_dsl::animal.filter(animal_dsl::poids.le(0.0)).select(animal_dsl::id).order(animal_dsl::id).load(conn)?;
  if !dead.is_empty() {
    // explicit cleanup, independent of the FK cascade
    diesel::delete(al_dsl::alimentation.filter(al_dsl::animal_id.eq_any(&dead))).execute(conn)?;
    diesel::delete(animal_dsl::animal.filter(animal_dsl::id.eq_any(&dead))).execute(conn)?;
  }

  let hen = Species::Hen;
  let mut layers: Vec<(i64, i64)> = animal_dsl::animal.filter(animal_dsl::type_.eq(hen.code()))
                                                      .filter(animal_dsl::poids.ge(config.laying_min_weight))
                                                      .filter(animal_dsl::age.ge(config.laying_min_age))
                                                      .group_by(animal_dsl::ferme_id)
                                                      .select((animal_dsl::ferme_id, count_star()))
                                                      .load(conn)?;
  layers.sort_unstable();
  let cow = Species::Cow;
  let milkers: Vec<i64> = animal_dsl::animal.filter(animal_dsl::type_.eq(cow.code()))
                                            .filter(animal_dsl::poids.ge(config.milking_min_weight))
                                            .select(animal_dsl::ferme_id)
                                            .distinct()
                                            .order(animal_dsl::ferme_id)
                                            .load(conn)?;

  let mut productions: Vec<NewProduction> =
    layers.into_iter()
          .filter(|(_, count)| *count >= 1)
          .map(|(farm_id, quantity)| NewProduction { kind: ProductKind::Egg, quantity, farm_id })
          .collect();
  productions.extend(milkers.into_iter()
                            .map(|farm_id| NewProduction { kind: ProductKind::Milk, quantity: config.milk_yield, farm_id }));
  for p in productions.iter() {
    let row = NewProductionRow { type_: p.kind.code(), quantite: p.quantity, ferme_id: p.farm_id };
    diesel::insert_into(prod_dsl::production).values(&row).execute(conn)?;
  }

  Ok(TickReport { date: today, aged, starved, dead, productions })
}

impl FarmRepository for DieselFarmRepository {
  fn create_farm(&self, farm: NewFarm) -> Result<Farm, DomainError> {
    let mut conn = self.conn()?;
    let row = NewFarmRow { nom: farm.name(), solde_ecus: farm.balance() };
    let created = map_db_err(diesel::insert_into(ferme_dsl::ferme).values(&row).get_result::<FarmRow>(&mut conn))?;
    log::info!("granja creada: #{} {}", created.id, created.nom);
    Ok(created.into())
  }
  fn get_farm(&self, id: i64) -> Result<Option<Farm>, DomainError> {
    let mut conn = self.conn()?;
    let opt = map_db_err(ferme_dsl::ferme.filter(ferme_dsl::id.eq(id)).first::<FarmRow>(&mut conn).optional())?;
    Ok(opt.map(Farm::from))
  }
  fn list_farms(&self) -> Result<Vec<Farm>, DomainError> {
    let mut conn = self.conn()?;
    let rows = map_db_err(ferme_dsl::ferme.order(ferme_dsl::id).load::<FarmRow>(&mut conn))?;
    Ok(rows.into_iter().map(Farm::from).collect())
  }
  fn delete_farm(&self, id: i64) -> Result<(), DomainError> {
    let mut conn = self.conn()?;
    let deleted = map_db_err(conn.transaction::<usize, DieselError, _>(|conn| {
                                   let owned = animal_dsl::animal.filter(animal_dsl::ferme_id.eq(id)).select(animal_dsl::id);
                                   diesel::delete(al_dsl::alimentation.filter(al_dsl::animal_id.eq_any(owned))).execute(conn)?;
                                   diesel::delete(animal_dsl::animal.filter(animal_dsl::ferme_id.eq(id))).execute(conn)?;
                                   diesel::delete(stock_dsl::stock.filter(stock_dsl::ferme_id.eq(id))).execute(conn)?;
                                   diesel::delete(prod_dsl::production.filter(prod_dsl::ferme_id.eq(id))).execute(conn)?;
                                   diesel::delete(ferme_dsl::ferme.filter(ferme_dsl::id.eq(id))).execute(conn)
                                 }))?;
    if deleted == 0 {
      return Err(DomainError::NotFound(format!("granja {}", id)));
    }
    log::info!("granja #{} eliminada", id);
    Ok(())
  }
  fn add_animal(&self, animal: NewAnimal) -> Result<Animal, DomainError> {
    let mut conn = self.conn()?;
    if !farm_exists(&mut conn, animal.farm_id())? {
      return Err(DomainError::NotFound(format!("granja {}", animal.farm_id())));
    }
    let row = NewAnimalRow { type_: animal.species().code(),
                             poids: animal.weight(),
                             age: animal.age(),
                             sexe: animal.sex().map(|s| s.code()),
                             ferme_id: animal.farm_id() };
    let created = map_db_err(diesel::insert_into(animal_dsl::animal).values(&row).get_result::<AnimalRow>(&mut conn))?;
    created.into_domain()
  }
  fn get_animal(&self, id: i64) -> Result<Option<Animal>, DomainError> {
    let mut conn = self.conn()?;
    let opt = map_db_err(animal_dsl::animal.filter(animal_dsl::id.eq(id)).first::<AnimalRow>(&mut conn).optional())?;
    opt.map(AnimalRow::into_domain).transpose()
  }
  fn list_animals(&self, farm_id: i64) -> Result<Vec<Animal>, DomainError> {
    let mut conn = self.conn()?;
    let rows = map_db_err(animal_dsl::animal.filter(animal_dsl::ferme_id.eq(farm_id))
                                            .order(animal_dsl::id)
                                            .load::<AnimalRow>(&mut conn))?;
    rows.into_iter().map(AnimalRow::into_domain).collect()
  }
  fn remove_animal(&self, id: i64) -> Result<(), DomainError> {
    let mut conn = self.conn()?;
    let deleted = map_db_err(conn.transaction::<usize, DieselError, _>(|conn| {
                                   diesel::delete(al_dsl::alimentation.filter(al_dsl::animal_id.eq(id))).execute(conn)?;
                                   diesel::delete(animal_dsl::animal.filter(animal_dsl::id.eq(id))).execute(conn)
                                 }))?;
    if deleted == 0 {
      return Err(DomainError::NotFound(format!("animal {}", id)));
    }
    Ok(())
  }
  fn add_stock(&self, stock: NewStock) -> Result<StockEntry, DomainError> {
    let mut conn = self.conn()?;
    if !farm_exists(&mut conn, stock.farm_id())? {
      return Err(DomainError::NotFound(format!("granja {}", stock.farm_id())));
    }
    let row = NewStockRow { type_: stock.feed_type(), quantite: stock.quantity(), ferme_id: stock.farm_id() };
    let created = map_db_err(diesel::insert_into(stock_dsl::stock).values(&row).get_result::<StockRow>(&mut conn))?;
    Ok(created.into())
  }
  fn list_stock(&self, farm_id: i64) -> Result<Vec<StockEntry>, DomainError> {
    let mut conn = self.conn()?;
    let rows = map_db_err(stock_dsl::stock.filter(stock_dsl::ferme_id.eq(farm_id))
                                          .order(stock_dsl::id)
                                          .load::<StockRow>(&mut conn))?;
    Ok(rows.into_iter().map(StockEntry::from).collect())
  }
  fn record_feeding(&self, animal_id: i64, date: NaiveDate) -> Result<FeedingEvent, DomainError> {
    let mut conn = self.conn()?;
    if !animal_exists(&mut conn, animal_id)? {
      return Err(DomainError::NotFound(format!("animal {}", animal_id)));
    }
    let row = NewFeedingRow { animal_id, date_nourrissage: date };
    match diesel::insert_into(al_dsl::alimentation).values(&row).get_result::<FeedingRow>(&mut conn) {
      Ok(r) => Ok(r.into()),
      Err(DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _)) => {
        log::warn!("alimentación duplicada rechazada: animal {} el {}", animal_id, date);
        Err(DomainError::DuplicateFeeding { animal_id, date })
      }
      Err(DieselError::DatabaseError(DatabaseErrorKind::ForeignKeyViolation, _)) => {
        Err(DomainError::NotFound(format!("animal {}", animal_id)))
      }
      Err(e) => Err(DomainError::ExternalError(format!("db: {}", e))),
    }
  }
  fn list_feedings(&self, animal_id: i64) -> Result<Vec<FeedingEvent>, DomainError> {
    let mut conn = self.conn()?;
    let rows = map_db_err(al_dsl::alimentation.filter(al_dsl::animal_id.eq(animal_id))
                                              .order(al_dsl::date_nourrissage)
                                              .load::<FeedingRow>(&mut conn))?;
    Ok(rows.into_iter().map(FeedingEvent::from).collect())
  }
  fn list_production(&self, farm_id: i64) -> Result<Vec<Production>, DomainError> {
    let mut conn = self.conn()?;
    let rows = map_db_err(prod_dsl::production.filter(prod_dsl::ferme_id.eq(farm_id))
                                              .order(prod_dsl::id)
                                              .load::<ProductionRow>(&mut conn))?;
    Ok(rows.into_iter().map(Production::from).collect())
  }
  fn run_daily_tick(&self, today: NaiveDate, config: &TickConfig) -> Result<TickReport, DomainError> {
    config.validate()?;
    let mut conn = self.conn()?;
    // BEGIN IMMEDIATE takes the write lock up front so two nights cannot
    // interleave on the same database.
    let report = map_db_err(conn.immediate_transaction(|conn| night_in_transaction(conn, today, config)))?;
    if !report.dead.is_empty() {
      log::warn!("noche {}: {} animales muertos de hambre: {:?}", today, report.dead.len(), report.dead);
    }
    log::info!("noche {} aplicada: {} envejecidos, {} sin comer, {} filas de producción",
               today,
               report.aged,
               report.starved,
               report.productions.len());
    Ok(report)
  }
}

/// Crear repo desde las variables de entorno: `FARM_DB_URL` (o
/// `DATABASE_URL`) y `FARM_POOL_SIZE`. Sin URL se usa una base SQLite en
/// memoria compartida.
pub fn new_from_env() -> Result<DieselFarmRepository, DomainError> {
  dotenvy::dotenv().ok();
  let url = std::env::var("FARM_DB_URL").or_else(|_| std::env::var("DATABASE_URL"))
                                        .unwrap_or_else(|_| DEFAULT_DB_URL.into());
  let pool_size = match std::env::var("FARM_POOL_SIZE") {
    Ok(v) => v.trim()
              .parse::<u32>()
              .map_err(|e| DomainError::ValidationError(format!("FARM_POOL_SIZE inválido '{}': {}", v, e)))?,
    Err(_) => DEFAULT_POOL_SIZE,
  };
  DieselFarmRepository::new(&url, pool_size)
}

// Test helper: construct a repository over an explicit SQLite URL,
// bypassing environment parsing.
pub fn new_sqlite_for_test(database_url: &str) -> Result<DieselFarmRepository, DomainError> {
  DieselFarmRepository::new(database_url, DEFAULT_POOL_SIZE)
}
