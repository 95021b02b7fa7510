use chrono::NaiveDate;
use diesel::connection::SimpleConnection;
use diesel::prelude::*;
use farm_domain::{DomainError, FarmRepository, NewAnimal, NewFarm, NewStock, ProductKind, TickConfig};
use farm_persistence::new_sqlite_for_test;
use uuid::Uuid;

fn memory_url() -> String {
  format!("file:night_{}?mode=memory&cache=shared", Uuid::new_v4().simple())
}

fn today() -> NaiveDate {
  NaiveDate::from_ymd_opt(2025, 3, 14).unwrap()
}

#[test]
fn night_over_two_farms() {
  let repo = new_sqlite_for_test(&memory_url()).expect("repo");
  let alpha = repo.create_farm(NewFarm::new("Ferme Alpha").unwrap()).unwrap();
  let beta = repo.create_farm(NewFarm::new("Ferme Beta").unwrap()).unwrap();
  let fed_hen = repo.add_animal(NewAnimal::hen(alpha.id, 2.5, 5).unwrap()).unwrap();
  let hungry_hen = repo.add_animal(NewAnimal::hen(beta.id, 2.5, 5).unwrap()).unwrap();
  let cow = repo.add_animal(NewAnimal::cow(alpha.id, 80.0, 10).unwrap()).unwrap();
  repo.add_stock(NewStock::new(alpha.id, "paille", 5).unwrap()).unwrap();
  repo.record_feeding(fed_hen.id, today()).unwrap();
  repo.record_feeding(cow.id, today()).unwrap();

  let report = repo.run_daily_tick(today(), &TickConfig::default()).expect("tick");
  assert_eq!(report.aged, 3);
  assert_eq!(report.starved, 1);
  assert!(report.dead.is_empty());

  let hen = repo.get_animal(fed_hen.id).unwrap().expect("fed hen survives");
  assert_eq!(hen.age, 6);
  assert_eq!(hen.weight, 2.5);
  let hungry = repo.get_animal(hungry_hen.id).unwrap().expect("hungry hen after one night");
  assert!((hungry.weight - 2.3).abs() < 1e-9);
  assert_eq!(repo.get_animal(cow.id).unwrap().unwrap().weight, 80.0);

  let prod = repo.list_production(alpha.id).unwrap();
  let eggs: Vec<_> = prod.iter().filter(|p| p.kind == ProductKind::Egg).collect();
  let milk: Vec<_> = prod.iter().filter(|p| p.kind == ProductKind::Milk).collect();
  assert_eq!(eggs.len(), 1);
  assert!(eggs[0].quantity >= 1);
  assert_eq!(milk.len(), 1);
  assert_eq!(milk[0].quantity, 8);
  // the starving hen dropped under the laying weight
  assert!(repo.list_production(beta.id).unwrap().is_empty());
  assert_eq!(report.eggs_for(alpha.id), eggs[0].quantity);
  assert_eq!(report.milk_for(alpha.id), 8);
}

#[test]
fn starving_hen_is_culled_once_weight_reaches_zero() {
  let repo = new_sqlite_for_test(&memory_url()).expect("repo");
  let farm = repo.create_farm(NewFarm::new("FermeTest").unwrap()).unwrap();
  let hen = repo.add_animal(NewAnimal::hen(farm.id, 2.5, 5).unwrap()).unwrap();
  repo.record_feeding(hen.id, today()).unwrap();
  let config = TickConfig::default().with_decay(0.5);

  let mut day = today();
  for _ in 0..4 {
    day = day.succ_opt().unwrap();
    let r = repo.run_daily_tick(day, &config).unwrap();
    assert!(r.dead.is_empty());
  }
  let weak = repo.get_animal(hen.id).unwrap().expect("still alive after four nights");
  assert!((weak.weight - 0.5).abs() < 1e-9);

  day = day.succ_opt().unwrap();
  let r = repo.run_daily_tick(day, &config).unwrap();
  assert_eq!(r.dead, vec![hen.id]);
  assert!(repo.get_animal(hen.id).unwrap().is_none());
  assert!(repo.list_feedings(hen.id).unwrap().is_empty());
}

#[test]
fn failed_night_rolls_back_every_step() {
  let url = memory_url();
  let repo = new_sqlite_for_test(&url).expect("repo");
  let farm = repo.create_farm(NewFarm::new("FermeTest").unwrap()).unwrap();
  let hen = repo.add_animal(NewAnimal::hen(farm.id, 2.5, 5).unwrap()).unwrap();
  let doomed = repo.add_animal(NewAnimal::hen(farm.id, 0.1, 5).unwrap()).unwrap();
  repo.record_feeding(hen.id, today()).unwrap();

  let mut raw = SqliteConnection::establish(&url).expect("raw connection");
  raw.batch_execute("CREATE TRIGGER refuse_production BEFORE INSERT ON production BEGIN SELECT RAISE(ABORT, 'boom'); \
                     END;")
     .expect("create trigger");

  match repo.run_daily_tick(today(), &TickConfig::default()) {
    Err(DomainError::ExternalError(_)) => {}
    other => panic!("expected the night to fail, got: {:?}", other),
  }
  assert_eq!(repo.get_animal(hen.id).unwrap().unwrap().age, 5);
  assert_eq!(repo.get_animal(doomed.id).unwrap().expect("rollback keeps the dead hen").weight, 0.1);
  assert!(repo.list_production(farm.id).unwrap().is_empty());

  raw.batch_execute("DROP TRIGGER refuse_production;").expect("drop trigger");
  let report = repo.run_daily_tick(today(), &TickConfig::default()).expect("night after fix");
  assert_eq!(report.dead, vec![doomed.id]);
  assert_eq!(repo.get_animal(hen.id).unwrap().unwrap().age, 6);
}

#[test]
fn invalid_config_is_rejected_before_touching_the_store() {
  let repo = new_sqlite_for_test(&memory_url()).expect("repo");
  let farm = repo.create_farm(NewFarm::new("FermeTest").unwrap()).unwrap();
  let hen = repo.add_animal(NewAnimal::hen(farm.id, 2.5, 5).unwrap()).unwrap();
  let res = repo.run_daily_tick(today(), &TickConfig::default().with_decay(f64::NAN));
  assert!(matches!(res, Err(DomainError::ValidationError(_))));
  assert_eq!(repo.get_animal(hen.id).unwrap().unwrap().age, 5);
}
