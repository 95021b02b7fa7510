use chrono::{Local, NaiveDate};
use farm_domain::{NewAnimal, Sex, Species};
use farm_sim::{FarmService, SimConfig};
use std::error::Error;
use std::io::{self, Write};
use std::sync::Arc;

/// Pequeño menú interactivo para administrar granjas usando el repositorio
/// SQLite de `farm-persistence`.
///
/// Opciones soportadas:
/// 1) Ver granjas
/// 2) Crear granja
/// 3) Añadir animal
/// 4) Alimentar animal
/// 5) Alimentar toda una granja
/// 6) Pasar la noche
/// 7) Ver una granja (animales, stock, producción)
/// 8) Eliminar granja
/// 9) Salir
fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();
    // Inicializar repo (aplica migraciones embebidas)
    let repo = farm_persistence::new_from_env()?;
    let config = SimConfig::from_env()?;
    let service = FarmService::new(Arc::new(repo), config);

    loop {
        println!("\n== Farm CLI menu ==");
        println!("1) Ver granjas");
        println!("2) Crear granja");
        println!("3) Añadir animal");
        println!("4) Alimentar animal");
        println!("5) Alimentar toda una granja");
        println!("6) Pasar la noche");
        println!("7) Ver granja");
        println!("8) Eliminar granja");
        println!("9) Salir");
        print!("Elige una opción: ");
        io::stdout().flush().ok();

        let mut choice = String::new();
        if io::stdin().read_line(&mut choice)? == 0 {
            break;
        }
        match choice.trim() {
            "1" => match service.farms() {
                Ok(farms) => {
                    println!("\nID    | SALDO  | NOMBRE");
                    println!("------------------------------");
                    for f in farms {
                        println!("{:<5} | {:<6} | {}", f.id, f.balance, f.name);
                    }
                }
                Err(e) => eprintln!("Error listando granjas: {}", e),
            },
            "2" => {
                let name = prompt("Nombre: ")?;
                let balance_s = prompt("Saldo inicial (enter para 1500): ")?;
                let balance = if balance_s.trim().is_empty() {
                    None
                } else {
                    match balance_s.trim().parse::<i64>() {
                        Ok(b) => Some(b),
                        Err(_) => {
                            eprintln!("Saldo inválido");
                            continue;
                        }
                    }
                };
                match service.open_farm(&name, balance) {
                    Ok(f) => println!("Granja creada: {}", f),
                    Err(e) => eprintln!("Error creando granja: {}", e),
                }
            }
            "3" => {
                let farm_id = match prompt_parse::<i64>("Id de la granja: ")? {
                    Some(v) => v,
                    None => {
                        eprintln!("Id inválido");
                        continue;
                    }
                };
                let species = Species::from_code(prompt("Especie (poule, vache, ...): ")?.trim());
                let weight = match prompt_parse::<f64>("Peso: ")? {
                    Some(v) => v,
                    None => {
                        eprintln!("Peso inválido");
                        continue;
                    }
                };
                let age = match prompt_parse::<i32>("Edad: ")? {
                    Some(v) => v,
                    None => {
                        eprintln!("Edad inválida");
                        continue;
                    }
                };
                let sex_s = prompt("Sexo (male/femelle, enter para ninguno): ")?;
                let sex = if sex_s.trim().is_empty() {
                    None
                } else {
                    match sex_s.parse::<Sex>() {
                        Ok(s) => Some(s),
                        Err(e) => {
                            eprintln!("{}", e);
                            continue;
                        }
                    }
                };
                let res = NewAnimal::new(farm_id, species, weight, age, sex).map_err(farm_sim::SimError::from)
                                                                             .and_then(|a| service.add_animal(a));
                match res {
                    Ok(a) => println!("Animal añadido: {}", a),
                    Err(e) => eprintln!("Error añadiendo animal: {}", e),
                }
            }
            "4" => {
                let animal_id = match prompt_parse::<i64>("Id del animal: ")? {
                    Some(v) => v,
                    None => {
                        eprintln!("Id inválido");
                        continue;
                    }
                };
                let date = match prompt_date()? {
                    Some(d) => d,
                    None => continue,
                };
                match service.feed(animal_id, date) {
                    Ok(ev) => println!("Animal {} alimentado el {}", ev.animal_id, ev.date),
                    Err(e) => eprintln!("Error alimentando: {}", e),
                }
            }
            "5" => {
                let farm_id = match prompt_parse::<i64>("Id de la granja: ")? {
                    Some(v) => v,
                    None => {
                        eprintln!("Id inválido");
                        continue;
                    }
                };
                let date = match prompt_date()? {
                    Some(d) => d,
                    None => continue,
                };
                match service.feed_farm(farm_id, date) {
                    Ok(n) => println!("{} animales alimentados", n),
                    Err(e) => eprintln!("Error alimentando la granja: {}", e),
                }
            }
            "6" => {
                let date = match prompt_date()? {
                    Some(d) => d,
                    None => continue,
                };
                match service.run_night(date) {
                    Ok(report) => println!("{}", serde_json::to_string_pretty(&report)?),
                    Err(e) => eprintln!("Error en la noche: {}", e),
                }
            }
            "7" => {
                let farm_id = match prompt_parse::<i64>("Id de la granja: ")? {
                    Some(v) => v,
                    None => {
                        eprintln!("Id inválido");
                        continue;
                    }
                };
                match service.farm_overview(farm_id) {
                    Ok(view) => println!("{}", serde_json::to_string_pretty(&view)?),
                    Err(e) => eprintln!("Error leyendo la granja: {}", e),
                }
            }
            "8" => {
                let farm_id = match prompt_parse::<i64>("Id de la granja a eliminar: ")? {
                    Some(v) => v,
                    None => {
                        eprintln!("Id inválido");
                        continue;
                    }
                };
                let confirm = prompt(&format!("Confirma borrado de la granja {}? escribir 'yes' para confirmar: ",
                                              farm_id))?;
                if confirm.trim().to_lowercase() == "yes" {
                    match service.close_farm(farm_id) {
                        Ok(()) => println!("Granja eliminada: {}", farm_id),
                        Err(e) => eprintln!("Error eliminando granja: {}", e),
                    }
                } else {
                    println!("Borrado cancelado");
                }
            }
            "9" => {
                println!("Saliendo...");
                break;
            }
            other => {
                println!("Opción inválida: {}", other);
            }
        }
    }

    Ok(())
}

fn prompt(msg: &str) -> io::Result<String> {
    print!("{}", msg);
    io::stdout().flush()?;
    let mut s = String::new();
    io::stdin().read_line(&mut s)?;
    Ok(s)
}

fn prompt_parse<T: std::str::FromStr>(msg: &str) -> io::Result<Option<T>> {
    Ok(prompt(msg)?.trim().parse::<T>().ok())
}

/// Pide una fecha AAAA-MM-DD; enter usa la fecha local de hoy.
fn prompt_date() -> io::Result<Option<NaiveDate>> {
    let s = prompt("Fecha (AAAA-MM-DD, enter para hoy): ")?;
    if s.trim().is_empty() {
        return Ok(Some(Local::now().date_naive()));
    }
    match NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d") {
        Ok(d) => Ok(Some(d)),
        Err(_) => {
            eprintln!("Fecha inválida");
            Ok(None)
        }
    }
}
