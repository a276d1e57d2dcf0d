//! Demo data for a freshly created database.

use std::sync::Arc;

use tracing::info;

use concierge_core::error::ConciergeError;
use concierge_core::records::{Room, RoomStatus, StockItem};

use crate::db::Database;
use crate::repository::{RoomRepository, StockRepository};

const DEMO_ROOMS: &[(&str, &str, i32)] = &[
    ("101", "single", 1),
    ("102", "dubla", 1),
    ("103", "twin", 1),
    ("201", "dubla", 2),
    ("202", "tripla", 2),
    ("203", "family", 2),
    ("301", "dubla", 3),
    ("302", "dubla", 3),
    ("305", "apartament", 3),
];

const DEMO_STOCK: &[(&str, i64, &str, i64)] = &[
    ("Cafea", 120, "buc", 900),
    ("Apa plata", 200, "sticla", 600),
    ("Bere", 96, "sticla", 1200),
    ("Suc", 80, "sticla", 800),
    ("Croissant", 30, "buc", 700),
    ("Prosop", 150, "buc", 0),
    ("Sapun", 300, "buc", 0),
    ("Sampon", 240, "buc", 0),
    ("Hartie igienica", 400, "rola", 0),
];

/// Insert demo rooms and stock if the database has no rooms yet.
///
/// Returns `true` when data was inserted.
pub fn seed_demo_data(db: Arc<Database>) -> Result<bool, ConciergeError> {
    let rooms = RoomRepository::new(db.clone());
    if rooms.count()? > 0 {
        return Ok(false);
    }

    for (number, room_type, floor) in DEMO_ROOMS {
        rooms.save(&Room {
            number: number.to_string(),
            room_type: room_type.to_string(),
            floor: *floor,
            status: RoomStatus::Available,
        })?;
    }

    let stock = StockRepository::new(db);
    for (name, quantity, unit, price) in DEMO_STOCK {
        stock.save(&StockItem {
            name: name.to_string(),
            quantity: *quantity,
            unit: unit.to_string(),
            price: *price,
        })?;
    }

    info!(
        rooms = DEMO_ROOMS.len(),
        stock_items = DEMO_STOCK.len(),
        "Seeded demo data"
    );
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seed_only_once() {
        let db = Arc::new(Database::in_memory().unwrap());
        assert!(seed_demo_data(db.clone()).unwrap());
        assert!(!seed_demo_data(db.clone()).unwrap());

        let rooms = RoomRepository::new(db.clone());
        assert_eq!(rooms.count().unwrap(), DEMO_ROOMS.len() as u64);
        let stock = StockRepository::new(db);
        assert!(stock.names().unwrap().contains(&"Cafea".to_string()));
        assert_eq!(stock.list().unwrap().len(), DEMO_STOCK.len());
    }
}
