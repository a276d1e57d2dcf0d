//! Repository implementations for SQLite-backed persistence.
//!
//! Each repository wraps an `Arc<Database>` and speaks raw SQL.

use std::sync::Arc;

use chrono::{NaiveDate, TimeZone, Utc};
use uuid::Uuid;

use concierge_core::error::ConciergeError;
use concierge_core::records::{
    HistoryEntry, HistoryKind, Reservation, ReservationStatus, Room, RoomStatus, StockItem,
};

use crate::db::Database;

const DATE_FORMAT: &str = "%Y-%m-%d";

fn storage_err(e: rusqlite::Error) -> ConciergeError {
    ConciergeError::Storage(e.to_string())
}

// =============================================================================
// Rooms
// =============================================================================

pub struct RoomRepository {
    db: Arc<Database>,
}

impl RoomRepository {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Insert or replace a room.
    pub fn save(&self, room: &Room) -> Result<(), ConciergeError> {
        self.db.with_conn(|conn| {
            conn.execute(
                "INSERT OR REPLACE INTO rooms (number, room_type, floor, status)
                 VALUES (?1, ?2, ?3, ?4)",
                rusqlite::params![room.number, room.room_type, room.floor, room.status.as_str()],
            )
            .map_err(|e| ConciergeError::Storage(format!("Failed to save room: {}", e)))?;
            Ok(())
        })
    }

    pub fn find(&self, number: &str) -> Result<Option<Room>, ConciergeError> {
        self.db.with_conn(|conn| {
            let result = conn
                .query_row(
                    "SELECT number, room_type, floor, status FROM rooms WHERE number = ?1",
                    rusqlite::params![number],
                    |row| Ok(row_to_room(row)),
                )
                .optional()
                .map_err(storage_err)?;

            match result {
                Some(room) => Ok(Some(room?)),
                None => Ok(None),
            }
        })
    }

    pub fn list(&self) -> Result<Vec<Room>, ConciergeError> {
        self.db.with_conn(|conn| {
            let mut stmt = conn
                .prepare("SELECT number, room_type, floor, status FROM rooms ORDER BY number")
                .map_err(storage_err)?;
            let rows = stmt
                .query_map([], |row| Ok(row_to_room(row)))
                .map_err(storage_err)?;

            let mut rooms = Vec::new();
            for row in rows {
                rooms.push(row.map_err(storage_err)??);
            }
            Ok(rooms)
        })
    }

    pub fn count(&self) -> Result<u64, ConciergeError> {
        self.db.with_conn(|conn| {
            let count: i64 = conn
                .query_row("SELECT COUNT(*) FROM rooms", [], |row| row.get(0))
                .map_err(storage_err)?;
            Ok(count as u64)
        })
    }
}

// =============================================================================
// Stock
// =============================================================================

pub struct StockRepository {
    db: Arc<Database>,
}

impl StockRepository {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Insert or replace a stock item.
    pub fn save(&self, item: &StockItem) -> Result<(), ConciergeError> {
        self.db.with_conn(|conn| {
            conn.execute(
                "INSERT OR REPLACE INTO stock_items (name, quantity, unit, price)
                 VALUES (?1, ?2, ?3, ?4)",
                rusqlite::params![item.name, item.quantity, item.unit, item.price],
            )
            .map_err(|e| ConciergeError::Storage(format!("Failed to save stock item: {}", e)))?;
            Ok(())
        })
    }

    /// Look up several items by name (case-insensitive). Missing names are skipped.
    pub fn find_by_names(&self, names: &[String]) -> Result<Vec<StockItem>, ConciergeError> {
        self.db.with_conn(|conn| {
            let mut stmt = conn
                .prepare("SELECT name, quantity, unit, price FROM stock_items WHERE name = ?1")
                .map_err(storage_err)?;

            let mut items = Vec::new();
            for name in names {
                let item = stmt
                    .query_row(rusqlite::params![name], row_to_stock_item)
                    .optional()
                    .map_err(storage_err)?;
                if let Some(item) = item {
                    items.push(item);
                }
            }
            Ok(items)
        })
    }

    pub fn names(&self) -> Result<Vec<String>, ConciergeError> {
        self.db.with_conn(|conn| {
            let mut stmt = conn
                .prepare("SELECT name FROM stock_items ORDER BY name")
                .map_err(storage_err)?;
            let rows = stmt
                .query_map([], |row| row.get::<_, String>(0))
                .map_err(storage_err)?;
            rows.collect::<Result<Vec<_>, _>>().map_err(storage_err)
        })
    }

    pub fn list(&self) -> Result<Vec<StockItem>, ConciergeError> {
        self.db.with_conn(|conn| {
            let mut stmt = conn
                .prepare("SELECT name, quantity, unit, price FROM stock_items ORDER BY name")
                .map_err(storage_err)?;
            let rows = stmt.query_map([], row_to_stock_item).map_err(storage_err)?;
            rows.collect::<Result<Vec<_>, _>>().map_err(storage_err)
        })
    }
}

// =============================================================================
// Reservations
// =============================================================================

pub struct ReservationRepository {
    db: Arc<Database>,
}

impl ReservationRepository {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Insert or replace `reservation` once its room exists and no other
    /// active reservation overlaps its stay.
    ///
    /// The checks and the write share one lock and one transaction, so two
    /// concurrent bookings for the same nights cannot both succeed.
    pub fn book(&self, reservation: &Reservation) -> Result<(), ConciergeError> {
        self.db.with_conn(|conn| {
            let tx = conn.unchecked_transaction().map_err(storage_err)?;
            if !room_exists(&tx, &reservation.room_number)? {
                return Err(ConciergeError::NotFound(format!(
                    "Room {}",
                    reservation.room_number
                )));
            }
            if overlap_exists(&tx, reservation)? {
                return Err(ConciergeError::Validation(format!(
                    "Room {} is already booked between {} and {}",
                    reservation.room_number, reservation.start_date, reservation.end_date
                )));
            }
            tx.execute(
                "INSERT OR REPLACE INTO reservations
                    (id, room_number, guest_name, phone, start_date, end_date, status)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                rusqlite::params![
                    reservation.id.to_string(),
                    reservation.room_number,
                    reservation.guest_name,
                    reservation.phone,
                    reservation.start_date.format(DATE_FORMAT).to_string(),
                    reservation.end_date.format(DATE_FORMAT).to_string(),
                    reservation.status.as_str(),
                ],
            )
            .map_err(|e| ConciergeError::Storage(format!("Failed to save reservation: {}", e)))?;
            tx.commit().map_err(storage_err)
        })
    }

    pub fn find_by_id(&self, id: Uuid) -> Result<Option<Reservation>, ConciergeError> {
        self.db.with_conn(|conn| {
            let result = conn
                .query_row(
                    "SELECT id, room_number, guest_name, phone, start_date, end_date, status
                     FROM reservations WHERE id = ?1",
                    rusqlite::params![id.to_string()],
                    |row| Ok(row_to_reservation(row)),
                )
                .optional()
                .map_err(storage_err)?;

            match result {
                Some(reservation) => Ok(Some(reservation?)),
                None => Ok(None),
            }
        })
    }

    /// Active reservation occupying `room_number` on `date`.
    pub fn find_for_room_on(
        &self,
        room_number: &str,
        date: NaiveDate,
    ) -> Result<Option<Reservation>, ConciergeError> {
        let day = date.format(DATE_FORMAT).to_string();
        self.db.with_conn(|conn| {
            let result = conn
                .query_row(
                    "SELECT id, room_number, guest_name, phone, start_date, end_date, status
                     FROM reservations
                     WHERE room_number = ?1
                       AND status IN ('confirmed', 'checked_in')
                       AND start_date <= ?2 AND end_date > ?2
                     ORDER BY start_date
                     LIMIT 1",
                    rusqlite::params![room_number, day],
                    |row| Ok(row_to_reservation(row)),
                )
                .optional()
                .map_err(storage_err)?;

            match result {
                Some(reservation) => Ok(Some(reservation?)),
                None => Ok(None),
            }
        })
    }

    /// All confirmed or checked-in reservations, by start date.
    pub fn active(&self) -> Result<Vec<Reservation>, ConciergeError> {
        self.db.with_conn(|conn| {
            let mut stmt = conn
                .prepare(
                    "SELECT id, room_number, guest_name, phone, start_date, end_date, status
                     FROM reservations
                     WHERE status IN ('confirmed', 'checked_in')
                     ORDER BY start_date, room_number",
                )
                .map_err(storage_err)?;
            let rows = stmt
                .query_map([], |row| Ok(row_to_reservation(row)))
                .map_err(storage_err)?;

            let mut reservations = Vec::new();
            for row in rows {
                reservations.push(row.map_err(storage_err)??);
            }
            Ok(reservations)
        })
    }

    pub fn set_status(&self, id: Uuid, status: ReservationStatus) -> Result<bool, ConciergeError> {
        self.db.with_conn(|conn| {
            let changed = conn
                .execute(
                    "UPDATE reservations SET status = ?1 WHERE id = ?2",
                    rusqlite::params![status.as_str(), id.to_string()],
                )
                .map_err(storage_err)?;
            Ok(changed > 0)
        })
    }
}

// =============================================================================
// History
// =============================================================================

pub struct HistoryRepository {
    db: Arc<Database>,
}

impl HistoryRepository {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    pub fn append(&self, entry: &HistoryEntry) -> Result<(), ConciergeError> {
        self.db.with_conn(|conn| {
            conn.execute(
                "INSERT INTO history (id, timestamp, kind, text, intent)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                rusqlite::params![
                    entry.id.to_string(),
                    entry.timestamp.timestamp_millis(),
                    entry.kind.as_str(),
                    entry.text,
                    entry.intent,
                ],
            )
            .map_err(|e| ConciergeError::Storage(format!("Failed to append history: {}", e)))?;
            Ok(())
        })
    }

    /// Most recent entries, newest first.
    pub fn recent(&self, limit: usize) -> Result<Vec<HistoryEntry>, ConciergeError> {
        self.db.with_conn(|conn| {
            let mut stmt = conn
                .prepare(
                    "SELECT id, timestamp, kind, text, intent FROM history
                     ORDER BY timestamp DESC, rowid DESC
                     LIMIT ?1",
                )
                .map_err(storage_err)?;
            let rows = stmt
                .query_map(rusqlite::params![limit as i64], |row| {
                    Ok(row_to_history_entry(row))
                })
                .map_err(storage_err)?;

            let mut entries = Vec::new();
            for row in rows {
                entries.push(row.map_err(storage_err)??);
            }
            Ok(entries)
        })
    }
}

// =============================================================================
// Row mapping
// =============================================================================

fn room_exists(conn: &rusqlite::Connection, number: &str) -> Result<bool, ConciergeError> {
    let count: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM rooms WHERE number = ?1",
            rusqlite::params![number],
            |row| row.get(0),
        )
        .map_err(storage_err)?;
    Ok(count > 0)
}

/// Another active reservation for the same room overlapping `[start, end)`.
fn overlap_exists(
    conn: &rusqlite::Connection,
    reservation: &Reservation,
) -> Result<bool, ConciergeError> {
    let count: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM reservations
             WHERE room_number = ?1
               AND status IN ('confirmed', 'checked_in')
               AND start_date < ?3 AND end_date > ?2
               AND id != ?4",
            rusqlite::params![
                reservation.room_number,
                reservation.start_date.format(DATE_FORMAT).to_string(),
                reservation.end_date.format(DATE_FORMAT).to_string(),
                reservation.id.to_string(),
            ],
            |row| row.get(0),
        )
        .map_err(storage_err)?;
    Ok(count > 0)
}

fn row_to_room(row: &rusqlite::Row<'_>) -> Result<Room, ConciergeError> {
    let status: String = row.get(3).map_err(storage_err)?;
    Ok(Room {
        number: row.get(0).map_err(storage_err)?,
        room_type: row.get(1).map_err(storage_err)?,
        floor: row.get(2).map_err(storage_err)?,
        status: status
            .parse::<RoomStatus>()
            .map_err(ConciergeError::Storage)?,
    })
}

fn row_to_stock_item(row: &rusqlite::Row<'_>) -> rusqlite::Result<StockItem> {
    Ok(StockItem {
        name: row.get(0)?,
        quantity: row.get(1)?,
        unit: row.get(2)?,
        price: row.get(3)?,
    })
}

fn parse_date(value: &str) -> Result<NaiveDate, ConciergeError> {
    NaiveDate::parse_from_str(value, DATE_FORMAT)
        .map_err(|e| ConciergeError::Storage(format!("Invalid date '{}': {}", value, e)))
}

fn row_to_reservation(row: &rusqlite::Row<'_>) -> Result<Reservation, ConciergeError> {
    let id: String = row.get(0).map_err(storage_err)?;
    let start: String = row.get(4).map_err(storage_err)?;
    let end: String = row.get(5).map_err(storage_err)?;
    let status: String = row.get(6).map_err(storage_err)?;

    Ok(Reservation {
        id: Uuid::parse_str(&id)
            .map_err(|e| ConciergeError::Storage(format!("Invalid UUID: {}", e)))?,
        room_number: row.get(1).map_err(storage_err)?,
        guest_name: row.get(2).map_err(storage_err)?,
        phone: row.get(3).map_err(storage_err)?,
        start_date: parse_date(&start)?,
        end_date: parse_date(&end)?,
        status: status
            .parse::<ReservationStatus>()
            .map_err(ConciergeError::Storage)?,
    })
}

fn row_to_history_entry(row: &rusqlite::Row<'_>) -> Result<HistoryEntry, ConciergeError> {
    let id: String = row.get(0).map_err(storage_err)?;
    let millis: i64 = row.get(1).map_err(storage_err)?;
    let kind: String = row.get(2).map_err(storage_err)?;

    Ok(HistoryEntry {
        id: Uuid::parse_str(&id)
            .map_err(|e| ConciergeError::Storage(format!("Invalid UUID: {}", e)))?,
        timestamp: Utc
            .timestamp_millis_opt(millis)
            .single()
            .unwrap_or_default(),
        kind: kind.parse::<HistoryKind>().map_err(ConciergeError::Storage)?,
        text: row.get(3).map_err(storage_err)?,
        intent: row.get(4).map_err(storage_err)?,
    })
}

/// Extension trait for rusqlite to support optional query results.
trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>, rusqlite::Error>;
}

impl<T> OptionalExt<T> for Result<T, rusqlite::Error> {
    fn optional(self) -> Result<Option<T>, rusqlite::Error> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_db() -> Arc<Database> {
        Arc::new(Database::in_memory().unwrap())
    }

    fn date(m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, m, d).unwrap()
    }

    fn make_room(number: &str) -> Room {
        Room {
            number: number.to_string(),
            room_type: "dubla".to_string(),
            floor: 3,
            status: RoomStatus::Available,
        }
    }

    fn make_reservation(room: &str, start: NaiveDate, end: NaiveDate) -> Reservation {
        Reservation {
            id: Uuid::new_v4(),
            room_number: room.to_string(),
            guest_name: "Andrei Anton".to_string(),
            phone: Some("0722123456".to_string()),
            start_date: start,
            end_date: end,
            status: ReservationStatus::Confirmed,
        }
    }

    // ---- RoomRepository tests ----

    #[test]
    fn test_room_save_and_find() {
        let repo = RoomRepository::new(make_db());
        repo.save(&make_room("305")).unwrap();

        let found = repo.find("305").unwrap().unwrap();
        assert_eq!(found.room_type, "dubla");
        assert_eq!(found.floor, 3);
        assert!(repo.find("999").unwrap().is_none());
        assert_eq!(repo.count().unwrap(), 1);
    }

    #[test]
    fn test_room_list_sorted() {
        let repo = RoomRepository::new(make_db());
        repo.save(&make_room("201")).unwrap();
        repo.save(&make_room("101")).unwrap();

        let numbers: Vec<String> = repo.list().unwrap().into_iter().map(|r| r.number).collect();
        assert_eq!(numbers, vec!["101", "201"]);
    }

    // ---- StockRepository tests ----

    #[test]
    fn test_stock_find_by_names_is_case_insensitive() {
        let repo = StockRepository::new(make_db());
        repo.save(&StockItem {
            name: "Cafea".to_string(),
            quantity: 40,
            unit: "buc".to_string(),
            price: 800,
        })
        .unwrap();

        let found = repo
            .find_by_names(&["cafea".to_string(), "Ceai".to_string()])
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "Cafea");
        assert_eq!(repo.names().unwrap(), vec!["Cafea"]);
    }

    // ---- ReservationRepository tests ----

    #[test]
    fn test_reservation_find_for_room_on() {
        let db = make_db();
        RoomRepository::new(db.clone()).save(&make_room("305")).unwrap();
        let repo = ReservationRepository::new(db);
        let reservation = make_reservation("305", date(4, 16), date(4, 18));
        repo.book(&reservation).unwrap();

        let found = repo.find_for_room_on("305", date(4, 17)).unwrap().unwrap();
        assert_eq!(found.id, reservation.id);
        assert_eq!(found.phone.as_deref(), Some("0722123456"));
        assert!(repo.find_for_room_on("305", date(4, 18)).unwrap().is_none());
        assert!(repo.find_for_room_on("101", date(4, 17)).unwrap().is_none());
    }

    #[test]
    fn test_book_rejects_overlap_and_unknown_room() {
        let db = make_db();
        RoomRepository::new(db.clone()).save(&make_room("305")).unwrap();
        let repo = ReservationRepository::new(db);
        let mut existing = make_reservation("305", date(4, 16), date(4, 18));
        repo.book(&existing).unwrap();

        let overlap = repo
            .book(&make_reservation("305", date(4, 17), date(4, 19)))
            .unwrap_err();
        assert!(matches!(overlap, ConciergeError::Validation(_)));
        repo.book(&make_reservation("305", date(4, 18), date(4, 20)))
            .unwrap();

        let missing = repo
            .book(&make_reservation("999", date(4, 16), date(4, 18)))
            .unwrap_err();
        assert!(matches!(missing, ConciergeError::NotFound(_)));

        // Re-booking the same reservation does not collide with itself.
        existing.guest_name = "Ion Popescu".to_string();
        repo.book(&existing).unwrap();
        assert_eq!(repo.find_by_id(existing.id).unwrap().unwrap().guest_name, "Ion Popescu");
        assert_eq!(repo.active().unwrap().len(), 2);
    }

    #[test]
    fn test_rejected_booking_leaves_no_row() {
        let db = make_db();
        RoomRepository::new(db.clone()).save(&make_room("305")).unwrap();
        let repo = ReservationRepository::new(db);
        repo.book(&make_reservation("305", date(4, 16), date(4, 18)))
            .unwrap();
        let rejected = make_reservation("305", date(4, 15), date(4, 17));
        assert!(repo.book(&rejected).is_err());
        assert!(repo.find_by_id(rejected.id).unwrap().is_none());
    }

    #[test]
    fn test_cancelled_reservation_is_inactive() {
        let db = make_db();
        RoomRepository::new(db.clone()).save(&make_room("305")).unwrap();
        let repo = ReservationRepository::new(db);
        let reservation = make_reservation("305", date(4, 16), date(4, 18));
        repo.book(&reservation).unwrap();
        assert_eq!(repo.active().unwrap().len(), 1);

        assert!(repo
            .set_status(reservation.id, ReservationStatus::Cancelled)
            .unwrap());
        assert!(repo.active().unwrap().is_empty());
        assert!(!repo
            .set_status(Uuid::new_v4(), ReservationStatus::Cancelled)
            .unwrap());
    }

    // ---- HistoryRepository tests ----

    #[test]
    fn test_history_recent_newest_first() {
        let repo = HistoryRepository::new(make_db());
        let mut first = HistoryEntry::new(HistoryKind::Chat, "first", None);
        first.timestamp = Utc.timestamp_millis_opt(1_000).single().unwrap();
        let mut second = HistoryEntry::new(HistoryKind::Automation, "second", None);
        second.timestamp = Utc.timestamp_millis_opt(2_000).single().unwrap();
        repo.append(&first).unwrap();
        repo.append(&second).unwrap();

        let recent = repo.recent(10).unwrap();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].text, "second");
        assert_eq!(recent[0].kind, HistoryKind::Automation);
        assert_eq!(repo.recent(1).unwrap().len(), 1);
    }
}
