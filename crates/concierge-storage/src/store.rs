//! Collaborator interfaces consumed by the interpreter and the channel.
//!
//! The interpreter never touches SQL directly: handlers and extractors go
//! through `HotelStore`, structured reservation commands through
//! `ReservationDesk`.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::Value;
use tracing::info;
use uuid::Uuid;

use concierge_core::error::ConciergeError;
use concierge_core::records::{HistoryEntry, Reservation, ReservationStatus, Room, StockItem};

use crate::db::Database;
use crate::repository::{HistoryRepository, ReservationRepository, RoomRepository, StockRepository};

/// Read access to front-desk records plus the history log.
#[async_trait]
pub trait HotelStore: Send + Sync {
    async fn room(&self, number: &str) -> Result<Option<Room>, ConciergeError>;

    /// Items whose names match any of `names`; unknown names are omitted.
    async fn stock_items(&self, names: &[String]) -> Result<Vec<StockItem>, ConciergeError>;

    async fn stock_item_names(&self) -> Result<Vec<String>, ConciergeError>;

    async fn reservation_for(
        &self,
        room_number: &str,
        date: NaiveDate,
    ) -> Result<Option<Reservation>, ConciergeError>;

    async fn active_reservations(&self) -> Result<Vec<Reservation>, ConciergeError>;

    async fn append_history(&self, entry: HistoryEntry) -> Result<(), ConciergeError>;

    async fn recent_history(&self, limit: usize) -> Result<Vec<HistoryEntry>, ConciergeError>;
}

/// Fields of a reservation to be created.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewReservation {
    pub room_number: String,
    pub guest_name: String,
    #[serde(default)]
    pub phone: Option<String>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReservationChanges {
    pub id: Uuid,
    #[serde(default)]
    pub room_number: Option<String>,
    #[serde(default)]
    pub guest_name: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Deserialize)]
struct ReservationId {
    id: Uuid,
}

/// A structured reservation operation received over the channel.
#[derive(Debug, Clone)]
pub enum ReservationCommand {
    Create(NewReservation),
    Update(ReservationChanges),
    Cancel(Uuid),
    CheckIn(Uuid),
    CheckOut(Uuid),
    Refresh,
}

impl ReservationCommand {
    /// Build a command from an action name and its JSON data.
    pub fn parse(action: &str, data: Value) -> Result<Self, ConciergeError> {
        let id = |data: Value| -> Result<Uuid, ConciergeError> {
            Ok(serde_json::from_value::<ReservationId>(data)?.id)
        };
        match action {
            "create" => Ok(Self::Create(serde_json::from_value(data)?)),
            "update" => Ok(Self::Update(serde_json::from_value(data)?)),
            "cancel" => Ok(Self::Cancel(id(data)?)),
            "check_in" => Ok(Self::CheckIn(id(data)?)),
            "check_out" => Ok(Self::CheckOut(id(data)?)),
            "refresh" => Ok(Self::Refresh),
            other => Err(ConciergeError::Validation(format!(
                "Unknown reservation action: {}",
                other
            ))),
        }
    }
}

/// Write access for reservation commands; returns the active set afterwards.
#[async_trait]
pub trait ReservationDesk: Send + Sync {
    async fn apply(&self, command: ReservationCommand)
        -> Result<Vec<Reservation>, ConciergeError>;
}

/// SQLite-backed implementation of both collaborator traits.
pub struct SqliteHotelStore {
    rooms: RoomRepository,
    stock: StockRepository,
    reservations: ReservationRepository,
    history: HistoryRepository,
}

impl SqliteHotelStore {
    pub fn new(db: Arc<Database>) -> Self {
        Self {
            rooms: RoomRepository::new(db.clone()),
            stock: StockRepository::new(db.clone()),
            reservations: ReservationRepository::new(db.clone()),
            history: HistoryRepository::new(db),
        }
    }

    fn ensure_dates(start: NaiveDate, end: NaiveDate) -> Result<(), ConciergeError> {
        if end <= start {
            return Err(ConciergeError::Validation(format!(
                "Checkout {} must be after check-in {}",
                end, start
            )));
        }
        Ok(())
    }

    fn change_status(&self, id: Uuid, status: ReservationStatus) -> Result<(), ConciergeError> {
        if !self.reservations.set_status(id, status)? {
            return Err(ConciergeError::NotFound(format!("Reservation {}", id)));
        }
        info!(reservation = %id, status = status.as_str(), "Reservation status changed");
        Ok(())
    }
}

#[async_trait]
impl HotelStore for SqliteHotelStore {
    async fn room(&self, number: &str) -> Result<Option<Room>, ConciergeError> {
        self.rooms.find(number)
    }

    async fn stock_items(&self, names: &[String]) -> Result<Vec<StockItem>, ConciergeError> {
        self.stock.find_by_names(names)
    }

    async fn stock_item_names(&self) -> Result<Vec<String>, ConciergeError> {
        self.stock.names()
    }

    async fn reservation_for(
        &self,
        room_number: &str,
        date: NaiveDate,
    ) -> Result<Option<Reservation>, ConciergeError> {
        self.reservations.find_for_room_on(room_number, date)
    }

    async fn active_reservations(&self) -> Result<Vec<Reservation>, ConciergeError> {
        self.reservations.active()
    }

    async fn append_history(&self, entry: HistoryEntry) -> Result<(), ConciergeError> {
        self.history.append(&entry)
    }

    async fn recent_history(&self, limit: usize) -> Result<Vec<HistoryEntry>, ConciergeError> {
        self.history.recent(limit)
    }
}

#[async_trait]
impl ReservationDesk for SqliteHotelStore {
    async fn apply(
        &self,
        command: ReservationCommand,
    ) -> Result<Vec<Reservation>, ConciergeError> {
        match command {
            ReservationCommand::Create(new) => {
                Self::ensure_dates(new.start_date, new.end_date)?;
                let reservation = Reservation {
                    id: Uuid::new_v4(),
                    room_number: new.room_number,
                    guest_name: new.guest_name,
                    phone: new.phone,
                    start_date: new.start_date,
                    end_date: new.end_date,
                    status: ReservationStatus::Confirmed,
                };
                self.reservations.book(&reservation)?;
                info!(reservation = %reservation.id, room = %reservation.room_number, "Reservation created");
            }
            ReservationCommand::Update(changes) => {
                let mut reservation = self
                    .reservations
                    .find_by_id(changes.id)?
                    .ok_or_else(|| ConciergeError::NotFound(format!("Reservation {}", changes.id)))?;
                if let Some(room) = changes.room_number {
                    reservation.room_number = room;
                }
                if let Some(name) = changes.guest_name {
                    reservation.guest_name = name;
                }
                if changes.phone.is_some() {
                    reservation.phone = changes.phone;
                }
                if let Some(start) = changes.start_date {
                    reservation.start_date = start;
                }
                if let Some(end) = changes.end_date {
                    reservation.end_date = end;
                }
                Self::ensure_dates(reservation.start_date, reservation.end_date)?;
                self.reservations.book(&reservation)?;
                info!(reservation = %reservation.id, "Reservation updated");
            }
            ReservationCommand::Cancel(id) => self.change_status(id, ReservationStatus::Cancelled)?,
            ReservationCommand::CheckIn(id) => self.change_status(id, ReservationStatus::CheckedIn)?,
            ReservationCommand::CheckOut(id) => {
                self.change_status(id, ReservationStatus::CheckedOut)?
            }
            ReservationCommand::Refresh => {}
        }
        self.reservations.active()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use concierge_core::records::{HistoryKind, RoomStatus};
    use serde_json::json;

    fn make_store() -> SqliteHotelStore {
        let db = Arc::new(Database::in_memory().unwrap());
        let rooms = RoomRepository::new(db.clone());
        for number in ["101", "305"] {
            rooms
                .save(&Room {
                    number: number.to_string(),
                    room_type: "dubla".to_string(),
                    floor: 1,
                    status: RoomStatus::Available,
                })
                .unwrap();
        }
        SqliteHotelStore::new(db)
    }

    fn create_command(room: &str, start: &str, end: &str) -> ReservationCommand {
        ReservationCommand::parse(
            "create",
            json!({
                "roomNumber": room,
                "guestName": "Andrei Anton",
                "startDate": start,
                "endDate": end,
            }),
        )
        .unwrap()
    }

    #[test]
    fn test_parse_rejects_unknown_action() {
        let err = ReservationCommand::parse("teleport", json!({})).unwrap_err();
        assert!(matches!(err, ConciergeError::Validation(_)));
    }

    #[test]
    fn test_parse_requires_id_for_cancel() {
        let err = ReservationCommand::parse("cancel", json!({"room": "1"})).unwrap_err();
        assert!(matches!(err, ConciergeError::Serialization(_)));
    }

    #[tokio::test]
    async fn test_create_and_lookup_reservation() {
        let store = make_store();
        let active = store
            .apply(create_command("305", "2025-04-16", "2025-04-18"))
            .await
            .unwrap();
        assert_eq!(active.len(), 1);

        let day = NaiveDate::from_ymd_opt(2025, 4, 17).unwrap();
        let found = store.reservation_for("305", day).await.unwrap().unwrap();
        assert_eq!(found.guest_name, "Andrei Anton");
    }

    #[tokio::test]
    async fn test_create_rejects_overlap_and_missing_room() {
        let store = make_store();
        store
            .apply(create_command("305", "2025-04-16", "2025-04-18"))
            .await
            .unwrap();

        let overlap = store
            .apply(create_command("305", "2025-04-17", "2025-04-20"))
            .await
            .unwrap_err();
        assert!(matches!(overlap, ConciergeError::Validation(_)));

        let missing = store
            .apply(create_command("999", "2025-04-17", "2025-04-20"))
            .await
            .unwrap_err();
        assert!(matches!(missing, ConciergeError::NotFound(_)));

        let backwards = store
            .apply(create_command("101", "2025-04-17", "2025-04-17"))
            .await
            .unwrap_err();
        assert!(matches!(backwards, ConciergeError::Validation(_)));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_overlapping_creates_book_once() {
        let store = Arc::new(make_store());
        let tasks: Vec<_> = (0..8)
            .map(|_| {
                let store = store.clone();
                tokio::spawn(async move {
                    store
                        .apply(create_command("305", "2025-04-16", "2025-04-18"))
                        .await
                })
            })
            .collect();

        let mut booked = 0;
        for task in tasks {
            match task.await.unwrap() {
                Ok(_) => booked += 1,
                Err(e) => assert!(matches!(e, ConciergeError::Validation(_))),
            }
        }
        assert_eq!(booked, 1);
        assert_eq!(store.active_reservations().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_update_and_cancel() {
        let store = make_store();
        let active = store
            .apply(create_command("305", "2025-04-16", "2025-04-18"))
            .await
            .unwrap();
        let id = active[0].id;

        let updated = store
            .apply(
                ReservationCommand::parse(
                    "update",
                    json!({"id": id.to_string(), "roomNumber": "101"}),
                )
                .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(updated[0].room_number, "101");

        let after_cancel = store.apply(ReservationCommand::Cancel(id)).await.unwrap();
        assert!(after_cancel.is_empty());

        let missing = store
            .apply(ReservationCommand::Cancel(Uuid::new_v4()))
            .await
            .unwrap_err();
        assert!(matches!(missing, ConciergeError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_history_append_and_recent() {
        let store = make_store();
        store
            .append_history(HistoryEntry::new(HistoryKind::Chat, "salut", None))
            .await
            .unwrap();
        let recent = store.recent_history(5).await.unwrap();
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].text, "salut");
    }
}
