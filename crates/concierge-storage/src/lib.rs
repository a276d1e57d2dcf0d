//! Concierge Storage crate - SQLite persistence behind narrow collaborator traits.
//!
//! Provides a WAL-mode SQLite database with migrations, repositories for
//! rooms/stock/reservations/history, and the `HotelStore` and
//! `ReservationDesk` traits the interpreter and channel depend on.

pub mod db;
pub mod migrations;
pub mod repository;
pub mod seed;
pub mod store;

pub use db::Database;
pub use repository::{HistoryRepository, ReservationRepository, RoomRepository, StockRepository};
pub use seed::seed_demo_data;
pub use store::{HotelStore, NewReservation, ReservationCommand, ReservationDesk, SqliteHotelStore};
