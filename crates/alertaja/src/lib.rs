//! `alertaja` - A community traffic alert and courier availability board
//!
//! This library provides the board's core: reporting and voting on incident
//! alerts, announcing and finding available couriers, and the storage, expiry
//! and chat-link plumbing behind them.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

pub mod alerts;
pub mod cli;
pub mod config;
pub mod courier;
pub mod display;
pub mod error;
pub mod expiry;
pub mod geo;
pub mod logging;
pub mod map;
pub mod messaging;
pub mod phone;
pub mod session;
pub mod storage;

pub use alerts::{Alert, AlertBoard, AlertType, DisputeOutcome, NewAlert, Report};
pub use config::Config;
pub use courier::{AvailabilityPublisher, CourierDirectory, CourierStatus, DirectoryEntry, OwnStatus};
pub use error::{Error, Result, ValidationError};
pub use expiry::{AlertPolicy, CourierPolicy};
pub use geo::Coordinates;
pub use logging::init_logging;
pub use messaging::Messenger;
pub use session::{Session, SessionHolder};
pub use storage::{Storage, StorageStats};
