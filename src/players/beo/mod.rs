//! Bang & Olufsen speakers (BeoNotify / BeoZone REST API)

pub mod api;
pub mod connection;
pub mod controller;
pub mod dispatcher;
pub mod engine;
pub mod error;
pub mod notification;
pub mod translator;

pub use controller::{BeoPlayerController, PLAYER_NAME};
pub use error::{BeoError, ProtocolError};
