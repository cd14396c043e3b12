/// Player management for networked speakers
mod player_controller;
mod base_controller;
pub mod beo;

// Re-export the PlayerController trait and related components
pub use player_controller::{PlayerController, PlayerStateListener};
pub use base_controller::BasePlayerController;
pub use beo::BeoPlayerController;
