//! Camera-driven freehand drawing: colored markers become pointers, and the
//! number of pointers in view decides whether the user is drawing, erasing
//! or moving shapes.

pub mod calibration;
pub mod camera;
pub mod cli;
pub mod clock;
pub mod color;
pub mod composite;
pub mod config;
pub mod draw;
pub mod error;
pub mod geometry;
pub mod gesture;
pub mod registry;
pub mod session;
pub mod shape;
pub mod stroke;
pub mod tracker;
pub mod types;

pub use config::EngineConfig;
pub use error::Error;
pub use gesture::InteractionMode;
pub use session::{Session, StepReport};
