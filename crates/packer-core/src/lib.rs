//! Room packing and layout engine.
//!
//! Computes non-overlapping placements of boxed items inside a room, reports
//! what could not be placed, and validates or optimizes stored layouts.

pub mod collision;
pub mod config;
pub mod free_space;
pub mod geometry;
pub mod grouping;
pub mod optimizer;
pub mod packer;
pub mod rotation;
pub mod stacking;
pub mod strategy;
pub mod tolerance;
pub mod types;
pub mod validator;

pub use config::EngineConfig;
pub use geometry::{Box3D, Point, Rectangle};
pub use optimizer::{LayoutOptimizer, OptimizerOptions};
pub use packer::{optimize_layout, pack, validate_layout, Packer};
pub use rotation::Rotation;
pub use strategy::{CompartmentStrategy, HybridStrategy, LaffStrategy, PackingStrategy};
pub use types::*;
pub use validator::LayoutValidator;
