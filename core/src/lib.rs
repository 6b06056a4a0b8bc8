//! beergame-core — a four-tier supply-chain ("beer game") simulation and
//! turn-synchronization engine.
//!
//! The chain is Retailer → Wholesaler → Distributor → Factory, advanced
//! in discrete weekly ticks. `engine::Simulation` owns the per-node
//! inventory/order/shipment state machine; `controller::GameController`
//! gates each weekly advance on collecting every participant's decision;
//! `manager::GameManager` is the surface a transport layer drives.
//!
//! Transport, rendering, persistence and scoring presentation live
//! outside this crate. Events are queued in memory for the collaborator
//! to drain; nothing here performs blocking I/O.

pub mod config;
pub mod controller;
pub mod demand;
pub mod engine;
pub mod error;
pub mod event;
pub mod manager;
pub mod metrics;
pub mod node;
pub mod pipeline;
pub mod policy;
pub mod snapshot;
pub mod types;

pub use error::{GameError, GameResult};
pub use types::{GameId, ParticipantId, Quantity, Week};
