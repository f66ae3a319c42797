//! Shared state and wire vocabulary for the TIGRE client.
//!
//! This crate holds everything the other client crates agree on:
//! * [`store`]: the reactive layer store and its reducer actions
//! * [`layer`]: vector/raster layer records and symbology
//! * [`event`]: named backend events and their payload decoding
//! * [`command`]: the REPL command grammar and the shared command surface
//! * [`output`]: the `Output` record returned by command evaluation

pub mod command;
pub mod event;
pub mod geo;
pub mod layer;
pub mod output;
pub mod store;

pub use command::{Command, CommandReceiver, CommandSurface, DbConnect, DbDescribe};
pub use event::{EventError, SessionEvent};
pub use geo::LngLat;
pub use layer::{Layer, LayerEntry, LayerRef, RasterEntry, RasterLayer, Symbology, VectorEntry, VectorLayer};
pub use output::{Output, OutputResults};
pub use store::{LayerAction, LayerStore, LayerStoreState};
