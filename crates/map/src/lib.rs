//! Map view coordination for the TIGRE client.
//!
//! * [`scheduler`]: debounced redraw passes over the visible vector layers
//! * [`click`]: single-shot map click to `inspect` command dispatch
//! * [`surface`]: the render target owned by the scheduler

pub mod click;
pub mod scheduler;
pub mod surface;
#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use click::{ClickDispatcher, ClickHandler, ClickPort};
pub use scheduler::{FailedFetch, FetchError, PassReport, RedrawConfig, RedrawPhase, RedrawScheduler, RedrawTrigger};
pub use surface::{Basemap, HeadlessSurface, MapSurface, Overlay};
