//! Bridge between the TIGRE client and its opaque backend.
//!
//! * [`Backend`]: the four request/response commands the client may invoke
//! * [`EventHub`]: named event fan-out shared by backend pushes and local emitters
//! * [`stdio`]: a line-delimited JSON transport to a backend child process
//! * [`sync`]: keeps the layer store in step with backend layer events

pub mod backend;
pub mod error;
pub mod hub;
pub mod stdio;
pub mod sync;
#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use backend::{Backend, GeometrySet, ReadForm, SharedBackend};
pub use error::{BridgeError, Result};
pub use hub::{EventHub, EventStream};
pub use stdio::StdioBackend;
pub use sync::LayerSync;
