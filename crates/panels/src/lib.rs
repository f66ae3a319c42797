//! Side panels of the TIGRE client.
//!
//! * [`loading`]: progress bar driven by `loading` events
//! * [`table`]: attribute table driven by `open-table`/`close-table`
//! * [`pane`]: the layer list with visibility toggles and analysis actions
//! * [`repl`]: the command pipeline and its history

pub mod loading;
pub mod pane;
pub mod repl;
pub mod table;

pub use loading::{LoadingBar, LoadingIndicator};
pub use pane::{LayerPane, PaneError, PaneRow};
pub use repl::{CommandPipeline, History, HistoryItem};
pub use table::{TableError, TableTab, TableView, TableViewState};
