// crates/monitor/src/lib.rs
//! Job monitoring core: log buffering, snapshot/stream reconciliation, and
//! the delayed results-view navigation.
//!
//! One [`MonitorSession`] owns everything for one job id. The snapshot fetch
//! and the event stream race; [`JobStateStore`] resolves the race with
//! last-write-wins whole-value replacement, and all mutation funnels through
//! the session's single event loop so there is never more than one writer.

pub mod log_buffer;
pub mod navigation;
pub mod session;
pub mod store;

pub use log_buffer::LogBuffer;
pub use navigation::{NavState, Navigation, NavigationController, REDIRECT_DELAY};
pub use session::{MonitorEvent, MonitorSession};
pub use store::JobStateStore;
