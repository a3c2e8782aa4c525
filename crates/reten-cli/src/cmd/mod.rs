//! One module per subcommand.

pub mod comment;
pub mod confirm;
pub mod list;
pub mod report;
pub mod token;
pub mod watch;

use crate::output::OutputMode;
use reten_core::Lifecycle;

/// Everything a command handler needs: the lifecycle manager over the
/// shared store, this device's identity, and the output mode.
pub struct AppContext {
    pub lifecycle: Lifecycle,
    pub device_token: String,
    pub mode: OutputMode,
}
