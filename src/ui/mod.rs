//! UI module for consistent CLI output
//!
//! Uses `cliclack` for interactive prompts and spinners, with automatic
//! fallback to plain output in CI/non-interactive environments.

mod context;
mod output;
mod progress;
mod prompts;

pub use context::UiContext;
pub use output::{intro, outro_success, remark, step_info, step_ok, step_warn};
pub use progress::TaskSpinner;
pub use prompts::confirm;
