//! CLI command implementations

pub mod install;
pub mod list;
pub mod locate;
pub mod run;
pub mod uninstall;
pub mod version;

pub use install::execute as install;
pub use list::execute as list;
pub use locate::execute as locate;
pub use run::execute as run;
pub use uninstall::execute as uninstall;
pub use version::execute as version;
