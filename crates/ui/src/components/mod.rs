pub mod actions;
pub mod footer;
pub mod header;
pub mod panes;
pub mod settings_dialog;

pub use actions::ActionsBar;
pub use footer::Footer;
pub use header::Header;
pub use panes::{InputPane, OutputPane};
pub use settings_dialog::SettingsDialog;
