pub mod button;
pub mod context_menu;
pub mod textarea;

// Re-export component symbols so callers can `use crate::components::ui::Button` etc.
pub use button::*;
pub use context_menu::*;
pub use textarea::*;
