pub mod actions;
mod app_state;
mod bubble;
mod bubble_list;
pub mod clipboard;
mod code_blocks;
mod conversation;
pub mod events;
mod markdown_table;
mod normalize;
mod scroll;
mod sidebar;
mod syntaxes;
mod themes;

pub use app_state::*;
pub use bubble::*;
pub use bubble_list::*;
pub use code_blocks::*;
pub use conversation::*;
pub use markdown_table::*;
pub use normalize::*;
pub use scroll::*;
pub use sidebar::*;
pub use syntaxes::*;
pub use themes::*;
