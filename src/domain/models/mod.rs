mod action;
mod backend;
mod command;
mod event;
mod message;
mod settings;
mod slash_commands;
mod textarea;

pub use action::*;
pub use backend::*;
pub use command::*;
pub use event::*;
pub use message::*;
pub use settings::*;
pub use slash_commands::*;
pub use textarea::*;
