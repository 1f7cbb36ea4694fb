pub mod board;
pub mod config;
pub mod game;
pub mod position;
pub mod protocol;
pub mod room;
pub mod rules;
pub mod selection;
pub mod web;

pub use board::*;
pub use game::*;
pub use position::*;
pub use protocol::*;
pub use room::*;
pub use rules::*;
pub use selection::*;
