pub mod checklist_handler;

pub use checklist_handler::*;
