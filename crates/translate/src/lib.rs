mod factory;
mod http;
mod prompt;
mod providers;
pub mod sanitize;

pub use factory::*;
pub use providers::*;

pub use cue_translate_interface::*;
