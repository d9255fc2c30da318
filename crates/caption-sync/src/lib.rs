//! Bilingual captions for a host video page.
//!
//! A [`Session`] waits for the page's transcript panel and caption overlay,
//! translates the transcript sentence by sentence and keeps the overlay showing
//! the translation of whichever cue the player marks active.

mod cache;
mod config;
pub mod constants;
mod controller;
pub mod cue;
pub mod detect;
mod error;
mod events;
mod i18n;
pub mod markup;
mod menu;
mod orchestrator;
mod progress;
mod render;
mod scheduler;
mod session;
mod sync;

pub use cache::*;
pub use config::*;
pub use controller::*;
pub use error::*;
pub use events::*;
pub use i18n::*;
pub use menu::*;
pub use orchestrator::*;
pub use progress::*;
pub use render::*;
pub use scheduler::*;
pub use session::*;
pub use sync::*;

use std::cell::RefCell;
use std::rc::Rc;

use cue_host_dom::Document;

/// The page as seen by every component of one session. Never borrowed across
/// an await point.
pub type SharedDocument = Rc<RefCell<Document>>;
