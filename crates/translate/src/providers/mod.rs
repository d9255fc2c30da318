mod deepl;
mod deepseek;
mod gemini;
mod passthrough;

pub use deepl::*;
pub use deepseek::*;
pub use gemini::*;
pub use passthrough::*;
