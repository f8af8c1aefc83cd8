pub mod export;
pub mod parse;

pub use export::*;
pub use parse::*;
