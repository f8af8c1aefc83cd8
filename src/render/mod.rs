pub mod avatar;
pub mod csv;
pub mod document;
pub mod print;
pub mod text;

pub use avatar::*;
pub use csv::*;
pub use document::*;
pub use print::*;
pub use text::*;
