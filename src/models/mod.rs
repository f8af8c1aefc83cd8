pub mod participant;
pub mod turn;

pub use participant::*;
pub use turn::*;
