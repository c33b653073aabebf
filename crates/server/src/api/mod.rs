mod alerts;
mod geocode;
mod oba;
mod surveys;

pub use alerts::*;
pub use geocode::*;
pub use oba::*;
pub use surveys::*;
