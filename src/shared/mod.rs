pub mod format;
pub mod geo;
pub mod time;
pub mod url;

pub use format::*;
pub use geo::*;
pub use time::*;
pub use self::url::*;
