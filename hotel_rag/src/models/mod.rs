pub mod hotel;
pub mod index;
pub mod intent;
pub mod search;

pub use hotel::*;
pub use index::*;
pub use intent::*;
pub use search::*;
