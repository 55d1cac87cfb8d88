pub mod gate;
pub mod identity;
pub use gate::*;
pub use identity::*;
