pub mod attack;
pub mod decode;
pub mod encode;
pub mod info;

pub use attack::*;
pub use decode::*;
pub use encode::*;
pub use info::*;
