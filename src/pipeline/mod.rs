pub mod bits;
pub mod cipher;
pub mod compress;
pub mod lsb;
pub mod segment;
pub mod stego;

pub use bits::*;
pub use cipher::*;
pub use compress::*;
pub use lsb::*;
pub use segment::*;
pub use stego::*;
