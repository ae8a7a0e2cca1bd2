pub mod cursor;
pub mod deletion;
pub mod memory;
pub mod posting;
