pub mod ipfs;
pub mod memory;
