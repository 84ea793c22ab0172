pub mod init;
pub mod mem_store;

pub use init::{init, InitError};
pub use mem_store::MemStore;

#[cfg(test)]
mod tests;
