pub mod memory;
pub mod mysql;

pub use memory::MemoryDriver;
pub use mysql::MySqlDriver;
