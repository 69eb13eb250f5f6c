pub mod db;
pub mod memory;
pub mod payments;

pub use db::DbAdapter;
pub use memory::MemoryStore;
pub use payments::StripeAdapter;
