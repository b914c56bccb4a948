pub mod memory;
pub mod models;
pub mod mongodb;
pub mod store;

pub use memory::MemoryStore;
pub use models::{LunchReservation, Student};
pub use self::mongodb::MongoRepo;
pub use store::{with_timeout, LunchStore};
