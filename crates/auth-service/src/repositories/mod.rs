pub mod users;

pub use users::{InMemoryUserRepository, UserRepository};
