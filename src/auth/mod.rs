pub mod password;

pub use password::{hash_new_password, verify_password};
