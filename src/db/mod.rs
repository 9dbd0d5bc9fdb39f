pub mod schema;
pub mod tokens;
pub mod users;
