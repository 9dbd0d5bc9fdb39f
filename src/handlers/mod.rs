//! HTTP endpoint handlers for the account API.
//!
//! Each endpoint follows the same shape: a thin handler that validates input
//! and maps errors to HTTP statuses, and a `_logic` module holding the
//! collaborator calls.

pub mod login;
pub mod login_logic;
pub mod logout;
pub mod logout_logic;
pub mod refresh;
pub mod refresh_logic;
pub mod session;
