pub mod app_state;
pub mod auth;
pub mod error;
pub mod routes;

pub use app_state::AppState;

#[cfg(test)]
pub(crate) mod test_support;
