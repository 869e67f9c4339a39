#[allow(clippy::module_inception)]
mod auth_page;

pub use auth_page::AuthPage;
