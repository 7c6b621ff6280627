//! Domain models for the storefront session.

mod session;
mod user;

pub use session::{Session, SessionInfo, SessionSnapshot};
pub use user::AuthUser;
