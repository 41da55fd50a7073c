//! Data models for the admin backend
//!
//! Wire shapes for insights, team members, uploads and auth, plus the
//! client-side page accumulator used by the "load more" listings.

mod auth;
mod insight;
mod pagination;
mod team_member;
mod upload;

// Re-export all models for convenient imports
pub use auth::*;
pub use insight::*;
pub use pagination::*;
pub use team_member::*;
pub use upload::*;
