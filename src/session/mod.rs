//! Session management: one exclusively-owned browsing session per job
//!
//! This module contains:
//! - The [`PageDriver`] capability trait and its cookie-jar HTTP
//!   implementation
//! - The [`Session`] lifecycle: open, optional login, scoped release
//! - Cookie snapshot import/export for an external persistence collaborator

mod driver;
mod manager;

pub use driver::{FetchedPage, HttpDriver, PageDriver, StoredCookie};
pub use manager::{Session, SessionState};
