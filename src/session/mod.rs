//! In-memory session lifecycle.
//!
//! ## Components
//! - `codec`: HS256 token signing and verification
//! - `registry`: which issued tokens are currently live
//! - `manager`: issue / authorize / renew / flush on top of the two
//! - `gate`: Axum middleware guarding protected routes
//! - `sweeper`: optional background removal of expired sessions

pub mod codec;
pub mod gate;
pub mod manager;
pub mod registry;
pub mod sweeper;

pub use codec::{Claims, MintedToken, TokenCodec, TokenError};
pub use gate::{extract_token, session_gate};
pub use manager::{AuthenticatedSubject, SessionManager};
pub use registry::SessionRegistry;
pub use sweeper::spawn_sweeper;
