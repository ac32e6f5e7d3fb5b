//! # huddle-client
//!
//! Invitation-gated sign-in and two-party chat for Huddle workspaces.
//!
//! - [`gate`]: owner and invited-agent login.
//! - [`resolver`]: one canonical thread per pair of participants.
//! - [`stream`]: live, ordered message snapshots and sending.
//! - [`session`]: ties the three together for one signed-in user.

pub mod auth;
pub mod backend;
pub mod config;
pub mod error;
pub mod events;
pub mod gate;
pub mod resolver;
pub mod session;
pub mod stream;

use tracing_subscriber::{fmt, EnvFilter};

pub use auth::{AuthIdentity, AuthProvider, StaticAuthProvider};
pub use backend::{ChatStore, IdentityStore};
pub use config::ClientConfig;
pub use error::{AuthError, SessionError};
pub use gate::{AgentLogin, AgentLoginState, Identity, InvitationGate, Role};
pub use resolver::find_or_create_thread;
pub use session::{MessageSink, Session};
pub use stream::{MessageStream, Snapshot, Subscription};

/// Install the global `tracing` subscriber. `RUST_LOG` overrides the
/// default filter. Calling this again is a no-op.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("huddle_client=debug,huddle_store=info,warn"));

    let installed = fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .try_init()
        .is_ok();

    if installed {
        tracing::info!("Starting {}", huddle_shared::constants::APP_NAME);
    }
}
