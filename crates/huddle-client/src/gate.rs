//! Invitation gate: who may sign in, and as what.
//!
//! Owners sign in unconditionally and get their workspace registered on the
//! first login. Agents must claim an email first; the claim is checked
//! against every workspace's invite list *before* any handshake is started,
//! and the identity the handshake returns must match the claim.
//!
//! Agent login walks this machine:
//!
//! ```text
//! Idle -> EmailClaimed -> Rejected
//!                      -> Invited -> Authenticating -> Verified
//!                                                   -> Mismatched
//! ```
//!
//! `Rejected` and `Mismatched` are terminal failures; the next attempt
//! starts over from `Idle`.

use chrono::{SubsecRound, Utc};
use huddle_shared::{normalize_email, Email, Uid};
use huddle_store::User;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::auth::AuthProvider;
use crate::backend::IdentityStore;
use crate::error::SessionError;

/// What kind of session an [`Identity`] holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Owner,
    Agent,
}

/// A signed-in user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub uid: Uid,
    pub email: Email,
    pub role: Role,
    /// The owner uid whose threads this identity reads and writes. Equal to
    /// `uid` for owners.
    pub workspace: Uid,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AgentLoginState {
    Idle,
    EmailClaimed { email: Email },
    Rejected { email: Email },
    Invited { email: Email, workspace: Uid },
    Authenticating { email: Email, workspace: Uid },
    Verified(Identity),
    Mismatched { claimed: Email, actual: String },
}

impl AgentLoginState {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::EmailClaimed { .. } => "email_claimed",
            Self::Rejected { .. } => "rejected",
            Self::Invited { .. } => "invited",
            Self::Authenticating { .. } => "authenticating",
            Self::Verified(_) => "verified",
            Self::Mismatched { .. } => "mismatched",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Rejected { .. } | Self::Verified(_) | Self::Mismatched { .. }
        )
    }
}

/// Progress of one agent login attempt.
#[derive(Debug, Clone)]
pub struct AgentLogin {
    state: AgentLoginState,
}

impl AgentLogin {
    pub fn new() -> Self {
        Self {
            state: AgentLoginState::Idle,
        }
    }

    pub fn state(&self) -> &AgentLoginState {
        &self.state
    }

    fn advance(&mut self, next: AgentLoginState) {
        debug!(from = self.state.name(), to = next.name(), "agent login");
        self.state = next;
    }
}

impl Default for AgentLogin {
    fn default() -> Self {
        Self::new()
    }
}

pub struct InvitationGate<'a, S, A> {
    store: &'a S,
    auth: &'a A,
}

impl<'a, S, A> InvitationGate<'a, S, A>
where
    S: IdentityStore,
    A: AuthProvider,
{
    pub fn new(store: &'a S, auth: &'a A) -> Self {
        Self { store, auth }
    }

    /// Sign in as a workspace owner, registering the workspace on first
    /// login.
    pub async fn authenticate_as_owner(&self) -> Result<Identity, SessionError> {
        let handshake = self.auth.authenticate().await?;
        let email = Email::parse(&handshake.email)?;

        self.ensure_registered(&handshake.uid, &email).await?;

        info!(uid = %handshake.uid, email = %email, "owner signed in");
        Ok(Identity {
            workspace: handshake.uid.clone(),
            uid: handshake.uid,
            email,
            role: Role::Owner,
        })
    }

    /// Create the owner record unless it already exists. Returns the stored
    /// record and whether this call created it.
    pub async fn ensure_registered(
        &self,
        uid: &Uid,
        email: &Email,
    ) -> Result<(User, bool), SessionError> {
        if let Some(existing) = self.store.get_user(uid).await? {
            return Ok((existing, false));
        }

        let user = User {
            uid: uid.clone(),
            email: email.clone(),
            contacts: Vec::new(),
            is_owner: true,
            // Stored timestamps keep microseconds.
            created_at: Utc::now().trunc_subsecs(6),
        };
        self.store.create_user(&user).await?;

        info!(uid = %uid, email = %email, "workspace created");
        Ok((user, true))
    }

    /// Sign in as an invited agent claiming `claimed_email`.
    pub async fn authenticate_as_agent(&self, claimed_email: &str) -> Result<Identity, SessionError> {
        let mut login = AgentLogin::new();
        self.run_agent_login(&mut login, claimed_email).await
    }

    /// Drive `login` through one attempt. A login that already finished (or
    /// was interrupted) is reset to `Idle` first.
    pub async fn run_agent_login(
        &self,
        login: &mut AgentLogin,
        claimed_email: &str,
    ) -> Result<Identity, SessionError> {
        if login.state != AgentLoginState::Idle {
            login.advance(AgentLoginState::Idle);
        }

        // Nothing is read before the claim is known to be non-empty.
        let email = Email::parse(claimed_email)?;
        login.advance(AgentLoginState::EmailClaimed {
            email: email.clone(),
        });

        let Some(workspace) = self.inviting_workspace(&email).await? else {
            warn!(email = %email, "sign-in rejected: not invited");
            login.advance(AgentLoginState::Rejected {
                email: email.clone(),
            });
            return Err(SessionError::NotInvited(email));
        };

        login.advance(AgentLoginState::Invited {
            email: email.clone(),
            workspace: workspace.clone(),
        });
        login.advance(AgentLoginState::Authenticating {
            email: email.clone(),
            workspace: workspace.clone(),
        });

        let handshake = match self.auth.authenticate().await {
            Ok(handshake) => handshake,
            Err(e) => {
                login.advance(AgentLoginState::Idle);
                return Err(e.into());
            }
        };

        let actual = normalize_email(&handshake.email);
        if actual != email.as_str() {
            warn!(claimed = %email, actual = %actual, "identity mismatch, signing out");
            if let Err(e) = self.auth.sign_out().await {
                warn!(error = %e, "sign-out after identity mismatch failed");
            }
            login.advance(AgentLoginState::Mismatched {
                claimed: email.clone(),
                actual: actual.clone(),
            });
            return Err(SessionError::IdentityMismatch {
                claimed: email,
                actual,
            });
        }

        let identity = Identity {
            uid: handshake.uid,
            email,
            role: Role::Agent,
            workspace,
        };
        info!(uid = %identity.uid, workspace = %identity.workspace, "agent signed in");
        login.advance(AgentLoginState::Verified(identity.clone()));
        Ok(identity)
    }

    /// Linear scan over every invite list; the first registered user whose
    /// contacts include `email` owns the workspace the agent joins.
    async fn inviting_workspace(&self, email: &Email) -> Result<Option<Uid>, SessionError> {
        let users = self.store.list_users().await?;
        Ok(users
            .into_iter()
            .find(|user| user.contacts.contains(email))
            .map(|user| user.uid))
    }
}
