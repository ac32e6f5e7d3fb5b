//! The session controller.
//!
//! One [`Session`] per signed-in user. It owns the identity, the thread the
//! UI is looking at and the live subscription to it; the subscription is
//! released whenever the thread changes or the session ends. The only
//! mutating entry points a UI should call are [`Session::send`] and
//! [`Session::switch_counterpart`] (plus the login calls).

use std::sync::Arc;

use huddle_shared::{Email, ThreadId, ValidationError};
use huddle_store::{Message, StoreError};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::auth::AuthProvider;
use crate::backend::{ChatStore, IdentityStore};
use crate::config::ClientConfig;
use crate::error::SessionError;
use crate::gate::{AgentLogin, AgentLoginState, Identity, InvitationGate, Role};
use crate::resolver::find_or_create_thread;
use crate::stream::{MessageStream, Snapshot, Subscription};

/// Rendering callback. Receives the full, ordered message list of the
/// active thread on every change.
pub type MessageSink = Arc<dyn Fn(Snapshot) + Send + Sync>;

struct ActiveThread {
    counterpart: Email,
    subscription: Subscription,
}

pub struct Session<S, A> {
    store: S,
    auth: A,
    stream: MessageStream<S>,
    sink: MessageSink,
    identity: Option<Identity>,
    agent_login: AgentLogin,
    active: Option<ActiveThread>,
    /// The thread whose snapshots may reach `sink`.
    current: watch::Sender<Option<ThreadId>>,
}

impl<S, A> Session<S, A>
where
    S: IdentityStore + ChatStore + Clone + 'static,
    A: AuthProvider,
{
    pub fn new(store: S, auth: A, config: &ClientConfig, sink: MessageSink) -> Self {
        let stream = MessageStream::new(store.clone()).with_max_message_len(config.max_message_len);
        let (current, _) = watch::channel(None);
        Self {
            store,
            auth,
            stream,
            sink,
            identity: None,
            agent_login: AgentLogin::new(),
            active: None,
            current,
        }
    }

    pub fn identity(&self) -> Option<&Identity> {
        self.identity.as_ref()
    }

    /// Where the most recent agent login attempt stopped.
    pub fn agent_login_state(&self) -> &AgentLoginState {
        self.agent_login.state()
    }

    pub fn active_thread(&self) -> Option<&ThreadId> {
        self.active.as_ref().map(|a| a.subscription.thread_id())
    }

    pub fn counterpart(&self) -> Option<&Email> {
        self.active.as_ref().map(|a| &a.counterpart)
    }

    pub async fn login_owner(&mut self) -> Result<&Identity, SessionError> {
        self.reset();
        let identity = InvitationGate::new(&self.store, &self.auth)
            .authenticate_as_owner()
            .await?;
        Ok(self.identity.insert(identity))
    }

    pub async fn login_agent(&mut self, claimed_email: &str) -> Result<&Identity, SessionError> {
        self.reset();
        let identity = InvitationGate::new(&self.store, &self.auth)
            .run_agent_login(&mut self.agent_login, claimed_email)
            .await?;
        Ok(self.identity.insert(identity))
    }

    /// Whom the signed-in user can talk to: the owner's invite list, or the
    /// workspace owner for an agent.
    pub async fn counterparts(&self) -> Result<Vec<Email>, SessionError> {
        let identity = self.require_identity()?;
        match identity.role {
            Role::Owner => Ok(self
                .store
                .get_user(&identity.uid)
                .await?
                .map(|user| user.contacts)
                .unwrap_or_default()),
            Role::Agent => {
                let owner = self
                    .store
                    .get_user(&identity.workspace)
                    .await?
                    .ok_or(StoreError::NotFound)?;
                Ok(vec![owner.email])
            }
        }
    }

    /// Make the thread with `counterpart` the active one.
    ///
    /// Only emails listed by [`counterparts`](Self::counterparts) are
    /// accepted. The previous subscription is cancelled before the new
    /// thread is resolved, and the new one is only subscribed once
    /// resolution is done. On failure no thread is active.
    pub async fn switch_counterpart(&mut self, counterpart: &str) -> Result<ThreadId, SessionError> {
        let identity = self.require_identity()?;
        let workspace = identity.workspace.clone();
        let me = identity.email.clone();
        let counterpart = Email::parse(counterpart)?;

        self.release_active();

        if !self.counterparts().await?.contains(&counterpart) {
            warn!(counterpart = %counterpart, "refusing thread with a non-contact");
            return Err(ValidationError::NotAContact(counterpart).into());
        }

        let thread_id = find_or_create_thread(&self.store, &workspace, &me, &counterpart).await?;

        self.current.send_replace(Some(thread_id.clone()));
        let current = self.current.subscribe();
        let sink = Arc::clone(&self.sink);
        let subscription = self.stream.subscribe(thread_id.clone(), move |snapshot| {
            if current.borrow().as_ref() == Some(&snapshot.thread_id) {
                sink(snapshot);
            } else {
                debug!(thread = %snapshot.thread_id, "discarding stray snapshot");
            }
        })?;

        info!(thread = %thread_id, counterpart = %counterpart, "active thread switched");
        self.active = Some(ActiveThread {
            counterpart,
            subscription,
        });
        Ok(thread_id)
    }

    /// Send `text` from the signed-in user to the active counterpart.
    pub async fn send(&self, text: &str) -> Result<Message, SessionError> {
        let identity = self.require_identity()?;
        let active = self.active.as_ref().ok_or(ValidationError::NoActiveThread)?;

        self.stream
            .send(
                active.subscription.thread_id(),
                &identity.email,
                &active.counterpart,
                text,
            )
            .await
    }

    /// Store errors the live feed reported since the last call.
    pub fn take_stream_errors(&mut self) -> Vec<StoreError> {
        let mut errors = Vec::new();
        if let Some(active) = self.active.as_mut() {
            while let Some(e) = active.subscription.try_next_error() {
                errors.push(e);
            }
        }
        errors
    }

    /// End the session: drop the live feed, then revoke the provider session.
    pub async fn sign_out(&mut self) -> Result<(), SessionError> {
        let had_identity = self.identity.is_some();
        self.reset();
        self.auth.sign_out().await?;
        if had_identity {
            info!("signed out");
        }
        Ok(())
    }

    fn require_identity(&self) -> Result<&Identity, ValidationError> {
        self.identity.as_ref().ok_or(ValidationError::NotSignedIn)
    }

    fn release_active(&mut self) {
        if let Some(active) = self.active.take() {
            active.subscription.cancel();
        }
        self.current.send_replace(None);
    }

    fn reset(&mut self) {
        self.release_active();
        self.identity = None;
    }
}
