//! Registry of per-resource sessions.
//!
//! A session is created the first time its key is looked up and lives until
//! the key is explicitly removed, which the dispatcher does on `disconnect`.
//! The registry is shared by every connection thread, so both the key map and
//! each individual session sit behind their own mutex: two connections that
//! use the same key are serialised, while unrelated keys only contend on the
//! brief map lookup.

use std::collections::HashMap;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex, PoisonError};

use thiserror::Error;
use tracing::debug;

use crate::handler::{TransparentHandler, VfsHandler, panic_message};

const SESSION_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::session");

/// Opaque identifier of the resource a session is bound to.
///
/// The shim sends the share's original path, but the registry attaches no
/// meaning to it; any string, including the empty one, is a valid key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionKey(String);

impl SessionKey {
    /// Wraps a raw key.
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Key as text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for SessionKey {
    fn from(key: &str) -> Self {
        Self::new(key)
    }
}

impl From<String> for SessionKey {
    fn from(key: String) -> Self {
        Self(key)
    }
}

impl AsRef<str> for SessionKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Errors raised by the session registry.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// A thread panicked while holding a session lock.
    #[error("{what} lock poisoned")]
    Poisoned { what: &'static str },
    /// The handler factory panicked while building a session.
    #[error("handler factory panicked for session '{key}': {message}")]
    FactoryPanicked { key: SessionKey, message: String },
}

/// One logical resource context: its key and the handler serving it.
pub struct Session {
    key: SessionKey,
    handler: Box<dyn VfsHandler>,
}

impl Session {
    fn new(key: SessionKey, handler: Box<dyn VfsHandler>) -> Self {
        Self { key, handler }
    }

    /// Key the session was created for.
    #[must_use]
    pub fn key(&self) -> &SessionKey {
        &self.key
    }

    /// Handler owned by the session.
    pub fn handler_mut(&mut self) -> &mut dyn VfsHandler {
        self.handler.as_mut()
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("key", &self.key)
            .finish_non_exhaustive()
    }
}

/// Shared reference to a registered session.
///
/// Clones refer to the same session; [`SessionHandle::same_session`] tells
/// whether two handles do.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    inner: Arc<Mutex<Session>>,
}

impl SessionHandle {
    fn new(session: Session) -> Self {
        Self {
            inner: Arc::new(Mutex::new(session)),
        }
    }

    /// Whether both handles refer to the same session instance.
    #[must_use]
    pub fn same_session(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Runs `f` with exclusive access to the session.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Poisoned`] if a previous holder panicked.
    pub fn with_session<F, R>(&self, f: F) -> Result<R, RegistryError>
    where
        F: FnOnce(&mut Session) -> R,
    {
        let mut guard = self
            .inner
            .lock()
            .map_err(|_| RegistryError::Poisoned { what: "session" })?;
        Ok(f(&mut guard))
    }
}

/// Builds the handler for each newly created session.
pub trait HandlerFactory: Send + Sync {
    /// Creates the handler for the session keyed by `key`.
    fn create(&self, key: &SessionKey) -> Box<dyn VfsHandler>;
}

impl<F> HandlerFactory for F
where
    F: Fn(&SessionKey) -> Box<dyn VfsHandler> + Send + Sync,
{
    fn create(&self, key: &SessionKey) -> Box<dyn VfsHandler> {
        self(key)
    }
}

/// Process-wide map from key to session.
pub struct SessionRegistry {
    factory: Arc<dyn HandlerFactory>,
    sessions: Mutex<HashMap<SessionKey, SessionHandle>>,
}

impl SessionRegistry {
    /// Creates an empty registry whose sessions are built by `factory`.
    pub fn new(factory: Arc<dyn HandlerFactory>) -> Self {
        Self {
            factory,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    /// Replaces the factory used for sessions created from now on.
    ///
    /// Existing sessions keep their handlers. Requiring `&mut self` means the
    /// factory is settled before the registry is shared between threads.
    pub fn set_handler_factory(&mut self, factory: Arc<dyn HandlerFactory>) {
        self.factory = factory;
    }

    /// Returns the session for `key`, creating it on first use.
    ///
    /// The factory runs under the map lock, so each key is built at most
    /// once. A panicking factory leaves the registry untouched and usable.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::FactoryPanicked`] if the factory panics while
    /// building the handler.
    pub fn get_or_create(&self, key: &SessionKey) -> Result<SessionHandle, RegistryError> {
        self.with_sessions(|sessions| {
            if let Some(existing) = sessions.get(key) {
                return Ok(existing.clone());
            }
            let handler = panic::catch_unwind(AssertUnwindSafe(|| self.factory.create(key)))
                .map_err(|payload| RegistryError::FactoryPanicked {
                    key: key.clone(),
                    message: panic_message(&*payload),
                })?;
            let handle = SessionHandle::new(Session::new(key.clone(), handler));
            sessions.insert(key.clone(), handle.clone());
            debug!(
                target: SESSION_TARGET,
                session = %key,
                active = sessions.len(),
                "session created"
            );
            Ok(handle)
        })
    }

    /// Removes and returns the session for `key`.
    ///
    /// Removing an unknown key is a no-op that returns `None`.
    pub fn remove(&self, key: &SessionKey) -> Option<SessionHandle> {
        self.with_sessions(|sessions| {
            let removed = sessions.remove(key);
            if removed.is_some() {
                debug!(
                    target: SESSION_TARGET,
                    session = %key,
                    active = sessions.len(),
                    "session removed"
                );
            } else {
                debug!(
                    target: SESSION_TARGET,
                    session = %key,
                    "remove requested for unknown session"
                );
            }
            removed
        })
    }

    /// Whether a session exists for `key`.
    #[must_use]
    pub fn contains(&self, key: &SessionKey) -> bool {
        self.with_sessions(|sessions| sessions.contains_key(key))
    }

    /// Number of live sessions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.with_sessions(|sessions| sessions.len())
    }

    /// Whether no session is live.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.with_sessions(|sessions| sessions.is_empty())
    }

    /// Keys of the live sessions, sorted.
    #[must_use]
    pub fn keys(&self) -> Vec<SessionKey> {
        self.with_sessions(|sessions| {
            let mut keys: Vec<SessionKey> = sessions.keys().cloned().collect();
            keys.sort();
            keys
        })
    }

    fn with_sessions<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&mut HashMap<SessionKey, SessionHandle>) -> R,
    {
        // Every map update is a single insert or remove, so a map whose lock
        // was poisoned is still consistent.
        let mut guard = self
            .sessions
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        f(&mut guard)
    }
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new(Arc::new(|_: &SessionKey| -> Box<dyn VfsHandler> {
            Box::new(TransparentHandler)
        }))
    }
}

impl fmt::Debug for SessionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionRegistry")
            .field("sessions", &self.len())
            .finish_non_exhaustive()
    }
}
