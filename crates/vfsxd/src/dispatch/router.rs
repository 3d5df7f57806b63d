//! Operation resolution and fault-isolated handler invocation.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use tracing::{debug, error};

use super::errors::HandlerFault;
use crate::handler::{self, Arguments, HandlerResult, Operation, SessionContext, panic_message};
use crate::protocol::{Request, Status};
use crate::session::{SessionHandle, SessionKey, SessionRegistry};

/// Tracing target for dispatch operations.
pub(crate) const DISPATCH_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::dispatch");

/// Outcome of looking an operation name up in the dispatch table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// The name is one of the recognised operations.
    Found(Operation),
    /// The name is unknown; the fallback answers it.
    NotFound,
}

impl Resolution {
    /// Resolves an operation name. Matching is exact and case-sensitive.
    #[must_use]
    pub fn resolve(name: &str) -> Self {
        name.parse::<Operation>()
            .map_or(Self::NotFound, Self::Found)
    }
}

/// Routes requests to the handler of the session they name.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    registry: Arc<SessionRegistry>,
}

impl Dispatcher {
    /// Creates a dispatcher over a shared session registry.
    pub fn new(registry: Arc<SessionRegistry>) -> Self {
        Self { registry }
    }

    /// Registry the dispatcher resolves sessions in.
    #[must_use]
    pub fn registry(&self) -> &Arc<SessionRegistry> {
        &self.registry
    }

    /// Dispatches one request and returns the status for the shim.
    ///
    /// The session is looked up (or created) before the operation is
    /// resolved, so even an unrecognised operation establishes a session. A
    /// `disconnect` removes the session from the registry but still reaches
    /// the handler that served it. Handler errors, handler panics and
    /// registry faults all come back as [`Status::Error`].
    pub fn dispatch(&self, request: &Request) -> Status {
        let key = SessionKey::from(request.key());
        let session = match self.registry.get_or_create(&key) {
            Ok(session) => session,
            Err(error) => {
                error!(
                    target: DISPATCH_TARGET,
                    session = %key,
                    %error,
                    "session lookup failed"
                );
                return Status::Error;
            }
        };

        let resolution = Resolution::resolve(request.operation());
        if resolution == Resolution::Found(Operation::Disconnect) {
            self.registry.remove(&key);
        }

        match resolution {
            Resolution::Found(operation) => {
                debug!(
                    target: DISPATCH_TARGET,
                    session = %key,
                    %operation,
                    arguments = request.arguments().len(),
                    "dispatching operation"
                );
                let context = SessionContext::new(key, operation);
                invoke_guarded(&session, &context, &Arguments::from(request.arguments()))
            }
            Resolution::NotFound => fallback(request),
        }
    }
}

/// Answer for operation names outside the dispatch table.
fn fallback(request: &Request) -> Status {
    debug!(
        target: DISPATCH_TARGET,
        session = request.key(),
        operation = request.operation(),
        "unrecognised operation"
    );
    Status::NotImplemented
}

/// Runs the handler under the session lock, containing errors and panics.
///
/// The panic is caught before the lock guard drops, so a failing handler
/// never poisons its session.
fn invoke_guarded(session: &SessionHandle, context: &SessionContext, args: &Arguments) -> Status {
    let outcome = session.with_session(|session| {
        panic::catch_unwind(AssertUnwindSafe(|| {
            handler::invoke(session.handler_mut(), context, args)
        }))
    });

    match outcome {
        Ok(Ok(result)) => settle(context, result),
        Ok(Err(payload)) => report(HandlerFault::Panicked {
            operation: context.operation(),
            session: context.key().clone(),
            message: panic_message(&*payload),
        }),
        Err(error) => {
            error!(
                target: DISPATCH_TARGET,
                session = %context.key(),
                %error,
                "session unavailable"
            );
            Status::Error
        }
    }
}

fn settle(context: &SessionContext, result: HandlerResult) -> Status {
    match result {
        Ok(status) => status,
        Err(source) => report(HandlerFault::Failed {
            operation: context.operation(),
            session: context.key().clone(),
            source,
        }),
    }
}

fn report(fault: HandlerFault) -> Status {
    error!(target: DISPATCH_TARGET, error = %fault, "handler fault");
    Status::Error
}
