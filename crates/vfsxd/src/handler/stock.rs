//! Handlers shipped with the daemon and selectable through configuration.

use std::sync::Arc;

use tracing::info;
use vfsx_config::HandlerKind;

use super::{Arguments, HandlerResult, SessionContext, VfsHandler};
use crate::protocol::Status;
use crate::session::{HandlerFactory, SessionKey};

const AUDIT_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::audit");

/// Lets every recognised operation proceed untouched.
#[derive(Debug, Default, Clone, Copy)]
pub struct TransparentHandler;

impl VfsHandler for TransparentHandler {
    fn unhandled(&mut self, _session: &SessionContext, _args: &Arguments) -> HandlerResult {
        Ok(Status::Transparent)
    }
}

/// Records every operation in the log, then lets it proceed.
#[derive(Debug, Default, Clone, Copy)]
pub struct AuditHandler {
    operations_seen: u64,
}

impl AuditHandler {
    /// Operations this session has recorded so far.
    #[must_use]
    pub fn operations_seen(&self) -> u64 {
        self.operations_seen
    }
}

impl VfsHandler for AuditHandler {
    fn unhandled(&mut self, session: &SessionContext, args: &Arguments) -> HandlerResult {
        self.operations_seen = self.operations_seen.saturating_add(1);
        info!(
            target: AUDIT_TARGET,
            session = %session.key(),
            operation = %session.operation(),
            arguments = ?args.as_slice(),
            sequence = self.operations_seen,
            "operation observed"
        );
        Ok(Status::Transparent)
    }
}

/// Refuses anything that would modify the share.
///
/// Mutating operations answer [`Status::Unauthorized`]. `open` is refused
/// when its flags ask for write access, creation or truncation.
#[derive(Debug, Default, Clone, Copy)]
pub struct ReadOnlyHandler;

impl ReadOnlyHandler {
    const OPEN_FLAGS_INDEX: usize = 1;

    fn opens_for_writing(flags: i32) -> bool {
        flags & libc::O_ACCMODE != libc::O_RDONLY || flags & (libc::O_CREAT | libc::O_TRUNC) != 0
    }
}

impl VfsHandler for ReadOnlyHandler {
    fn unhandled(&mut self, session: &SessionContext, _args: &Arguments) -> HandlerResult {
        if session.operation().is_mutating() {
            Ok(Status::Unauthorized)
        } else {
            Ok(Status::Transparent)
        }
    }

    fn open(&mut self, _session: &SessionContext, args: &Arguments) -> HandlerResult {
        let flags = args.parse::<i32>(Self::OPEN_FLAGS_INDEX, "flags")?;
        if Self::opens_for_writing(flags) {
            Ok(Status::Unauthorized)
        } else {
            Ok(Status::Transparent)
        }
    }
}

/// Builds the factory that constructs `kind` for every new session.
#[must_use]
pub fn stock_factory(kind: HandlerKind) -> Arc<dyn HandlerFactory> {
    match kind {
        HandlerKind::Transparent => Arc::new(|_: &SessionKey| -> Box<dyn VfsHandler> {
            Box::new(TransparentHandler)
        }),
        HandlerKind::Audit => Arc::new(|_: &SessionKey| -> Box<dyn VfsHandler> {
            Box::new(AuditHandler::default())
        }),
        HandlerKind::ReadOnly => Arc::new(|_: &SessionKey| -> Box<dyn VfsHandler> {
            Box::new(ReadOnlyHandler)
        }),
    }
}

