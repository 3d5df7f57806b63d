//! Test suites for the bridge daemon.

mod support;
