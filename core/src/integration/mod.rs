//! Integration tests for the hotloop core
//!
//! Tests cross-component behavior: deterministic replay against real logic
//! modules, code reloads under a running scheduler, and audio fill over
//! many frames.
