//! Bellhop - session engine and notification poller for a form-driven web game
//!
//! The remote service exposes no formal API: every operation is an
//! authenticated form POST against server-rendered HTML or loosely-typed
//! JSON, and the session is a password-hash token bound to cookies. This
//! crate keeps such a session continuously authenticated, survives the
//! nightly maintenance window ("rollover"), and runs a perpetual
//! low-frequency poll for inbound chat and mail while other callers issue
//! ad-hoc authenticated requests concurrently.
//!
//! Everything else (page scraping, command handling, persistence, UI) is an
//! external collaborator that consumes [`session::Session`]'s request
//! surface and subscribes to [`events::EventBus`].

pub mod adapters;
pub mod config;
pub mod events;
pub mod models;
pub mod poller;
pub mod rollover;
pub mod session;
pub mod traits;
