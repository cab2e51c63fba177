#![deny(missing_docs)]
//! Shared types for streaming line-delimited JSON from inference endpoints.
//!
//! A caller describes one outbound call with a [`StreamRequest`], receives
//! decoded [`StreamEvent`]s through a [`StreamHandler`], and learns how the
//! call ended from its [`Outcome`]. The transport itself lives in
//! `ndstream-transport`; this crate carries only the vocabulary both sides
//! agree on.

pub mod cancel;
pub mod error;
pub mod event;
pub mod handler;
pub mod outcome;
pub mod request;

pub use cancel::*;
pub use error::*;
pub use event::*;
pub use handler::*;
pub use outcome::*;
pub use request::*;
