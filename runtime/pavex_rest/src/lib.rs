//! # Pavex REST - API reference
//!
//! Content negotiation and request-body binding for REST controllers.
//!
//! The crate is organised around the lifecycle of a request:
//!
//! - [`serialization`] turns request bodies into [`Value`](serialization::Value)s,
//!   picking the codec that matches the declared `Content-Type` (JSON, YAML or MessagePack);
//! - [`binding`] assigns request parameters and the decoded body to the arguments of the
//!   targeted action, enforcing the allow-list of properties that each action declares;
//! - [`negotiation`] picks the representation of the response based on the `Accept` header;
//! - [`response`] encodes the outcome of the action in the negotiated format.
//!
//! All the knobs are gathered in [`RestConfig`](config::RestConfig).
pub mod binding;
pub mod config;
pub mod negotiation;
pub mod request;
pub mod response;
pub mod serialization;
