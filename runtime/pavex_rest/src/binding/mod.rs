//! Bind request data to the arguments of controller actions.
//!
//! # Guide
//!
//! Every argument of an action is populated from one of two sources:
//!
//! - the parameters that were already extracted from the request (route, query string);
//! - the request body, for the single argument that the action declares as body-bound.
//!
//! Body-bound arguments are declared per controller, via [`RestController::body_params`].
//! Each declaration ([`BodyParam`]) also states which properties of the decoded body
//! may be assigned to the argument: by default, none of them. This protects your actions
//! against mass-assignment, i.e. untrusted input setting properties it shouldn't control.
//!
//! [`ArgumentBinder`] puts everything together: it looks up the declarations of the targeted
//! controller in a [`BodyParamCatalog`], decodes the body using a
//! [`SerializerRegistry`](crate::serialization::SerializerRegistry) and assigns the values.
//! [`bind_arguments`] exposes the binding algorithm on its own, if you need to source the
//! body differently.
pub use argument::{ActionArgument, Argument, PropertyMappingConfiguration};
pub use binder::{ArgumentBinder, bind_arguments};
pub use body_param::BodyParam;
pub use catalog::{BodyParamCatalog, BodyParams, RestController};

mod argument;
mod binder;
mod body_param;
mod catalog;
pub mod errors;
