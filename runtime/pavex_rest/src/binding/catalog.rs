use std::any::{TypeId, type_name};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::BodyParam;

/// A controller whose actions may bind their arguments from the request body.
///
/// Implementations declare, for each action, which argument is built from the whole request body.
/// Actions that aren't mentioned don't read the body.
///
/// # Example
///
/// ```rust
/// use pavex_rest::binding::{BodyParam, BodyParams, RestController};
///
/// struct UsersController;
///
/// impl RestController for UsersController {
///     fn body_params(params: &mut BodyParams) {
///         params
///             .action("create", BodyParam::new("user").allow_properties(["name", "email"]))
///             .action("import", BodyParam::new("users").allow_all_properties());
///     }
/// }
/// ```
///
/// To inherit the declarations of another controller, call its `body_params` first
/// and then add your own.
pub trait RestController: 'static {
    /// Register the body-bound argument of each action.
    fn body_params(params: &mut BodyParams);
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
/// The body-bound argument declarations of a controller, keyed by action name.
pub struct BodyParams(IndexMap<String, BodyParam>);

impl BodyParams {
    /// An empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare the body-bound argument of `action`.
    ///
    /// An action has at most one body-bound argument: if `action` was already registered,
    /// the new declaration replaces the old one.
    pub fn action(&mut self, action: impl Into<String>, param: BodyParam) -> &mut Self {
        let action = action.into();
        if let Some(previous) = self.0.get(&action) {
            tracing::warn!(
                action = %action,
                previous_argument = %previous.argument_name(),
                argument = %param.argument_name(),
                "The body parameter of this action was declared more than once. The last declaration wins"
            );
        }
        self.0.insert(action, param);
        self
    }

    /// The declaration for `action`, if there is one.
    pub fn get(&self, action: &str) -> Option<&BodyParam> {
        self.0.get(action)
    }

    /// The number of actions with a body-bound argument.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if no action has a body-bound argument.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over `(action, declaration)` pairs, in registration order.
    pub fn iter(&self) -> impl ExactSizeIterator<Item = (&str, &BodyParam)> {
        self.0.iter().map(|(action, param)| (action.as_str(), param))
    }
}

#[derive(Debug, Default)]
/// A cache of the [`BodyParams`] of every controller, built on first use.
///
/// The table of a controller is computed the first time it's requested and reused afterwards,
/// until it's explicitly invalidated.
/// The catalog can be shared across threads: if two threads ask for the same controller
/// at the same time, the table may be computed twice, but both of them will observe the
/// first table that was stored.
pub struct BodyParamCatalog {
    cache: RwLock<HashMap<TypeId, Arc<BodyParams>>>,
    /// `(controller, action)` pairs whose declaration was found not to match any argument.
    unmatched: Mutex<HashSet<(TypeId, String)>>,
}

impl BodyParamCatalog {
    /// An empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// The body-bound argument declarations of controller `C`.
    pub fn declarations_for<C: RestController>(&self) -> Arc<BodyParams> {
        let id = TypeId::of::<C>();
        if let Some(params) = self
            .cache
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&id)
        {
            return Arc::clone(params);
        }

        let mut params = BodyParams::new();
        C::body_params(&mut params);
        let params = Arc::new(params);

        let mut cache = self.cache.write().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(cache.entry(id).or_insert(params))
    }

    /// Compute the declarations of controller `C` ahead of the first request.
    ///
    /// It's a good idea to preload every controller at startup: invalid declarations
    /// surface in the logs before any traffic is served.
    pub fn preload<C: RestController>(&self) -> &Self {
        let params = self.declarations_for::<C>();
        tracing::info!(
            controller = type_name::<C>(),
            n_body_params = params.len(),
            "Loaded body parameter declarations"
        );
        self
    }

    /// Drop the cached declarations of controller `C`.
    ///
    /// They will be computed again on the next lookup.
    pub fn invalidate<C: RestController>(&self) {
        self.cache
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&TypeId::of::<C>());
        self.unmatched
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .retain(|(id, _)| *id != TypeId::of::<C>());
    }

    /// Drop all cached declarations.
    pub fn clear(&self) {
        self.cache
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
        self.unmatched
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    /// The number of controllers whose declarations are currently cached.
    pub fn len(&self) -> usize {
        self.cache
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Returns `true` if nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Record that the declaration of `action` on controller `C` matches none of the
    /// action's arguments.
    ///
    /// It returns `true` the first time a pair is recorded, and `false` afterwards until
    /// the declarations of `C` are invalidated.
    pub(crate) fn record_unmatched<C: RestController>(&self, action: &str) -> bool {
        self.unmatched
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert((TypeId::of::<C>(), action.to_owned()))
    }
}
