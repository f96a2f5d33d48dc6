use std::any::type_name;
use std::sync::Arc;

use indexmap::IndexMap;
use tracing::Level;
use tracing_log_error::log_error;

use super::errors::{BindError, RequiredArgumentMissing};
use super::{ActionArgument, BodyParam, BodyParamCatalog, RestController};
use crate::config::RestConfig;
use crate::request::{ActionRequest, BodySizeLimit};
use crate::serialization::{SerializerRegistry, Value};

/// Populate the arguments of an action, in their declared order.
///
/// For each argument:
///
/// 1. If `params` has an entry with the same name, its value is assigned as is,
///    without going through the property mapping configuration.
///    The body is not considered.
/// 2. Otherwise, if `body_param` names the argument, its property mapping is configured
///    according to the declaration and the decoded body is assigned to it.
/// 3. Otherwise, if the argument is required, binding fails with
///    [`RequiredArgumentMissing`].
/// 4. Otherwise, the argument is left unset.
///
/// `body` is invoked at most once, and only if an argument is actually bound from the body.
///
/// Binding stops at the first failure. The arguments bound before the failure keep their values,
/// but the caller must treat the whole argument list as unusable.
pub fn bind_arguments<A, F>(
    arguments: &mut [A],
    params: &IndexMap<String, Value>,
    body: F,
    body_param: Option<&BodyParam>,
) -> Result<(), BindError>
where
    A: ActionArgument,
    F: FnMut() -> Result<Value, BindError>,
{
    let mut body = LazyBody::new(body);
    for argument in arguments.iter_mut() {
        if let Some(value) = params.get(argument.name()) {
            argument.assign_param(value.clone());
            continue;
        }
        match body_param {
            Some(body_param) if body_param.argument_name() == argument.name() => {
                body_param.configure(argument.property_mapping_configuration());
                let value = body.get()?.clone();
                argument.set_value(value)?;
            }
            _ if argument.is_required() => {
                return Err(RequiredArgumentMissing {
                    argument: argument.name().to_owned(),
                }
                .into());
            }
            _ => {}
        }
    }
    Ok(())
}

/// The request body, decoded on first access.
struct LazyBody<F> {
    decode: F,
    decoded: Option<Value>,
}

impl<F> LazyBody<F>
where
    F: FnMut() -> Result<Value, BindError>,
{
    fn new(decode: F) -> Self {
        Self {
            decode,
            decoded: None,
        }
    }

    fn get(&mut self) -> Result<&Value, BindError> {
        let decoded = match self.decoded.take() {
            Some(decoded) => decoded,
            None => (self.decode)()?,
        };
        Ok(self.decoded.insert(decoded))
    }
}

#[derive(Debug, Clone)]
/// Bind incoming requests to the arguments of controller actions.
///
/// It combines the three pieces of state that binding relies on:
///
/// - the [`SerializerRegistry`], to decode request bodies;
/// - the [`BodyParamCatalog`], to find the body-bound argument of each action;
/// - the [`BodySizeLimit`], to reject oversized bodies before they are decoded.
///
/// It's cheap to clone: all clones share the same registry and catalog.
///
/// # Example
///
/// ```rust
/// use pavex_rest::binding::{Argument, ArgumentBinder, BodyParam, BodyParams, RestController};
/// use pavex_rest::request::ActionRequest;
/// use serde_json::json;
///
/// struct UsersController;
///
/// impl RestController for UsersController {
///     fn body_params(params: &mut BodyParams) {
///         params.action("update", BodyParam::new("user").allow_properties(["name"]));
///     }
/// }
///
/// let binder = ArgumentBinder::default();
/// let request = ActionRequest::new("update")
///     .content_type("application/json")
///     .body(r#"{"name": "Jane"}"#)
///     .param("id", json!(42));
/// let mut arguments = [Argument::required("id"), Argument::required("user")];
///
/// binder.bind::<UsersController, _>(&request, &mut arguments).unwrap();
///
/// assert_eq!(arguments[0].value(), Some(&json!(42)));
/// assert_eq!(arguments[1].value(), Some(&json!({ "name": "Jane" })));
/// ```
pub struct ArgumentBinder {
    registry: Arc<SerializerRegistry>,
    catalog: Arc<BodyParamCatalog>,
    body_size_limit: BodySizeLimit,
}

impl Default for ArgumentBinder {
    fn default() -> Self {
        Self::new(
            Arc::new(SerializerRegistry::default()),
            Arc::new(BodyParamCatalog::new()),
        )
    }
}

impl ArgumentBinder {
    /// Create a new binder, with the default body size limit.
    pub fn new(registry: Arc<SerializerRegistry>, catalog: Arc<BodyParamCatalog>) -> Self {
        Self {
            registry,
            catalog,
            body_size_limit: BodySizeLimit::default(),
        }
    }

    /// Create a new binder with the codecs and the body size limit described by `config`.
    pub fn from_config(config: &RestConfig) -> Self {
        Self::new(
            Arc::new(SerializerRegistry::from_config(config)),
            Arc::new(BodyParamCatalog::new()),
        )
        .body_size_limit(config.body_size_limit())
    }

    /// Set the body size limit.
    pub fn body_size_limit(mut self, limit: BodySizeLimit) -> Self {
        self.body_size_limit = limit;
        self
    }

    /// The registry used to decode request bodies.
    pub fn registry(&self) -> &Arc<SerializerRegistry> {
        &self.registry
    }

    /// The catalog used to look up body-bound arguments.
    pub fn catalog(&self) -> &Arc<BodyParamCatalog> {
        &self.catalog
    }

    /// Bind `request` to the `arguments` of the targeted action of controller `C`.
    ///
    /// See [`bind_arguments`] for the binding rules.
    #[tracing::instrument(
        name = "bind_action_arguments",
        skip_all,
        fields(controller = type_name::<C>(), action = %request.action())
    )]
    pub fn bind<C, A>(&self, request: &ActionRequest, arguments: &mut [A]) -> Result<(), BindError>
    where
        C: RestController,
        A: ActionArgument,
    {
        let declarations = self.catalog.declarations_for::<C>();
        let body_param = declarations.get(request.action());
        if let Some(body_param) = body_param {
            let is_declared = arguments
                .iter()
                .any(|argument| argument.name() == body_param.argument_name());
            if !is_declared && self.catalog.record_unmatched::<C>(request.action()) {
                tracing::warn!(
                    argument = %body_param.argument_name(),
                    "The body parameter doesn't match any of the arguments of the action. It will be ignored"
                );
            }
        }

        let decode = || -> Result<Value, BindError> {
            let raw = request.raw_body();
            self.body_size_limit.check(raw.len())?;
            self.registry
                .decode(request.declared_content_type(), raw)
                .map_err(|e| {
                    log_error!(e, level: Level::DEBUG, "Failed to decode the request body");
                    e.into()
                })
        };
        bind_arguments(arguments, request.request_params(), decode, body_param)
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use serde_json::json;

    use super::*;
    use crate::binding::{Argument, BodyParams, PropertyMappingConfiguration};

    fn no_params() -> IndexMap<String, Value> {
        IndexMap::new()
    }

    fn unreachable_body() -> Result<Value, BindError> {
        panic!("The body should not be decoded")
    }

    #[test]
    fn a_missing_required_argument_is_reported() {
        let mut arguments = [Argument::required("A"), Argument::optional("B")];

        let err = bind_arguments(&mut arguments, &no_params(), unreachable_body, None).unwrap_err();

        insta::assert_snapshot!(err, @r#"Required argument "A" is not set."#);
        assert!(!arguments[1].is_set());
    }

    #[test]
    fn optional_arguments_can_be_left_unset() {
        let mut arguments = [Argument::optional("B")];
        bind_arguments(&mut arguments, &no_params(), unreachable_body, None).unwrap();
        assert!(!arguments[0].is_set());
    }

    #[test]
    fn request_params_take_precedence_over_the_body() {
        let mut params = no_params();
        params.insert("payload".into(), json!("from the route"));
        let body_param = BodyParam::new("payload").allow_all_properties();
        let mut arguments = [Argument::required("payload")];

        bind_arguments(&mut arguments, &params, unreachable_body, Some(&body_param)).unwrap();

        assert_eq!(arguments[0].value(), Some(&json!("from the route")));
    }

    #[test]
    fn structured_params_are_assigned_as_is() {
        let mut params = no_params();
        params.insert("filter".into(), json!({ "status": "open", "tags": ["a"] }));
        let mut arguments = [Argument::required("filter")];

        bind_arguments(&mut arguments, &params, unreachable_body, None).unwrap();

        assert_eq!(
            arguments[0].value(),
            Some(&json!({ "status": "open", "tags": ["a"] }))
        );
        assert_eq!(
            arguments[0].property_mapping(),
            &PropertyMappingConfiguration::default()
        );
    }

    #[test]
    fn the_body_is_decoded_at_most_once() {
        let n_decodes = Cell::new(0);
        let body = || {
            n_decodes.set(n_decodes.get() + 1);
            Ok(json!({ "x": 1 }))
        };
        let body_param = BodyParam::new("payload").allow_all_properties();
        let mut arguments = [
            Argument::required("payload"),
            Argument::optional("other"),
            Argument::required("payload"),
        ];

        bind_arguments(&mut arguments, &no_params(), body, Some(&body_param)).unwrap();

        assert_eq!(n_decodes.get(), 1);
        assert_eq!(arguments[0].value(), arguments[2].value());
        assert!(!arguments[1].is_set());
    }

    #[test]
    fn the_allow_list_is_applied_before_assignment() {
        let body_param = BodyParam::new("payload").allow_properties(["x"]);
        let mut arguments = [Argument::required("payload")];

        let err = bind_arguments(
            &mut arguments,
            &no_params(),
            || Ok(json!({ "x": 1, "y": 2 })),
            Some(&body_param),
        )
        .unwrap_err();

        insta::assert_snapshot!(err, @r#"The property "y" is not allowed to be set on argument "payload"."#);
        let config = arguments[0].property_mapping();
        assert!(config.is_allowed("x"));
        assert!(!config.is_allowed("y"));
        assert!(!arguments[0].is_set());
    }

    #[test]
    fn decoding_failures_abort_the_pass() {
        let body_param = BodyParam::new("payload").allow_all_properties();
        let mut arguments = [
            Argument::optional("first"),
            Argument::required("payload"),
            Argument::required("last"),
        ];
        let mut params = no_params();
        params.insert("first".into(), json!(1));

        let err = bind_arguments(
            &mut arguments,
            &params,
            || Err(crate::serialization::errors::UnsupportedFormatError::MissingContentType.into()),
            Some(&body_param),
        )
        .unwrap_err();

        assert!(matches!(err, BindError::UnsupportedFormat(_)));
        assert!(arguments[0].is_set());
        assert!(!arguments[2].is_set());
    }

    #[test]
    fn a_body_param_for_another_argument_does_not_satisfy_required_ones() {
        let body_param = BodyParam::new("payload").allow_all_properties();
        let mut arguments = [Argument::required("data")];

        let err =
            bind_arguments(&mut arguments, &no_params(), unreachable_body, Some(&body_param))
                .unwrap_err();

        assert!(matches!(err, BindError::RequiredArgumentMissing(_)));
    }

    #[test]
    fn unmatched_declarations_are_reported_once_per_action() {
        struct Orphans;

        impl RestController for Orphans {
            fn body_params(params: &mut BodyParams) {
                params.action("create", BodyParam::new("missing"));
            }
        }

        let binder = ArgumentBinder::default();
        let request = ActionRequest::new("create");
        let mut arguments = [Argument::optional("payload")];

        binder.bind::<Orphans, _>(&request, &mut arguments).unwrap();
        binder.bind::<Orphans, _>(&request, &mut arguments).unwrap();

        assert!(!arguments[0].is_set());
        // Already recorded by the first pass.
        assert!(!binder.catalog().record_unmatched::<Orphans>("create"));
    }
}
