use indexmap::IndexSet;
use serde::de::DeserializeOwned;

use super::errors::{ArgumentConversionError, PropertyNotAllowed};
use crate::serialization::Value;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
/// Which properties of an object value may be assigned to an argument.
///
/// This is the mass-assignment guard: it stops untrusted input from setting properties
/// that the action didn't expect to receive.
///
/// A fresh configuration allows **no** properties.
/// Calls to [`allow_properties`](Self::allow_properties) and
/// [`allow_all_properties`](Self::allow_all_properties) are cumulative.
///
/// The configuration only looks at the top-level keys of object values.
/// Scalars and sequences are never rejected.
pub struct PropertyMappingConfiguration {
    allowed: AllowedProperties,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
enum AllowedProperties {
    #[default]
    None,
    Listed(IndexSet<String>),
    All,
}

impl PropertyMappingConfiguration {
    /// Allow every property to be assigned.
    pub fn allow_all_properties(&mut self) -> &mut Self {
        self.allowed = AllowedProperties::All;
        self
    }

    /// Allow the listed properties to be assigned, on top of the ones that were already allowed.
    pub fn allow_properties<I, S>(&mut self, names: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let names = names.into_iter().map(Into::into);
        match &mut self.allowed {
            AllowedProperties::All => {}
            AllowedProperties::Listed(listed) => listed.extend(names),
            AllowedProperties::None => self.allowed = AllowedProperties::Listed(names.collect()),
        }
        self
    }

    /// Returns `true` if every property may be assigned.
    pub fn allows_all_properties(&self) -> bool {
        matches!(self.allowed, AllowedProperties::All)
    }

    /// The explicitly allowed properties, if the configuration is based on a list.
    pub fn allowed_properties(&self) -> Option<&IndexSet<String>> {
        match &self.allowed {
            AllowedProperties::Listed(listed) => Some(listed),
            AllowedProperties::None | AllowedProperties::All => None,
        }
    }

    /// Returns `true` if the property called `name` may be assigned.
    pub fn is_allowed(&self, name: &str) -> bool {
        match &self.allowed {
            AllowedProperties::None => false,
            AllowedProperties::Listed(listed) => listed.contains(name),
            AllowedProperties::All => true,
        }
    }

    /// The first property of `value` that may not be assigned, if any.
    pub fn first_disallowed<'a>(&self, value: &'a Value) -> Option<&'a str> {
        let Value::Object(map) = value else {
            return None;
        };
        map.keys()
            .map(String::as_str)
            .find(|name| !self.is_allowed(name))
    }
}

/// A declared argument of a controller action, as seen by the binder.
///
/// [`Argument`] is the built-in implementation. Implement this trait if your framework
/// has its own representation of action arguments.
pub trait ActionArgument {
    /// The name of the argument.
    fn name(&self) -> &str;

    /// Returns `true` if the action can't run without a value for this argument.
    fn is_required(&self) -> bool;

    /// The property mapping configuration used when the argument is assigned.
    fn property_mapping_configuration(&mut self) -> &mut PropertyMappingConfiguration;

    /// Assign a value coming from untrusted input, e.g. the request body.
    ///
    /// It must enforce the property mapping configuration that is in effect at the time of
    /// the call.
    fn set_value(&mut self, value: Value) -> Result<(), PropertyNotAllowed>;

    /// Assign a value that was extracted by the host framework, e.g. from the route.
    ///
    /// The property mapping configuration doesn't apply.
    fn assign_param(&mut self, value: Value);
}

#[derive(Debug, Clone, PartialEq)]
/// A declared argument of a controller action.
///
/// # Example
///
/// ```rust
/// use pavex_rest::binding::{ActionArgument, Argument};
/// use serde_json::json;
///
/// let mut user = Argument::required("user");
/// user.property_mapping_configuration().allow_properties(["name"]);
///
/// assert!(user.set_value(json!({ "name": "Jane" })).is_ok());
/// assert!(user.set_value(json!({ "name": "Jane", "is_admin": true })).is_err());
/// ```
pub struct Argument {
    name: String,
    required: bool,
    value: Option<Value>,
    property_mapping: PropertyMappingConfiguration,
}

impl Argument {
    /// An argument that must be provided.
    pub fn required(name: impl Into<String>) -> Self {
        Self::new(name, true)
    }

    /// An argument that can be left unset.
    pub fn optional(name: impl Into<String>) -> Self {
        Self::new(name, false)
    }

    fn new(name: impl Into<String>, required: bool) -> Self {
        Self {
            name: name.into(),
            required,
            value: None,
            property_mapping: PropertyMappingConfiguration::default(),
        }
    }

    /// The value assigned to the argument, if any.
    pub fn value(&self) -> Option<&Value> {
        self.value.as_ref()
    }

    /// Returns `true` if a value was assigned to the argument.
    pub fn is_set(&self) -> bool {
        self.value.is_some()
    }

    /// Take the assigned value out of the argument.
    pub fn take_value(&mut self) -> Option<Value> {
        self.value.take()
    }

    /// The property mapping configuration of the argument.
    pub fn property_mapping(&self) -> &PropertyMappingConfiguration {
        &self.property_mapping
    }

    /// Deserialize the assigned value into `T`.
    ///
    /// It returns `Ok(None)` if no value was assigned.
    /// The error reports the path of the field that failed to deserialize.
    pub fn value_as<T>(&self) -> Result<Option<T>, ArgumentConversionError>
    where
        T: DeserializeOwned,
    {
        let Some(value) = &self.value else {
            return Ok(None);
        };
        serde_path_to_error::deserialize(value.clone())
            .map(Some)
            .map_err(|source| ArgumentConversionError {
                argument: self.name.clone(),
                source,
            })
    }
}

impl ActionArgument for Argument {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_required(&self) -> bool {
        self.required
    }

    fn property_mapping_configuration(&mut self) -> &mut PropertyMappingConfiguration {
        &mut self.property_mapping
    }

    fn set_value(&mut self, value: Value) -> Result<(), PropertyNotAllowed> {
        if let Some(property) = self.property_mapping.first_disallowed(&value) {
            return Err(PropertyNotAllowed {
                argument: self.name.clone(),
                property: property.to_owned(),
            });
        }
        self.value = Some(value);
        Ok(())
    }

    fn assign_param(&mut self, value: Value) {
        self.value = Some(value);
    }
}
