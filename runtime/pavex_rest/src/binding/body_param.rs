use indexmap::IndexSet;
use serde::{Deserialize, Serialize};

use super::PropertyMappingConfiguration;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// Declare that an action argument is built from the whole request body.
///
/// It also determines which properties of the decoded body may be assigned to the argument:
///
/// - [`BodyParam::allow_all_properties`] allows every property;
/// - [`BodyParam::allow_properties`] allows an explicit list of properties;
/// - if neither is used, no property may be assigned.
///
/// If both are set, allowing all properties takes precedence.
///
/// # Example
///
/// ```rust
/// use pavex_rest::binding::BodyParam;
///
/// let param = BodyParam::new("user").allow_properties(["name", "email"]);
/// assert_eq!(param.argument_name(), "user");
/// assert!(!param.allows_all_properties());
/// ```
pub struct BodyParam {
    argument_name: String,
    #[serde(default)]
    allow_all_properties: bool,
    #[serde(default)]
    allow_properties: IndexSet<String>,
}

impl BodyParam {
    /// Bind the request body to the argument named `argument_name`.
    pub fn new(argument_name: impl Into<String>) -> Self {
        Self {
            argument_name: argument_name.into(),
            allow_all_properties: false,
            allow_properties: IndexSet::new(),
        }
    }

    /// Allow every property of the decoded body to be assigned.
    pub fn allow_all_properties(mut self) -> Self {
        self.allow_all_properties = true;
        self
    }

    /// Allow the listed properties of the decoded body to be assigned.
    ///
    /// It can be called multiple times: the lists are merged.
    pub fn allow_properties<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allow_properties
            .extend(names.into_iter().map(Into::into));
        self
    }

    /// The name of the argument built from the request body.
    pub fn argument_name(&self) -> &str {
        &self.argument_name
    }

    /// Returns `true` if every property may be assigned.
    pub fn allows_all_properties(&self) -> bool {
        self.allow_all_properties
    }

    /// The properties that may be assigned, in declaration order.
    ///
    /// It's ignored if [`BodyParam::allows_all_properties`] returns `true`.
    pub fn allowed_properties(&self) -> &IndexSet<String> {
        &self.allow_properties
    }

    /// Configure the property mapping of the argument this declaration targets.
    pub(crate) fn configure(&self, config: &mut PropertyMappingConfiguration) {
        if self.allow_all_properties {
            config.allow_all_properties();
        } else if !self.allow_properties.is_empty() {
            config.allow_properties(self.allow_properties.iter().cloned());
        }
    }
}
