use std::sync::Arc;

use http::StatusCode;
use pavex_rest::binding::errors::BindError;
use pavex_rest::binding::{
    Argument, ArgumentBinder, BodyParam, BodyParamCatalog, BodyParams, RestController,
};
use pavex_rest::config::RestConfig;
use pavex_rest::negotiation::SupportedMediaTypes;
use pavex_rest::request::{ActionRequest, BodySizeLimit};
use pavex_rest::response::render;
use pavex_rest::serialization::SerializerRegistry;
use serde_json::json;
use ubyte::ToByteUnit;

struct ItemsController;

impl RestController for ItemsController {
    fn body_params(params: &mut BodyParams) {
        params
            .action("replace", BodyParam::new("payload").allow_all_properties())
            .action("patch", BodyParam::new("payload").allow_properties(["x"]))
            .action("orphan", BodyParam::new("missing").allow_all_properties());
    }
}

fn binder() -> ArgumentBinder {
    ArgumentBinder::default()
}

#[test]
fn required_arguments_without_a_source_are_reported() {
    let request = ActionRequest::new("list");
    let mut arguments = [Argument::required("A"), Argument::optional("B")];

    let err = binder()
        .bind::<ItemsController, _>(&request, &mut arguments)
        .unwrap_err();

    insta::assert_snapshot!(err, @r#"Required argument "A" is not set."#);
    assert!(!arguments[1].is_set());
    assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
}

#[test]
fn allow_all_properties_binds_the_whole_body() {
    let request = ActionRequest::new("replace")
        .content_type("application/json")
        .body(r#"{"x":1,"y":2}"#);
    let mut arguments = [Argument::required("payload")];

    binder()
        .bind::<ItemsController, _>(&request, &mut arguments)
        .unwrap();

    assert!(arguments[0].property_mapping().allows_all_properties());
    assert_eq!(arguments[0].value(), Some(&json!({ "x": 1, "y": 2 })));
}

#[test]
fn properties_outside_the_allow_list_are_rejected() {
    let request = ActionRequest::new("patch")
        .content_type("application/json")
        .body(r#"{"x":1,"y":2}"#);
    let mut arguments = [Argument::required("payload")];

    let err = binder()
        .bind::<ItemsController, _>(&request, &mut arguments)
        .unwrap_err();

    assert!(matches!(err, BindError::PropertyNotAllowed(ref e) if e.property == "y"));
    let config = arguments[0].property_mapping();
    assert!(config.is_allowed("x"));
    assert!(!config.is_allowed("y"));
}

#[test]
fn allowed_properties_are_bound() {
    let request = ActionRequest::new("patch")
        .content_type("application/yaml")
        .body("x: 1\n");
    let mut arguments = [Argument::required("payload")];

    binder()
        .bind::<ItemsController, _>(&request, &mut arguments)
        .unwrap();

    assert_eq!(arguments[0].value(), Some(&json!({ "x": 1 })));
}

#[test]
fn request_params_win_and_the_body_is_not_decoded() {
    // The body is malformed: decoding it would fail.
    let request = ActionRequest::new("replace")
        .content_type("application/json")
        .body("{")
        .param("payload", json!({ "from": "route" }));
    let mut arguments = [Argument::required("payload")];

    binder()
        .bind::<ItemsController, _>(&request, &mut arguments)
        .unwrap();

    assert_eq!(arguments[0].value(), Some(&json!({ "from": "route" })));
}

#[test]
fn unsupported_and_malformed_bodies() {
    let mut arguments = [Argument::required("payload")];

    let request = ActionRequest::new("replace")
        .content_type("application/xml")
        .body("<x>1</x>");
    let err = binder()
        .bind::<ItemsController, _>(&request, &mut arguments)
        .unwrap_err();
    assert_eq!(err.status_code(), StatusCode::UNSUPPORTED_MEDIA_TYPE);

    let request = ActionRequest::new("replace")
        .content_type("application/json")
        .body("{");
    let err = binder()
        .bind::<ItemsController, _>(&request, &mut arguments)
        .unwrap_err();
    assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    insta::assert_snapshot!(err, @r"
    Failed to deserialize the body as a `application/json` document.
    EOF while parsing an object at line 1 column 1
    ");
}

#[test]
fn oversized_bodies_are_rejected_before_decoding() {
    let binder = binder().body_size_limit(BodySizeLimit::Enabled {
        max_size: 8.bytes(),
    });
    // Not valid JSON either: the size check must come first.
    let request = ActionRequest::new("replace")
        .content_type("application/json")
        .body("not json at all");
    let mut arguments = [Argument::required("payload")];

    let err = binder
        .bind::<ItemsController, _>(&request, &mut arguments)
        .unwrap_err();

    assert_eq!(err.status_code(), StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(
        err.into_response().status(),
        StatusCode::PAYLOAD_TOO_LARGE
    );
}

#[test]
fn a_declaration_for_an_unknown_argument_is_ignored() {
    let request = ActionRequest::new("orphan")
        .content_type("application/json")
        .body("{}");
    let mut arguments = [Argument::optional("payload")];

    binder()
        .bind::<ItemsController, _>(&request, &mut arguments)
        .unwrap();

    assert!(!arguments[0].is_set());
}

#[test]
fn binders_built_from_config_share_their_catalog() {
    let config = RestConfig {
        max_body_size: None,
        ..Default::default()
    };
    let binder = ArgumentBinder::from_config(&config);
    let clone = binder.clone();

    binder.catalog().preload::<ItemsController>();

    assert!(Arc::ptr_eq(binder.catalog(), clone.catalog()));
    assert_eq!(clone.catalog().len(), 1);
}

#[test]
fn custom_catalogs_can_be_invalidated() {
    let catalog = Arc::new(BodyParamCatalog::new());
    let binder = ArgumentBinder::new(Arc::new(SerializerRegistry::default()), catalog.clone());
    let request = ActionRequest::new("replace")
        .content_type("application/x-msgpack")
        .body(vec![0x81, 0xa1, b'x', 0x01]);
    let mut arguments = [Argument::required("payload")];

    binder
        .bind::<ItemsController, _>(&request, &mut arguments)
        .unwrap();
    assert_eq!(arguments[0].value(), Some(&json!({ "x": 1 })));
    assert_eq!(catalog.len(), 1);

    catalog.invalidate::<ItemsController>();
    assert!(catalog.is_empty());
}

#[test]
fn a_full_request_response_cycle() {
    #[derive(serde::Deserialize)]
    struct Patch {
        x: u32,
    }

    let (parts, ()) = http::Request::builder()
        .method("PATCH")
        .uri("/items/7")
        .header(http::header::CONTENT_TYPE, "application/json")
        .header(http::header::ACCEPT, "application/yaml, application/json;q=0.5")
        .body(())
        .unwrap()
        .into_parts();

    let request =
        ActionRequest::from_parts(&parts, r#"{"x": 41}"#, "patch").param("id", json!(7));
    let mut arguments = [Argument::required("id"), Argument::required("payload")];
    let binder = binder();
    binder
        .bind::<ItemsController, _>(&request, &mut arguments)
        .unwrap();

    let patch: Patch = arguments[1].value_as().unwrap().unwrap();
    let output = json!({ "id": arguments[0].value(), "x": patch.x + 1 });

    let supported = SupportedMediaTypes::default();
    let media_type = supported.negotiate_headers(&parts.headers).unwrap();
    let response = render(binder.registry(), media_type, &output).unwrap();

    assert_eq!(response.headers()[http::header::CONTENT_TYPE], "application/yaml");
    insta::assert_snapshot!(String::from_utf8_lossy(response.body()), @r"
    id: 7
    x: 42
    ");
}
