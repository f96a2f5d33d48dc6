use pavex_rest::serialization::SerializerRegistry;
use pavex_rest::serialization::errors::UnsupportedFormatError;

#[test]
fn json_is_resolved_to_the_json_codec() {
    let registry = SerializerRegistry::default();
    let codec = registry.resolve(Some("application/json")).unwrap();
    assert_eq!(codec.mime_type(), "application/json");
}

#[test]
fn unknown_media_types_are_rejected() {
    let registry = SerializerRegistry::default();
    let err = registry.resolve(Some("text/unknown")).unwrap_err();
    assert!(matches!(
        err,
        UnsupportedFormatError::UnknownContentType { ref actual } if actual == "text/unknown"
    ));
}

#[test]
fn xml_is_advertised_but_not_decodable() {
    let registry = SerializerRegistry::default();
    let err = registry.resolve(Some("application/xml")).unwrap_err();
    insta::assert_snapshot!(err, @"The `Content-Type` header was set to `application/xml`. There is no serializer registered for this media type");
}

#[test]
fn a_missing_content_type_is_never_defaulted() {
    let registry = SerializerRegistry::default();
    let err = registry.decode(None, b"{}").unwrap_err();
    insta::assert_snapshot!(err, @"The `Content-Type` header is missing. This endpoint expects requests with a `Content-Type` header set to one of the supported media types");
}
