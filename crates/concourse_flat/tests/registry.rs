//! Integration tests for codec lookup in `concourse_flat`.

use concourse_flat::{CodecRegistry, Flat, FlatError, FlatObject, Target, TypeKey};
use core::any::Any;

#[derive(Debug, Clone, Copy, PartialEq)]
enum Colour {
    Red,
    Green,
}

impl Flat for Colour {
    fn ancestors() -> Vec<TypeKey> {
        vec![TypeKey::enumeration()]
    }

    fn flatten_default(&self) -> String {
        format!("Colour.{self:?}")
    }

    fn unflatten_default(flat: &str) -> Result<Self, FlatError> {
        Err(FlatError::invalid_value::<Self>(flat))
    }

    fn member_name(&self) -> Option<&'static str> {
        Some(match self {
            Self::Red => "RED",
            Self::Green => "GREEN",
        })
    }

    fn from_member_name(name: &str) -> Option<Self> {
        match name {
            "RED" => Some(Self::Red),
            "GREEN" => Some(Self::Green),
            _ => None,
        }
    }
}

#[derive(Debug, PartialEq)]
struct Port(u16);

impl Flat for Port {
    fn flatten_default(&self) -> String {
        self.0.to_string()
    }

    fn unflatten_default(flat: &str) -> Result<Self, FlatError> {
        flat.parse().map(Port).map_err(|err| FlatError::parse::<Self>(flat, err))
    }
}

// ─────────────────────────────────────────────────────────────────────
// Lookup along the chain
// ─────────────────────────────────────────────────────────────────────

#[test]
fn enum_uses_family_codec_from_standard_registry() {
    let codecs = CodecRegistry::standard();
    assert_eq!(codecs.flatten(&Colour::Green), "GREEN");
    assert_eq!(codecs.unflatten::<Colour>("RED").unwrap(), Colour::Red);
}

#[test]
fn enum_without_registry_uses_default() {
    let codecs = CodecRegistry::new();
    assert_eq!(codecs.flatten(&Colour::Green), "Colour.Green");
    assert!(codecs.unflatten::<Colour>("GREEN").is_err());
}

#[test]
fn unknown_member_is_reported() {
    let err = CodecRegistry::standard()
        .unflatten::<Colour>("BLUE")
        .unwrap_err();
    assert!(matches!(err, FlatError::UnknownMember { ref name, .. } if name == "BLUE"));
}

#[test]
fn exact_type_entry_beats_family_entry() {
    let codecs = CodecRegistry::standard()
        .derive()
        .with_flatten(|colour: &Colour| format!("{colour:?}").to_lowercase());
    assert_eq!(codecs.flatten(&Colour::Red), "red");
}

#[test]
fn object_entry_acts_as_wildcard_default() {
    let mut codecs = CodecRegistry::new();
    codecs.register_family_flatten(TypeKey::object(), |value: &dyn FlatObject| {
        Some(format!("<{}>", value.default_flat()))
    });
    assert_eq!(codecs.flatten(&Port(80)), "<80>");
    assert_eq!(codecs.flatten(&"x".to_owned()), "<x>");
}

#[test]
fn unregistered_type_falls_back_to_default() {
    let codecs = CodecRegistry::standard();
    assert_eq!(codecs.flatten(&Port(8080)), "8080");
    assert_eq!(codecs.unflatten::<Port>("8080").unwrap(), Port(8080));
}

// ─────────────────────────────────────────────────────────────────────
// Registry isolation and failures
// ─────────────────────────────────────────────────────────────────────

#[test]
fn derived_registry_does_not_leak_into_parent() {
    let parent = CodecRegistry::with_builtins();
    let mut child = parent.derive();
    child.register_flatten(|port: &Port| format!(":{}", port.0));

    assert_eq!(child.flatten(&Port(1)), ":1");
    assert_eq!(parent.flatten(&Port(1)), "1");
    assert!(child.has_flatten(TypeKey::of::<Port>()));
    assert!(!parent.has_flatten(TypeKey::of::<Port>()));
}

#[test]
fn registration_infers_type_from_signature() {
    fn parse_port(flat: &str) -> Result<Port, FlatError> {
        flat.trim_start_matches(':')
            .parse()
            .map(Port)
            .map_err(|err| FlatError::parse::<Port>(flat, err))
    }

    let codecs = CodecRegistry::new().with_unflatten(parse_port);
    assert!(codecs.has_unflatten(TypeKey::of::<Port>()));
    assert_eq!(codecs.unflatten::<Port>(":22").unwrap(), Port(22));
}

#[test]
fn family_decoder_producing_wrong_type_is_a_mismatch() {
    let mut codecs = CodecRegistry::new();
    codecs.register_family_unflatten(TypeKey::object(), |_target: &Target, _flat: &str| {
        Ok(Box::new(0_u8) as Box<dyn Any>)
    });
    let err = codecs.unflatten::<Port>("80").unwrap_err();
    assert!(matches!(err, FlatError::TypeMismatch { .. }));
}

#[test]
fn standard_registry_lists_builtins() {
    let codecs = CodecRegistry::standard();
    assert!(codecs.has_unflatten(TypeKey::of::<bool>()));
    assert!(codecs.has_flatten(TypeKey::enumeration()));
    assert!(!codecs.has_flatten(TypeKey::object()));
}
