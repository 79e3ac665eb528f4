//! Decode fuzz target: feed arbitrary bytes to the codec as a recursive message.
//! Decoding must not panic; validate must accept exactly what deserialize accepts,
//! and anything that decodes must re-encode and decode to the same record.
//! Build with: cargo fuzz run decode_fuzz (requires nightly and cargo fuzz).

#![cfg_attr(fuzzing, no_main)]

#[cfg(fuzzing)]
use libfuzzer_sys::fuzz_target;
#[cfg(fuzzing)]
use protowire::{Codec, CodecOptions, FieldDescriptor as F, MessageSchema, SchemaRegistry, ValueKind};

#[cfg(fuzzing)]
fn codec() -> Codec {
    let registry = SchemaRegistry::resolve(vec![MessageSchema::new("Node")
        .field(F::scalar("id", 1, ValueKind::UInt64))
        .field(F::scalar("label", 2, ValueKind::String))
        .field(F::packed("codes", 3, ValueKind::Enum))
        .field(F::message("next", 4, "Node"))
        .field(F::repeated_message("children", 5, "Node"))
        .field(F::optional("delta", 6, ValueKind::Int32))
        .field(F::scalar("ratio", 7, ValueKind::Double))
        .field(F::unpacked("stamps", 8, ValueKind::Fixed32))])
    .expect("resolve");
    Codec::new(registry, CodecOptions { max_depth: 16, preserve_unknown: true })
}

#[cfg(fuzzing)]
fuzz_target!(|data: &[u8]| {
    let codec = codec();
    let decoded = codec.deserialize("Node", data);
    assert_eq!(codec.validate("Node", data).is_ok(), decoded.is_ok());
    if let Ok(record) = decoded {
        let bytes = codec.serialize("Node", &record).expect("re-encode");
        let again = codec.deserialize("Node", &bytes).expect("decode re-encoded");
        assert_eq!(
            codec.serialize("Node", &again).expect("re-encode twice"),
            bytes
        );
    }
});

#[cfg(not(fuzzing))]
fn main() {
    eprintln!("Build with: cargo fuzz run decode_fuzz");
}
