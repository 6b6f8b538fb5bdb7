use base64::Engine;
use serde_json::{json, Value};
use sts_client::protocol::{decode, decode_bytes, encode};
use sts_client::{InboundMessage, OutboundMessage};

fn b64(bytes: &[u8]) -> String {
    base64::engine::general_purpose::STANDARD.encode(bytes)
}

#[test]
fn test_encode_audio_chunk() {
    let text = encode(&OutboundMessage::Audio(vec![0, 1, 2, 253, 254, 255]));
    let value: Value = serde_json::from_str(&text).unwrap();

    assert_eq!(
        value,
        json!({ "type": "audio", "data": { "audio": b64(&[0, 1, 2, 253, 254, 255]) } })
    );
}

#[test]
fn test_encode_audio_end() {
    let text = encode(&OutboundMessage::AudioEnd);
    assert_eq!(text, r#"{"type":"audio/end"}"#);
}

#[test]
fn test_audio_roundtrip() {
    let original: Vec<u8> = (0..=255).collect();
    let decoded = decode(&encode(&OutboundMessage::Audio(original.clone()))).unwrap();

    assert_eq!(decoded, InboundMessage::Audio(original));
}

#[test]
fn test_decode_origin() {
    let msg = decode(r#"{"type":"origin","data":{"sentence":"He","is-final":false}}"#).unwrap();
    assert_eq!(
        msg,
        InboundMessage::Origin {
            text: "He".to_string(),
            is_final: false
        }
    );
}

#[test]
fn test_decode_translation() {
    let msg = decode(r#"{"type":"translation","data":{"sentence":"你好","is-final":true}}"#).unwrap();
    assert_eq!(
        msg,
        InboundMessage::Translation {
            text: "你好".to_string(),
            is_final: true
        }
    );
}

#[test]
fn test_decode_markers() {
    assert_eq!(decode(r#"{"type":"audio/flush"}"#).unwrap(), InboundMessage::AudioFlush);
    assert_eq!(decode(r#"{"type":"audio/end"}"#).unwrap(), InboundMessage::AudioEnd);
    assert_eq!(decode(r#"{"type":"origin/end"}"#).unwrap(), InboundMessage::OriginEnd);
    assert_eq!(
        decode(r#"{"type":"translation/end","data":null}"#).unwrap(),
        InboundMessage::TranslationEnd
    );
}

#[test]
fn test_decode_empty_audio_is_not_a_decode_error() {
    let msg = decode(r#"{"type":"audio","data":{"audio":""}}"#).unwrap();
    assert_eq!(msg, InboundMessage::Audio(Vec::new()));
}

#[test]
fn test_decode_unknown_tag() {
    let msg = decode(r#"{"type":"session/stats","data":{"latency":12}}"#).unwrap();
    assert_eq!(msg, InboundMessage::Unknown("session/stats".to_string()));
    assert_eq!(msg.tag(), "session/stats");
}

#[test]
fn test_decode_malformed_json_keeps_payload() {
    let payload = r#"{"type":"origin","data":"#;
    let err = decode(payload).unwrap_err();

    assert_eq!(err.payload, payload);
    assert!(err.reason.contains("malformed"));
}

#[test]
fn test_decode_missing_discriminator() {
    let err = decode(r#"{"data":{"sentence":"x","is-final":true}}"#).unwrap_err();
    assert!(err.reason.contains("type"));
}

#[test]
fn test_decode_missing_data() {
    let err = decode(r#"{"type":"origin"}"#).unwrap_err();
    assert!(err.reason.contains("data"));
}

#[test]
fn test_decode_wrong_field_types() {
    assert!(decode(r#"{"type":"origin","data":{"sentence":"x","is-final":"yes"}}"#).is_err());
    assert!(decode(r#"{"type":"audio","data":{"audio":42}}"#).is_err());
}

#[test]
fn test_decode_invalid_base64() {
    let err = decode(r#"{"type":"audio","data":{"audio":"not*base64!"}}"#).unwrap_err();
    assert!(err.reason.contains("base64"));
}

#[test]
fn test_decode_binary_frame() {
    let msg = decode_bytes(br#"{"type":"origin","data":{"sentence":"Hello","is-final":true}}"#).unwrap();
    assert_eq!(
        msg,
        InboundMessage::Origin {
            text: "Hello".to_string(),
            is_final: true
        }
    );

    assert!(decode_bytes(&[0xff, 0xfe, 0x00]).is_err());
}
