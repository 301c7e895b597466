use super::*;

use base64::engine::general_purpose::URL_SAFE;

const TOKEN: &str = "eyJhbGciOiJIUzI1NiJ9.payload-0123456789abcdef";

fn key() -> DerivedKey {
    KeyDerivation::new("test-salt", 1_000).derive(TOKEN)
}

fn decode(envelope: &str) -> Vec<u8> {
    URL_SAFE_NO_PAD.decode(envelope).unwrap()
}

#[test]
fn test_key_material_slices() {
    let token = "abcdefghijklmnopqrstuvwxyz0123456789";
    assert_eq!(KeyDerivation::key_material(token), "klmnopqrstuvpqrstuvwxyz0");
    assert_eq!(KeyDerivation::key_material("abcdefghijklmnopqrst"), "klmnopqrstpqrst");
    assert_eq!(KeyDerivation::key_material("short"), "");
}

#[test]
fn test_derivation_is_deterministic() {
    let derivation = KeyDerivation::from_config(&EnvelopeConfig::default());
    assert_eq!(derivation.derive(TOKEN), derivation.derive(TOKEN));
    assert_ne!(
        derivation.derive(TOKEN),
        derivation.derive("eyJhbGciOiJIUzI1NiJ9.another-token-value")
    );
}

#[test]
fn test_round_trip() {
    let key = key();
    let payload = br#"[{"step_id":1,"action":"navigate","element":null}]"#;
    let envelope = key.seal(payload).unwrap();
    assert!(!envelope.contains('='));
    assert!(!envelope.contains('+') && !envelope.contains('/'));

    let opened = key.open(&envelope).unwrap();
    assert_eq!(opened.plaintext, payload.to_vec());
    assert!(opened.timestamp > 1_600_000_000);
}

#[test]
fn test_layout() {
    let iv = [7u8; 16];
    let envelope = key().seal_with(&[b'x'; 20], iv, 1_700_000_000).unwrap();
    let bytes = decode(&envelope);

    assert_eq!(bytes[0], VERSION);
    assert_eq!(&bytes[1..9], &1_700_000_000u64.to_be_bytes());
    assert_eq!(&bytes[9..25], &iv);
    // 20 bytes pad to two blocks
    assert_eq!(bytes.len(), 25 + 32 + 32);
}

#[test]
fn test_tampering_fails_authentication() {
    let key = key();
    let envelope = key.seal(b"{\"hello\":\"world\"}").unwrap();
    let bytes = decode(&envelope);

    for index in [9, 25, bytes.len() - 20, bytes.len() - 1] {
        let mut tampered = bytes.clone();
        tampered[index] ^= 0x01;
        let result = key.open(&URL_SAFE_NO_PAD.encode(&tampered));
        assert!(
            matches!(result, Err(EnvelopeError::AuthenticationFailed)),
            "byte {} was not detected",
            index
        );
    }
}

#[test]
fn test_version_checked() {
    let key = key();
    let mut bytes = decode(&key.seal(b"{}").unwrap());
    bytes[0] = 0x81;
    let result = key.open(&URL_SAFE_NO_PAD.encode(&bytes));
    assert!(matches!(result, Err(EnvelopeError::UnsupportedVersion(0x81))));
}

#[test]
fn test_wrong_key_rejected() {
    let envelope = key().seal(b"{}").unwrap();
    let other = KeyDerivation::new("test-salt", 1_000).derive("eyJhbGciOiJIUzI1NiJ9.different-token");
    assert!(matches!(
        other.open(&envelope),
        Err(EnvelopeError::AuthenticationFailed)
    ));
}

#[test]
fn test_padded_encoding_accepted() {
    let key = key();
    let bytes = decode(&key.seal(b"[1,2,3]").unwrap());
    let padded = URL_SAFE.encode(&bytes);
    assert_eq!(key.open(&padded).unwrap().plaintext, b"[1,2,3]".to_vec());
}

#[test]
fn test_malformed_input() {
    let key = key();
    assert!(matches!(
        key.open(&URL_SAFE_NO_PAD.encode([VERSION; 40])),
        Err(EnvelopeError::Malformed(_))
    ));
    assert!(matches!(key.open("not*base64"), Err(EnvelopeError::Encoding(_))));
}

#[test]
fn test_debug_hides_key() {
    assert_eq!(format!("{:?}", key()), "DerivedKey(..)");
}
