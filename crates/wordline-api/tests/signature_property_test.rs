//! Property-based tests for signature verification and event parsing.
//!
//! Any change to the body or digest must be rejected, and no verified body,
//! however malformed, may panic the parser.

#![allow(clippy::unwrap_used)]

use base64::{engine::general_purpose::STANDARD, Engine};
use bytes::Bytes;
use proptest::{prelude::*, test_runner::Config as ProptestConfig};
use wordline_api::{dispatch::responses, InboundRequest, SignatureVerifier, VerificationError};
use wordline_core::{Event, WebhookEnvelope};
use wordline_testing::sign;

/// Deterministic property test configuration for CI stability.
fn proptest_config() -> ProptestConfig {
    ProptestConfig {
        cases: 50,
        timeout: 5000, // 5 seconds max
        fork: false,
        failure_persistence: None,
        source_file: None,
        ..ProptestConfig::default()
    }
}

fn secret_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-zA-Z0-9]{8,64}").unwrap()
}

fn verify(secret: &str, signature: &str, body: Vec<u8>) -> Result<(), VerificationError> {
    let verifier = SignatureVerifier::new(secret).unwrap();
    let request = InboundRequest::new(Some(signature), Bytes::from(body))?;
    verifier.verify(request).map(|_| ())
}

proptest! {
    #![proptest_config(proptest_config())]

    #[test]
    fn correctly_signed_body_verifies(
        secret in secret_strategy(),
        body in prop::collection::vec(any::<u8>(), 1..2048),
    ) {
        let signature = sign(&secret, &body);
        prop_assert!(verify(&secret, &signature, body).is_ok());
    }

    #[test]
    fn body_bit_flip_is_rejected(
        secret in secret_strategy(),
        body in prop::collection::vec(any::<u8>(), 1..2048),
        position in any::<prop::sample::Index>(),
        bit in 0u8..8,
    ) {
        let signature = sign(&secret, &body);
        let mut tampered = body;
        let index = position.index(tampered.len());
        tampered[index] ^= 1 << bit;

        prop_assert_eq!(verify(&secret, &signature, tampered), Err(VerificationError::Mismatch));
    }

    #[test]
    fn digest_bit_flip_is_rejected(
        secret in secret_strategy(),
        body in prop::collection::vec(any::<u8>(), 1..512),
        position in any::<prop::sample::Index>(),
        bit in 0u8..8,
    ) {
        let mut digest = STANDARD.decode(sign(&secret, &body)).unwrap();
        let index = position.index(digest.len());
        digest[index] ^= 1 << bit;
        let signature = STANDARD.encode(digest);

        prop_assert_eq!(verify(&secret, &signature, body), Err(VerificationError::Mismatch));
    }

    #[test]
    fn other_secret_is_rejected(
        secret in secret_strategy(),
        other in secret_strategy(),
        body in prop::collection::vec(any::<u8>(), 1..512),
    ) {
        prop_assume!(secret != other);
        let signature = sign(&other, &body);

        prop_assert_eq!(verify(&secret, &signature, body), Err(VerificationError::Mismatch));
    }

    #[test]
    fn arbitrary_bodies_never_panic_the_parser(body in prop::collection::vec(any::<u8>(), 0..1024)) {
        if let Ok(envelope) = WebhookEnvelope::from_slice(&body) {
            let parsed = envelope.into_events().count();
            prop_assert!(parsed <= body.len());
        }
    }

    #[test]
    fn arbitrary_event_objects_parse_or_report(
        kind in prop::sample::select(vec!["message", "follow", "unfollow", "postback", "join", "beacon"]),
        token in prop::option::of("[a-zA-Z0-9]{0,32}"),
        user in prop::option::of("U[0-9a-f]{0,32}"),
        text in prop::option::of(any::<String>()),
    ) {
        let mut event = serde_json::json!({ "type": kind });
        if let Some(token) = token {
            event["replyToken"] = token.into();
        }
        if let Some(user) = user {
            event["source"] = serde_json::json!({ "type": "user", "userId": user });
        }
        if let Some(text) = text {
            event["message"] = serde_json::json!({ "id": "1", "type": "text", "text": text });
        }

        match Event::from_value(event) {
            Ok(parsed) => prop_assert_eq!(parsed.kind().tag(), kind),
            Err(err) => prop_assert!(!err.tag().is_empty()),
        }
    }

    #[test]
    fn keyword_lookup_ignores_padding_and_case(
        index in 0usize..responses::COMMANDS.len(),
        left in "[ \t]{0,4}",
        right in "[ \t]{0,4}",
        upper in any::<bool>(),
    ) {
        let command = &responses::COMMANDS[index];
        let keyword = if upper { command.en.to_uppercase() } else { command.en.to_string() };
        let input = format!("{left}{keyword}{right}");

        prop_assert_eq!(responses::reply_for(&input), command.reply);
        prop_assert_eq!(responses::reply_for(&format!("{left}{}{right}", command.zh)), command.reply);
    }
}
