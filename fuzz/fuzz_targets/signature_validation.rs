#![no_main]

//! Fuzz target for webhook signature validation.
//!
//! The first input byte splits the rest into a signature header and a body.
//! Verification must reject or accept without panicking, and a body signed
//! by the verifier itself must always verify.

use bytes::Bytes;
use libfuzzer_sys::fuzz_target;
use wordline_api::{InboundRequest, SignatureVerifier};

const SECRET: &str = "fuzz-channel-secret";

fuzz_target!(|data: &[u8]| {
    let Some((&split, rest)) = data.split_first() else {
        return;
    };
    let split = usize::from(split).min(rest.len());
    let (header, body) = rest.split_at(split);

    let verifier = match SignatureVerifier::new(SECRET) {
        Ok(verifier) => verifier,
        Err(_) => return,
    };

    let header = String::from_utf8_lossy(header);
    let body = Bytes::copy_from_slice(body);

    if let Ok(request) = InboundRequest::new(Some(&header), body.clone()) {
        let _ = verifier.verify(request);
    }

    if !body.is_empty() {
        let signature = verifier.sign(&body);
        let request = InboundRequest::new(Some(&signature), body);
        assert!(request.is_ok_and(|request| verifier.verify(request).is_ok()));
    }
});
