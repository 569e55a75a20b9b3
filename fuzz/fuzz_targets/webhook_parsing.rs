#![no_main]

//! Fuzz target for webhook envelope and event parsing.
//!
//! Arbitrary bytes go through envelope parsing and then per-event parsing.
//! Neither stage may panic.

use libfuzzer_sys::fuzz_target;
use wordline_core::WebhookEnvelope;

fuzz_target!(|data: &[u8]| {
    let Ok(envelope) = WebhookEnvelope::from_slice(data) else {
        return;
    };

    for event in envelope.into_events() {
        match event {
            Ok(event) => {
                let _ = event.kind().tag();
                let _ = event.reply_token().map(|token| token.redacted());
            },
            Err(err) => {
                let _ = err.to_string();
            },
        }
    }
});
