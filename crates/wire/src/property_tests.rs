// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Property tests for the wire layer: arbitrary token content must survive
//! envelope flattening and framing unchanged.

use crate::{decode, encode, Envelope};
use proptest::prelude::*;
use weft_core::TokenBuilder;

fn arb_envelope() -> impl Strategy<Value = Envelope> {
    (
        any::<i32>(),
        "[a-zA-Z0-9._-]{1,24}",
        "[a-zA-Z0-9_-]{1,16}",
        ".{0,200}",
        any::<u64>(),
    )
        .prop_map(|(id, service, slot, value, deadline)| {
            Envelope::from_token(
                TokenBuilder::new(id)
                    .service(&service)
                    .slot(&slot, &value)
                    .not_after(deadline)
                    .build(),
            )
        })
}

proptest! {
    #[test]
    fn frame_round_trip_preserves_envelope(envelope in arb_envelope()) {
        let frame = encode(&envelope).unwrap();
        let back = decode(&frame[4..]).unwrap();
        prop_assert_eq!(back, envelope);
    }

    #[test]
    fn token_survives_flattening(envelope in arb_envelope()) {
        let token = envelope.clone().into_token();
        prop_assert_eq!(Envelope::from_token(token), envelope);
    }
}
