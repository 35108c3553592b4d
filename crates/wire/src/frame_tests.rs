// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use weft_core::TokenBuilder;

fn sample() -> Envelope {
    Envelope::from_token(TokenBuilder::new(1_000_000).build())
}

#[test]
fn encode_prefixes_payload_length() {
    let frame = encode(&sample()).unwrap();
    let len = u32::from_be_bytes([frame[0], frame[1], frame[2], frame[3]]);
    assert_eq!(len as usize, frame.len() - 4);
    assert_eq!(decode(&frame[4..]).unwrap(), sample());
}

#[tokio::test]
async fn write_then_read_round_trips() {
    let (mut client, mut server) = tokio::io::duplex(4096);
    write_envelope(&mut client, &sample()).await.unwrap();
    let received = read_envelope(&mut server).await.unwrap();
    assert_eq!(received, sample());
}

#[tokio::test]
async fn read_reports_clean_close() {
    let (client, mut server) = tokio::io::duplex(64);
    drop(client);
    match read_envelope(&mut server).await {
        Err(ProtocolError::Closed) => {}
        other => panic!("expected Closed, got {other:?}"),
    }
}

#[tokio::test]
async fn read_rejects_oversized_frame() {
    let (mut client, mut server) = tokio::io::duplex(64);
    use tokio::io::AsyncWriteExt;
    client.write_all(&(MAX_FRAME_LEN + 1).to_be_bytes()).await.unwrap();
    match read_envelope(&mut server).await {
        Err(ProtocolError::FrameTooLarge(n)) => assert_eq!(n, MAX_FRAME_LEN + 1),
        other => panic!("expected FrameTooLarge, got {other:?}"),
    }
}

#[tokio::test]
async fn back_to_back_frames_stay_aligned() {
    let (mut client, mut server) = tokio::io::duplex(8192);
    let first = Envelope::from_token(TokenBuilder::new(1_000_001).slot("a", "1").build());
    let second = Envelope::from_token(TokenBuilder::new(1_000_002).slot("b", "2").build());
    write_envelope(&mut client, &first).await.unwrap();
    write_envelope(&mut client, &second).await.unwrap();
    assert_eq!(read_envelope(&mut server).await.unwrap(), first);
    assert_eq!(read_envelope(&mut server).await.unwrap(), second);
}
