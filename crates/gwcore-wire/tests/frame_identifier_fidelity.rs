use gwcore_wire::{ChannelMessage, NotifyMessage};

#[test]
fn channel_frame_cannot_be_decoded_as_notify() {
    let channel_frame = ChannelMessage::model_exit(7)
        .encode(64 * 1024)
        .expect("encode should succeed");

    let error = NotifyMessage::decode(&channel_frame, 64 * 1024)
        .expect_err("an SBCH frame must not decode as an SBNO notify");
    assert!(matches!(error, gwcore_wire::WireError::Framing(_)));
}

#[test]
fn notify_frame_cannot_be_decoded_as_channel() {
    let notify_frame = NotifyMessage {
        model_uid: vec![7],
        model_time: 0.0,
        schedule_time: 0.0,
        notify_time: 0.0,
        signals: vec![],
    }
    .encode(64 * 1024)
    .expect("encode should succeed");

    let error = ChannelMessage::decode(&notify_frame, 64 * 1024)
        .expect_err("an SBNO frame must not decode as an SBCH channel message");
    assert!(matches!(error, gwcore_wire::WireError::Framing(_)));
}
