/*!
 * Framing Tests
 * Frames and delimiter-framed messages carried over real pipes
 */

use pipeworks::core::limits::DEFAULT_MAX_MESSAGE_BYTES;
use pipeworks::ipc::framing::{read_frame, write_frame};
use pipeworks::scenarios::duplex::{final_output, first_output};
use pipeworks::{FramedMessage, IpcError, PipePair, ProtocolError};
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use std::io::Write;

const MAX: usize = DEFAULT_MAX_MESSAGE_BYTES;

fn send_raw(bytes: &[u8]) -> Result<Vec<u8>, ProtocolError> {
    let (mut reader, mut writer) = PipePair::new().unwrap().into_parts();
    writer.write_all(bytes).unwrap();
    drop(writer);
    read_frame(&mut reader, MAX)
}

#[test]
fn test_frame_over_pipe() {
    let (mut reader, mut writer) = PipePair::new().unwrap().into_parts();
    write_frame(&mut writer, b"adelhoward.edu|hamad", MAX).unwrap();
    writer.close().unwrap();

    let payload = read_frame(&mut reader, MAX).unwrap();
    let message = FramedMessage::from_bytes(&payload).unwrap();
    assert_eq!(message.head(), "adelhoward.edu");
    assert_eq!(message.tail(), "hamad");
}

#[test]
fn test_missing_delimiter_is_protocol_violation() {
    let (mut reader, mut writer) = PipePair::new().unwrap().into_parts();
    write_frame(&mut writer, b"adelhoward.eduhamad", MAX).unwrap();
    drop(writer);

    let payload = read_frame(&mut reader, MAX).unwrap();
    let err: IpcError = FramedMessage::from_bytes(&payload).unwrap_err().into();
    assert!(err.is_protocol_violation());
    assert!(matches!(
        err,
        IpcError::Protocol(ProtocolError::MissingDelimiter)
    ));
}

#[test]
fn test_writer_closed_without_frame_is_truncated() {
    let err = send_raw(b"").unwrap_err();
    assert!(matches!(err, ProtocolError::Truncated { .. }));
}

#[test]
fn test_legacy_nul_terminated_message_is_rejected() {
    // Unframed C-string style payload: the first four bytes read as a huge length
    let err = send_raw(b"adel\0").unwrap_err();
    assert!(matches!(err, ProtocolError::TooLarge { .. }));
}

#[test]
fn test_oversized_stream_is_rejected_without_reading_it_all() {
    let mut frame = (u32::MAX).to_be_bytes().to_vec();
    frame.extend_from_slice(&[b'x'; 128]);
    let err = send_raw(&frame).unwrap_err();
    assert!(matches!(err, ProtocolError::TooLarge { .. }));
}

proptest! {
    #[test]
    fn prop_duplex_concatenation(a in "[A-Za-z0-9._-]{1,40}", b in "[A-Za-z0-9._-]{1,40}") {
        let first = first_output(&a);
        let message = FramedMessage::new(first.clone(), b.clone()).unwrap();

        let (mut reader, mut writer) = PipePair::new().unwrap().into_parts();
        write_frame(&mut writer, message.to_payload().as_bytes(), MAX).unwrap();
        drop(writer);

        let payload = read_frame(&mut reader, MAX).unwrap();
        let (head, tail) = FramedMessage::from_bytes(&payload).unwrap().into_parts();

        prop_assert_eq!(
            final_output(&head, &tail),
            format!("{}howard.edu{}gobison.org", a, b)
        );
    }

    #[test]
    fn prop_extra_delimiters_rejected(parts in proptest::collection::vec("[a-z]{0,8}", 3..6)) {
        let payload = parts.join("|");
        let delimiters = parts.len() - 1;
        let is_extra = matches!(
            FramedMessage::parse(&payload),
            Err(ProtocolError::ExtraDelimiter { count }) if count == delimiters
        );
        prop_assert!(is_extra);
    }
}
