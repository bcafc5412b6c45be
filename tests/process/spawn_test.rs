/*!
 * Spawn Tests
 * Role branching, endpoint hand-over and reaping across a real fork
 */

use pipeworks::core::limits::PANIC_STATUS;
use pipeworks::core::types::Role;
use pipeworks::ipc::framing::{read_frame, write_frame};
use pipeworks::{spawn, ExitOutcome, PipePair};
use pretty_assertions::assert_eq;
use serial_test::serial;
use std::io::{Read, Write};

#[test]
#[serial]
fn test_child_writes_parent_reads_to_end_of_stream() {
    let (reader, writer) = PipePair::new().unwrap().into_parts();

    let (worker, mut reader) = spawn(Role::Worker, (reader, writer), |mut writer| {
        match writer.write_all(b"ping") {
            Ok(()) => 7,
            Err(_) => 1,
        }
    })
    .unwrap();

    assert_eq!(worker.role(), &Role::Worker);

    // Only the child held a write end, so this returns once it exits
    let mut received = String::new();
    reader.read_to_string(&mut received).unwrap();
    assert_eq!(received, "ping");

    assert_eq!(worker.wait().unwrap(), ExitOutcome::Exited(7));
}

#[test]
#[serial]
fn test_two_pipe_round_trip() {
    let (c2w_reader, c2w_writer) = PipePair::new().unwrap().into_parts();
    let (w2c_reader, w2c_writer) = PipePair::new().unwrap().into_parts();

    let (worker, (mut to_worker, mut from_worker)) = spawn(
        Role::Worker,
        ((c2w_writer, w2c_reader), (c2w_reader, w2c_writer)),
        |(mut from_controller, mut to_controller)| {
            let payload = match read_frame(&mut from_controller, 1024) {
                Ok(payload) => payload,
                Err(_) => return 2,
            };
            let mut reply = payload;
            reply.extend_from_slice(b"howard.edu");
            match write_frame(&mut to_controller, &reply, 1024) {
                Ok(()) => 0,
                Err(_) => 3,
            }
        },
    )
    .unwrap();

    write_frame(&mut to_worker, b"adel", 1024).unwrap();
    to_worker.close().unwrap();

    let reply = read_frame(&mut from_worker, 1024).unwrap();
    assert_eq!(reply, b"adelhoward.edu");

    assert!(worker.wait().unwrap().success());
}

#[test]
#[serial]
fn test_child_panic_becomes_exit_status() {
    let (handle, ()) = spawn(Role::Worker, ((), ()), |()| -> i32 {
        panic!("worker body failed");
    })
    .unwrap();

    assert_eq!(handle.wait().unwrap(), ExitOutcome::Exited(PANIC_STATUS));
}
