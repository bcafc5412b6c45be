/*!
 * Pipe Tests
 * End-of-stream and closure behaviour of pipe endpoints
 */

use nix::errno::Errno;
use nix::sys::resource::{getrlimit, setrlimit, Resource};
use pipeworks::core::guard::{FdGuard, GuardError};
use pipeworks::core::types::Role;
use pipeworks::ipc::pipe::PipeError;
use pipeworks::{spawn, ExitOutcome, PipePair};
use pretty_assertions::assert_eq;
use serial_test::serial;
use std::io::{Read, Write};
use std::time::{Duration, Instant};

#[test]
fn test_read_after_all_writers_closed_returns_end_of_stream() {
    let (mut reader, writer) = PipePair::new().unwrap().into_parts();
    writer.close().unwrap();

    let start = Instant::now();
    let mut buf = [0u8; 16];
    let read = reader.read(&mut buf).unwrap();

    assert_eq!(read, 0);
    assert!(start.elapsed() < Duration::from_secs(1));
}

#[test]
fn test_buffered_bytes_survive_writer_close() {
    let (mut reader, mut writer) = PipePair::new().unwrap().into_parts();
    writer.write_all(b"adel").unwrap();
    drop(writer);

    let mut received = String::new();
    reader.read_to_string(&mut received).unwrap();
    assert_eq!(received, "adel");

    // Still end-of-stream on every later read
    let mut buf = [0u8; 4];
    assert_eq!(reader.read(&mut buf).unwrap(), 0);
}

#[test]
fn test_each_pair_is_independent() {
    let (mut r1, mut w1) = PipePair::new().unwrap().into_parts();
    let (mut r2, mut w2) = PipePair::new().unwrap().into_parts();

    w2.write_all(b"second").unwrap();
    w1.write_all(b"first").unwrap();
    drop(w1);
    drop(w2);

    let mut a = String::new();
    let mut b = String::new();
    r1.read_to_string(&mut a).unwrap();
    r2.read_to_string(&mut b).unwrap();
    assert_eq!(a, "first");
    assert_eq!(b, "second");
}

#[test]
fn test_endpoint_release_is_rejected_the_second_time() {
    let (read_end, _write_end) = nix::unistd::pipe().unwrap();
    let mut guard = FdGuard::new(read_end, "test.read");

    assert!(guard.is_active());
    assert_eq!(guard.release(), Ok(()));
    assert_eq!(guard.release(), Err(GuardError::AlreadyReleased));
    assert!(!guard.is_active());
}

#[test]
fn test_write_to_pipe_without_reader_fails() {
    let (reader, mut writer) = PipePair::new().unwrap().into_parts();
    reader.close().unwrap();

    // SIGPIPE is ignored by the Rust runtime, so the write reports EPIPE
    let err = writer.write_all(b"nobody listens").unwrap_err();
    assert_eq!(err.kind(), std::io::ErrorKind::BrokenPipe);
}

#[test]
#[serial]
fn test_descriptor_exhaustion_is_resource_exhausted() {
    // The limit is lowered in a child so the test process keeps its own
    let (handle, ()) = spawn(Role::Worker, ((), ()), |()| {
        let hard = match getrlimit(Resource::RLIMIT_NOFILE) {
            Ok((_, hard)) => hard,
            Err(_) => return 2,
        };
        if setrlimit(Resource::RLIMIT_NOFILE, hard.min(32), hard).is_err() {
            return 3;
        }

        let mut held = Vec::new();
        for _ in 0..64 {
            match PipePair::new() {
                Ok(pair) => held.push(pair),
                Err(PipeError::ResourceExhausted {
                    errno: Errno::EMFILE,
                }) => return 0,
                Err(_) => return 4,
            }
        }
        5
    })
    .unwrap();

    assert_eq!(handle.wait().unwrap(), ExitOutcome::Exited(0));
}
