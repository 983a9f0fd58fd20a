//! Damaged tapes: what is patched, what is fatal, and how it is reported.

use tapeimage_core::{Config, HeaderType, RecoveryState, TapeError, TapeImage};
use tapeimage_io::{ReadOutcome, ReadStatus};
use tapeimage_testkit::prelude::*;

fn five_records() -> Fixture {
    TapeWriter::new()
        .records(&[&b"aaaa"[..], b"bbbb", b"cccc", b"dddd", b"eeee"])
        .finish()
}

#[test]
fn unknown_type_is_patched_once() {
    let mut fixture = five_records();
    fixture.set_type(2, 7);

    let (log, warnings) = count_warnings(|| {
        let mut tape = fixture.open();
        let log = read_to_end(&mut tape, 3).unwrap();
        assert_eq!(tape.recovery(), RecoveryState::Recovering);
        assert_eq!(tape.headers()[2].header_type(), Some(HeaderType::Record));
        log
    });

    assert_eq!(log.data, fixture.payload);
    assert_eq!(warnings, 1);

    // Reads before the damaged descriptor are clean, every read after is
    // tainted.
    let first_tainted = log.outcomes.iter().position(|o| o.tainted).unwrap();
    assert_eq!(first_tainted, 2);
    assert!(log.outcomes[first_tainted..].iter().all(|o| o.tainted));
}

#[test]
fn unknown_type_on_first_descriptor() {
    let mut fixture = five_records();
    fixture.set_type(0, 0xdead);

    let mut tape = fixture.open();
    assert!(tape.recovery().is_recovering());

    let log = read_to_end(&mut tape, 64).unwrap();
    assert_eq!(log.data, fixture.payload);
    assert_eq!(log.tainted(), log.outcomes.len());
}

#[test]
fn wrong_back_pointer_is_patched() {
    let mut fixture = five_records();
    fixture.set_prev(3, 1);

    let (log, warnings) = count_warnings(|| {
        let mut tape = fixture.open();
        let log = read_to_end(&mut tape, 7).unwrap();
        assert_eq!(tape.headers()[3].prev as usize, fixture.headers[2]);
        log
    });

    assert_eq!(log.data, fixture.payload);
    assert_eq!(warnings, 1);
    assert!(log.outcomes.last().unwrap().tainted);
}

#[test]
fn patched_tape_seeks_normally() {
    let mut fixture = five_records();
    fixture.set_type(1, 3);
    let mut tape = fixture.open();
    read_to_end(&mut tape, 20).unwrap();

    tape.seek(6).unwrap();
    let mut buf = [0u8; 4];
    let outcome = tape.read(&mut buf).unwrap();
    assert_eq!(&buf, b"bbcc");
    assert_eq!(outcome.status, ReadStatus::Ok);
    assert!(outcome.tainted);
}

#[test]
fn second_anomaly_fails_recovery() {
    let mut fixture = five_records();
    fixture.set_type(1, 9).set_prev(3, 5);
    let mut tape = fixture.open();
    let mut buf = [0u8; 4];

    assert_eq!(tape.read(&mut buf).unwrap(), ReadOutcome::ok(4));
    assert_eq!(&buf, b"aaaa");

    let outcome = tape.read(&mut buf).unwrap();
    assert_eq!(&buf, b"bbbb");
    assert!(outcome.tainted);

    let outcome = tape.read(&mut buf).unwrap();
    assert_eq!(&buf, b"cccc");
    assert!(outcome.tainted);

    let err = tape.read(&mut buf).unwrap_err();
    assert!(matches!(err, TapeError::FailedRecovery { .. }), "{err}");
    assert!(matches!(tape.read(&mut buf), Err(TapeError::Poisoned)));
}

#[test]
fn second_descriptor_must_point_at_base_in_recovery() {
    let mut fixture = TapeWriter::with_prefix(b"xyz")
        .records(&[&b"aaaa"[..], b"bbbb"])
        .finish();
    fixture.set_type(0, 4).set_prev(1, 0);
    let mut tape = fixture.open();

    let mut buf = [0u8; 8];
    let err = tape.read(&mut buf).unwrap_err();
    assert!(matches!(err, TapeError::FailedRecovery { .. }), "{err}");
}

#[test]
fn second_descriptor_is_not_checked_when_clean() {
    let mut fixture = TapeWriter::with_prefix(b"xyz")
        .records(&[&b"aaaa"[..], b"bbbb"])
        .finish();
    fixture.set_prev(1, 0);
    let mut tape = fixture.open();

    let log = read_to_end(&mut tape, 8).unwrap();
    assert_eq!(log.data, b"aaaabbbb");
    assert_eq!(log.tainted(), 0);
}

#[test]
fn strict_config_rejects_first_anomaly() {
    let mut fixture = five_records();
    fixture.set_type(1, 9);
    let mut tape = TapeImage::open_with_config(fixture.stream(), Config::strict()).unwrap();

    let mut buf = [0u8; 8];
    let err = tape.read(&mut buf).unwrap_err();
    assert!(matches!(err, TapeError::Corrupt { .. }), "{err}");
    assert_eq!(tape.recovery(), RecoveryState::Clean);
}

#[test]
fn strict_config_rejects_damaged_first_descriptor() {
    let mut fixture = five_records();
    fixture.set_type(0, 9);

    let err = TapeImage::open_with_config(fixture.stream(), Config::strict()).unwrap_err();
    assert!(matches!(err.error(), TapeError::Corrupt { .. }));
    assert_eq!(err.into_inner().position(), fixture.base as u64 + 12);
}

#[test]
fn unordered_pointers_are_fatal() {
    let mut fixture = five_records();
    let prev = fixture.header(2).prev;
    fixture.set_next(2, prev - 1);

    let (result, warnings) = count_warnings(|| {
        let mut tape = fixture.open();
        read_to_end(&mut tape, 64)
    });

    let err = result.unwrap_err();
    assert!(matches!(err, TapeError::Corrupt { .. }));
    assert!(err.to_string().contains("4GB"), "{err}");
    assert_eq!(warnings, 0);
}

#[test]
fn unordered_pointers_with_bad_type_are_fatal() {
    let mut fixture = five_records();
    let prev = fixture.header(2).prev;
    fixture.set_type(2, 5).set_next(2, prev);

    let mut tape = fixture.open();
    let err = read_to_end(&mut tape, 64).unwrap_err();
    assert!(matches!(err, TapeError::Corrupt { .. }));
    assert!(err.to_string().contains("missing data"), "{err}");
}

#[test]
fn forward_pointer_inside_descriptor_is_fatal() {
    let mut fixture = five_records();
    let at = fixture.headers[2] as u32;
    fixture.set_next(2, at + 4);

    let mut tape = fixture.open();
    let err = read_to_end(&mut tape, 64).unwrap_err();
    assert!(matches!(err, TapeError::Corrupt { .. }), "{err}");
    assert!(err.is_fatal());
}
