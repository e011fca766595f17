//! End-to-end tests against the emulated bridge firmware

use std::time::{Duration, Instant};

use zedspi_bridge::{Bridge, BridgeError, ResponsePolicy, SamplePair, Timing};
use zedspi_dummy::DummyBridge;

fn bridge() -> Bridge<DummyBridge> {
    Bridge::with_timing(DummyBridge::new(), Timing::without_settle())
}

#[test]
fn register_write_frame_on_the_wire() {
    let mut bridge = bridge();
    bridge.write(0, 0x000A, 0x12).unwrap();
    assert_eq!(
        bridge.channel().sent(),
        [0x5A, 0x00, 0x00, 0x00, 0x00, 0x0A, 0x00, 0x00, 0x00, 0x12]
    );
}

#[test]
fn register_write_then_read_back() {
    let mut bridge = bridge();
    bridge.write(0, 0x0123, 0x5A).unwrap();
    assert_eq!(bridge.read(0, 0x0123).unwrap(), 0x5A);
    assert_eq!(bridge.read(0, 0x0124).unwrap(), 0);
    assert_eq!(bridge.channel().register(0x0123), 0x5A);
}

#[test]
fn read_survives_stray_bytes_with_resync() {
    let mut bridge = bridge();
    bridge.write(0, 0x0042, 0x99).unwrap();
    bridge.channel_mut().inject_garbage(&[0x00, 0xA5]);
    assert_eq!(bridge.read(0, 0x0042).unwrap(), 0x99);
}

#[test]
fn read_reports_stray_bytes_when_strict() {
    let timing = Timing::without_settle().with_policy(ResponsePolicy::Strict);
    let mut bridge = Bridge::with_timing(DummyBridge::new(), timing);
    bridge.channel_mut().inject_garbage(&[0xA5]);
    match bridge.read(0, 0x0042) {
        Err(BridgeError::ProtocolMismatch { expected, found }) => {
            assert_eq!(expected, 0x5B);
            assert_eq!(found, 0xA5);
        }
        other => panic!("expected protocol mismatch, got {:?}", other),
    }
}

#[test]
fn read_from_hung_device_times_out() {
    let mut bridge = Bridge::with_timing(DummyBridge::new(), Timing::without_settle());
    bridge.channel_mut().set_muted(true);

    let start = Instant::now();
    let err = bridge.read(0, 0x000A).unwrap_err();
    let elapsed = start.elapsed();

    assert!(err.is_timeout());
    assert!(elapsed >= Duration::from_secs(1));
    assert!(elapsed < Duration::from_secs(2));
}

#[test]
fn waveform_download_then_capture_loopback() {
    let mut bridge = bridge();
    let i = [100, -200, 300, i16::MIN];
    let q = [-1, 0, i16::MAX, 7];
    bridge.download_waveform(&i, &q).unwrap();

    let expected: Vec<SamplePair> = i
        .iter()
        .zip(&q)
        .map(|(&i, &q)| SamplePair::new(i, q))
        .collect();
    assert_eq!(bridge.channel().waveform(), expected.as_slice());

    let capture = bridge.read_capture(8).unwrap();
    assert_eq!(capture.len(), 8);
    assert_eq!(&capture[..4], expected.as_slice());
    assert_eq!(&capture[4..], expected.as_slice());
}

#[test]
fn normalized_waveform_is_quantized() {
    let mut bridge = bridge();
    bridge
        .download_waveform_normalized(&[1.0, -1.0, 0.0], &[0.5, -0.5, 0.0])
        .unwrap();
    assert_eq!(
        bridge.channel().waveform(),
        [
            SamplePair::new(i16::MAX, 16383),
            SamplePair::new(i16::MIN, -16384),
            SamplePair::new(0, 0),
        ]
    );
}

#[test]
fn rejected_transfers_send_nothing() {
    let mut bridge = bridge();

    assert!(bridge
        .download_waveform(&[1, 2], &[1])
        .unwrap_err()
        .is_invalid_argument());
    assert!(bridge
        .download_waveform_normalized(&[0.1], &[])
        .unwrap_err()
        .is_invalid_argument());
    assert!(bridge.read_capture(16385).unwrap_err().is_invalid_argument());
    assert!(bridge.dpd_lut_read(64).unwrap_err().is_invalid_argument());

    assert!(bridge.channel().sent().is_empty());
}

#[test]
fn full_size_capture_is_accepted() {
    let mut bridge = bridge();
    let capture = bridge.read_capture(16384).unwrap();
    assert_eq!(capture.len(), 16384);
    assert!(capture.iter().all(|s| *s == SamplePair::default()));
}

#[test]
fn stored_waveform_selection() {
    let mut bridge = bridge();
    let file: Vec<SamplePair> = (0..16).map(|n| SamplePair::new(n, -n)).collect();
    bridge.channel_mut().store_file(1, file.clone());

    bridge.select_stored_waveform(1, 32).unwrap();
    assert_eq!(bridge.channel().waveform(), &file[..8]);
    assert_eq!(
        &bridge.channel().sent()[..10],
        [0x5E, 0x01, 0x00, 0x00, 0x00, 0x20, 0, 0, 0, 0]
    );
}

#[test]
fn dpd_register_roundtrip() {
    let mut bridge = bridge();
    bridge.dpd_write(0x0C, 0x1234_5678).unwrap();
    assert_eq!(bridge.dpd_read(0x0C).unwrap(), 0x1234_5678);
    assert_eq!(bridge.channel().dpd_register(0x0C), 0x1234_5678);
}

#[test]
fn dpd_lut_roundtrip() {
    let mut bridge = bridge();
    let lut: Vec<SamplePair> = (0..512)
        .map(|n| SamplePair::new(n as i16 * 3, -(n as i16)))
        .collect();

    bridge.dpd_lut_write(5, &lut).unwrap();
    assert_eq!(bridge.channel().dpd_lut(5), Some(lut.as_slice()));
    assert_eq!(bridge.dpd_lut_read(5).unwrap(), lut);
}
