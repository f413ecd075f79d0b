mod common;

use common::{grab_count, mock_config, orchestrator, registry, stop_count, CollectSink, HookSink};
use phantom_acquire::camera::{CameraCall, CameraRegistry, MockCameraConfig, MockOperation};
use phantom_acquire::config::{LogLevel, SessionConfig};
use phantom_acquire::frame::{PixelDepth, Pixels};
use phantom_acquire::interrupt::InterruptFlag;
use phantom_acquire::sink::PngSink;
use phantom_acquire::{AcquisitionError, FrameGeometry};

#[test]
fn test_successful_session_call_order() {
    let registry = registry(MockCameraConfig::with_geometry(12, 6, 10));
    let calls = registry.call_log();
    let (orchestrator, _log) = orchestrator(LogLevel::Debug);
    let mut sink = CollectSink::default();

    let report = orchestrator
        .run_session(&registry, &mock_config(), &mut sink)
        .unwrap();

    assert_eq!(report.camera, "mock");
    assert_eq!(report.geometry, FrameGeometry::new(12, 6, 10));
    assert_eq!(sink.frames.len(), 1);
    assert_eq!(sink.frames[0], report.frame);

    let calls = calls.calls();
    let address = report.frame.data_address();
    assert_eq!(
        calls,
        vec![
            CameraCall::SetNetworkAddress(String::new()),
            CameraCall::SetConnect(true),
            CameraCall::StartRecording,
            CameraCall::SensorBitdepth,
            CameraCall::RoiHeight,
            CameraCall::RoiWidth,
            CameraCall::Grab {
                rows: 6,
                columns: 10,
                depth: PixelDepth::Mono16,
                address,
            },
            CameraCall::StopRecording,
        ]
    );
}

#[test]
fn test_16bit_4x8_gets_u16_buffer_and_one_grab() {
    let registry = registry(MockCameraConfig::with_geometry(16, 4, 8));
    let calls = registry.call_log();
    let (orchestrator, _log) = orchestrator(LogLevel::Info);

    let report = orchestrator
        .run_session(&registry, &mock_config(), &mut CollectSink::default())
        .unwrap();

    match report.frame.pixels() {
        Pixels::Mono16(a) => assert_eq!(a.dim(), (4, 8)),
        Pixels::Mono8(_) => panic!("expected a u16 buffer"),
    }
    let calls = calls.calls();
    assert_eq!(grab_count(&calls), 1);
    assert!(calls.contains(&CameraCall::Grab {
        rows: 4,
        columns: 8,
        depth: PixelDepth::Mono16,
        address: report.frame.data_address(),
    }));
}

#[test]
fn test_element_width_follows_bitdepth() {
    for (bits, depth) in [
        (1, PixelDepth::Mono8),
        (8, PixelDepth::Mono8),
        (9, PixelDepth::Mono16),
        (12, PixelDepth::Mono16),
        (16, PixelDepth::Mono16),
    ] {
        let registry = registry(MockCameraConfig::with_geometry(bits, 3, 5));
        let (orchestrator, _log) = orchestrator(LogLevel::Error);
        let report = orchestrator
            .run_session(&registry, &mock_config(), &mut CollectSink::default())
            .unwrap();
        assert_eq!(report.frame.pixel_depth(), depth, "{bits} bit");
        assert_eq!(report.frame.dim(), (3, 5));
    }
}

#[test]
fn test_grabbed_frame_is_populated() {
    let registry = registry(MockCameraConfig::with_geometry(8, 4, 4));
    let (orchestrator, _log) = orchestrator(LogLevel::Info);
    let report = orchestrator
        .run_session(&registry, &mock_config(), &mut CollectSink::default())
        .unwrap();

    assert!(!report.frame.is_blank());
    assert_eq!(report.stats.min, 0);
    assert_eq!(report.stats.max, 6);
}

#[test]
fn test_discovery_without_10g_sets_only_address() {
    let registry = registry(MockCameraConfig::default());
    let calls = registry.call_log();
    let (orchestrator, _log) = orchestrator(LogLevel::Info);

    orchestrator
        .run_session(&registry, &mock_config(), &mut CollectSink::default())
        .unwrap();

    let writes: Vec<_> = calls
        .calls()
        .into_iter()
        .filter(CameraCall::is_property_write)
        .collect();
    assert_eq!(
        writes,
        vec![
            CameraCall::SetNetworkAddress(String::new()),
            CameraCall::SetConnect(true)
        ]
    );
}

#[test]
fn test_10g_properties_set_before_connect() {
    let registry = registry(MockCameraConfig::default());
    let calls = registry.call_log();
    let (orchestrator, _log) = orchestrator(LogLevel::Info);
    let config = SessionConfig {
        network_address: "192.168.1.40".into(),
        network_interface: "enp1s0".into(),
        enable_10ge: true,
        ..mock_config()
    };

    orchestrator
        .run_session(&registry, &config, &mut CollectSink::default())
        .unwrap();

    let writes: Vec<_> = calls
        .calls()
        .into_iter()
        .filter(CameraCall::is_property_write)
        .collect();
    assert_eq!(
        writes,
        vec![
            CameraCall::SetNetworkAddress("192.168.1.40".into()),
            CameraCall::SetNetworkInterface("enp1s0".into()),
            CameraCall::SetEnable10ge(true),
            CameraCall::SetConnect(true),
        ]
    );
}

#[test]
fn test_unknown_camera_touches_nothing() {
    let registry = registry(MockCameraConfig::default());
    let calls = registry.call_log();
    let (orchestrator, _log) = orchestrator(LogLevel::Info);
    let config = SessionConfig {
        camera: "phantom".into(),
        ..SessionConfig::default()
    };

    let err = orchestrator
        .run_session(&registry, &config, &mut CollectSink::default())
        .unwrap_err();

    assert!(matches!(err, AcquisitionError::DeviceNotFound { ref camera, .. } if camera == "phantom"));
    assert!(calls.is_empty());
}

#[test]
fn test_connection_failure_never_records() {
    let registry = registry(MockCameraConfig::default().unreachable());
    let calls = registry.call_log();
    let (orchestrator, _log) = orchestrator(LogLevel::Info);

    let err = orchestrator
        .run_session(&registry, &mock_config(), &mut CollectSink::default())
        .unwrap_err();

    assert!(matches!(err, AcquisitionError::Connection(_)));
    let calls = calls.calls();
    assert!(!calls.contains(&CameraCall::StartRecording));
    assert_eq!(stop_count(&calls), 0);
}

#[test]
fn test_start_failure_does_not_stop() {
    let config = MockCameraConfig::default().fail_on(MockOperation::StartRecording, "already armed");
    let registry = registry(config);
    let calls = registry.call_log();
    let (orchestrator, _log) = orchestrator(LogLevel::Info);

    let err = orchestrator
        .run_session(&registry, &mock_config(), &mut CollectSink::default())
        .unwrap_err();

    assert!(matches!(err, AcquisitionError::DeviceState(_)));
    assert_eq!(stop_count(&calls.calls()), 0);
}

#[test]
fn test_grab_failure_still_stops_once() {
    let config = MockCameraConfig::default().fail_on(MockOperation::Grab, "no frame within 5 s");
    let registry = registry(config);
    let calls = registry.call_log();
    let (orchestrator, _log) = orchestrator(LogLevel::Info);
    let mut sink = CollectSink::default();

    let err = orchestrator
        .run_session(&registry, &mock_config(), &mut sink)
        .unwrap_err();

    assert!(matches!(err, AcquisitionError::AcquisitionTimeout(_)));
    assert!(sink.frames.is_empty());
    let calls = calls.calls();
    assert_eq!(stop_count(&calls), 1);
    assert_eq!(calls.last(), Some(&CameraCall::StopRecording));
}

#[test]
fn test_grab_error_wins_over_stop_error() {
    let config = MockCameraConfig::default()
        .fail_on(MockOperation::Grab, "no trigger")
        .fail_on(MockOperation::StopRecording, "stop refused");
    let registry = registry(config);
    let calls = registry.call_log();
    let (orchestrator, log) = orchestrator(LogLevel::Info);

    let err = orchestrator
        .run_session(&registry, &mock_config(), &mut CollectSink::default())
        .unwrap_err();

    assert!(matches!(err, AcquisitionError::AcquisitionTimeout(ref m) if m == "no trigger"));
    assert_eq!(stop_count(&calls.calls()), 1);
    let text = log.text();
    assert!(text.contains("stop refused"), "{text}");
    assert!(text.contains("state=Recording"), "{text}");
}

#[test]
fn test_stop_failure_after_success_is_reported() {
    let config = MockCameraConfig::default().fail_on(MockOperation::StopRecording, "stop refused");
    let registry = registry(config);
    let calls = registry.call_log();
    let (orchestrator, log) = orchestrator(LogLevel::Info);

    let err = orchestrator
        .run_session(&registry, &mock_config(), &mut CollectSink::default())
        .unwrap_err();

    assert!(matches!(err, AcquisitionError::DeviceState(ref m) if m == "stop refused"));
    assert_eq!(stop_count(&calls.calls()), 1);
    let text = log.text();
    assert!(text.contains("Camera may still be recording"), "{text}");
    assert!(text.contains("state=Recording"), "{text}");
    assert!(!text.contains("Recording stopped"), "{text}");
}

#[test]
fn test_state_reaches_stopped_after_clean_stop() {
    let registry = registry(MockCameraConfig::default());
    let (orchestrator, log) = orchestrator(LogLevel::Debug);

    orchestrator
        .run_session(&registry, &mock_config(), &mut CollectSink::default())
        .unwrap();

    let text = log.text();
    assert!(text.contains("from=Recording to=Stopped"), "{text}");
}

#[test]
fn test_empty_roi_rejected_before_grab() {
    let registry = registry(MockCameraConfig::with_geometry(12, 0, 1024));
    let calls = registry.call_log();
    let (orchestrator, _log) = orchestrator(LogLevel::Info);

    let err = orchestrator
        .run_session(&registry, &mock_config(), &mut CollectSink::default())
        .unwrap_err();

    assert!(matches!(err, AcquisitionError::DeviceState(_)));
    let calls = calls.calls();
    assert_eq!(grab_count(&calls), 0);
    assert_eq!(stop_count(&calls), 1);
}

#[test]
fn test_interrupt_before_grab() {
    let registry = registry(MockCameraConfig::default());
    let calls = registry.call_log();
    let flag = InterruptFlag::new();
    flag.raise();
    let (orchestrator, _log) = orchestrator(LogLevel::Info);
    let orchestrator = orchestrator.with_interrupt(flag);

    let err = orchestrator
        .run_session(&registry, &mock_config(), &mut CollectSink::default())
        .unwrap_err();

    assert!(matches!(err, AcquisitionError::Interrupted));
    let calls = calls.calls();
    assert_eq!(grab_count(&calls), 0);
    assert_eq!(stop_count(&calls), 1);
}

#[test]
fn test_interrupt_while_presenting() {
    let registry = registry(MockCameraConfig::default());
    let calls = registry.call_log();
    let flag = InterruptFlag::new();
    let (orchestrator, log) = orchestrator(LogLevel::Info);
    let orchestrator = orchestrator.with_interrupt(flag.clone());
    let mut sink = HookSink(|| { flag.raise(); });

    let err = orchestrator
        .run_session(&registry, &mock_config(), &mut sink)
        .unwrap_err();

    assert!(matches!(err, AcquisitionError::Interrupted));
    let calls = calls.calls();
    assert_eq!(grab_count(&calls), 1);
    assert_eq!(stop_count(&calls), 1);
    assert!(log.text().contains("Interrupted"));
}

#[test]
fn test_sink_failure_stops_recording() {
    let dir = tempfile::tempdir().unwrap();
    let registry = registry(MockCameraConfig::default());
    let calls = registry.call_log();
    let (orchestrator, _log) = orchestrator(LogLevel::Info);
    let mut sink = PngSink::new(dir.path().join("no-such-dir").join("frame.png"));

    let err = orchestrator
        .run_session(&registry, &mock_config(), &mut sink)
        .unwrap_err();

    assert!(!err.is_device_error());
    assert_eq!(stop_count(&calls.calls()), 1);
}

#[test]
fn test_png_output() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("frame.png");
    let registry = registry(MockCameraConfig::with_geometry(12, 8, 16));
    let (orchestrator, _log) = orchestrator(LogLevel::Info);
    let mut sink = PngSink::new(&path);

    orchestrator
        .run_session(&registry, &mock_config(), &mut sink)
        .unwrap();

    let img = image::open(&path).unwrap().into_luma16();
    assert_eq!(img.dimensions(), (16, 8));
}

#[test]
fn test_registry_lists_mock() {
    let registry = registry(MockCameraConfig::default());
    assert_eq!(registry.available_cameras().unwrap(), vec!["mock".to_string()]);
}
