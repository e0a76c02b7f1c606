//! End-to-end tests over the network channel
//!
//! Each test starts a simulator on an ephemeral port, connects a `TcpLink`
//! and drives `RemoteDevice` against it.
//!
//! Run with: cargo test -p remotez-tests --test tcp_e2e_test

use std::sync::Arc;

use chrono::{FixedOffset, TimeZone};
use pretty_assertions::assert_eq;
use remotez::config::TcpConfig;
use remotez::device::DeviceTime;
use remotez::protocol::{region, Command, ResetKind, Status};
use remotez::{FlashRegion, RemoteDevice, RemoteError, TcpLink};
use remotez_sim::{SimConfig, SimServer, SimulatedRemote};
use tokio::task::JoinHandle;

/// Simulator plus a connected device
struct TestHarness {
    remote: Arc<SimulatedRemote>,
    device: RemoteDevice<TcpLink>,
    server: JoinHandle<()>,
}

impl TestHarness {
    async fn new() -> Self {
        Self::with_config(SimConfig {
            flash_size: 64 * 1024,
            ..SimConfig::default()
        })
        .await
    }

    async fn with_config(config: SimConfig) -> Self {
        Self::start(config, remotez::protocol::MAX_PAYLOAD).await
    }

    async fn start(config: SimConfig, chunk_size: usize) -> Self {
        let remote = Arc::new(SimulatedRemote::new(config));
        let server = SimServer::bind("127.0.0.1:0", Arc::clone(&remote))
            .await
            .expect("bind simulator");
        let addr = server.local_addr().expect("simulator address");
        let server = server.spawn();

        let link = TcpLink::connect(&TcpConfig::new(addr.ip().to_string(), addr.port()))
            .await
            .expect("connect to simulator");

        Self {
            remote,
            device: RemoteDevice::new(link).with_chunk_size(chunk_size),
            server,
        }
    }
}

impl Drop for TestHarness {
    fn drop(&mut self) {
        self.server.abort();
    }
}

#[tokio::test]
async fn test_identity_over_tcp() {
    let mut config = SimConfig::default();
    config.identity.hw_major = 2;
    config.identity.hw_minor = 1;
    config.identity.fw_minor = 207;
    let serial = config.identity.serial;

    let mut h = TestHarness::with_config(config).await;
    let identity = h.device.get_identity().await.unwrap();

    assert_eq!(identity.usb_vid, 0x046D);
    assert_eq!(identity.hardware_version(), "2.1");
    assert_eq!(identity.firmware_version(), "4.207");
    assert_eq!(identity.serial, serial);
    assert_eq!(identity.flash, None);
}

#[tokio::test]
async fn test_ping_and_echo() {
    let mut h = TestHarness::new().await;

    h.device.ping().await.unwrap();
    let payload: Vec<u8> = (0..60).collect();
    assert_eq!(h.device.echo(&payload).await.unwrap(), payload);
}

#[tokio::test]
async fn test_flash_write_read_verify() {
    let mut h = TestHarness::new().await;
    let image: Vec<u8> = (0..150u32).map(|i| (i * 7) as u8).collect();

    h.device.write_flash(0x2000, &image).await.unwrap();
    assert_eq!(h.remote.flash_snapshot(0x2000, 150), Some(image.clone()));

    let read = h.device.read_flash(0x2000, 150).await.unwrap();
    assert_eq!(read, image);
    h.device.verify_flash(0x2000, &image).await.unwrap();

    let crc = h.device.calculate_checksum(0x2000, 150).await.unwrap();
    assert_eq!(crc, remotez::protocol::checksum(&image));
}

#[tokio::test]
async fn test_small_chunks_move_the_same_bytes() {
    let config = SimConfig {
        flash_size: 4096,
        ..SimConfig::default()
    };
    let mut h = TestHarness::start(config, 7).await;
    assert_eq!(h.device.chunk_size(), 7);

    let data: Vec<u8> = (0..100).collect();
    h.device.write_flash(0x40, &data).await.unwrap();
    assert_eq!(h.device.read_flash(0x40, 100).await.unwrap(), data);
}

#[tokio::test]
async fn test_erase_restores_erased_value() {
    let mut h = TestHarness::new().await;
    h.device.write_flash(0x1000, &[0u8; 32]).await.unwrap();

    h.device
        .erase_regions(&[FlashRegion {
            address: 0x1000,
            length: 0x1000,
        }])
        .await
        .unwrap();

    assert_eq!(h.remote.flash_snapshot(0x1000, 32), Some(vec![0xFF; 32]));
}

#[tokio::test]
async fn test_out_of_range_read_surfaces_status() {
    let mut h = TestHarness::new().await;

    let err = h.device.read_flash(0xFFFF_0000, 16).await.unwrap_err();
    assert_eq!(err.status(), Some(Status::InvalidAddress));

    // The link is still usable afterwards
    h.device.ping().await.unwrap();
}

#[tokio::test]
async fn test_verify_detects_difference() {
    let mut h = TestHarness::new().await;
    h.device.write_flash(0, &[1, 2, 3, 4]).await.unwrap();

    let err = h.device.verify_flash(0, &[1, 2, 0, 4]).await.unwrap_err();
    assert!(matches!(err, RemoteError::VerifyMismatch { offset: 2 }));
}

#[tokio::test]
async fn test_busy_is_surfaced_not_retried() {
    let mut h = TestHarness::new().await;
    h.remote.inject_status(Command::GetName, Status::Busy);

    let err = h.device.get_name().await.unwrap_err();
    assert!(err.is_busy());

    // Caller-driven retry succeeds
    assert_eq!(h.device.get_name().await.unwrap(), "RemoteZ Simulator");
}

#[tokio::test]
async fn test_time_round_trip() {
    let mut h = TestHarness::new().await;
    let dt = FixedOffset::east_opt(60 * 60)
        .unwrap()
        .with_ymd_and_hms(2022, 6, 15, 12, 30, 0)
        .unwrap();

    h.device
        .set_time(&DeviceTime::from_datetime(&dt, "CET"))
        .await
        .unwrap();
    let time = h.device.get_time().await.unwrap();

    assert_eq!((time.year, time.month, time.day), (2022, 6, 15));
    assert_eq!((time.hour, time.minute), (12, 30));
    assert_eq!(time.dow, 3);
    assert_eq!(time.utc_offset, 60);
    assert_eq!(time.timezone, "CET");
}

#[tokio::test]
async fn test_name_and_location() {
    let mut h = TestHarness::new().await;

    h.device.set_name("Den").await.unwrap();
    h.device.set_location("Shelf").await.unwrap();

    assert_eq!(h.device.get_name().await.unwrap(), "Den");
    assert_eq!(h.device.get_location().await.unwrap(), "Shelf");
}

#[tokio::test]
async fn test_region_update_and_read_back() {
    let mut h = TestHarness::new().await;
    let config_blob: Vec<u8> = (0..200u16).map(|i| (i % 251) as u8).collect();

    h.device
        .update_region(region::CONFIG, &config_blob)
        .await
        .unwrap();
    assert_eq!(h.remote.region_content(region::CONFIG), Some(config_blob.clone()));

    let read = h.device.read_region(region::CONFIG).await.unwrap();
    assert_eq!(read, config_blob);
}

#[tokio::test]
async fn test_invalidate_clears_region() {
    let mut h = TestHarness::new().await;
    h.device.update_region(region::SKIN, &[9; 10]).await.unwrap();

    h.device.invalidate_flash(region::SKIN).await.unwrap();

    assert_eq!(h.device.read_region(region::SKIN).await.unwrap(), Vec::<u8>::new());
}

#[tokio::test]
async fn test_unknown_region() {
    let mut h = TestHarness::new().await;
    let err = h.device.update_region(0x7E, &[0; 4]).await.unwrap_err();
    assert_eq!(err.status(), Some(Status::BadRegion));
}

#[tokio::test]
async fn test_raw_ir_cache_and_execute() {
    let mut h = TestHarness::new().await;
    let waveform = vec![0x42; 130];

    h.device.cache_raw_ir(&waveform).await.unwrap();
    h.device.execute_raw_ir().await.unwrap();

    assert_eq!(h.remote.cached_raw_ir(), Some(waveform));
    assert_eq!(h.remote.ir_executions(), 1);
}

#[tokio::test]
async fn test_learn_ir_returns_capture() {
    let mut h = TestHarness::new().await;
    let expected = h.remote.config().ir_capture.clone();

    let capture = h.device.learn_ir().await.unwrap();

    assert_eq!(capture, expected);
    assert!(!h.remote.is_learning());
}

#[tokio::test]
async fn test_zwave_messages_and_ids() {
    let mut h = TestHarness::new().await;

    h.device.send_zwave_request(&[1, 2, 3]).await.unwrap();
    h.device.send_zwave_response(&[7; 90]).await.unwrap();
    h.device.set_node_id(5).await.unwrap();
    h.device.set_home_id(0xCAFE_F00D).await.unwrap();

    assert_eq!(h.device.get_node_id().await.unwrap(), 5);
    assert_eq!(h.device.get_home_id().await.unwrap(), 0xCAFE_F00D);
    assert_eq!(
        h.remote.zwave_messages(),
        vec![
            (Command::SendShortZwaveRequest, vec![1, 2, 3]),
            (Command::SendLongZwaveResponseDataDone, vec![7; 90]),
        ]
    );
}

#[tokio::test]
async fn test_reset_and_interfaces() {
    let mut h = TestHarness::new().await;

    h.device.reset(ResetKind::Reboot).await.unwrap();
    assert_eq!(h.remote.last_reset(), Some(ResetKind::Reboot));

    let interfaces = h.device.get_interface_list().await.unwrap();
    assert!(interfaces.contains(&Command::LearnIr));
    assert!(h
        .device
        .is_interface_supported(Command::GetSystemInfo)
        .await
        .unwrap());
    assert!(!h
        .device
        .is_interface_supported(Command::ExecuteAction)
        .await
        .unwrap());
}

#[tokio::test]
async fn test_serial_update() {
    let mut h = TestHarness::new().await;
    let serial = uuid::Uuid::from_u128(0x0123_4567_89AB_CDEF_0123_4567_89AB_CDEF);

    h.device.set_serial(serial).await.unwrap();
    assert_eq!(h.device.get_serial().await.unwrap(), serial);
}
