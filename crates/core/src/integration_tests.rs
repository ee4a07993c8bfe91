//! Integration tests: exercise the full flow against a simulated PMW3360.
//!
//! The recording bus stands in for the sensor and logs every chip-select
//! edge, byte and delay, so the startup sequence can be compared byte for
//! byte and wait for wait against the datasheet order.

#[cfg(test)]
mod tests {
    use crate::config::SensorConfig;
    use crate::device::SensorStatus;
    use crate::firmware::FirmwareImage;
    use crate::motion::MotionSample;
    use crate::registers::Register;
    use crate::sensor::{Sensor, SessionState};
    use crate::transport::recording::{BusEvent, RecordingBus};

    const SROM: [u8; 6] = [0x01, 0x04, 0x8E, 0x96, 0x6E, 0x77];
    const SROM_ID: u8 = 0x04;

    fn tx(out: u8) -> BusEvent {
        BusEvent::Transfer { out, input: 0x00 }
    }

    /// Expected events for one register read answered with `value`.
    fn read(addr: u8, value: u8) -> Vec<BusEvent> {
        vec![
            BusEvent::Select,
            tx(addr),
            BusEvent::DelayUs(100),
            BusEvent::Transfer {
                out: 0x00,
                input: value,
            },
            BusEvent::DelayUs(1),
            BusEvent::Deselect,
            BusEvent::DelayUs(19),
        ]
    }

    /// Expected events for one register write.
    fn write(addr: u8, value: u8) -> Vec<BusEvent> {
        vec![
            BusEvent::Select,
            tx(addr | 0x80),
            tx(value),
            BusEvent::DelayUs(20),
            BusEvent::Deselect,
            BusEvent::DelayUs(100),
        ]
    }

    /// Create a simulated PMW3360 that accepts the download.
    fn create_mock_pmw3360() -> RecordingBus {
        let mut bus = RecordingBus::new();
        bus.set_register(Register::ProductId, 0x42)
            .set_register(Register::InverseProductId, 0xBD)
            .set_register(Register::RevisionId, 0x01)
            .set_register(Register::SromId, SROM_ID);
        bus
    }

    /// Test: golden startup sequence for initialize_sensor(800).
    #[test]
    fn initialize_sensor_golden_sequence() {
        let mut bus = create_mock_pmw3360();
        let mut sensor = Sensor::new(&mut bus, FirmwareImage::new(&SROM));
        sensor.initialize_sensor(800).unwrap();
        assert_eq!(sensor.state(), SessionState::Configured);

        let mut expected = vec![BusEvent::Deselect, BusEvent::Select, BusEvent::Deselect];
        // Power-up reset
        expected.extend(write(0x3A, 0x5A));
        expected.push(BusEvent::DelayMs(50));
        // Discard reads: Motion, Delta_X_L, Delta_X_H, Delta_Y_L, Delta_Y_H
        for addr in 0x02..=0x06 {
            expected.extend(read(addr, 0x00));
        }
        // SROM download
        expected.extend(write(0x10, 0x20));
        expected.extend(write(0x13, 0x1D));
        expected.push(BusEvent::DelayMs(10));
        expected.extend(write(0x13, 0x18));
        expected.push(BusEvent::Select);
        expected.push(tx(0x62 | 0x80));
        expected.push(BusEvent::DelayUs(15));
        for byte in SROM {
            expected.push(tx(byte));
            expected.push(BusEvent::DelayUs(15));
        }
        expected.push(BusEvent::Deselect);
        expected.extend(read(0x2A, SROM_ID));
        // Post-download mode and initial resolution
        expected.extend(write(0x10, 0x00));
        expected.extend(write(0x0F, 0x15));
        expected.push(BusEvent::DelayMs(10));
        // Requested resolution: 800 / 100 - 1
        expected.extend(write(0x0F, 0x07));

        assert_eq!(bus.events(), &expected[..]);
    }

    /// Test: virtual time spent in startup adds up to the mandated waits.
    #[test]
    fn startup_virtual_time() {
        let mut bus = create_mock_pmw3360();
        Sensor::new(&mut bus, FirmwareImage::new(&SROM))
            .perform_startup()
            .unwrap();

        let writes = 6u64; // reset, Config2, SROM_Enable x2, Config2, Config1
        let reads = 6u64; // five discards, SROM_ID
        let burst = 15 * (SROM.len() as u64 + 1);
        let expected = 50_000 + 10_000 + 10_000 + writes * 120 + reads * 120 + burst;
        assert_eq!(bus.elapsed_us(), expected);
    }

    /// Test: zero motion polls stay at zero with no drift.
    #[test]
    fn poll_motion_idempotent_without_motion() {
        let mut bus = create_mock_pmw3360();
        let mut sensor = Sensor::new(&mut bus, FirmwareImage::new(&SROM));
        sensor.initialize_sensor(800).unwrap();

        assert_eq!(sensor.poll_motion().unwrap(), MotionSample::ZERO);
        assert_eq!(sensor.poll_motion().unwrap(), MotionSample::ZERO);
        assert_eq!(sensor.state(), SessionState::Polling);
    }

    /// Test: every poll repeats the identical latch and read sequence.
    #[test]
    fn poll_motion_sequence_repeats() {
        let mut bus = create_mock_pmw3360();
        let mut sensor = Sensor::new(&mut bus, FirmwareImage::new(&SROM));
        sensor.initialize_sensor(800).unwrap();
        sensor.bus_mut().clear();

        sensor.poll_motion().unwrap();
        let first = sensor.bus_mut().take_events();
        sensor.poll_motion().unwrap();
        let second = sensor.bus_mut().take_events();

        let mut expected = write(0x02, 0x01);
        for addr in [0x02, 0x04, 0x03, 0x06, 0x05] {
            expected.extend(read(addr, 0x00));
        }
        assert_eq!(first, expected);
        assert_eq!(second, expected);
    }

    /// Test: motion values flow through the latch into decoded samples.
    #[test]
    fn poll_motion_decodes_queued_deltas() {
        let mut bus = create_mock_pmw3360();
        let config = SensorConfig::default();
        let mut sensor = config.sensor(&mut bus, FirmwareImage::new(&SROM));
        sensor.initialize_sensor(config.resolution_cpi).unwrap();

        // Queued after startup so the discard reads do not consume them.
        sensor
            .bus_mut()
            .queue_register(Register::DeltaXH, &[0x00, 0xFF])
            .queue_register(Register::DeltaXL, &[0x01, 0xFF])
            .queue_register(Register::DeltaYH, &[0x80, 0x00])
            .queue_register(Register::DeltaYL, &[0x00, 0x10]);

        let a = sensor.poll_motion().unwrap();
        let b = sensor.poll_motion().unwrap();
        let c = sensor.poll_motion().unwrap();
        assert_eq!(a, MotionSample::new(1, -32768));
        assert_eq!(b, MotionSample::new(-1, 16));
        assert_eq!(c, MotionSample::ZERO);

        assert_eq!(
            b.oriented(config.orientation),
            MotionSample::new(-1, -16)
        );
    }

    /// Test: configured firmware check accepts the expected SROM ID.
    #[test]
    fn config_driven_startup_with_verification() {
        let config = SensorConfig::from_json(r#"{ "verify_srom_id": 4 }"#).unwrap();
        let mut bus = create_mock_pmw3360();
        let mut sensor = config.sensor(&mut bus, FirmwareImage::new(&SROM));
        sensor.initialize_sensor(config.resolution_cpi).unwrap();
        assert_eq!(sensor.srom_id(), Some(SROM_ID));
        assert_eq!(sensor.check_status().unwrap(), SensorStatus::Ready);
        assert!(sensor.identify().unwrap().has_firmware());
    }

    /// Test: burst payload arrives complete and in order.
    #[test]
    fn burst_payload_matches_image() {
        let image: Vec<u8> = (0..crate::firmware::PMW3360_SROM_LEN)
            .map(|i| (i * 7 % 251) as u8)
            .collect();
        let mut bus = create_mock_pmw3360();
        Sensor::new(&mut bus, FirmwareImage::new(&image))
            .perform_startup()
            .unwrap();
        assert_eq!(bus.burst_bytes(), &image[..]);
    }
}
