use chrono::{DateTime, Utc};
use log::error;
use serde::{Deserialize, Serialize};

use crate::utils::error::ModbusError;

/// Register map of the power meter: six single-precision channels in one
/// input-register block. Voltage phases occupy words 0-5, current phases
/// words 12-17; words 6-11 belong to channels this poller does not report.
pub const POWER_METER_START_REGISTER: u16 = 16;
pub const POWER_METER_REGISTER_COUNT: u16 = 18;

const VOLTAGE_WORD_OFFSETS: [usize; 3] = [0, 2, 4];
const CURRENT_WORD_OFFSETS: [usize; 3] = [12, 14, 16];

#[derive(Debug, Clone)]
pub struct PowerMeterDevice {
    pub address: u8,
    pub start_register: u16,
    pub register_count: u16,
}

impl PowerMeterDevice {
    pub fn new(address: u8) -> Self {
        Self {
            address,
            start_register: POWER_METER_START_REGISTER,
            register_count: POWER_METER_REGISTER_COUNT,
        }
    }

    /// Decode one raw register block into a measurement snapshot.
    ///
    /// Each channel is two big-endian-ordered words reinterpreted as an
    /// IEEE-754 single bit pattern, never numerically converted.
    pub fn decode(&self, words: &[u16]) -> Result<PowerMeterSnapshot, ModbusError> {
        if words.len() < self.register_count as usize {
            error!(
                "❌ Insufficient register count from device {}: {} words",
                self.address,
                words.len()
            );
            return Err(ModbusError::InvalidData(format!(
                "Expected {} registers, got {}",
                self.register_count,
                words.len()
            )));
        }

        let channel = |offset: usize| word_pair_to_f32(words[offset], words[offset + 1]);

        Ok(PowerMeterSnapshot {
            timestamp: Utc::now(),
            voltage_1: channel(VOLTAGE_WORD_OFFSETS[0]),
            voltage_2: channel(VOLTAGE_WORD_OFFSETS[1]),
            voltage_3: channel(VOLTAGE_WORD_OFFSETS[2]),
            current_1: channel(CURRENT_WORD_OFFSETS[0]),
            current_2: channel(CURRENT_WORD_OFFSETS[1]),
            current_3: channel(CURRENT_WORD_OFFSETS[2]),
        })
    }
}

/// Latest measurement set. Overwritten in place on every successful poll;
/// no history is kept.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PowerMeterSnapshot {
    pub timestamp: DateTime<Utc>,
    pub voltage_1: f32,
    pub voltage_2: f32,
    pub voltage_3: f32,
    pub current_1: f32,
    pub current_2: f32,
    pub current_3: f32,
}

fn word_pair_to_f32(hi: u16, lo: u16) -> f32 {
    f32::from_bits(((hi as u32) << 16) | lo as u32)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block_with(pairs: &[(usize, u16, u16)]) -> Vec<u16> {
        let mut words = vec![0u16; POWER_METER_REGISTER_COUNT as usize];
        for &(offset, hi, lo) in pairs {
            words[offset] = hi;
            words[offset + 1] = lo;
        }
        words
    }

    #[test]
    fn test_word_pair_reinterprets_bit_pattern() {
        // 0x42280000 is the bit pattern of 42.0
        assert_eq!(word_pair_to_f32(0x4228, 0x0000), 42.0);
        // Not a numeric cast: the max u32 pattern is a NaN, not 4294967295.0
        assert!(word_pair_to_f32(0xFFFF, 0xFFFF).is_nan());
        // Sign bit survives
        assert_eq!(word_pair_to_f32(0xC228, 0x0000), -42.0);
    }

    #[test]
    fn test_decode_voltage_phase_one() {
        let device = PowerMeterDevice::new(1);
        let words = block_with(&[(0, 0x4228, 0x0000)]);
        let snapshot = device.decode(&words).unwrap();
        assert_eq!(snapshot.voltage_1, 42.0);
        assert_eq!(snapshot.voltage_2, 0.0);
        assert_eq!(snapshot.current_3, 0.0);
    }

    #[test]
    fn test_decode_all_channels_at_mapped_offsets() {
        let device = PowerMeterDevice::new(1);
        let words = block_with(&[
            (0, 0x4363, 0x0000),  // 227.0 V
            (2, 0x4365, 0x0000),  // 229.0 V
            (4, 0x4360, 0x0000),  // 224.0 V
            (12, 0x40A0, 0x0000), // 5.0 A
            (14, 0x40C0, 0x0000), // 6.0 A
            (16, 0x40E0, 0x0000), // 7.0 A
        ]);
        let snapshot = device.decode(&words).unwrap();
        assert_eq!(snapshot.voltage_1, 227.0);
        assert_eq!(snapshot.voltage_2, 229.0);
        assert_eq!(snapshot.voltage_3, 224.0);
        assert_eq!(snapshot.current_1, 5.0);
        assert_eq!(snapshot.current_2, 6.0);
        assert_eq!(snapshot.current_3, 7.0);
    }

    #[test]
    fn test_decode_is_deterministic() {
        let device = PowerMeterDevice::new(1);
        let words = block_with(&[(0, 0x4228, 0x0000), (16, 0x3F80, 0x0000)]);
        let a = device.decode(&words).unwrap();
        let b = device.decode(&words).unwrap();
        assert_eq!(a.voltage_1, b.voltage_1);
        assert_eq!(a.current_3, b.current_3);
    }

    #[test]
    fn test_decode_rejects_short_block() {
        let device = PowerMeterDevice::new(1);
        // 17 words: the legacy off-by-one request size, one word short of
        // current phase 3
        let words = vec![0u16; 17];
        assert!(matches!(
            device.decode(&words),
            Err(ModbusError::InvalidData(_))
        ));
    }
}
