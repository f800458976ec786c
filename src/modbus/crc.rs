pub fn crc16_modbus(data: &[u8]) -> u16 {
    let mut crc: u16 = 0xFFFF;
    let poly: u16 = 0xA001;

    for &byte in data {
        crc ^= byte as u16;
        for _ in 0..8 {
            if crc & 0x0001 != 0 {
                crc = (crc >> 1) ^ poly;
            } else {
                crc >>= 1;
            }
        }
    }
    crc
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crc16_modbus_known_frame() {
        // Read input registers, slave 1, start 16, count 18
        let data = vec![0x01, 0x04, 0x00, 0x10, 0x00, 0x12];
        let crc = crc16_modbus(&data);
        // Checked against a reference CRC-16/MODBUS implementation
        assert_eq!(crc, 0xC271);
    }

    #[test]
    fn test_crc16_modbus_empty() {
        assert_eq!(crc16_modbus(&[]), 0xFFFF);
    }
}
