use super::crc::crc16_modbus;
use crate::utils::error::ModbusError;

pub const FUNCTION_READ_INPUT_REGISTERS: u8 = 0x04;

const EXCEPTION_FLAG: u8 = 0x80;
const EXCEPTION_FRAME_LEN: usize = 5;

/// Build a Read Input Registers request frame, CRC appended low byte first.
pub fn build_read_input_request(slave_id: u8, start_addr: u16, count: u16) -> Vec<u8> {
    let mut frame = vec![slave_id, FUNCTION_READ_INPUT_REGISTERS];
    frame.extend_from_slice(&start_addr.to_be_bytes());
    frame.extend_from_slice(&count.to_be_bytes());

    let crc = crc16_modbus(&frame);
    frame.extend_from_slice(&crc.to_le_bytes());
    frame
}

/// Expected length of a normal response frame for `count` registers.
pub fn expected_response_len(count: u16) -> usize {
    5 + (count as usize) * 2
}

/// Validate a complete response frame and extract the register words.
///
/// An exception frame (function code with the high bit set) surfaces as
/// `ModbusError::Exception` carrying the device's exception code verbatim.
pub fn parse_read_response(
    slave_id: u8,
    count: u16,
    frame: &[u8],
) -> Result<Vec<u16>, ModbusError> {
    if frame.len() < EXCEPTION_FRAME_LEN {
        return Err(ModbusError::InvalidResponse);
    }

    let data_len = frame.len() - 2;
    let received_crc = u16::from_le_bytes([frame[data_len], frame[data_len + 1]]);
    let calculated_crc = crc16_modbus(&frame[..data_len]);
    if received_crc != calculated_crc {
        return Err(ModbusError::CrcError);
    }

    if frame[0] != slave_id {
        return Err(ModbusError::InvalidResponse);
    }

    if frame[1] == FUNCTION_READ_INPUT_REGISTERS | EXCEPTION_FLAG {
        return Err(ModbusError::Exception(frame[2]));
    }

    if frame[1] != FUNCTION_READ_INPUT_REGISTERS {
        return Err(ModbusError::InvalidResponse);
    }

    let byte_count = frame[2] as usize;
    if byte_count != (count as usize) * 2 || frame.len() != byte_count + 5 {
        return Err(ModbusError::InvalidResponse);
    }

    // Registers are transmitted big-endian, two bytes per word
    let words = frame[3..3 + byte_count]
        .chunks_exact(2)
        .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
        .collect();

    Ok(words)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_read_input_request() {
        let frame = build_read_input_request(1, 16, 18);
        assert_eq!(
            frame,
            vec![0x01, 0x04, 0x00, 0x10, 0x00, 0x12, 0x71, 0xC2]
        );
    }

    #[test]
    fn test_parse_valid_response() {
        // Slave 1, two registers: 0x4228, 0x0000
        let frame = [0x01, 0x04, 0x04, 0x42, 0x28, 0x00, 0x00, 0x6F, 0xF4];
        let words = parse_read_response(1, 2, &frame).unwrap();
        assert_eq!(words, vec![0x4228, 0x0000]);
    }

    #[test]
    fn test_parse_exception_response() {
        // Exception frame: illegal data address (code 2)
        let frame = [0x01, 0x84, 0x02, 0xC2, 0xC1];
        match parse_read_response(1, 18, &frame) {
            Err(ModbusError::Exception(code)) => assert_eq!(code, 2),
            other => panic!("expected exception, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_rejects_bad_crc() {
        let frame = [0x01, 0x04, 0x04, 0x42, 0x28, 0x00, 0x00, 0x00, 0x00];
        assert!(matches!(
            parse_read_response(1, 2, &frame),
            Err(ModbusError::CrcError)
        ));
    }

    #[test]
    fn test_parse_rejects_wrong_slave() {
        let frame = [0x01, 0x04, 0x04, 0x42, 0x28, 0x00, 0x00, 0x6F, 0xF4];
        assert!(matches!(
            parse_read_response(2, 2, &frame),
            Err(ModbusError::InvalidResponse)
        ));
    }

    #[test]
    fn test_parse_rejects_short_frame() {
        assert!(matches!(
            parse_read_response(1, 2, &[0x01, 0x04]),
            Err(ModbusError::InvalidResponse)
        ));
    }
}
