//! Byte cursor bounds and byte order.
use super::*;

#[test]
/// Multi-byte values are read most significant byte first.
fn test_read_big_endian() {
    let data = [0x12, 0x34, 0x56, 0x78, 0x9A, 0xBC];
    let mut reader = ByteReader::new(&data);
    assert_eq!(reader.read_u8().unwrap(), 0x12);
    assert_eq!(reader.read_u16().unwrap(), 0x3456);
    assert_eq!(
        reader.read_u32(),
        Err(ByteReaderError::OutOfBounds {
            asked: 4,
            available: 3
        })
    );
    assert_eq!(reader.read_slice(3).unwrap(), &[0x78, 0x9A, 0xBC]);
    assert_eq!(reader.remaining(), 0);
}

#[test]
/// A failed read does not move the cursor.
fn test_read_out_of_bounds_keeps_cursor() {
    let data = [0xFF, 0x01];
    let mut reader = ByteReader::new(&data);
    assert!(reader.read_u32().is_err());
    assert_eq!(reader.position(), 0);
    assert_eq!(reader.read_u16().unwrap(), 0xFF01);
}

#[test]
/// Writer lays values big-endian and refuses to overflow.
fn test_write_big_endian() {
    let mut buffer = [0u8; 7];
    let mut writer = ByteWriter::new(&mut buffer);
    writer.write_u8(0xAA).unwrap();
    writer.write_u16(0x0102).unwrap();
    writer.write_u32(0x0A0B_0C0D).unwrap();
    assert_eq!(
        writer.write_u8(0),
        Err(ByteWriterError::OutOfBounds {
            asked: 1,
            available: 0
        })
    );
    assert_eq!(writer.position(), 7);
    assert_eq!(buffer, [0xAA, 0x01, 0x02, 0x0A, 0x0B, 0x0C, 0x0D]);
}
