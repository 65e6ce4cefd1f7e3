//! Thin wrappers around the `leb128` crate's encoders, plus the
//! length-prefixed byte-string encoding Wasm uses for names.

pub fn write_u32(buf: &mut Vec<u8>, value: u32) {
    leb128::write::unsigned(buf, u64::from(value)).expect("writing to a Vec<u8> never fails");
}

pub fn write_u64(buf: &mut Vec<u8>, value: u64) {
    leb128::write::unsigned(buf, value).expect("writing to a Vec<u8> never fails");
}

pub fn write_i32(buf: &mut Vec<u8>, value: i32) {
    leb128::write::signed(buf, i64::from(value)).expect("writing to a Vec<u8> never fails");
}

pub fn write_i64(buf: &mut Vec<u8>, value: i64) {
    leb128::write::signed(buf, value).expect("writing to a Vec<u8> never fails");
}

pub fn write_name(buf: &mut Vec<u8>, name: &str) {
    write_u32(buf, u32::try_from(name.len()).expect("name too long to encode"));
    buf.extend_from_slice(name.as_bytes());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsigned_encoding_matches_the_core_spec_example() {
        let mut buf = Vec::new();
        write_u32(&mut buf, 624_485);
        assert_eq!(buf, vec![0xE5, 0x8E, 0x26]);
    }

    #[test]
    fn signed_encoding_matches_the_core_spec_example() {
        let mut buf = Vec::new();
        write_i32(&mut buf, -123_456);
        assert_eq!(buf, vec![0xC0, 0xBB, 0x78]);
    }
}
