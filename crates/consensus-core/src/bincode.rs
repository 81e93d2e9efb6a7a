use bincode::config;
use bincode::{de, error};

pub const MAX_MSG_SIZE: usize = 0x100_0000;
pub const STD_BINCODE_CONFIG: config::Configuration<
    config::BigEndian,
    config::Varint,
    config::Limit<MAX_MSG_SIZE>,
> = config::standard()
    .with_limit::<MAX_MSG_SIZE>()
    .with_big_endian()
    .with_variable_int_encoding();

/// Decode `src` with [`STD_BINCODE_CONFIG`], failing on any trailing bytes
pub fn decode_whole<D: de::Decode<()>>(src: &[u8]) -> Result<D, error::DecodeError> {
    let (t, consumed) = bincode::decode_from_slice(src, STD_BINCODE_CONFIG)?;

    if consumed != src.len() {
        return Err(error::DecodeError::Other("leftover bytes"));
    }

    Ok(t)
}

pub fn encode_to_vec<E: bincode::Encode>(val: &E) -> Vec<u8> {
    bincode::encode_to_vec(val, STD_BINCODE_CONFIG).expect("Can't fail")
}
