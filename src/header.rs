//! Wire header: magic number and format version.
//!
//! Kept separate from the writer/reader drivers the way `massive-graph-core`
//! keeps its chunk-header framing separate from payload decoding — the
//! header is a fixed five bytes, checked once per `serialize`/`deserialize`
//! call, before any tagged value is read.

use crate::buffer::Buffer;
use crate::error::{Error, Result};
use crate::reader::Reader;

/// Magic number written at the start of every encoded blob.
pub const MAGIC: u32 = 0x5442_5235;

/// Wire format version this crate implements.
pub const VERSION: u8 = 0x05;

/// Write the 4-byte magic and 1-byte version at the current buffer position.
pub fn write_header(buf: &mut Buffer) {
    buf.write_u32_le(MAGIC);
    buf.write_u8(VERSION);
}

/// Read and validate the header, failing if the magic or version does not
/// match what this codec produces.
pub fn read_header(reader: &mut Reader) -> Result<()> {
    let magic = reader.read_u32_le()?;
    if magic != MAGIC {
        return Err(Error::InvalidMagic {
            expected: MAGIC,
            found: magic,
        });
    }
    let version = reader.read_u8()?;
    if version != VERSION {
        return Err(Error::UnsupportedFormat {
            expected: VERSION,
            found: version,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips() {
        let mut buf = Buffer::new(128);
        write_header(&mut buf);
        let bytes = buf.into_vec();
        assert_eq!(&bytes[0..4], &MAGIC.to_le_bytes());
        assert_eq!(bytes[4], VERSION);

        let mut reader = Reader::new(&bytes);
        read_header(&mut reader).unwrap();
    }

    #[test]
    fn rejects_bad_magic() {
        let bytes = [0u8, 0, 0, 0, VERSION];
        let mut reader = Reader::new(&bytes);
        assert!(matches!(
            read_header(&mut reader),
            Err(Error::InvalidMagic { .. })
        ));
    }

    #[test]
    fn rejects_bad_version() {
        let mut bytes = MAGIC.to_le_bytes().to_vec();
        bytes.push(0x99);
        let mut reader = Reader::new(&bytes);
        assert!(matches!(
            read_header(&mut reader),
            Err(Error::UnsupportedFormat { .. })
        ));
    }
}
