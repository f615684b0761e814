//! Endian I/O helpers shared by the parser and writer (§4.2).

/// Rounds `value` up to the next multiple of `size`.
#[inline(always)]
pub(crate) fn align(value: u32, size: u32) -> u32 {
    (value + (size - value % size) % size) as u32
}

/// A 24-bit unsigned integer, as used for string table and container
/// element counts. `binrw` has no native support for non-power-of-two
/// widths, so this hand-rolls `BinRead`/`BinWrite` the way the rest of the
/// BYML codec hand-rolls its few format quirks.
#[allow(non_camel_case_types)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct u24(pub u32);

impl u24 {
    pub fn as_u32(&self) -> u32 {
        self.0
    }
}

impl binrw::BinRead for u24 {
    type Args = ();
    fn read_options<R: std::io::Read + std::io::Seek>(
        reader: &mut R,
        opts: &binrw::ReadOptions,
        _: (),
    ) -> binrw::BinResult<Self> {
        let buf: [u8; 3] = binrw::BinRead::read_options(reader, opts, ())?;
        match opts.endian() {
            binrw::Endian::Little | binrw::Endian::Native => Ok(u24(u32::from(buf[0])
                | u32::from(buf[1]) << 8
                | u32::from(buf[2]) << 16)),
            binrw::Endian::Big => Ok(u24(u32::from(buf[2])
                | u32::from(buf[1]) << 8
                | u32::from(buf[0]) << 16)),
        }
    }
}

impl binrw::BinWrite for u24 {
    type Args = ();
    fn write_options<W: std::io::Write + std::io::Seek>(
        &self,
        writer: &mut W,
        options: &binrw::WriteOptions,
        args: Self::Args,
    ) -> binrw::BinResult<()> {
        let mut buf = [0; 3];
        match options.endian() {
            binrw::Endian::Little | binrw::Endian::Native => {
                buf[0] = self.0 as u8;
                buf[1] = (self.0 >> 8) as u8;
                buf[2] = (self.0 >> 16) as u8;
            }
            binrw::Endian::Big => {
                buf[0] = (self.0 >> 16) as u8;
                buf[1] = (self.0 >> 8) as u8;
                buf[2] = self.0 as u8;
            }
        }
        buf.write_options(writer, options, args)
    }
}

#[cfg(test)]
mod tests {
    use binrw::{BinRead, BinWrite};

    use super::*;

    #[test]
    fn align_up() {
        assert_eq!(align(0, 4), 0);
        assert_eq!(align(1, 4), 4);
        assert_eq!(align(4, 4), 4);
        assert_eq!(align(17, 4), 20);
    }

    #[test]
    fn u24_round_trip() {
        let num = u24(8388608);
        let le_data = b"\x00\x00\x80";
        let be_data = b"\x80\x00\x00";
        let mut buf = Vec::new();
        num.write_options(
            &mut std::io::Cursor::new(&mut buf),
            &binrw::WriteOptions::default().with_endian(binrw::Endian::Little),
            (),
        )
        .unwrap();
        assert_eq!(buf, le_data);
        buf.clear();
        num.write_options(
            &mut std::io::Cursor::new(&mut buf),
            &binrw::WriteOptions::default().with_endian(binrw::Endian::Big),
            (),
        )
        .unwrap();
        assert_eq!(buf, be_data);
        buf.clear();
        let mut reader = std::io::Cursor::new(le_data);
        let num = u24::read_options(
            &mut reader,
            &binrw::ReadOptions::default().with_endian(binrw::Endian::Little),
            (),
        )
        .unwrap();
        assert_eq!(num.0, 8388608);
        reader = std::io::Cursor::new(be_data);
        let num = u24::read_options(
            &mut reader,
            &binrw::ReadOptions::default().with_endian(binrw::Endian::Big),
            (),
        )
        .unwrap();
        assert_eq!(num.0, 8388608);
    }
}
