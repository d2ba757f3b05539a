use std::error::Error;
use std::fmt::{Debug, Display, Formatter};
use std::io::{Read, Write};

#[derive(Debug)]
pub enum EncodeError
{
    IOError(std::io::Error),
    StringTooLong
    {
        len: usize,
    },
    CountTooLarge
    {
        what: &'static str,
        count: usize,
    },
}
impl Error for EncodeError { }
impl Display for EncodeError
{
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result { Debug::fmt(self, f) }
}
impl From<std::io::Error> for EncodeError
{
    fn from(err: std::io::Error) -> Self { EncodeError::IOError(err) }
}

#[derive(Debug)]
pub enum DecodeError
{
    IOError(std::io::Error),
    BadMagic
    {
        expected: [u8; 4],
        found: [u8; 4],
    },
    UnsupportedVersion(u32),
    InvalidUtf8(std::string::FromUtf8Error),
}
impl Error for DecodeError { }
impl Display for DecodeError
{
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result { Debug::fmt(self, f) }
}
impl From<std::io::Error> for DecodeError
{
    fn from(err: std::io::Error) -> Self { DecodeError::IOError(err) }
}

/// Little-endian primitive writes. Strings are a u16 byte length followed by UTF-8
pub trait BinWrite: Write
{
    fn write_u16_le(&mut self, v: u16) -> Result<(), EncodeError> { Ok(self.write_all(&v.to_le_bytes())?) }
    fn write_u32_le(&mut self, v: u32) -> Result<(), EncodeError> { Ok(self.write_all(&v.to_le_bytes())?) }
    fn write_i32_le(&mut self, v: i32) -> Result<(), EncodeError> { Ok(self.write_all(&v.to_le_bytes())?) }
    fn write_f32_le(&mut self, v: f32) -> Result<(), EncodeError> { Ok(self.write_all(&v.to_le_bytes())?) }

    fn write_f32s(&mut self, vs: &[f32]) -> Result<(), EncodeError>
    {
        for v in vs
        {
            self.write_f32_le(*v)?;
        }
        Ok(())
    }
    fn write_u32s(&mut self, vs: &[u32]) -> Result<(), EncodeError>
    {
        for v in vs
        {
            self.write_u32_le(*v)?;
        }
        Ok(())
    }

    fn write_count(&mut self, what: &'static str, count: usize) -> Result<(), EncodeError>
    {
        let count = u32::try_from(count).map_err(|_| EncodeError::CountTooLarge { what, count })?;
        self.write_u32_le(count)
    }

    fn write_str(&mut self, s: &str) -> Result<(), EncodeError>
    {
        let len = u16::try_from(s.len()).map_err(|_| EncodeError::StringTooLong { len: s.len() })?;
        self.write_u16_le(len)?;
        Ok(self.write_all(s.as_bytes())?)
    }
}
impl<W: Write + ?Sized> BinWrite for W { }

pub trait BinRead: Read
{
    fn read_bytes<const N: usize>(&mut self) -> Result<[u8; N], DecodeError>
    {
        let mut buf = [0u8; N];
        self.read_exact(&mut buf)?;
        Ok(buf)
    }

    fn read_u16_le(&mut self) -> Result<u16, DecodeError> { Ok(u16::from_le_bytes(self.read_bytes()?)) }
    fn read_u32_le(&mut self) -> Result<u32, DecodeError> { Ok(u32::from_le_bytes(self.read_bytes()?)) }
    fn read_i32_le(&mut self) -> Result<i32, DecodeError> { Ok(i32::from_le_bytes(self.read_bytes()?)) }
    fn read_f32_le(&mut self) -> Result<f32, DecodeError> { Ok(f32::from_le_bytes(self.read_bytes()?)) }

    fn read_f32s<const N: usize>(&mut self) -> Result<[f32; N], DecodeError>
    {
        let mut out = [0.0; N];
        for v in &mut out
        {
            *v = self.read_f32_le()?;
        }
        Ok(out)
    }
    fn read_u32s<const N: usize>(&mut self) -> Result<[u32; N], DecodeError>
    {
        let mut out = [0; N];
        for v in &mut out
        {
            *v = self.read_u32_le()?;
        }
        Ok(out)
    }

    fn read_str(&mut self) -> Result<String, DecodeError>
    {
        let len = self.read_u16_le()? as usize;
        let mut buf = vec![0u8; len];
        self.read_exact(&mut buf)?;
        String::from_utf8(buf).map_err(DecodeError::InvalidUtf8)
    }

    fn expect_magic(&mut self, expected: [u8; 4]) -> Result<(), DecodeError>
    {
        let found = self.read_bytes::<4>()?;
        match found == expected
        {
            true => Ok(()),
            false => Err(DecodeError::BadMagic { expected, found }),
        }
    }
}
impl<R: Read + ?Sized> BinRead for R { }

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn strings_are_length_prefixed()
    {
        let mut buf = Vec::new();
        buf.write_str("Arm").unwrap();
        assert_eq!(buf, vec![3, 0, b'A', b'r', b'm']);

        let back = buf.as_slice().read_str().unwrap();
        assert_eq!(back, "Arm");
    }

    #[test]
    fn long_strings_rejected()
    {
        let long = "x".repeat(u16::MAX as usize + 1);
        let mut buf = Vec::new();
        assert!(matches!(buf.write_str(&long), Err(EncodeError::StringTooLong { len }) if len == long.len()));
        assert!(buf.is_empty());

        let longest = "y".repeat(u16::MAX as usize);
        buf.write_str(&longest).unwrap();
        assert_eq!(buf.len(), 2 + longest.len());
    }

    #[test]
    fn little_endian()
    {
        let mut buf = Vec::new();
        buf.write_u32_le(0x0403_0201).unwrap();
        buf.write_i32_le(-1).unwrap();
        assert_eq!(buf, vec![1, 2, 3, 4, 0xff, 0xff, 0xff, 0xff]);
    }

    #[test]
    fn bad_magic()
    {
        let bytes = b"ABIN";
        assert!(matches!(bytes.as_slice().expect_magic(*b"MBIN"), Err(DecodeError::BadMagic { .. })));
        assert!(bytes.as_slice().expect_magic(*b"ABIN").is_ok());
    }

    #[test]
    fn truncated_input()
    {
        let bytes = [5u8, 0, b'a'];
        assert!(matches!(bytes.as_slice().read_str(), Err(DecodeError::IOError(_))));
    }
}
