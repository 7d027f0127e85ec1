//! Byte cursor over a mangled symbol.

use crate::error::{Error, Result};

pub(super) struct Cursor<'a> {
    src: &'a [u8],
    offset: usize,
}

impl<'a> Cursor<'a> {
    /// Create a cursor over everything up to the first NUL byte.
    pub fn new(src: &'a [u8]) -> Self {
        let len = src.iter().position(|&b| b == 0).unwrap_or(src.len());
        Self {
            src: &src[..len],
            offset: 0,
        }
    }

    /// Unparsed remainder of the symbol.
    #[inline]
    pub fn src(&self) -> &'a [u8] {
        &self.src[self.offset..]
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.offset >= self.src.len()
    }

    /// View the current byte without incrementing the offset.
    #[inline]
    pub fn peek(&self) -> Option<u8> {
        self.src().first().copied()
    }

    /// View the byte after the current one without incrementing the offset.
    #[inline]
    pub fn peek_second(&self) -> Option<u8> {
        self.src().get(1).copied()
    }

    /// View the current byte, incrementing the offset.
    pub fn take(&mut self) -> Result<u8> {
        let byte = self.peek().ok_or(Error::UnexpectedEnd)?;
        self.offset += 1;
        Ok(byte)
    }

    /// Increment the offset if the current byte equals the byte given.
    pub fn eat(&mut self, byte: u8) -> bool {
        let matches = self.peek() == Some(byte);
        self.offset += matches as usize;
        matches
    }

    /// Increment the offset if the remainder starts with the given slice.
    pub fn eat_slice(&mut self, slice: &[u8]) -> bool {
        let matches = self.src().starts_with(slice);
        self.offset += slice.len() * (matches as usize);
        matches
    }

    /// Like [`Cursor::eat`] but a mismatch is an error.
    pub fn expect(&mut self, byte: u8) -> Result<()> {
        match self.peek() {
            Some(b) if b == byte => {
                self.offset += 1;
                Ok(())
            }
            Some(_) => Err(Error::UnexpectedText),
            None => Err(Error::UnexpectedEnd),
        }
    }

    /// Consume a run of ascii digits. Nothing is consumed if there are none.
    pub fn decimal(&mut self) -> Result<Option<u64>> {
        let digits = self.src().iter().take_while(|b| b.is_ascii_digit()).count();
        if digits == 0 {
            return Ok(None);
        }

        let mut n = 0u64;
        for &digit in &self.src()[..digits] {
            n = n.checked_mul(10).ok_or(Error::Overflow)?;
            n = n.checked_add((digit - b'0') as u64).ok_or(Error::Overflow)?;
        }

        self.offset += digits;
        Ok(Some(n))
    }

    /// `<source-name> ::= <positive length number> <identifier>`
    pub fn len_prefixed_name(&mut self) -> Result<Option<String>> {
        let len = match self.decimal()? {
            Some(len) => usize::try_from(len).map_err(|_| Error::Overflow)?,
            None => return Ok(None),
        };

        if len == 0 {
            return Err(Error::UnexpectedText);
        }

        let ident = self.src().get(..len).ok_or(Error::UnexpectedEnd)?;
        let ident = std::str::from_utf8(ident).map_err(|_| Error::UnexpectedText)?;
        self.offset += len;
        Ok(Some(ident.to_string()))
    }

    /// `<seq-id> _`, the number of a substitution in base 36.
    ///
    /// `S_` refers to the first entry, `S0_` to the second, and so on.
    pub fn seq_id(&mut self) -> Result<usize> {
        if self.eat(b'_') {
            return Ok(0);
        }

        let mut n = 0usize;
        loop {
            let digit = match self.take()? {
                b'_' => break,
                c @ b'0'..=b'9' => c - b'0',
                c @ b'A'..=b'Z' => c - b'A' + 10,
                _ => return Err(Error::UnexpectedText),
            };

            n = n.checked_mul(36).ok_or(Error::Overflow)?;
            n = n.checked_add(digit as usize).ok_or(Error::Overflow)?;
        }

        n.checked_add(1).ok_or(Error::Overflow)
    }
}
