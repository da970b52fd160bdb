use std::io::{self, Read};

/// Chunk size used when a reader-backed bulk read has to grow its buffer.
const BULK_CHUNK: usize = 64 * 1024;

/// A byte source the decoder pulls from.
///
/// Short reads signal end of input; the decoder turns them into `Truncated` errors.
pub trait Source {
    /// Fill as much of `buf` as possible, returning the number of bytes written. Fewer than
    /// `buf.len()` bytes means the input is exhausted.
    ///
    /// # Errors
    ///
    /// Propagates I/O failures of the underlying reader.
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize>;

    /// Append up to `n` bytes to `out`, returning how many were appended.
    ///
    /// # Errors
    ///
    /// Propagates I/O failures of the underlying reader.
    fn read_bulk(&mut self, n: usize, out: &mut Vec<u8>) -> io::Result<usize>;

    /// Number of bytes consumed so far, if the source tracks it.
    fn position(&self) -> Option<u64> {
        None
    }
}

/// A position-aware source over an in-memory buffer.
#[derive(Debug, Clone)]
pub struct SliceSource<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> SliceSource<'a> {
    /// Start reading at the beginning of `data`.
    #[must_use]
    pub const fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Bytes not yet consumed.
    #[must_use]
    pub fn remaining(&self) -> &'a [u8] {
        &self.data[self.pos..]
    }

    fn take(&mut self, n: usize) -> &'a [u8] {
        let rest = self.remaining();
        let chunk = &rest[..n.min(rest.len())];
        self.pos += chunk.len();
        chunk
    }
}

impl Source for SliceSource<'_> {
    #[inline]
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let chunk = self.take(buf.len());
        buf[..chunk.len()].copy_from_slice(chunk);
        Ok(chunk.len())
    }

    fn read_bulk(&mut self, n: usize, out: &mut Vec<u8>) -> io::Result<usize> {
        let chunk = self.take(n);
        out.try_reserve_exact(chunk.len())
            .map_err(|_| io::Error::from(io::ErrorKind::OutOfMemory))?;
        out.extend_from_slice(chunk);
        Ok(chunk.len())
    }

    #[inline]
    fn position(&self) -> Option<u64> {
        Some(self.pos as u64)
    }
}

/// A source over any [`io::Read`].
///
/// Only reports a position when constructed with [`ReadSource::with_position`].
#[derive(Debug)]
pub struct ReadSource<R> {
    inner: R,
    pos: Option<u64>,
}

impl<R: Read> ReadSource<R> {
    /// Wrap a reader that cannot report its position.
    pub const fn new(inner: R) -> Self {
        Self { inner, pos: None }
    }

    /// Wrap a reader whose next byte is at offset `start`, counting consumed bytes from there.
    pub const fn with_position(inner: R, start: u64) -> Self {
        Self {
            inner,
            pos: Some(start),
        }
    }

    /// Unwrap the reader.
    pub fn into_inner(self) -> R {
        self.inner
    }

    fn advance(&mut self, n: usize) {
        if let Some(pos) = self.pos.as_mut() {
            *pos += n as u64;
        }
    }
}

impl<R: Read> Source for ReadSource<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let mut filled = 0;
        while filled < buf.len() {
            match self.inner.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => {
                    self.advance(filled);
                    return Err(e);
                }
            }
        }
        self.advance(filled);
        Ok(filled)
    }

    fn read_bulk(&mut self, n: usize, out: &mut Vec<u8>) -> io::Result<usize> {
        let start = out.len();
        let mut want = n;
        while want > 0 {
            let chunk = want.min(BULK_CHUNK);
            out.try_reserve(chunk)
                .map_err(|_| io::Error::from(io::ErrorKind::OutOfMemory))?;
            let got = (&mut self.inner).take(chunk as u64).read_to_end(out);
            let got = match got {
                Ok(got) => got,
                Err(e) => {
                    self.advance(out.len() - start);
                    return Err(e);
                }
            };
            want -= got;
            if got < chunk {
                break;
            }
        }
        let appended = out.len() - start;
        self.advance(appended);
        Ok(appended)
    }

    fn position(&self) -> Option<u64> {
        self.pos
    }
}

impl<S: Source + ?Sized> Source for &mut S {
    #[inline]
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        (**self).read(buf)
    }

    #[inline]
    fn read_bulk(&mut self, n: usize, out: &mut Vec<u8>) -> io::Result<usize> {
        (**self).read_bulk(n, out)
    }

    #[inline]
    fn position(&self) -> Option<u64> {
        (**self).position()
    }
}
