use embassy_time::Duration;
use heapless::Vec;

use crate::error::Error;
use crate::traits::Transport;

/// Capacity of the response frame buffer.
pub const INGRESS_BUF_SIZE: usize = 2048;

/// Accumulates modem output into a single frame until a caller supplied
/// terminal condition holds or a deadline passes.
pub(crate) struct Ingress {
    buf: Vec<u8, INGRESS_BUF_SIZE>,
}

impl Ingress {
    pub(crate) const fn new() -> Self {
        Self { buf: Vec::new() }
    }

    pub(crate) fn frame(&self) -> &[u8] {
        &self.buf
    }

    pub(crate) fn clear(&mut self) {
        self.buf.clear();
    }

    /// Throw away whatever is already waiting on the line.
    pub(crate) async fn drain<T: Transport>(&mut self, transport: &mut T) -> Result<usize, Error> {
        let mut scratch = [0u8; 64];
        let mut discarded = 0;
        while transport.read_ready().map_err(Error::from_io)? {
            match transport.read(&mut scratch).await.map_err(Error::from_io)? {
                0 => break,
                n => discarded += n,
            }
        }
        Ok(discarded)
    }

    /// Append incoming bytes to the frame, testing `is_terminal` after every
    /// byte.
    ///
    /// Returns `Ok(true)` when the condition matched and `Ok(false)` when the
    /// deadline passed first. Bytes received up to that point stay in the
    /// frame either way.
    pub(crate) async fn read_until<T, F>(
        &mut self,
        transport: &mut T,
        timeout: Duration,
        poll_interval: Duration,
        mut is_terminal: F,
    ) -> Result<bool, Error>
    where
        T: Transport,
        F: FnMut(&[u8]) -> bool,
    {
        let deadline = transport.now() + timeout;

        loop {
            while transport.read_ready().map_err(Error::from_io)? {
                let mut byte = [0u8; 1];
                if transport.read(&mut byte).await.map_err(Error::from_io)? == 0 {
                    break;
                }

                self.buf.push(byte[0]).map_err(|_| Error::Overflow)?;

                if is_terminal(&self.buf) {
                    return Ok(true);
                }
            }

            if transport.now() >= deadline {
                return Ok(false);
            }

            transport.delay(poll_interval).await;
        }
    }
}
