use embassy_time::{Duration, Instant, Timer};
use embedded_io_async::{ErrorType, Read, ReadReady, Write};

/// Byte channel to the modem, plus the clock the driver measures deadlines
/// against.
///
/// `read_ready` must not block: it reports whether at least one byte can be
/// read right now.
#[allow(async_fn_in_trait)]
pub trait Transport: Read + Write + ReadReady {
    fn now(&mut self) -> Instant;

    async fn delay(&mut self, duration: Duration);
}

/// Binds any embedded-io serial port to the embassy-time global time driver.
pub struct TimedTransport<T> {
    inner: T,
}

impl<T> TimedTransport<T> {
    pub fn new(inner: T) -> Self {
        Self { inner }
    }

    pub fn release(self) -> T {
        self.inner
    }
}

impl<T: ErrorType> ErrorType for TimedTransport<T> {
    type Error = T::Error;
}

impl<T: Read> Read for TimedTransport<T> {
    async fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        self.inner.read(buf).await
    }
}

impl<T: Write> Write for TimedTransport<T> {
    async fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        self.inner.write(buf).await
    }

    async fn flush(&mut self) -> Result<(), Self::Error> {
        self.inner.flush().await
    }
}

impl<T: ReadReady> ReadReady for TimedTransport<T> {
    fn read_ready(&mut self) -> Result<bool, Self::Error> {
        self.inner.read_ready()
    }
}

impl<T: Read + Write + ReadReady> Transport for TimedTransport<T> {
    fn now(&mut self) -> Instant {
        Instant::now()
    }

    async fn delay(&mut self, duration: Duration) {
        Timer::after(duration).await
    }
}
