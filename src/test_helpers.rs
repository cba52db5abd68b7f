//! Scripted modem for unit tests.
//!
//! `MockTransport` runs on a virtual millisecond clock: `delay` advances the
//! clock instantly, and injected bytes only become readable once the clock
//! has reached their arrival time. Every complete command line written by the
//! driver is matched against the head of the script; a match queues the
//! scripted reply.

use core::convert::Infallible;
use core::future::Future;
use std::collections::VecDeque;
use std::string::String;
use std::sync::Once;
use std::vec::Vec;

use embassy_time::{Duration, Instant};
use embedded_io_async::{ErrorType, Read, ReadReady, Write};
use env_logger::Env;

use crate::client::Client;
use crate::traits::Transport;

static INIT: Once = Once::new();

pub fn setup_logger() {
    INIT.call_once(|| {
        env_logger::Builder::from_env(Env::default().default_filter_or("info"))
            .is_test(true)
            .init();
    });
}

pub fn block_on<F: Future>(fut: F) -> F::Output {
    setup_logger();
    embassy_futures::block_on(fut)
}

struct Exchange {
    command: String,
    reply: Vec<u8>,
    delay_ms: u64,
}

#[derive(Default)]
pub struct MockTransport {
    now_ms: u64,
    rx: VecDeque<(u64, u8)>,
    script: VecDeque<Exchange>,
    line: Vec<u8>,
    commands: Vec<String>,
    writes: Vec<(u64, Vec<u8>)>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reply with `reply` as soon as `command` has been written.
    pub fn expect(&mut self, command: &str, reply: &[u8]) -> &mut Self {
        self.expect_delayed(command, reply, 0)
    }

    pub fn expect_delayed(&mut self, command: &str, reply: &[u8], delay_ms: u64) -> &mut Self {
        self.script.push_back(Exchange {
            command: command.into(),
            reply: reply.to_vec(),
            delay_ms,
        });
        self
    }

    /// Bytes readable right away.
    pub fn inject(&mut self, bytes: &[u8]) -> &mut Self {
        let now = self.now_ms;
        self.inject_at(now, bytes)
    }

    /// Bytes readable once the clock reaches `at_ms`.
    pub fn inject_at(&mut self, at_ms: u64, bytes: &[u8]) -> &mut Self {
        self.rx.extend(bytes.iter().map(|b| (at_ms, *b)));
        self
    }

    pub fn now_ms(&self) -> u64 {
        self.now_ms
    }

    pub fn advance(&mut self, ms: u64) {
        self.now_ms += ms;
    }

    /// Bytes queued but not yet read by the driver, regardless of arrival
    /// time.
    pub fn pending(&self) -> usize {
        self.rx.len()
    }

    /// Command lines written so far, without line terminators.
    pub fn commands(&self) -> &[String] {
        &self.commands
    }

    /// Every write call with the virtual time it happened at.
    pub fn writes(&self) -> &[(u64, Vec<u8>)] {
        &self.writes
    }

    pub fn written(&self) -> Vec<u8> {
        self.writes.iter().flat_map(|(_, w)| w.iter().copied()).collect()
    }

    pub fn script_done(&self) -> bool {
        self.script.is_empty()
    }

    fn on_command(&mut self, command: String) {
        if self
            .script
            .front()
            .map(|e| e.command == command)
            .unwrap_or(false)
        {
            let exchange = self.script.pop_front().unwrap();
            let at = self.now_ms + exchange.delay_ms;
            self.inject_at(at, &exchange.reply);
        }
        self.commands.push(command);
    }
}

impl ErrorType for MockTransport {
    type Error = Infallible;
}

impl Read for MockTransport {
    async fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        let mut n = 0;
        while n < buf.len() {
            match self.rx.front() {
                Some((at, byte)) if *at <= self.now_ms => {
                    buf[n] = *byte;
                    n += 1;
                    self.rx.pop_front();
                }
                _ => break,
            }
        }
        Ok(n)
    }
}

impl ReadReady for MockTransport {
    fn read_ready(&mut self) -> Result<bool, Self::Error> {
        Ok(self
            .rx
            .front()
            .map(|(at, _)| *at <= self.now_ms)
            .unwrap_or(false))
    }
}

impl Write for MockTransport {
    async fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        self.writes.push((self.now_ms, buf.to_vec()));
        self.line.extend_from_slice(buf);

        while let Some(pos) = self.line.windows(2).position(|w| w == b"\r\n") {
            let line: Vec<u8> = self.line.drain(..pos + 2).collect();
            let command = String::from_utf8_lossy(&line[..pos]).into_owned();
            self.on_command(command);
        }

        // The escape sequence is never followed by a line terminator.
        if self.line == b"+++" {
            self.line.clear();
            self.on_command("+++".into());
        }

        Ok(buf.len())
    }

    async fn flush(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

impl Transport for MockTransport {
    fn now(&mut self) -> Instant {
        Instant::from_millis(self.now_ms)
    }

    async fn delay(&mut self, duration: Duration) {
        self.now_ms += duration.as_millis();
    }
}

pub fn client(transport: MockTransport) -> Client<MockTransport> {
    Client::new(transport)
}
