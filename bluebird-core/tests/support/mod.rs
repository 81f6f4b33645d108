#![allow(dead_code)]

use std::collections::VecDeque;

use bluebird_core::utils::{
    connection::http::{HttpRequest, HttpResponse, HttpTransport, Method, TransportError},
    schedule::WallClock,
};
use embedded_hal::delay::DelayNs;
use embedded_hal_mock::eh1::i2c::Transaction as I2cTrans;
use rand_core::RngCore;

/// Default I2C address for the PCA9685 board.
pub const PWM_ADDRESS: u8 = 0x40;

/// Create a write transaction for the given I2C address and data payload.
pub fn write(
    addr: u8,
    data: Vec<u8>,
) -> I2cTrans {
    I2cTrans::write(addr, data)
}

/// Register write for one PCA9685 output with the pulse starting at tick 0.
pub fn channel_write(
    channel: u8,
    off: u16,
) -> I2cTrans {
    let reg = 0x06 + 4 * channel;
    write(
        PWM_ADDRESS,
        vec![reg, 0x00, 0x00, (off & 0xFF) as u8, (off >> 8) as u8],
    )
}

/// Enable, sleep, prescale 121 (50 Hz), wake.
pub fn configure_transactions() -> Vec<I2cTrans> {
    vec![
        write(PWM_ADDRESS, vec![0x00, 0x01]),
        write(PWM_ADDRESS, vec![0x00, 0x11]),
        write(PWM_ADDRESS, vec![0xFE, 121]),
        write(PWM_ADDRESS, vec![0x00, 0x01]),
    ]
}

/// Delay that only remembers what it was asked to wait, in milliseconds.
#[derive(Default)]
pub struct RecordingDelay {
    pub waits_ms: Vec<u32>,
}

impl DelayNs for RecordingDelay {
    fn delay_ns(
        &mut self,
        ns: u32,
    ) {
        self.waits_ms.push(ns / 1_000_000);
    }

    fn delay_ms(
        &mut self,
        ms: u32,
    ) {
        self.waits_ms.push(ms);
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedRequest {
    pub method: Method,
    pub url: String,
    pub bearer: Option<String>,
    pub body: Option<String>,
}

/// Transport answering from a queue of canned responses.
pub struct ScriptedTransport {
    pub connected: bool,
    pub responses: VecDeque<Result<HttpResponse, TransportError>>,
    pub requests: Vec<RecordedRequest>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self {
            connected: true,
            responses: VecDeque::new(),
            requests: Vec::new(),
        }
    }

    pub fn respond(
        mut self,
        status: u16,
        body: &str,
    ) -> Self {
        self.responses.push_back(Ok(HttpResponse {
            status,
            body: body.to_string(),
        }));
        self
    }

    pub fn fail(
        mut self,
        error: TransportError,
    ) -> Self {
        self.responses.push_back(Err(error));
        self
    }

    pub fn offline(mut self) -> Self {
        self.connected = false;
        self
    }
}

impl HttpTransport for ScriptedTransport {
    fn is_connected(&self) -> bool {
        self.connected
    }

    async fn send(
        &mut self,
        request: &HttpRequest<'_>,
    ) -> Result<HttpResponse, TransportError> {
        self.requests.push(RecordedRequest {
            method: request.method,
            url: request.url.to_string(),
            bearer: request.bearer.map(str::to_string),
            body: request.body.map(str::to_string),
        });
        self.responses
            .pop_front()
            .unwrap_or(Err(TransportError::Io))
    }
}

/// Clock stuck at one instant.
pub struct FixedClock(pub Option<i64>);

impl WallClock for FixedClock {
    fn epoch_secs(&self) -> Option<i64> {
        self.0
    }
}

/// Hands out a fixed sequence of `u32` values, repeating the last one.
pub struct SequenceRng {
    values: Vec<u32>,
    next: usize,
}

impl SequenceRng {
    pub fn new(values: &[u32]) -> Self {
        Self {
            values: values.to_vec(),
            next: 0,
        }
    }
}

impl RngCore for SequenceRng {
    fn next_u32(&mut self) -> u32 {
        let i = self.next.min(self.values.len() - 1);
        self.next += 1;
        self.values[i]
    }

    fn next_u64(&mut self) -> u64 {
        self.next_u32() as u64
    }

    fn fill_bytes(
        &mut self,
        dst: &mut [u8],
    ) {
        for chunk in dst.chunks_mut(4) {
            let bytes = self.next_u32().to_le_bytes();
            chunk.copy_from_slice(&bytes[..chunk.len()]);
        }
    }
}
