//! Mock UART implementation for testing

use core::cell::RefCell;
use embedded_io_async::{ErrorKind, ErrorType, Read, ReadReady, Write};
use std::collections::VecDeque;
use std::rc::Rc;
use std::vec::Vec;

#[derive(Debug, Default)]
struct State {
    tx_buffer: Vec<u8>,
    rx_buffer: VecDeque<u8>,
    fail_writes: usize,
}

/// Mock UART implementation
///
/// Provides in-memory buffers for transmit and receive data,
/// allowing unit tests to verify UART traffic without hardware.
///
/// `read` never blocks: with nothing buffered it returns `Ok(0)`. Drivers
/// check `read_ready()` before reading, as they would on hardware.
///
/// # Example
///
/// ```ignore
/// use click_drivers::platform::mock::MockUart;
///
/// let uart = MockUart::new();
/// let mut port = uart.clone();
///
/// port.write_all(b"sys get ver\r\n").await?;
/// assert_eq!(uart.tx_buffer(), b"sys get ver\r\n");
///
/// uart.inject_rx_data(b"RN2483 1.0.5\r\n");
/// ```
#[derive(Debug, Clone, Default)]
pub struct MockUart {
    state: Rc<RefCell<State>>,
}

impl MockUart {
    /// Create a new mock UART
    pub fn new() -> Self {
        Self::default()
    }

    /// Get transmitted data (for test verification)
    pub fn tx_buffer(&self) -> Vec<u8> {
        self.state.borrow().tx_buffer.clone()
    }

    /// Clear transmit buffer
    pub fn clear_tx_buffer(&self) {
        self.state.borrow_mut().tx_buffer.clear();
    }

    /// Inject data into receive buffer (simulates data arriving on RX)
    pub fn inject_rx_data(&self, data: &[u8]) {
        self.state
            .borrow_mut()
            .rx_buffer
            .extend(data.iter().copied());
    }

    /// Bytes received but not consumed yet
    pub fn rx_pending(&self) -> usize {
        self.state.borrow().rx_buffer.len()
    }

    /// Fail the next `count` writes
    pub fn fail_next_writes(&self, count: usize) {
        self.state.borrow_mut().fail_writes = count;
    }
}

impl ErrorType for MockUart {
    type Error = ErrorKind;
}

impl Read for MockUart {
    async fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        let mut state = self.state.borrow_mut();
        let mut count = 0;
        for slot in buf.iter_mut() {
            match state.rx_buffer.pop_front() {
                Some(byte) => {
                    *slot = byte;
                    count += 1;
                }
                None => break,
            }
        }
        Ok(count)
    }
}

impl ReadReady for MockUart {
    fn read_ready(&mut self) -> Result<bool, Self::Error> {
        Ok(!self.state.borrow().rx_buffer.is_empty())
    }
}

impl Write for MockUart {
    async fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        let mut state = self.state.borrow_mut();
        if state.fail_writes > 0 {
            state.fail_writes -= 1;
            return Err(ErrorKind::BrokenPipe);
        }
        state.tx_buffer.extend_from_slice(buf);
        Ok(buf.len())
    }

    async fn flush(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}
