//! Mock SPI implementation for testing

use core::cell::RefCell;
use embedded_hal::spi::{ErrorKind, ErrorType, Operation};
use embedded_hal_async::spi::SpiDevice;
use std::collections::VecDeque;
use std::rc::Rc;
use std::vec::Vec;

/// SPI operation type for logging
///
/// One `SpiDevice::transaction` call (one chip-select assertion) is logged
/// as one `Vec<SpiOperation>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpiOperation {
    /// Transfer (full-duplex)
    Transfer { write: Vec<u8>, read: Vec<u8> },
    /// Write only
    Write { data: Vec<u8> },
    /// Read only
    Read { len: usize },
    /// Delay inside the transaction
    Delay { ns: u32 },
}

#[derive(Debug, Default)]
struct State {
    transactions: Vec<Vec<SpiOperation>>,
    read_data: VecDeque<u8>,
    fail_count: usize,
}

/// Mock SPI device implementation
///
/// Records all transactions for test verification and serves
/// pre-programmed read data. Reads past the scripted data return zeros.
#[derive(Debug, Clone, Default)]
pub struct MockSpi {
    state: Rc<RefCell<State>>,
}

impl MockSpi {
    /// Create a new mock SPI device
    pub fn new() -> Self {
        Self::default()
    }

    /// Get transaction log (for test verification)
    pub fn transactions(&self) -> Vec<Vec<SpiOperation>> {
        self.state.borrow().transactions.clone()
    }

    /// Bytes clocked out by the host in each transaction, excluding the
    /// dummy bytes of read-only operations
    pub fn written_frames(&self) -> Vec<Vec<u8>> {
        self.state
            .borrow()
            .transactions
            .iter()
            .map(|ops| {
                let mut frame = Vec::new();
                for op in ops {
                    match op {
                        SpiOperation::Write { data } => frame.extend_from_slice(data),
                        SpiOperation::Transfer { write, .. } => frame.extend_from_slice(write),
                        SpiOperation::Read { .. } | SpiOperation::Delay { .. } => {}
                    }
                }
                frame
            })
            .collect()
    }

    /// Clear transaction log
    pub fn clear_transactions(&self) {
        self.state.borrow_mut().transactions.clear();
    }

    /// Replace the data returned by read operations
    pub fn set_read_data(&self, data: &[u8]) {
        let mut state = self.state.borrow_mut();
        state.read_data.clear();
        state.read_data.extend(data.iter().copied());
    }

    /// Append data returned by read operations
    pub fn push_read_data(&self, data: &[u8]) {
        self.state.borrow_mut().read_data.extend(data.iter().copied());
    }

    /// Fail the next `count` transactions
    pub fn fail_next(&self, count: usize) {
        self.state.borrow_mut().fail_count = count;
    }
}

impl ErrorType for MockSpi {
    type Error = ErrorKind;
}

impl SpiDevice for MockSpi {
    async fn transaction(
        &mut self,
        operations: &mut [Operation<'_, u8>],
    ) -> Result<(), Self::Error> {
        let mut state = self.state.borrow_mut();

        if state.fail_count > 0 {
            state.fail_count -= 1;
            return Err(ErrorKind::Other);
        }

        let mut log = Vec::with_capacity(operations.len());
        for op in operations.iter_mut() {
            match op {
                Operation::Write(data) => log.push(SpiOperation::Write {
                    data: data.to_vec(),
                }),
                Operation::Read(buffer) => {
                    for byte in buffer.iter_mut() {
                        *byte = state.read_data.pop_front().unwrap_or(0);
                    }
                    log.push(SpiOperation::Read { len: buffer.len() });
                }
                Operation::Transfer(read, write) => {
                    for byte in read.iter_mut() {
                        *byte = state.read_data.pop_front().unwrap_or(0);
                    }
                    log.push(SpiOperation::Transfer {
                        write: write.to_vec(),
                        read: read.to_vec(),
                    });
                }
                Operation::TransferInPlace(buffer) => {
                    let write = buffer.to_vec();
                    for byte in buffer.iter_mut() {
                        *byte = state.read_data.pop_front().unwrap_or(0);
                    }
                    log.push(SpiOperation::Transfer {
                        write,
                        read: buffer.to_vec(),
                    });
                }
                Operation::DelayNs(ns) => log.push(SpiOperation::Delay { ns: *ns }),
            }
        }
        state.transactions.push(log);

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_spi_write() {
        let mut spi = MockSpi::new();
        spi.write(&[0x01, 0x02, 0x03]).await.unwrap();

        let transactions = spi.transactions();
        assert_eq!(transactions.len(), 1);
        assert_eq!(
            transactions[0],
            vec![SpiOperation::Write {
                data: vec![0x01, 0x02, 0x03]
            }]
        );
    }

    #[tokio::test]
    async fn test_mock_spi_read() {
        let mut spi = MockSpi::new();
        spi.set_read_data(&[0xAA, 0xBB, 0xCC]);

        let mut buffer = [0u8; 3];
        spi.read(&mut buffer).await.unwrap();

        assert_eq!(buffer, [0xAA, 0xBB, 0xCC]);
        assert_eq!(spi.transactions()[0], vec![SpiOperation::Read { len: 3 }]);
    }

    #[tokio::test]
    async fn test_mock_spi_transfer_in_place() {
        let mut spi = MockSpi::new();
        spi.set_read_data(&[0x12, 0x34]);

        let mut buf = [0xA0, 0xB0];
        spi.transfer_in_place(&mut buf).await.unwrap();

        assert_eq!(buf, [0x12, 0x34]);
        assert_eq!(spi.written_frames(), vec![vec![0xA0, 0xB0]]);
    }

    #[tokio::test]
    async fn test_mock_spi_command_then_read_is_one_frame() {
        let mut spi = MockSpi::new();
        spi.set_read_data(&[0x55]);

        let mut buf = [0u8; 1];
        spi.transaction(&mut [Operation::Write(&[0x05]), Operation::Read(&mut buf)])
            .await
            .unwrap();

        assert_eq!(buf[0], 0x55);
        assert_eq!(spi.transactions().len(), 1);
        assert_eq!(spi.written_frames(), vec![vec![0x05]]);
    }

    #[tokio::test]
    async fn test_mock_spi_fail_next() {
        let mut spi = MockSpi::new();
        spi.fail_next(1);

        assert_eq!(spi.write(&[0x00]).await, Err(ErrorKind::Other));
        assert!(spi.write(&[0x00]).await.is_ok());
    }
}
