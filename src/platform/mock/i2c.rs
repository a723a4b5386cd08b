//! Mock I2C implementation for testing

use core::cell::RefCell;
use embedded_hal::i2c::{ErrorKind, ErrorType, NoAcknowledgeSource, Operation};
use embedded_hal_async::i2c::I2c;
use std::collections::VecDeque;
use std::rc::Rc;
use std::vec::Vec;

/// I2C transaction type for logging
///
/// Adjacent operations of the same kind are merged, matching the bus
/// semantics of `embedded_hal::i2c::I2c::transaction`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum I2cTransaction {
    /// Write transaction
    Write { addr: u8, data: Vec<u8> },
    /// Read transaction
    Read { addr: u8, len: usize },
    /// Write-Read transaction (repeated START)
    WriteRead {
        addr: u8,
        write_data: Vec<u8>,
        read_len: usize,
    },
}

#[derive(Debug, Default)]
struct State {
    transactions: Vec<I2cTransaction>,
    read_data: VecDeque<u8>,
    nack_count: usize,
    nack_reads: usize,
}

/// Mock I2C implementation
///
/// Records all transactions for test verification and serves
/// pre-programmed read data. Reads past the scripted data return zeros.
#[derive(Debug, Clone, Default)]
pub struct MockI2c {
    state: Rc<RefCell<State>>,
}

impl MockI2c {
    /// Create a new mock I2C
    pub fn new() -> Self {
        Self::default()
    }

    /// Get transaction log (for test verification)
    pub fn transactions(&self) -> Vec<I2cTransaction> {
        self.state.borrow().transactions.clone()
    }

    /// Get the payload of every write (plain writes and the write half of
    /// write-read transactions), in order
    pub fn written(&self) -> Vec<Vec<u8>> {
        self.state
            .borrow()
            .transactions
            .iter()
            .filter_map(|t| match t {
                I2cTransaction::Write { data, .. } => Some(data.clone()),
                I2cTransaction::WriteRead { write_data, .. } => Some(write_data.clone()),
                I2cTransaction::Read { .. } => None,
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

    /// Number of scripted bytes not read yet
    pub fn pending_read_data(&self) -> usize {
        self.state.borrow().read_data.len()
    }

    /// NACK the next `count` transactions
    pub fn nack_next(&self, count: usize) {
        self.state.borrow_mut().nack_count = count;
    }

    /// NACK the next `count` transactions that start with a read
    ///
    /// Models a device that accepts a command and then NACKs its address
    /// while it is busy producing the answer.
    pub fn nack_next_reads(&self, count: usize) {
        self.state.borrow_mut().nack_reads = count;
    }
}

enum Segment {
    Write(Vec<u8>),
    Read(usize),
}

impl ErrorType for MockI2c {
    type Error = ErrorKind;
}

impl I2c for MockI2c {
    async fn transaction(
        &mut self,
        address: u8,
        operations: &mut [Operation<'_>],
    ) -> Result<(), Self::Error> {
        let mut state = self.state.borrow_mut();

        if state.nack_count > 0 {
            state.nack_count -= 1;
            return Err(ErrorKind::NoAcknowledge(NoAcknowledgeSource::Address));
        }

        if state.nack_reads > 0 && matches!(operations.first(), Some(Operation::Read(_))) {
            state.nack_reads -= 1;
            return Err(ErrorKind::NoAcknowledge(NoAcknowledgeSource::Address));
        }

        let mut segments: Vec<Segment> = Vec::new();
        for op in operations.iter_mut() {
            match op {
                Operation::Write(data) => match segments.last_mut() {
                    Some(Segment::Write(acc)) => acc.extend_from_slice(data),
                    _ => segments.push(Segment::Write(data.to_vec())),
                },
                Operation::Read(buffer) => {
                    for byte in buffer.iter_mut() {
                        *byte = state.read_data.pop_front().unwrap_or(0);
                    }
                    match segments.last_mut() {
                        Some(Segment::Read(len)) => *len += buffer.len(),
                        _ => segments.push(Segment::Read(buffer.len())),
                    }
                }
            }
        }

        if let [Segment::Write(w), Segment::Read(len)] = segments.as_slice() {
            let entry = I2cTransaction::WriteRead {
                addr: address,
                write_data: w.clone(),
                read_len: *len,
            };
            state.transactions.push(entry);
            return Ok(());
        }

        for segment in segments {
            let entry = match segment {
                Segment::Write(data) => I2cTransaction::Write {
                    addr: address,
                    data,
                },
                Segment::Read(len) => I2cTransaction::Read { addr: address, len },
            };
            state.transactions.push(entry);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_i2c_write() {
        let mut i2c = MockI2c::new();
        i2c.write(0x50, &[0x01, 0x02, 0x03]).await.unwrap();

        let transactions = i2c.transactions();
        assert_eq!(transactions.len(), 1);
        assert_eq!(
            transactions[0],
            I2cTransaction::Write {
                addr: 0x50,
                data: vec![0x01, 0x02, 0x03]
            }
        );
    }

    #[tokio::test]
    async fn test_mock_i2c_read() {
        let mut i2c = MockI2c::new();
        i2c.set_read_data(&[0xAA, 0xBB, 0xCC]);

        let mut buffer = [0u8; 3];
        i2c.read(0x51, &mut buffer).await.unwrap();

        assert_eq!(buffer, [0xAA, 0xBB, 0xCC]);
        assert_eq!(i2c.transactions()[0], I2cTransaction::Read { addr: 0x51, len: 3 });
    }

    #[tokio::test]
    async fn test_mock_i2c_write_read() {
        let mut i2c = MockI2c::new();
        i2c.set_read_data(&[0x12, 0x34]);

        let mut read_buf = [0u8; 2];
        i2c.write_read(0x52, &[0xA0], &mut read_buf).await.unwrap();

        assert_eq!(read_buf, [0x12, 0x34]);
        assert_eq!(
            i2c.transactions()[0],
            I2cTransaction::WriteRead {
                addr: 0x52,
                write_data: vec![0xA0],
                read_len: 2
            }
        );
    }

    #[tokio::test]
    async fn test_mock_i2c_merges_adjacent_writes() {
        let mut i2c = MockI2c::new();
        i2c.transaction(
            0x30,
            &mut [Operation::Write(&[0x1B]), Operation::Write(&[0x01, 0x02])],
        )
        .await
        .unwrap();

        assert_eq!(i2c.written(), vec![vec![0x1B, 0x01, 0x02]]);
    }

    #[tokio::test]
    async fn test_mock_i2c_nack_then_recover() {
        let mut i2c = MockI2c::new();
        i2c.nack_next(1);

        assert!(i2c.write(0x48, &[0x00]).await.is_err());
        assert!(i2c.write(0x48, &[0x00]).await.is_ok());
        assert_eq!(i2c.transactions().len(), 1);
    }

    #[tokio::test]
    async fn test_mock_i2c_nack_reads_only() {
        let mut i2c = MockI2c::new();
        i2c.nack_next_reads(1);

        assert!(i2c.write(0x48, &[0x00]).await.is_ok());
        let mut buf = [0u8; 1];
        assert!(i2c.read(0x48, &mut buf).await.is_err());
        assert!(i2c.read(0x48, &mut buf).await.is_ok());
    }

    #[tokio::test]
    async fn test_mock_i2c_clones_share_state() {
        let i2c = MockI2c::new();
        let mut handle = i2c.clone();
        i2c.push_read_data(&[0x42]);

        let mut buf = [0u8; 1];
        handle.read(0x20, &mut buf).await.unwrap();

        assert_eq!(buf[0], 0x42);
        assert_eq!(i2c.pending_read_data(), 0);
        assert_eq!(i2c.transactions().len(), 1);
    }
}
