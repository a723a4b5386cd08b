//! Fixed configuration sequences
//!
//! A `default_config()` is a list of register writes, read-modify-writes and
//! settle delays. `apply` runs the list in order and returns the first error,
//! leaving the remaining steps unexecuted.

use super::RegisterInterface;
use crate::core::time::delay_ms;
use crate::platform::Result;

/// One step of a configuration sequence
///
/// `A` is the register address type and `V` the register value type, so the
/// same sequence shape serves 8-bit register files and 16-bit ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step<A = u8, V = u8> {
    /// Write `value` to the register
    Write(A, V),
    /// Replace the bits selected by `mask`
    Update { reg: A, mask: V, value: V },
    /// Wait for the chip to settle
    DelayMs(u32),
}

/// Something a configuration sequence can be applied to
#[allow(async_fn_in_trait)]
pub trait ConfigureTarget<A, V> {
    /// Execute a `Step::Write`
    async fn write_step(&mut self, reg: A, value: V) -> Result<()>;

    /// Execute a `Step::Update`
    async fn update_step(&mut self, reg: A, mask: V, value: V) -> Result<()>;
}

impl<T> ConfigureTarget<u8, u8> for T
where
    T: RegisterInterface,
{
    async fn write_step(&mut self, reg: u8, value: u8) -> Result<()> {
        self.write_register(reg, value).await
    }

    async fn update_step(&mut self, reg: u8, mask: u8, value: u8) -> Result<()> {
        self.update_register(reg, mask, value).await
    }
}

/// Run `steps` in order, stopping at the first failure
pub async fn apply<T, A, V>(target: &mut T, steps: &[Step<A, V>]) -> Result<()>
where
    T: ConfigureTarget<A, V>,
    A: Copy,
    V: Copy,
{
    for (_index, step) in steps.iter().enumerate() {
        let result = match *step {
            Step::Write(reg, value) => target.write_step(reg, value).await,
            Step::Update { reg, mask, value } => target.update_step(reg, mask, value).await,
            Step::DelayMs(ms) => {
                delay_ms(ms).await;
                Ok(())
            }
        };

        if let Err(e) = result {
            crate::log_warn!("Configure sequence stopped at step {}", _index);
            return Err(e);
        }
    }

    Ok(())
}
