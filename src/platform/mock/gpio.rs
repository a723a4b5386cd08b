//! Mock GPIO implementation for testing

use core::cell::RefCell;
use core::convert::Infallible;
use embedded_hal::digital::{ErrorType, InputPin, OutputPin};
use std::rc::Rc;
use std::vec::Vec;

#[derive(Debug, Default)]
struct PinState {
    high: bool,
    history: Vec<bool>,
}

/// Mock GPIO pin
///
/// Works as an output (records every level driven) and as an input (returns
/// the level set by the test through `set_input_state`).
#[derive(Debug, Clone, Default)]
pub struct MockPin {
    state: Rc<RefCell<PinState>>,
}

impl MockPin {
    /// Create a new mock pin, initially low
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the input state (for simulating input pin reads)
    pub fn set_input_state(&self, high: bool) {
        self.state.borrow_mut().high = high;
    }

    /// Current pin level
    pub fn is_set_high(&self) -> bool {
        self.state.borrow().high
    }

    /// Every level driven through `OutputPin`, oldest first
    pub fn history(&self) -> Vec<bool> {
        self.state.borrow().history.clone()
    }
}

impl ErrorType for MockPin {
    type Error = Infallible;
}

impl OutputPin for MockPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        let mut state = self.state.borrow_mut();
        state.high = false;
        state.history.push(false);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        let mut state = self.state.borrow_mut();
        state.high = true;
        state.history.push(true);
        Ok(())
    }
}

impl InputPin for MockPin {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        Ok(self.state.borrow().high)
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        Ok(!self.state.borrow().high)
    }
}
