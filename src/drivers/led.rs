//! Board LED

use embassy_nrf::gpio::{Level, Output, OutputDrive, Pin};
use embassy_nrf::Peri;

/// Which output level lights the LED
#[derive(Debug, Clone, Copy, PartialEq, Eq, defmt::Format)]
pub enum Polarity {
    ActiveHigh,
    /// nRF52840-DK LEDs sink current into the pin
    ActiveLow,
}

pub struct Led {
    pin: Output<'static>,
    polarity: Polarity,
}

impl Led {
    /// Configure `pin` as an LED output, initially off
    pub fn new(pin: Peri<'static, impl Pin>, polarity: Polarity) -> Self {
        let off = match polarity {
            Polarity::ActiveHigh => Level::Low,
            Polarity::ActiveLow => Level::High,
        };
        Self {
            pin: Output::new(pin, off, OutputDrive::Standard),
            polarity,
        }
    }

    pub fn on(&mut self) {
        match self.polarity {
            Polarity::ActiveHigh => self.pin.set_high(),
            Polarity::ActiveLow => self.pin.set_low(),
        }
    }

    pub fn off(&mut self) {
        match self.polarity {
            Polarity::ActiveHigh => self.pin.set_low(),
            Polarity::ActiveLow => self.pin.set_high(),
        }
    }

    pub fn toggle(&mut self) {
        self.pin.toggle();
    }

    pub fn is_on(&self) -> bool {
        match self.polarity {
            Polarity::ActiveHigh => self.pin.is_set_high(),
            Polarity::ActiveLow => self.pin.is_set_low(),
        }
    }
}
