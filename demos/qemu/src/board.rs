//! Virtual board for QEMU: LEDs and buttons as `embedded-hal` pins.
//!
//! LED changes are logged. Buttons follow a fixed press pattern on the tick
//! counter so the tasks have something to react to.

use core::{
    convert::Infallible,
    sync::atomic::{AtomicBool, Ordering},
};

use embedded_hal::digital::{ErrorType, InputPin, OutputPin, StatefulOutputPin};
use log::info;

pub struct Led {
    name: &'static str,
    lit: AtomicBool,
}

impl Led {
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            lit: AtomicBool::new(false),
        }
    }

    fn set(&self, lit: bool) {
        if self.lit.swap(lit, Ordering::Relaxed) != lit {
            info!("{} LED {}", self.name, if lit { "on" } else { "off" });
        }
    }
}

impl ErrorType for &Led {
    type Error = Infallible;
}

impl OutputPin for &Led {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.set(false);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.set(true);
        Ok(())
    }
}

impl StatefulOutputPin for &Led {
    fn is_set_high(&mut self) -> Result<bool, Self::Error> {
        Ok(self.lit.load(Ordering::Relaxed))
    }

    fn is_set_low(&mut self) -> Result<bool, Self::Error> {
        Ok(!self.lit.load(Ordering::Relaxed))
    }
}

/// Button held down for `held` ticks out of every `every` ticks, starting at `offset`.
pub struct Button {
    every: u64,
    held: u64,
    offset: u64,
}

impl Button {
    pub const fn new(every: u64, held: u64, offset: u64) -> Self {
        Self {
            every,
            held,
            offset,
        }
    }
}

impl ErrorType for &Button {
    type Error = Infallible;
}

impl InputPin for &Button {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        let now = rondo::timer::current_tick().unwrap_or(0);
        Ok(now >= self.offset && (now - self.offset) % self.every < self.held)
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        Ok(!self.is_high()?)
    }
}

pub static LED_GREEN: Led = Led::new("green");
pub static LED_BLUE: Led = Led::new("blue");
pub static LED_YELLOW: Led = Led::new("yellow");
pub static LED_RED: Led = Led::new("red");

pub static BUTTON_TEST: Button = Button::new(3000, 700, 1200);
pub static BUTTON_CHANGE: Button = Button::new(2000, 100, 500);
