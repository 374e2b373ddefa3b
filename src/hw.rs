//! Hardware digital-input facility.
//!
//! One process-wide [`HwInterface`] is built at startup and handed by
//! reference to whoever needs a pin; nothing here touches global hardware
//! state ad hoc. Arming a channel that is already armed is a soft conflict:
//! the new callback is appended to the channel's list and every callback on
//! the list fires on a press.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use anyhow::Result;

/// Callback invoked once per detected physical press
pub type PressCallback = Arc<dyn Fn() + Send + Sync>;

/// Interrupt edge selection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    Falling,
    Rising,
}

/// Internal pull resistor selection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pull {
    Up,
    Down,
}

/// Low-level edge-interrupt provider.
///
/// `register` is called at most once per channel; dispatching to multiple
/// callbacks is the registry's job, debounce is the backend's.
pub trait InputBackend: Send + Sync {
    fn register(
        &self,
        channel: u8,
        edge: Edge,
        pull: Pull,
        handler: Box<dyn Fn() + Send + Sync>,
    ) -> Result<()>;
}

#[derive(Default)]
struct Armed {
    callbacks: Mutex<Vec<PressCallback>>,
}

impl Armed {
    fn fire(&self) {
        let callbacks = self.callbacks.lock().unwrap().clone();
        for callback in callbacks {
            callback();
        }
    }
}

/// Process-wide hardware handle: a backend plus the channel -> callbacks
/// registry. The registry is append-only; callbacks live until shutdown.
pub struct HwInterface {
    backend: Arc<dyn InputBackend>,
    armed: Mutex<HashMap<u8, Arc<Armed>>>,
}

impl HwInterface {
    pub fn new(backend: Arc<dyn InputBackend>) -> Self {
        Self {
            backend,
            armed: Mutex::new(HashMap::new()),
        }
    }

    /// Arm a falling-edge, pulled-up press interrupt on `channel`.
    ///
    /// The first arm registers the channel with the backend; later arms on
    /// the same channel log and append the callback instead of failing.
    pub fn arm(&self, channel: u8, callback: PressCallback) -> Result<()> {
        let mut armed = self.armed.lock().unwrap();
        if let Some(entry) = armed.get(&channel) {
            tracing::info!(channel, "Channel already armed, appending callback");
            entry.callbacks.lock().unwrap().push(callback);
            return Ok(());
        }

        let entry = Arc::new(Armed::default());
        entry.callbacks.lock().unwrap().push(callback);

        let dispatch = entry.clone();
        self.backend.register(
            channel,
            Edge::Falling,
            Pull::Up,
            Box::new(move || dispatch.fire()),
        )?;

        armed.insert(channel, entry);
        tracing::debug!(channel, "Channel armed");
        Ok(())
    }
}

/// One input channel bound to a play session's cancel action.
pub struct CancelSwitch {
    hw: Arc<HwInterface>,
    channel: u8,
}

impl CancelSwitch {
    pub fn new(hw: Arc<HwInterface>, channel: u8) -> Self {
        Self { hw, channel }
    }

    pub fn channel(&self) -> u8 {
        self.channel
    }

    /// Attach a press callback; debounce is delegated to the backend.
    pub fn arm(&self, on_press: PressCallback) -> Result<()> {
        self.hw.arm(self.channel, on_press)
    }
}

/// Software backend: channels are "pressed" programmatically.
///
/// Used on development hosts without GPIO and by the test suite.
#[derive(Default)]
pub struct SoftInput {
    handlers: Mutex<HashMap<u8, Box<dyn Fn() + Send + Sync>>>,
}

impl SoftInput {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate a single debounced press on `channel`.
    pub fn pulse(&self, channel: u8) {
        let handlers = self.handlers.lock().unwrap();
        if let Some(handler) = handlers.get(&channel) {
            handler();
        } else {
            tracing::debug!(channel, "Pulse on unarmed channel ignored");
        }
    }
}

impl InputBackend for SoftInput {
    fn register(
        &self,
        channel: u8,
        _edge: Edge,
        _pull: Pull,
        handler: Box<dyn Fn() + Send + Sync>,
    ) -> Result<()> {
        self.handlers.lock().unwrap().insert(channel, handler);
        Ok(())
    }
}

/// Raspberry Pi GPIO backend built on rppal's async pin interrupts.
#[cfg(feature = "rpi")]
pub mod rpi {
    use super::{Edge, InputBackend, Pull};
    use anyhow::{Context, Result};
    use rppal::gpio::{Gpio, InputPin, Trigger};
    use std::sync::Mutex;
    use std::time::Duration;

    /// Bounce suppression window handed to the GPIO driver
    const DEBOUNCE: Duration = Duration::from_millis(50);

    pub struct GpioInput {
        gpio: Gpio,
        // Pins must stay alive or their interrupts are torn down
        pins: Mutex<Vec<InputPin>>,
    }

    impl GpioInput {
        pub fn new() -> Result<Self> {
            let gpio = Gpio::new().context("opening GPIO")?;
            Ok(Self {
                gpio,
                pins: Mutex::new(Vec::new()),
            })
        }
    }

    impl InputBackend for GpioInput {
        fn register(
            &self,
            channel: u8,
            edge: Edge,
            pull: Pull,
            handler: Box<dyn Fn() + Send + Sync>,
        ) -> Result<()> {
            let pin = self
                .gpio
                .get(channel)
                .with_context(|| format!("claiming GPIO {channel}"))?;
            let mut pin = match pull {
                Pull::Up => pin.into_input_pullup(),
                Pull::Down => pin.into_input_pulldown(),
            };
            let trigger = match edge {
                Edge::Falling => Trigger::FallingEdge,
                Edge::Rising => Trigger::RisingEdge,
            };
            pin.set_async_interrupt(trigger, Some(DEBOUNCE), move |_| handler())
                .with_context(|| format!("arming interrupt on GPIO {channel}"))?;
            self.pins.lock().unwrap().push(pin);
            Ok(())
        }
    }
}
