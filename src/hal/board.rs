//! Board-level pin routing.
//!
//! The I2S master clock leaves the chip on GPIO0 through the CLK_OUT1
//! function. Two IO_MUX registers are involved:
//!
//! ```text
//! IO_MUX_GPIO0_REG  MCU_SEL[14:12] = 1        select CLK_OUT1 on GPIO0
//! PIN_CTRL          CLK_OUT1[3:0]  = 0x0      source I2S0 MCLK
//!                                  = 0xF      source I2S1 MCLK
//! ```
//!
//! Only the classic ESP32 register map is covered.

use crate::config::I2sPort;
use crate::error::AudioError;

/// GPIO that can carry CLK_OUT1.
pub const CLK_OUT1_PIN: u8 = 0;

/// IO_MUX function number of CLK_OUT1 on GPIO0.
pub const FUNC_GPIO0_CLK_OUT1: u32 = 1;

const MCU_SEL_SHIFT: u32 = 12;
const MCU_SEL_MASK: u32 = 0x7 << MCU_SEL_SHIFT;
const CLK_OUT1_MASK: u32 = 0xF;

/// Board configuration exposed to startup code.
pub trait Board {
    /// Drive the master clock of `port` out on `pin`.
    fn route_clock_out(&mut self, port: I2sPort, pin: u8) -> Result<(), AudioError>;
}

/// New IO_MUX pad value with MCU_SEL set to `func`.
#[inline]
pub fn mux_select(pad: u32, func: u32) -> u32 {
    (pad & !MCU_SEL_MASK) | ((func << MCU_SEL_SHIFT) & MCU_SEL_MASK)
}

/// New PIN_CTRL value with CLK_OUT1 sourced from `port`.
#[inline]
pub fn pin_ctrl_for(pin_ctrl: u32, port: I2sPort) -> u32 {
    match port {
        I2sPort::I2s0 => pin_ctrl & !CLK_OUT1_MASK,
        I2sPort::I2s1 => pin_ctrl | CLK_OUT1_MASK,
    }
}

/// Classic ESP32 IO_MUX access.
#[cfg(target_os = "espidf")]
pub struct Esp32Board {
    _private: (),
}

#[cfg(target_os = "espidf")]
impl Esp32Board {
    const IO_MUX_BASE: usize = 0x3FF4_9000;
    const PIN_CTRL: usize = Self::IO_MUX_BASE;
    const IO_MUX_GPIO0: usize = Self::IO_MUX_BASE + 0x44;

    /// # Safety
    ///
    /// Caller must be the only code touching IO_MUX PIN_CTRL and the GPIO0 pad.
    pub unsafe fn new() -> Self {
        Self { _private: () }
    }

    fn modify(addr: usize, f: impl FnOnce(u32) -> u32) {
        // SAFETY: `addr` is one of the IO_MUX registers above, which are
        // always mapped; exclusivity is promised by `Esp32Board::new`.
        unsafe {
            let reg = addr as *mut u32;
            core::ptr::write_volatile(reg, f(core::ptr::read_volatile(reg)));
        }
    }
}

#[cfg(target_os = "espidf")]
impl Board for Esp32Board {
    fn route_clock_out(&mut self, port: I2sPort, pin: u8) -> Result<(), AudioError> {
        if pin != CLK_OUT1_PIN {
            return Err(AudioError::InvalidConfig("CLK_OUT1 is only available on GPIO0"));
        }
        if !cfg!(esp32) {
            return Err(AudioError::InvalidConfig("clock out routing is mapped for ESP32 only"));
        }

        Self::modify(Self::IO_MUX_GPIO0, |pad| mux_select(pad, FUNC_GPIO0_CLK_OUT1));
        Self::modify(Self::PIN_CTRL, |ctrl| pin_ctrl_for(ctrl, port));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mux_select_only_touches_mcu_sel() {
        let pad = 0xFFFF_FFFF;
        assert_eq!(mux_select(pad, FUNC_GPIO0_CLK_OUT1), 0xFFFF_9FFF);
        assert_eq!(mux_select(0, FUNC_GPIO0_CLK_OUT1), 0x0000_1000);
    }

    #[test]
    fn test_clock_out_follows_configured_port() {
        use crate::config::TransportConfig;

        let config = TransportConfig::default();
        assert_eq!(config.port, I2sPort::I2s1);
        assert_eq!(config.clk_out_pin, CLK_OUT1_PIN);
        assert_eq!(pin_ctrl_for(0, config.port) & CLK_OUT1_MASK, 0xF);

        let config = TransportConfig {
            port: I2sPort::I2s0,
            ..TransportConfig::default()
        };
        assert_eq!(pin_ctrl_for(0xFFFF_FFFF, config.port) & CLK_OUT1_MASK, 0x0);
    }

    #[test]
    fn test_pin_ctrl_nibble_per_port() {
        assert_eq!(pin_ctrl_for(0x0000_03FF, I2sPort::I2s0), 0x0000_03F0);
        assert_eq!(pin_ctrl_for(0x0000_0300, I2sPort::I2s1), 0x0000_030F);
    }
}
