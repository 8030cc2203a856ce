//! I2sPatternTx - Main entry point
//!
//! 1. Install the I2S TX driver
//! 2. Route MCLK to GPIO0
//! 3. Write the test pattern once
//! 4. Idle, draining logs to the console

#[cfg(target_os = "espidf")]
mod firmware {
    use std::io::Write;

    use esp_idf_svc::hal::delay::FreeRtos;
    use esp_idf_svc::hal::gpio::AnyIOPin;
    use esp_idf_svc::hal::i2s::I2sDriver;
    use esp_idf_svc::hal::prelude::Peripherals;
    use esp_idf_svc::sys as esp_idf_sys;

    use i2s_pattern_tx::{
        config::IDLE_PERIOD_MS,
        console_logger,
        hal::{board::Esp32Board, i2s, Board},
        tx_error, tx_info, AudioError, I2sPort, LogStream, StreamWriter, SystemHeap, TransportConfig,
    };

    static LOG_STREAM: LogStream = LogStream::new();

    fn flush_logs() {
        let mut stdout = std::io::stdout();
        console_logger::drain_to(&LOG_STREAM, |line| {
            let _ = stdout.write_all(line);
        });
        let _ = stdout.flush();
    }

    pub fn run() -> Result<(), AudioError> {
        let config = TransportConfig::default();
        config.validate()?;

        let peripherals =
            Peripherals::take().map_err(|e| AudioError::Transport(e.code()))?;
        let std_config = i2s::std_config(&config);

        // SAFETY: the bus GPIOs are named only in config.pins and nothing else
        // in the firmware claims them; `validate` checked they are distinct.
        let (bck, dout, ws) = unsafe {
            (
                AnyIOPin::new(i32::from(config.pins.bck)),
                AnyIOPin::new(i32::from(config.pins.dout)),
                AnyIOPin::new(i32::from(config.pins.ws)),
            )
        };
        let mclk = Option::<AnyIOPin>::None;

        let driver = match config.port {
            I2sPort::I2s0 => {
                I2sDriver::new_std_tx(peripherals.i2s0, &std_config, bck, dout, mclk, ws)
            }
            I2sPort::I2s1 => {
                I2sDriver::new_std_tx(peripherals.i2s1, &std_config, bck, dout, mclk, ws)
            }
        }
        .map_err(|e| AudioError::Transport(e.code()))?;
        let transport =
            i2s::I2sTransport::new(driver, &config).map_err(|e| AudioError::Transport(e.code()))?;

        // SAFETY: only this task touches the IO_MUX clock-out registers.
        let mut board = unsafe { Esp32Board::new() };
        board.route_clock_out(config.port, config.clk_out_pin)?;

        tx_info!(
            LOG_STREAM,
            i2s::now_us(),
            "{} {} Hz {}-bit, MCLK {} Hz",
            env!("VERSION_STRING"),
            config.sample_rate_hz,
            config.bits.bits(),
            config.mclk_hz()
        );

        let mut writer = StreamWriter::new(transport, SystemHeap, &LOG_STREAM, i2s::now_us);
        writer.fill_and_send(config.bits.bits())?;

        Ok(())
    }

    pub fn main() {
        esp_idf_sys::link_patches();

        if let Err(err) = run() {
            tx_error!(LOG_STREAM, i2s::now_us(), "{}", err);
            flush_logs();
            if err.is_fatal() {
                panic!("{}", err);
            }
        }

        loop {
            flush_logs();
            FreeRtos::delay_ms(IDLE_PERIOD_MS);
        }
    }
}

#[cfg(target_os = "espidf")]
fn main() {
    firmware::main();
}

#[cfg(not(target_os = "espidf"))]
fn main() {
    // Host builds only carry the library and its tests.
}
