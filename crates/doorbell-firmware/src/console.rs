//! UART0 serial console (USB bridge on GPIO43/GPIO44)

use core::fmt;

use doorbell_core::console::SerialPort;
use esp_hal::Blocking;
use esp_hal::uart::Uart;

pub struct UartConsole {
    uart: Uart<'static, Blocking>,
}

impl UartConsole {
    pub fn new(uart: Uart<'static, Blocking>) -> Self {
        Self { uart }
    }

    fn write_bytes(&mut self, mut data: &[u8]) -> fmt::Result {
        while !data.is_empty() {
            let written = self.uart.write(data).map_err(|_| fmt::Error)?;
            data = &data[written..];
        }
        Ok(())
    }
}

impl SerialPort for UartConsole {
    fn read_ready(&mut self) -> bool {
        self.uart.read_ready()
    }

    fn read_byte(&mut self) -> Option<u8> {
        if !self.uart.read_ready() {
            return None;
        }

        let mut byte = [0u8; 1];
        match self.uart.read(&mut byte) {
            Ok(1) => Some(byte[0]),
            _ => None,
        }
    }
}

impl fmt::Write for UartConsole {
    // Terminals on the other end of the bridge expect CRLF
    fn write_str(&mut self, s: &str) -> fmt::Result {
        for (i, part) in s.split('\n').enumerate() {
            if i > 0 {
                self.write_bytes(b"\r\n")?;
            }
            self.write_bytes(part.as_bytes())?;
        }
        Ok(())
    }
}
