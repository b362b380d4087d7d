#![no_std]
#![no_main]

//! Echo UART input and switch LED1 with `on` / `off` lines.

use defmt::*;
use defmt_rtt as _;
use embassy_executor::Spawner;
use embassy_nrf::interrupt::{self, InterruptExt};
use embassy_nrf::{bind_interrupts, config::Config, peripherals, uarte};
use panic_probe as _;

use nrf52840_ble_apps::drivers::led::{Led, Polarity};
use nrf52840_ble_apps::drivers::uart::{LedCommand, LineBuffer};

bind_interrupts!(struct Irqs {
    UARTE0 => uarte::InterruptHandler<peripherals::UARTE0>;
});

#[embassy_executor::main]
async fn main(_spawner: Spawner) {
    info!("Starting UART to LED");

    let mut nrf_config = Config::default();
    nrf_config.gpiote_interrupt_priority = interrupt::Priority::P2;
    nrf_config.time_interrupt_priority = interrupt::Priority::P2;
    let p = embassy_nrf::init(nrf_config);

    let mut led = Led::new(p.P0_13, Polarity::ActiveLow);

    let mut config = uarte::Config::default();
    config.parity = uarte::Parity::EXCLUDED;
    config.baudrate = uarte::Baudrate::BAUD115200;
    interrupt::UARTE0.set_priority(interrupt::Priority::P3);
    let mut uart = uarte::Uarte::new(p.UARTE0, p.P0_08, p.P0_06, Irqs, config);

    let mut line: LineBuffer = LineBuffer::new();
    let mut byte = [0u8; 1];

    loop {
        if let Err(e) = uart.read(&mut byte).await {
            warn!("UART read failed: {:?}", e);
            continue;
        }
        if let Err(e) = uart.write(&byte).await {
            warn!("UART echo failed: {:?}", e);
        }

        if let Some(cmd) = line.push(byte[0]) {
            match LedCommand::parse(cmd) {
                Some(LedCommand::On) => led.on(),
                Some(LedCommand::Off) => led.off(),
                None => debug!("Ignoring line {=[u8]:a}", cmd),
            }
        }
    }
}
