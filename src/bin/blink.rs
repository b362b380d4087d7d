#![no_std]
#![no_main]

use defmt::info;
use defmt_rtt as _;
use embassy_executor::Spawner;
use embassy_nrf::{config::Config, interrupt};
use embassy_time::{Duration, Ticker};
use panic_probe as _;

use nrf52840_ble_apps::drivers::led::{Led, Polarity};

#[embassy_executor::main]
async fn main(_spawner: Spawner) {
    info!("Starting blink");

    let mut nrf_config = Config::default();
    nrf_config.time_interrupt_priority = interrupt::Priority::P2;
    let p = embassy_nrf::init(nrf_config);

    let mut led = Led::new(p.P0_13, Polarity::ActiveLow);
    let mut ticker = Ticker::every(Duration::from_millis(500));

    loop {
        ticker.next().await;
        led.toggle();
    }
}
