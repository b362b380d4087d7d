//! ADXL362 Accelerometer Driver
//!
//! Register level driver for the Analog Devices ADXL362 over SPI. Every
//! register access is a single `SpiDevice` transaction, so chip select
//! handling and bus sharing belong to the `SpiDevice` implementation.

use defmt::{debug, Format, Formatter};
use embedded_hal_async::spi::{Operation, SpiDevice};

use crate::core::error::AppError;

/// Register addresses
pub mod reg {
    pub const DEVID_AD: u8 = 0x00;
    pub const DEVID_MST: u8 = 0x01;
    pub const PARTID: u8 = 0x02;
    pub const REVID: u8 = 0x03;
    pub const XDATA: u8 = 0x08;
    pub const YDATA: u8 = 0x09;
    pub const ZDATA: u8 = 0x0A;
    pub const STATUS: u8 = 0x0B;
    pub const FIFO_ENTRIES_L: u8 = 0x0C;
    pub const FIFO_ENTRIES_H: u8 = 0x0D;
    pub const XDATA_L: u8 = 0x0E;
    pub const XDATA_H: u8 = 0x0F;
    pub const YDATA_L: u8 = 0x10;
    pub const YDATA_H: u8 = 0x11;
    pub const ZDATA_L: u8 = 0x12;
    pub const ZDATA_H: u8 = 0x13;
    pub const TEMP_L: u8 = 0x14;
    pub const TEMP_H: u8 = 0x15;
    pub const SOFT_RESET: u8 = 0x1F;
    pub const THRESH_ACT_L: u8 = 0x20;
    pub const THRESH_ACT_H: u8 = 0x21;
    pub const TIME_ACT: u8 = 0x22;
    pub const THRESH_INACT_L: u8 = 0x23;
    pub const THRESH_INACT_H: u8 = 0x24;
    pub const TIME_INACT_L: u8 = 0x25;
    pub const TIME_INACT_H: u8 = 0x26;
    pub const ACT_INACT_CTL: u8 = 0x27;
    pub const FIFO_CTL: u8 = 0x28;
    pub const FIFO_SAMPLES: u8 = 0x29;
    pub const INTMAP1: u8 = 0x2A;
    pub const INTMAP2: u8 = 0x2B;
    pub const FILTER_CTL: u8 = 0x2C;
    pub const POWER_CTL: u8 = 0x2D;
    pub const SELF_TEST: u8 = 0x2E;
}

/// SPI command bytes
pub mod cmd {
    pub const WRITE_REG: u8 = 0x0A;
    pub const READ_REG: u8 = 0x0B;
    pub const READ_FIFO: u8 = 0x0D;
}

/// Written to SOFT_RESET to reset the part
pub const RESET_CODE: u8 = 0x52;

// ACT_INACT_CTL
pub const LINKED_MODE: u8 = 0x10;
pub const LOOP_MODE: u8 = 0x30;
pub const INACT_EN: u8 = 0x04;
pub const ACT_EN: u8 = 0x01;
pub const INACT_REF_EN: u8 = 0x08;
pub const ACT_REF_EN: u8 = 0x02;

// FIFO_CTL
pub const STORE_TEMP_MODE: u8 = 0x04;
pub const FIFO_AH: u8 = 0x08;

// POWER_CTL
pub const MEASUREMENT_MODE: u8 = 0x02;
pub const AUTOSLEEP_EN: u8 = 0x04;
pub const WAKEUP_EN: u8 = 0x08;
const MEASURE_MASK: u8 = 0x03;

/// DEVID_AD, DEVID_MST and PARTID of a genuine part
pub const EXPECTED_ID: [u8; 3] = [0xAD, 0x1D, 0xF2];

/// Longest register burst the driver will issue
pub const MAX_REGISTER_BURST: usize = 126;

/// Settling time after a soft reset
const RESET_DELAY_NS: u32 = 500_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Format)]
pub enum FifoMode {
    Disabled = 0,
    OldestSaved = 1,
    Stream = 2,
    Triggered = 3,
}

/// Activity / inactivity detection mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Format)]
pub enum InterruptMode {
    Default,
    Linked,
    Loop,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Format)]
pub enum NoiseMode {
    Normal = 0,
    Low = 1,
    UltraLow = 2,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Format)]
pub enum MeasurementRange {
    G2 = 0,
    G4 = 1,
    G8 = 2,
}

/// Interrupt output pin selection for [`Adxl362::config_intmap`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Format)]
pub enum IntPin {
    Int1,
    Int2,
}

/// Sources routed to an interrupt pin
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Format)]
pub struct InterruptMap {
    pub data_ready: bool,
    pub fifo_ready: bool,
    pub fifo_watermark: bool,
    pub fifo_overrun: bool,
    pub act: bool,
    pub inact: bool,
    pub awake: bool,
    /// Active low output
    pub int_low: bool,
}

impl InterruptMap {
    pub fn bits(&self) -> u8 {
        [
            self.data_ready,
            self.fifo_ready,
            self.fifo_watermark,
            self.fifo_overrun,
            self.act,
            self.inact,
            self.awake,
            self.int_low,
        ]
        .iter()
        .enumerate()
        .fold(0, |acc, (bit, &set)| if set { acc | (1 << bit) } else { acc })
    }
}

/// ACT_INACT_CTL value for a detection mode. Enable bits are left clear.
pub fn act_inact_ctl(mode: InterruptMode, referenced_act: bool, referenced_inact: bool) -> u8 {
    let mut value = match mode {
        InterruptMode::Default => 0,
        InterruptMode::Linked => LINKED_MODE,
        InterruptMode::Loop => LOOP_MODE,
    };
    if referenced_inact {
        value |= INACT_REF_EN;
    }
    if referenced_act {
        value |= ACT_REF_EN;
    }
    value
}

/// FIFO_CTL value. `samples` above 255 sets the AH (ninth sample bit) flag.
pub fn fifo_ctl(mode: FifoMode, store_temp: bool, samples: u16) -> u8 {
    let mut value = mode as u8;
    if store_temp {
        value |= STORE_TEMP_MODE;
    }
    if samples > 255 {
        value |= FIFO_AH;
    }
    value
}

/// FILTER_CTL value selecting `range`; bits 5:0 are taken from `lower`
/// (bandwidth, external sampling and output data rate).
pub fn filter_ctl(range: MeasurementRange, lower: u8) -> u8 {
    (lower & 0x3F) | ((range as u8) << 6)
}

/// POWER_CTL value
pub fn power_ctl(noise: NoiseMode, measure: bool, autosleep: bool, wakeup: bool) -> u8 {
    let mut value = (noise as u8) << 4;
    if measure {
        value |= MEASUREMENT_MODE;
    }
    if autosleep {
        value |= AUTOSLEEP_EN;
    }
    if wakeup {
        value |= WAKEUP_EN;
    }
    value
}

/// Decode FIFO sample words into signed values.
///
/// Each entry is a little-endian word whose top two bits tag the axis; the
/// remaining 14 bits are two's complement. Returns the number of samples
/// written to `out`.
pub fn parse_fifo(bytes: &[u8], out: &mut [i16]) -> usize {
    let mut count = 0;
    for (word, slot) in bytes.chunks_exact(2).zip(out.iter_mut()) {
        let raw = u16::from_le_bytes([word[0], word[1]]);
        *slot = ((raw << 2) as i16) >> 2;
        count += 1;
    }
    count
}

/// Driver errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Adxl362Error<E> {
    /// Bus error from the SPI device
    Spi(E),
    /// Register burst longer than [`MAX_REGISTER_BURST`]
    TooLong,
    /// Device id registers do not match [`EXPECTED_ID`]
    WrongDevice,
}

impl<E> Format for Adxl362Error<E> {
    fn format(&self, f: Formatter) {
        match self {
            Adxl362Error::Spi(_) => defmt::write!(f, "Spi"),
            Adxl362Error::TooLong => defmt::write!(f, "TooLong"),
            Adxl362Error::WrongDevice => defmt::write!(f, "WrongDevice"),
        }
    }
}

impl<E> From<Adxl362Error<E>> for AppError {
    fn from(_: Adxl362Error<E>) -> Self {
        AppError::Sensor
    }
}

pub struct Adxl362<SPI> {
    spi: SPI,
}

impl<SPI: SpiDevice> Adxl362<SPI> {
    pub fn new(spi: SPI) -> Self {
        Self { spi }
    }

    /// Give back the SPI device
    pub fn release(self) -> SPI {
        self.spi
    }

    /// Write consecutive registers starting at `addr`
    pub async fn write_registers(&mut self, addr: u8, data: &[u8]) -> Result<(), Adxl362Error<SPI::Error>> {
        if data.len() > MAX_REGISTER_BURST {
            return Err(Adxl362Error::TooLong);
        }
        self.spi
            .transaction(&mut [Operation::Write(&[cmd::WRITE_REG, addr]), Operation::Write(data)])
            .await
            .map_err(Adxl362Error::Spi)
    }

    /// Read consecutive registers starting at `addr`
    pub async fn read_registers(&mut self, addr: u8, buf: &mut [u8]) -> Result<(), Adxl362Error<SPI::Error>> {
        if buf.len() > MAX_REGISTER_BURST {
            return Err(Adxl362Error::TooLong);
        }
        self.spi
            .transaction(&mut [Operation::Write(&[cmd::READ_REG, addr]), Operation::Read(buf)])
            .await
            .map_err(Adxl362Error::Spi)
    }

    async fn write_reg(&mut self, addr: u8, value: u8) -> Result<(), Adxl362Error<SPI::Error>> {
        self.write_registers(addr, &[value]).await
    }

    async fn read_reg(&mut self, addr: u8) -> Result<u8, Adxl362Error<SPI::Error>> {
        let mut value = [0u8; 1];
        self.read_registers(addr, &mut value).await?;
        Ok(value[0])
    }

    async fn modify_reg(&mut self, addr: u8, f: impl FnOnce(u8) -> u8) -> Result<(), Adxl362Error<SPI::Error>> {
        let value = self.read_reg(addr).await?;
        self.write_reg(addr, f(value)).await
    }

    /// Soft reset, then wait for the part to come back
    pub async fn reset(&mut self) -> Result<(), Adxl362Error<SPI::Error>> {
        self.spi
            .transaction(&mut [
                Operation::Write(&[cmd::WRITE_REG, reg::SOFT_RESET, RESET_CODE]),
                Operation::DelayNs(RESET_DELAY_NS),
            ])
            .await
            .map_err(Adxl362Error::Spi)
    }

    /// Reset and configure the power mode
    pub async fn init(
        &mut self,
        noise: NoiseMode,
        measure: bool,
        autosleep: bool,
        wakeup: bool,
    ) -> Result<(), Adxl362Error<SPI::Error>> {
        self.reset().await?;
        let power = power_ctl(noise, measure, autosleep, wakeup);
        debug!("ADXL362 POWER_CTL={=u8:#x}", power);
        self.write_reg(reg::POWER_CTL, power).await
    }

    /// DEVID_AD, DEVID_MST, PARTID and REVID
    pub async fn read_device_id(&mut self) -> Result<[u8; 4], Adxl362Error<SPI::Error>> {
        let mut id = [0u8; 4];
        self.read_registers(reg::DEVID_AD, &mut id).await?;
        Ok(id)
    }

    /// Check the id registers; returns the silicon revision
    pub async fn identify(&mut self) -> Result<u8, Adxl362Error<SPI::Error>> {
        let id = self.read_device_id().await?;
        if id[..3] != EXPECTED_ID {
            return Err(Adxl362Error::WrongDevice);
        }
        Ok(id[3])
    }

    /// Overwrites ACT_INACT_CTL, which also clears both enable bits
    pub async fn config_interrupt_mode(
        &mut self,
        mode: InterruptMode,
        referenced_act: bool,
        referenced_inact: bool,
    ) -> Result<(), Adxl362Error<SPI::Error>> {
        self.write_reg(reg::ACT_INACT_CTL, act_inact_ctl(mode, referenced_act, referenced_inact))
            .await
    }

    pub async fn config_measurement_range(&mut self, range: MeasurementRange) -> Result<(), Adxl362Error<SPI::Error>> {
        self.modify_reg(reg::FILTER_CTL, |v| filter_ctl(range, v)).await
    }

    /// 11-bit threshold; the upper bits of THRESH_ACT_H are preserved
    pub async fn set_activity_threshold(&mut self, threshold: u16) -> Result<(), Adxl362Error<SPI::Error>> {
        self.write_reg(reg::THRESH_ACT_L, threshold as u8).await?;
        let high = ((threshold >> 8) & 0x07) as u8;
        self.modify_reg(reg::THRESH_ACT_H, |v| (v & 0xF8) | high).await
    }

    /// 11-bit threshold
    pub async fn set_inactivity_threshold(&mut self, threshold: u16) -> Result<(), Adxl362Error<SPI::Error>> {
        self.write_reg(reg::THRESH_INACT_L, threshold as u8).await?;
        self.write_reg(reg::THRESH_INACT_H, ((threshold >> 8) & 0x07) as u8).await
    }

    /// Ignored by the part in wake-up mode
    pub async fn set_activity_time(&mut self, time: u8) -> Result<(), Adxl362Error<SPI::Error>> {
        self.write_reg(reg::TIME_ACT, time).await
    }

    pub async fn set_inactivity_time(&mut self, time: u16) -> Result<(), Adxl362Error<SPI::Error>> {
        self.write_registers(reg::TIME_INACT_L, &time.to_le_bytes()).await
    }

    pub async fn config_intmap(&mut self, map: &InterruptMap, pin: IntPin) -> Result<(), Adxl362Error<SPI::Error>> {
        let addr = match pin {
            IntPin::Int1 => reg::INTMAP1,
            IntPin::Int2 => reg::INTMAP2,
        };
        self.write_reg(addr, map.bits()).await
    }

    async fn interrupt_enable(&mut self, bits: u8) -> Result<(), Adxl362Error<SPI::Error>> {
        self.modify_reg(reg::ACT_INACT_CTL, |v| v | bits).await?;
        // Reading STATUS clears a pending activity interrupt
        self.read_status().await?;
        Ok(())
    }

    pub async fn activity_interrupt_enable(&mut self) -> Result<(), Adxl362Error<SPI::Error>> {
        self.interrupt_enable(ACT_EN).await
    }

    pub async fn inactivity_interrupt_enable(&mut self) -> Result<(), Adxl362Error<SPI::Error>> {
        self.interrupt_enable(INACT_EN).await
    }

    pub async fn activity_inactivity_interrupt_enable(&mut self) -> Result<(), Adxl362Error<SPI::Error>> {
        self.interrupt_enable(ACT_EN | INACT_EN).await
    }

    /// 8 most significant bits of each axis
    pub async fn sample_byte(&mut self) -> Result<(i8, i8, i8), Adxl362Error<SPI::Error>> {
        let mut data = [0u8; 3];
        self.read_registers(reg::XDATA, &mut data).await?;
        Ok((data[0] as i8, data[1] as i8, data[2] as i8))
    }

    /// Full resolution sample of each axis
    pub async fn sample_word(&mut self) -> Result<(i16, i16, i16), Adxl362Error<SPI::Error>> {
        let mut data = [0u8; 6];
        self.read_registers(reg::XDATA_L, &mut data).await?;
        Ok((
            i16::from_le_bytes([data[0], data[1]]),
            i16::from_le_bytes([data[2], data[3]]),
            i16::from_le_bytes([data[4], data[5]]),
        ))
    }

    /// Number of valid entries in the FIFO (10 bits)
    pub async fn fifo_entries(&mut self) -> Result<u16, Adxl362Error<SPI::Error>> {
        let mut data = [0u8; 2];
        self.read_registers(reg::FIFO_ENTRIES_L, &mut data).await?;
        Ok(u16::from(data[0]) | (u16::from(data[1] & 0x03) << 8))
    }

    pub async fn config_fifo(
        &mut self,
        mode: FifoMode,
        store_temp: bool,
        samples: u16,
    ) -> Result<(), Adxl362Error<SPI::Error>> {
        self.write_reg(reg::FIFO_SAMPLES, samples as u8).await?;
        self.write_reg(reg::FIFO_CTL, fifo_ctl(mode, store_temp, samples)).await
    }

    /// Drain `buf.len()` bytes from the FIFO; decode with [`parse_fifo`]
    pub async fn read_fifo(&mut self, buf: &mut [u8]) -> Result<(), Adxl362Error<SPI::Error>> {
        self.spi
            .transaction(&mut [Operation::Write(&[cmd::READ_FIFO]), Operation::Read(buf)])
            .await
            .map_err(Adxl362Error::Spi)
    }

    pub async fn read_status(&mut self) -> Result<u8, Adxl362Error<SPI::Error>> {
        self.read_reg(reg::STATUS).await
    }

    /// Switch to measurement mode, keeping the other POWER_CTL settings
    pub async fn measurement_mode(&mut self) -> Result<(), Adxl362Error<SPI::Error>> {
        self.modify_reg(reg::POWER_CTL, |v| (v & !MEASURE_MASK) | MEASUREMENT_MODE).await
    }

    pub async fn autosleep(&mut self) -> Result<(), Adxl362Error<SPI::Error>> {
        self.modify_reg(reg::POWER_CTL, |v| v | AUTOSLEEP_EN).await
    }
}
