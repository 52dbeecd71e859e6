// Goalfinder - VL53L0X Time-of-Flight Driver
//
// Register-level driver over a dedicated I2C bus. Only what the detection
// loop needs: identity check, default-mode init and single-shot ranging.

use std::time::{Duration, Instant};

use esp_idf_hal::i2c::I2cDriver;

use crate::config::*;
use crate::sensors::{Distance, DistanceSensor};

// VL53L0X register addresses
const REG_SYSRANGE_START: u8 = 0x00;
const REG_SYSTEM_INTERRUPT_CONFIG_GPIO: u8 = 0x0A;
const REG_SYSTEM_INTERRUPT_CLEAR: u8 = 0x0B;
const REG_RESULT_INTERRUPT_STATUS: u8 = 0x13;
const REG_RESULT_RANGE_STATUS: u8 = 0x14; // 12-byte result block
const REG_VHV_CONFIG_PAD_SCL_SDA_EXTSUP_HV: u8 = 0x89;
const REG_STOP_VARIABLE: u8 = 0x91;
const REG_IDENTIFICATION_MODEL_ID: u8 = 0xC0;
const MODEL_ID_EXPECTED: u8 = 0xEE;

const RANGE_STATUS_OUT_OF_RANGE: u8 = 4;
const MEASUREMENT_TIMEOUT: Duration = Duration::from_millis(100);

pub struct Vl53l0x {
    bus: I2cDriver<'static>,
    stop_variable: u8,
}

impl Vl53l0x {
    /// Verify the sensor identity and bring it into single-shot mode.
    pub fn new(bus: I2cDriver<'static>) -> anyhow::Result<Self> {
        let mut sensor = Self { bus, stop_variable: 0 };
        let id = sensor.read_reg(REG_IDENTIFICATION_MODEL_ID)?;
        if id != MODEL_ID_EXPECTED {
            anyhow::bail!("unexpected VL53L0X model id 0x{:02X}", id);
        }
        sensor.init()?;
        log::info!("VL53L0X initialised (single-shot ranging)");
        Ok(sensor)
    }

    fn init(&mut self) -> anyhow::Result<()> {
        // 2V8 I/O mode
        let pad = self.read_reg(REG_VHV_CONFIG_PAD_SCL_SDA_EXTSUP_HV)?;
        self.write_reg(REG_VHV_CONFIG_PAD_SCL_SDA_EXTSUP_HV, pad | 0x01)?;

        // I2C standard mode
        self.write_reg(0x88, 0x00)?;

        self.enter_private_page()?;
        self.stop_variable = self.read_reg(REG_STOP_VARIABLE)?;
        self.leave_private_page()?;

        // New sample ready interrupt, active low
        self.write_reg(REG_SYSTEM_INTERRUPT_CONFIG_GPIO, 0x04)?;
        self.write_reg(REG_SYSTEM_INTERRUPT_CLEAR, 0x01)?;
        Ok(())
    }

    fn enter_private_page(&mut self) -> anyhow::Result<()> {
        self.write_reg(0x80, 0x01)?;
        self.write_reg(0xFF, 0x01)?;
        self.write_reg(0x00, 0x00)?;
        Ok(())
    }

    fn leave_private_page(&mut self) -> anyhow::Result<()> {
        self.write_reg(0x00, 0x01)?;
        self.write_reg(0xFF, 0x00)?;
        self.write_reg(0x80, 0x00)?;
        Ok(())
    }

    /// Trigger one measurement and wait for it.
    pub fn range_single(&mut self) -> anyhow::Result<Distance> {
        self.enter_private_page()?;
        self.write_reg(REG_STOP_VARIABLE, self.stop_variable)?;
        self.leave_private_page()?;
        self.write_reg(REG_SYSRANGE_START, 0x01)?;

        let start = Instant::now();
        while self.read_reg(REG_SYSRANGE_START)? & 0x01 != 0 {
            if start.elapsed() > MEASUREMENT_TIMEOUT {
                anyhow::bail!("ranging start timed out");
            }
        }
        while self.read_reg(REG_RESULT_INTERRUPT_STATUS)? & 0x07 == 0 {
            if start.elapsed() > MEASUREMENT_TIMEOUT {
                anyhow::bail!("ranging result timed out");
            }
        }

        let mut result = [0u8; 12];
        self.bus.write_read(I2C_ADDR_VL53L0X, &[REG_RESULT_RANGE_STATUS], &mut result, I2C_TIMEOUT_TICKS)?;
        self.write_reg(REG_SYSTEM_INTERRUPT_CLEAR, 0x01)?;

        let status = (result[0] >> 3) & 0x0F;
        if status == RANGE_STATUS_OUT_OF_RANGE {
            return Ok(Distance::Invalid);
        }
        Ok(Distance::Millimeters(u16::from_be_bytes([result[10], result[11]])))
    }

    fn read_reg(&mut self, reg: u8) -> anyhow::Result<u8> {
        let mut buf = [0u8; 1];
        self.bus.write_read(I2C_ADDR_VL53L0X, &[reg], &mut buf, I2C_TIMEOUT_TICKS)?;
        Ok(buf[0])
    }

    fn write_reg(&mut self, reg: u8, value: u8) -> anyhow::Result<()> {
        self.bus.write(I2C_ADDR_VL53L0X, &[reg, value], I2C_TIMEOUT_TICKS)?;
        Ok(())
    }
}

impl DistanceSensor for Vl53l0x {
    fn read_distance_mm(&mut self) -> Distance {
        match self.range_single() {
            Ok(distance) => distance,
            Err(e) => {
                log::debug!("VL53L0X read failed: {}", e);
                Distance::Invalid
            }
        }
    }
}
