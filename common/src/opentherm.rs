//! OpenTherm payload helpers.
//!
//! Frame layout (parity and framing are the transport's business):
//! bits 28..=30 message type, bits 16..=23 data id, bits 0..=15 data value.

use serde::Serialize;

/// Data ids exchanged by the transaction cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum MessageId {
    Status,
    TSet,
    Tboiler,
    Tdhw,
    Toutside,
    Tret,
    Texhaust,
    TdhwSet,
}

impl MessageId {
    pub fn code(self) -> u8 {
        match self {
            Self::Status => 0,
            Self::TSet => 1,
            Self::Tboiler => 25,
            Self::Tdhw => 26,
            Self::Toutside => 27,
            Self::Tret => 28,
            Self::Texhaust => 33,
            Self::TdhwSet => 56,
        }
    }

    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::Status),
            1 => Some(Self::TSet),
            25 => Some(Self::Tboiler),
            26 => Some(Self::Tdhw),
            27 => Some(Self::Toutside),
            28 => Some(Self::Tret),
            33 => Some(Self::Texhaust),
            56 => Some(Self::TdhwSet),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RequestType {
    Read,
    Write,
}

impl RequestType {
    pub fn code(self) -> u32 {
        match self {
            Self::Read => 0,
            Self::Write => 1,
        }
    }

    /// Message type a slave answers an accepted request with.
    pub fn ack_code(self) -> u32 {
        match self {
            Self::Read => 4,
            Self::Write => 5,
        }
    }
}

const SLAVE_CH_ACTIVE: u32 = 1 << 1;
const SLAVE_DHW_ACTIVE: u32 = 1 << 2;
const SLAVE_FLAME_ON: u32 = 1 << 3;

/// Raw data id of a frame; may name an id outside [`MessageId`].
pub fn data_id(frame: u32) -> u8 {
    ((frame >> 16) & 0xFF) as u8
}

pub fn data_value(frame: u32) -> u16 {
    (frame & 0xFFFF) as u16
}

/// Builds a frame without the parity bit.
pub fn compose(request_type: RequestType, id: MessageId, data: u16) -> u32 {
    (request_type.code() << 28) | (u32::from(id.code()) << 16) | u32::from(data)
}

/// Slave-side counterpart of [`compose`].
pub fn compose_ack(request_type: RequestType, id: MessageId, data: u16) -> u32 {
    (request_type.ack_code() << 28) | (u32::from(id.code()) << 16) | u32::from(data)
}

/// f8.8 encoding of a setpoint, clamped to the 0..=100 °C range the boiler accepts.
pub fn temperature_to_data(temp: f32) -> u16 {
    let clamped = if temp.is_finite() {
        temp.clamp(0.0, 100.0)
    } else {
        0.0
    };
    (clamped * 256.0) as u16
}

/// Signed f8.8 encoding of a measured temperature.
pub fn reading_to_data(temp: f32) -> u16 {
    if !temp.is_finite() {
        return 0;
    }
    (temp * 256.0).round().clamp(f32::from(i16::MIN), f32::from(i16::MAX)) as i16 as u16
}

pub fn data_to_temperature(data: u16) -> f32 {
    f32::from(data as i16) / 256.0
}

/// Master status word: CH enable, DHW enable and cooling enable in the high byte.
pub fn master_status_data(central_heating: bool, hot_water: bool, cooling: bool) -> u16 {
    let flags = u16::from(central_heating) | (u16::from(hot_water) << 1) | (u16::from(cooling) << 2);
    flags << 8
}

/// Slave status word: CH active, DHW active and flame in the low byte.
pub fn slave_status_data(central_heating: bool, hot_water: bool, flame: bool) -> u16 {
    let mut data = 0;
    if central_heating {
        data |= SLAVE_CH_ACTIVE as u16;
    }
    if hot_water {
        data |= SLAVE_DHW_ACTIVE as u16;
    }
    if flame {
        data |= SLAVE_FLAME_ON as u16;
    }
    data
}

pub fn is_central_heating_active(frame: u32) -> bool {
    frame & SLAVE_CH_ACTIVE != 0
}

pub fn is_hot_water_active(frame: u32) -> bool {
    frame & SLAVE_DHW_ACTIVE != 0
}

pub fn is_flame_on(frame: u32) -> bool {
    frame & SLAVE_FLAME_ON != 0
}
