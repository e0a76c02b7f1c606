//! Remote clock

use chrono::{DateTime, Datelike, FixedOffset, NaiveDate, Offset, TimeZone, Timelike};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use super::system::decode_c_string;
use super::{require_len, RemoteDevice};
use crate::error::{RemoteError, Result};
use crate::protocol::{Command, FrameError, MAX_PAYLOAD};
use crate::transport::Link;

/// Fixed fields ahead of the optional timezone
const FIXED_LEN: usize = 10;

/// Offset of the timezone name
const TIMEZONE_OFFSET: usize = 16;

/// Clock value as the remote stores it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceTime {
    pub year: u16,
    pub month: u8,
    pub day: u8,
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
    /// Day of week, Sunday = 0
    pub dow: u8,
    /// Minutes east of UTC
    pub utc_offset: i16,
    pub timezone: String,
}

impl DeviceTime {
    /// Parse a GET_CURRENT_TIME payload
    ///
    /// ```text
    /// 0-1 year  2 month  3 day  4 hour  5 minute  6 second  7 dow (low 3 bits)
    /// 8-9 utc offset (i16, minutes)  10-15 reserved  16.. timezone, NUL-terminated
    /// ```
    pub fn decode(payload: &[u8]) -> Result<Self> {
        require_len(Command::GetCurrentTime, payload, FIXED_LEN)?;

        let timezone = if payload.len() > TIMEZONE_OFFSET {
            decode_c_string(Command::GetCurrentTime, &payload[TIMEZONE_OFFSET..])?
        } else {
            String::new()
        };

        Ok(Self {
            year: u16::from_le_bytes([payload[0], payload[1]]),
            month: payload[2],
            day: payload[3],
            hour: payload[4],
            minute: payload[5],
            second: payload[6],
            dow: payload[7] & 0x07,
            utc_offset: i16::from_le_bytes([payload[8], payload[9]]),
            timezone,
        })
    }

    /// Serialize for UPDATE_TIME
    pub fn encode(&self) -> Result<Vec<u8>> {
        let mut payload = vec![0u8; TIMEZONE_OFFSET];
        payload[0..2].copy_from_slice(&self.year.to_le_bytes());
        payload[2] = self.month;
        payload[3] = self.day;
        payload[4] = self.hour;
        payload[5] = self.minute;
        payload[6] = self.second;
        payload[7] = self.dow & 0x07;
        payload[8..10].copy_from_slice(&self.utc_offset.to_le_bytes());

        if !self.timezone.is_empty() {
            payload.extend_from_slice(self.timezone.as_bytes());
            payload.push(0);
        }
        if payload.len() > MAX_PAYLOAD {
            return Err(FrameError::PayloadTooLarge {
                len: payload.len(),
                max: MAX_PAYLOAD,
            }
            .into());
        }
        Ok(payload)
    }

    /// Build from a chrono date-time, keeping its offset
    pub fn from_datetime<Tz: TimeZone>(dt: &DateTime<Tz>, timezone: impl Into<String>) -> Self {
        let offset_secs = dt.offset().fix().local_minus_utc();
        Self {
            year: dt.year() as u16,
            month: dt.month() as u8,
            day: dt.day() as u8,
            hour: dt.hour() as u8,
            minute: dt.minute() as u8,
            second: dt.second() as u8,
            dow: dt.weekday().num_days_from_sunday() as u8,
            utc_offset: (offset_secs / 60) as i16,
            timezone: timezone.into(),
        }
    }

    /// Local wall-clock time with the stored UTC offset
    pub fn to_datetime(&self) -> Result<DateTime<FixedOffset>> {
        let invalid = || RemoteError::InvalidResponse(format!("invalid device time {:?}", self));

        let offset =
            FixedOffset::east_opt(i32::from(self.utc_offset) * 60).ok_or_else(invalid)?;
        let naive = NaiveDate::from_ymd_opt(i32::from(self.year), self.month.into(), self.day.into())
            .and_then(|d| d.and_hms_opt(self.hour.into(), self.minute.into(), self.second.into()))
            .ok_or_else(invalid)?;
        offset
            .from_local_datetime(&naive)
            .single()
            .ok_or_else(invalid)
    }
}

impl<L: Link + ?Sized> RemoteDevice<L> {
    #[instrument(skip(self))]
    pub async fn get_time(&mut self) -> Result<DeviceTime> {
        let payload = self.request(Command::GetCurrentTime, &[]).await?;
        let time = DeviceTime::decode(&payload)?;
        debug!(?time, "Remote clock");
        Ok(time)
    }

    #[instrument(skip(self))]
    pub async fn set_time(&mut self, time: &DeviceTime) -> Result<()> {
        let payload = time.encode()?;
        self.request(Command::UpdateTime, &payload).await?;
        Ok(())
    }
}
