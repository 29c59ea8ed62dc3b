use super::{DeviceError, DeviceResult, GainMode, TunerDevice};
use std::io::{Read, Seek, SeekFrom};

/// Serves a recorded raw 8-bit I/Q capture as if it were live, looping at the end.
///
/// Tuning calls are recorded but do not change the served data.
pub struct ReplayDevice<R> {
    source: R,
    center: u32,
    rate: u32,
}

impl<R: Read + Seek> ReplayDevice<R> {
    pub fn new(source: R) -> Self {
        Self {
            source,
            center: 0,
            rate: 0,
        }
    }

    fn rewind(&mut self) -> DeviceResult<()> {
        self.source
            .seek(SeekFrom::Start(0))
            .map(|_| ())
            .map_err(|err| DeviceError::Read(err.to_string()))
    }
}

impl<R: Read + Seek> TunerDevice for ReplayDevice<R> {
    fn set_center_frequency(&mut self, hz: u32) -> DeviceResult<()> {
        self.center = hz;
        Ok(())
    }

    fn center_frequency(&self) -> u32 {
        self.center
    }

    fn set_sample_rate(&mut self, hz: u32) -> DeviceResult<()> {
        self.rate = hz;
        Ok(())
    }

    fn sample_rate(&self) -> u32 {
        self.rate
    }

    fn set_gain_mode(&mut self, _mode: GainMode) -> DeviceResult<()> {
        Ok(())
    }

    fn set_gain(&mut self, _tenths_db: i32) -> DeviceResult<()> {
        Ok(())
    }

    fn reset_buffer(&mut self) -> DeviceResult<()> {
        Ok(())
    }

    fn read_sync(&mut self, buf: &mut [u8]) -> DeviceResult<usize> {
        let mut filled = 0;
        let mut rewound = false;
        while filled < buf.len() {
            let n = self
                .source
                .read(&mut buf[filled..])
                .map_err(|err| DeviceError::Read(err.to_string()))?;
            if n == 0 {
                if rewound {
                    break;
                }
                self.rewind()?;
                rewound = true;
                continue;
            }
            rewound = false;
            filled += n;
        }
        Ok(filled)
    }
}
