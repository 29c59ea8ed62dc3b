use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;
use sweepcore::device::{
    DeviceCatalog, DeviceError, DeviceInfo, DeviceResult, ReplayDevice, TunerDevice,
};

/// Catalog exposing one recorded raw 8-bit I/Q capture as a tuner.
pub struct CaptureCatalog {
    path: PathBuf,
}

impl CaptureCatalog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl DeviceCatalog for CaptureCatalog {
    fn devices(&self) -> Vec<DeviceInfo> {
        let name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        vec![DeviceInfo {
            index: 0,
            vendor: "Capture".into(),
            product: self.path.display().to_string(),
            serial: name,
        }]
    }

    fn open(&self, index: usize) -> DeviceResult<Box<dyn TunerDevice>> {
        if index != 0 {
            return Err(DeviceError::Open(index));
        }
        let file = File::open(&self.path).map_err(|err| {
            log::error!("cannot open capture {}: {}", self.path.display(), err);
            DeviceError::Open(index)
        })?;
        Ok(Box::new(ReplayDevice::new(BufReader::new(file))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn capture_file_opens_as_a_device() {
        let mut temp = NamedTempFile::new().unwrap();
        temp.write_all(&[127, 130, 124, 127]).unwrap();
        let catalog = CaptureCatalog::new(temp.path());
        let mut device = catalog.open(0).unwrap();
        let mut buf = [0u8; 6];
        assert_eq!(device.read_sync(&mut buf).unwrap(), 6);
        assert_eq!(buf, [127, 130, 124, 127, 127, 130]);
    }

    #[test]
    fn missing_capture_fails_to_open() {
        let catalog = CaptureCatalog::new("/nonexistent/capture.u8");
        assert!(matches!(catalog.open(0), Err(DeviceError::Open(0))));
        assert_eq!(catalog.devices()[0].serial, "capture.u8");
    }
}
