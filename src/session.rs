//! HID device session.

use hidapi::{HidApi, HidDevice, HidError};
use log::{debug, error, info};
use thiserror::Error;

use crate::controller::TowerController;
use crate::{Color, Pattern};

/// Device session errors.
#[derive(Error, Debug)]
pub(crate) enum DeviceError {
    #[error("unable to open device: {0} (check that it is connected)")]
    NotFound(#[source] HidError),
    #[error("unable to write command: device is not open")]
    NotOpen,
    #[error("unable to write command: {0}")]
    WriteFailed(#[source] HidError),
}

/// Access to HID devices.
pub(crate) trait HidBackend {
    type Device: HidTransport;

    /// Open the first device matching the vendor and product ID.
    fn open_device(&self, vendor_id: u16, product_id: u16) -> Result<Self::Device, HidError>;
}

/// Output report channel of an open HID device.
pub(crate) trait HidTransport {
    /// Write an output report, the first byte is the report ID.
    fn write_report(&self, data: &[u8]) -> Result<usize, HidError>;
}

/// Backend using the system's hidapi library.
pub(crate) struct HidApiBackend;

/// Device opened through hidapi.
pub(crate) struct HidApiDevice {
    device: HidDevice,
    _api: HidApi,
}

impl HidBackend for HidApiBackend {
    type Device = HidApiDevice;

    fn open_device(&self, vendor_id: u16, product_id: u16) -> Result<HidApiDevice, HidError> {
        let api = HidApi::new()?;
        let device = api.open(vendor_id, product_id)?;
        Ok(HidApiDevice { device, _api: api })
    }
}

impl HidTransport for HidApiDevice {
    fn write_report(&self, data: &[u8]) -> Result<usize, HidError> {
        self.device.write(data)
    }
}

/// Connection to a single signal tower.
///
/// The session is either closed or holds exactly one open device handle. All writes on a closed
/// session fail with [`DeviceError::NotOpen`] without touching the device.
pub(crate) struct Session<B: HidBackend> {
    controller: Box<dyn TowerController>,
    device: Option<B::Device>,
    backend: B,
}

impl<B: HidBackend> Session<B> {
    pub fn new(backend: B, controller: Box<dyn TowerController>) -> Self {
        Self { controller, backend, device: None }
    }

    pub fn is_open(&self) -> bool {
        self.device.is_some()
    }

    /// Open the device, keeping the current handle if one is held already.
    pub fn open(&mut self) -> Result<(), DeviceError> {
        if self.is_open() {
            return Ok(());
        }

        let vendor_id = self.controller.vendor_id();
        let product_id = self.controller.product_id();
        let device =
            self.backend.open_device(vendor_id, product_id).map_err(DeviceError::NotFound)?;
        self.device = Some(device);

        info!("Succeeded to open device {:04x}:{:04x}.", vendor_id, product_id);

        Ok(())
    }

    /// Write a command report to the device.
    pub fn write(&self, command: &[u8]) -> Result<(), DeviceError> {
        let device = self.device.as_ref().ok_or(DeviceError::NotOpen)?;

        debug!("Writing command {:02x?}", command);

        let sent = device.write_report(command).map_err(DeviceError::WriteFailed)?;
        if sent < command.len() {
            let err = HidError::IncompleteSendError { sent, all: command.len() };
            return Err(DeviceError::WriteFailed(err));
        }

        Ok(())
    }

    /// Update the tower's light.
    pub fn lights(&self, color: Color, pattern: Pattern) -> Result<(), DeviceError> {
        let command = self.controller.command_bytes(color, pattern);
        self.write(&command)
    }

    /// Release the device handle.
    pub fn close(&mut self) {
        if self.device.take().is_some() {
            info!("Succeeded to close device.");
        }
    }

    /// Turn the light off and close the device.
    pub fn shutdown(&mut self) {
        if let Err(err) = self.lights(Color::Off, Pattern::Continuous) {
            error!("{}", err);
        }

        self.close();
    }
}


#[cfg(test)]
mod tests {
    use super::mock::MockBackend;
    use super::*;
    use crate::patlite::Patlite;

    const OFF: [u8; 9] = [0x00, 0x00, 0x00, 0x08, 0x0f, 0x01, 0x00, 0x00, 0x00];

    fn session(backend: &MockBackend) -> Session<MockBackend> {
        Session::new(backend.clone(), Box::new(Patlite))
    }

    #[test]
    fn opens_patlite_ids() {
        let backend = MockBackend::default();
        let mut session = session(&backend);

        session.open().unwrap();

        assert!(session.is_open());
        assert_eq!(backend.opened.get(), Some((0x191A, 0x6001)));
    }

    #[test]
    fn write_before_open() {
        let backend = MockBackend::default();
        let session = session(&backend);

        assert!(matches!(session.write(&OFF), Err(DeviceError::NotOpen)));
        assert!(backend.writes.borrow().is_empty());
    }

    #[test]
    fn open_failure_stays_closed() {
        let backend = MockBackend { absent: true, ..Default::default() };
        let mut session = session(&backend);

        assert!(matches!(session.open(), Err(DeviceError::NotFound(_))));
        assert!(!session.is_open());
        assert!(matches!(session.lights(Color::Red, Pattern::Continuous), Err(DeviceError::NotOpen)));
    }

    #[test]
    fn write_failure() {
        let backend = MockBackend::default();
        let mut session = session(&backend);
        session.open().unwrap();

        backend.fail_writes.set(true);

        assert!(matches!(session.write(&OFF), Err(DeviceError::WriteFailed(_))));
        assert!(session.is_open());
    }

    #[test]
    fn short_write_fails() {
        let backend = MockBackend::default();
        let mut session = session(&backend);
        session.open().unwrap();

        backend.short_writes.set(true);

        match session.write(&OFF) {
            Err(DeviceError::WriteFailed(HidError::IncompleteSendError { sent, all })) => {
                assert_eq!(sent, 8);
                assert_eq!(all, 9);
            },
            _ => panic!("short write was not reported"),
        }
    }

    #[test]
    fn lights_writes_full_command() {
        let backend = MockBackend::default();
        let mut session = session(&backend);
        session.open().unwrap();

        session.lights(Color::Red, Pattern::Continuous).unwrap();

        let writes = backend.writes.borrow();
        assert_eq!(*writes, vec![vec![0x00, 0x00, 0x00, 0x08, 0x0f, 0x11, 0x00, 0x00, 0x00]]);
    }

    #[test]
    fn close_is_idempotent() {
        let backend = MockBackend::default();
        let mut session = session(&backend);

        session.close();
        session.open().unwrap();
        session.close();
        session.close();

        assert!(!session.is_open());
        assert!(matches!(session.write(&OFF), Err(DeviceError::NotOpen)));
    }

    #[test]
    fn reopen_after_close() {
        let backend = MockBackend::default();
        let mut session = session(&backend);

        session.open().unwrap();
        session.close();
        session.open().unwrap();

        assert!(session.is_open());
    }

    #[test]
    fn shutdown_turns_light_off() {
        let backend = MockBackend::default();
        let mut session = session(&backend);
        session.open().unwrap();

        session.shutdown();

        assert_eq!(*backend.writes.borrow(), vec![OFF.to_vec()]);
        assert!(!session.is_open());
    }
}
