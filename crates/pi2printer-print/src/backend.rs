// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Hardware access for USB thermal printers.
//
// On Linux the kernel `usblp` driver exposes each USB printer class device
// as a character device (`/dev/usb/lpN`) and describes it under
// `/sys/class/usbmisc/lpN`.  We map a vendor/product pair to its device node
// through sysfs and then write raw ESC/POS bytes to the node.  No libusb,
// no claiming interfaces. The kernel driver owns the device.

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::mpsc;
use std::time::Duration;

use thiserror::Error;
use tracing::debug;

use pi2printer_core::types::DeviceDescriptor;

/// Why a printer could not be reached.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProbeError {
    #[error("not present")]
    Absent,

    #[error("permission denied")]
    PermissionDenied,

    #[error("claimed by another process")]
    Claimed,

    #[error("probe timed out after {0:?}")]
    TimedOut(Duration),

    #[error("{0}")]
    Other(String),
}

impl ProbeError {
    /// Classify an OS error from opening a device node.
    pub fn from_io(err: &io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::NotFound => Self::Absent,
            io::ErrorKind::PermissionDenied => Self::PermissionDenied,
            io::ErrorKind::ResourceBusy => Self::Claimed,
            // ENODEV / ENXIO: node exists but the printer is unplugged.
            _ if matches!(err.raw_os_error(), Some(6) | Some(19)) => Self::Absent,
            _ => Self::Other(err.to_string()),
        }
    }
}

/// An open connection to a printer.
pub trait DeviceLink: Send {
    /// Send raw bytes to the printer.
    fn write_bytes(&mut self, bytes: &[u8]) -> io::Result<()>;

    /// Whether the printer has an auto-cutter.
    fn supports_cut(&self) -> bool {
        true
    }

    /// Whether the printer honours bold and justification commands.
    fn supports_styling(&self) -> bool {
        true
    }

    /// Release the connection. Called at most once.
    fn close(&mut self) {}
}

/// Something that can open printers by USB identity.
pub trait DeviceBackend: Send + Sync {
    fn open(&self, device: &DeviceDescriptor) -> Result<Box<dyn DeviceLink>, ProbeError>;
}

/// Open `device`, giving up after `timeout`.
///
/// The open runs on a helper thread so a wedged driver cannot stall
/// resolution. A thread that outlives the timeout is left to finish on its
/// own; its link, if any, is dropped.
pub fn open_with_timeout(
    backend: &Arc<dyn DeviceBackend>,
    device: &DeviceDescriptor,
    timeout: Duration,
) -> Result<Box<dyn DeviceLink>, ProbeError> {
    let (tx, rx) = mpsc::channel();
    let backend = Arc::clone(backend);
    let target = *device;
    std::thread::Builder::new()
        .name(format!("probe-{}", device.usb_id()))
        .spawn(move || {
            let _ = tx.send(backend.open(&target));
        })
        .map_err(|e| ProbeError::Other(format!("spawn probe thread: {e}")))?;

    match rx.recv_timeout(timeout) {
        Ok(result) => result,
        Err(mpsc::RecvTimeoutError::Timeout) => Err(ProbeError::TimedOut(timeout)),
        Err(mpsc::RecvTimeoutError::Disconnected) => {
            Err(ProbeError::Other("probe thread exited without a result".into()))
        }
    }
}

/// Non-destructive reachability check: open, then close without writing.
pub fn probe(
    backend: &Arc<dyn DeviceBackend>,
    device: &DeviceDescriptor,
    timeout: Duration,
) -> Result<(), ProbeError> {
    let mut link = open_with_timeout(backend, device, timeout)?;
    link.close();
    Ok(())
}

// -- usblp backend ----------------------------------------------------------

/// Linux `usblp` character-device backend.
#[derive(Debug, Clone)]
pub struct UsbLpBackend {
    device_dir: PathBuf,
    sysfs_dir: PathBuf,
}

impl Default for UsbLpBackend {
    fn default() -> Self {
        Self::new("/dev/usb", "/sys/class/usbmisc")
    }
}

impl UsbLpBackend {
    pub fn new(device_dir: impl Into<PathBuf>, sysfs_dir: impl Into<PathBuf>) -> Self {
        Self {
            device_dir: device_dir.into(),
            sysfs_dir: sysfs_dir.into(),
        }
    }

    /// Find the `/dev/usb/lpN` node for a vendor/product pair.
    fn find_node(&self, device: &DeviceDescriptor) -> Result<PathBuf, ProbeError> {
        let entries = std::fs::read_dir(&self.sysfs_dir).map_err(|e| ProbeError::from_io(&e))?;
        for entry in entries.flatten() {
            let name = entry.file_name();
            let Some(name) = name.to_str() else { continue };
            if !name.starts_with("lp") {
                continue;
            }
            // lpN/device points at the USB interface; the ids live on its parent.
            let Ok(interface) = std::fs::canonicalize(entry.path().join("device")) else {
                continue;
            };
            let Some(usb_device) = interface.parent() else { continue };
            let ids = (
                read_hex_id(&usb_device.join("idVendor")),
                read_hex_id(&usb_device.join("idProduct")),
            );
            if ids == (Some(device.vendor_id), Some(device.product_id)) {
                debug!(device = %device, node = name, "matched usblp node");
                return Ok(self.device_dir.join(name));
            }
        }
        Err(ProbeError::Absent)
    }
}

impl DeviceBackend for UsbLpBackend {
    fn open(&self, device: &DeviceDescriptor) -> Result<Box<dyn DeviceLink>, ProbeError> {
        let node = self.find_node(device)?;
        let file = OpenOptions::new()
            .write(true)
            .open(&node)
            .map_err(|e| ProbeError::from_io(&e))?;
        Ok(Box::new(UsbLpLink {
            file: Some(file),
            node,
        }))
    }
}

fn read_hex_id(path: &Path) -> Option<u16> {
    let text = std::fs::read_to_string(path).ok()?;
    u16::from_str_radix(text.trim(), 16).ok()
}

/// An open usblp device node.
struct UsbLpLink {
    file: Option<File>,
    node: PathBuf,
}

impl DeviceLink for UsbLpLink {
    fn write_bytes(&mut self, bytes: &[u8]) -> io::Result<()> {
        let file = self.file.as_mut().ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotConnected,
                format!("{} is closed", self.node.display()),
            )
        })?;
        file.write_all(bytes)?;
        file.flush()
    }

    fn close(&mut self) {
        self.file = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Lay out a fake sysfs + /dev tree with one printer at lp0.
    fn fake_tree(vid: &str, pid: &str) -> (tempfile::TempDir, UsbLpBackend) {
        let root = tempfile::tempdir().unwrap();
        let sysfs = root.path().join("sys");
        let dev = root.path().join("dev");
        let usb_device = sysfs.join("lp0");
        std::fs::create_dir_all(usb_device.join("device")).unwrap();
        std::fs::write(usb_device.join("idVendor"), format!("{vid}\n")).unwrap();
        std::fs::write(usb_device.join("idProduct"), format!("{pid}\n")).unwrap();
        std::fs::create_dir_all(&dev).unwrap();
        std::fs::write(dev.join("lp0"), b"").unwrap();
        let backend = UsbLpBackend::new(&dev, &sysfs);
        (root, backend)
    }

    #[test]
    fn opens_matching_node_and_writes() {
        let (root, backend) = fake_tree("04b8", "0e15");
        let device = DeviceDescriptor::new(0x04b8, 0x0e15, "Epson TM-T20");
        let mut link = backend.open(&device).expect("open");
        link.write_bytes(b"hello").unwrap();
        link.close();
        assert!(link.write_bytes(b"again").is_err());

        let written = std::fs::read(root.path().join("dev").join("lp0")).unwrap();
        assert_eq!(written, b"hello");
    }

    #[test]
    fn unknown_ids_are_absent() {
        let (_root, backend) = fake_tree("04b8", "0e15");
        let device = DeviceDescriptor::new(0x0519, 0x0001, "Star TSP100");
        assert_eq!(backend.open(&device).err(), Some(ProbeError::Absent));
    }

    #[test]
    fn missing_sysfs_is_absent() {
        let backend = UsbLpBackend::new("/nonexistent/dev", "/nonexistent/sys");
        let device = DeviceDescriptor::new(0x04b8, 0x0e15, "Epson TM-T20");
        assert_eq!(backend.open(&device).err(), Some(ProbeError::Absent));
    }

    #[test]
    fn io_errors_are_classified() {
        let busy = io::Error::from(io::ErrorKind::ResourceBusy);
        assert_eq!(ProbeError::from_io(&busy), ProbeError::Claimed);
        let denied = io::Error::from(io::ErrorKind::PermissionDenied);
        assert_eq!(ProbeError::from_io(&denied), ProbeError::PermissionDenied);
        let no_device = io::Error::from_raw_os_error(19);
        assert_eq!(ProbeError::from_io(&no_device), ProbeError::Absent);
    }

    struct StuckBackend;

    impl DeviceBackend for StuckBackend {
        fn open(&self, _device: &DeviceDescriptor) -> Result<Box<dyn DeviceLink>, ProbeError> {
            std::thread::sleep(Duration::from_secs(5));
            Err(ProbeError::Absent)
        }
    }

    #[test]
    fn probe_is_bounded_by_timeout() {
        let backend: Arc<dyn DeviceBackend> = Arc::new(StuckBackend);
        let device = DeviceDescriptor::new(0x04b8, 0x0e15, "Epson TM-T20");
        let timeout = Duration::from_millis(50);
        assert_eq!(
            probe(&backend, &device, timeout),
            Err(ProbeError::TimedOut(timeout))
        );
    }
}
