//! Bluetooth RFCOMM printer
//!
//! Paired printers are exposed by the kernel as serial devices once bound:
//!
//! ```bash
//! $ bluetoothctl pair 00:11:62:XX:XX:XX
//! $ sudo rfcomm bind 0 00:11:62:XX:XX:XX   # creates /dev/rfcomm0
//! ```
//!
//! The configured address may be the device path itself or the printer's
//! MAC address, in which case the bound `/dev/rfcommN` is looked up in
//! `/proc/net/rfcomm`.
//!
//! The device is switched to raw tty mode so ESC/POS bytes pass through
//! unmodified, and large payloads are written in chunks to avoid overflowing
//! the printer's Bluetooth buffer.

use crate::error::{PrintError, PrintResult};
use crate::printer::Printer;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;
use tracing::{info, instrument};

/// Default chunk size for writes (bytes)
const CHUNK_SIZE: usize = 4096;

/// Delay between chunks
const CHUNK_DELAY: Duration = Duration::from_millis(2);

/// Bluetooth printer bound to an RFCOMM device
#[derive(Debug, Clone)]
pub struct BluetoothPrinter {
    device: String,
}

impl BluetoothPrinter {
    /// Create from an RFCOMM device path or a MAC address
    pub fn new(device: &str) -> PrintResult<Self> {
        let device = device.trim();
        if !device.starts_with('/') && !is_valid_mac(device) {
            return Err(PrintError::InvalidConfig(format!(
                "Bluetooth printer needs an RFCOMM device path or MAC address, got '{}'",
                device
            )));
        }
        Ok(Self {
            device: device.to_string(),
        })
    }

    /// Configured device (path or MAC)
    pub fn device(&self) -> &str {
        &self.device
    }

    /// Resolve the configured device to a path
    pub fn resolve_path(&self) -> PrintResult<PathBuf> {
        if self.device.starts_with('/') {
            return Ok(PathBuf::from(&self.device));
        }

        let table = fs::read_to_string("/proc/net/rfcomm").map_err(|e| {
            PrintError::Device(format!("Cannot read RFCOMM bindings: {}", e))
        })?;

        find_rfcomm_binding(&table, &self.device)
            .ok_or_else(|| PrintError::Device(format!("No RFCOMM binding for {}", self.device)))
    }

    /// Resolve the device and write on the calling thread
    ///
    /// Blocks until every chunk has been written.
    pub fn print_blocking(&self, data: &[u8]) -> PrintResult<()> {
        let path = self.resolve_path()?;
        Self::write_blocking(&path, data)
    }

    fn write_blocking(path: &Path, data: &[u8]) -> PrintResult<()> {
        let mut file = open_raw(path)?;

        for chunk in data.chunks(CHUNK_SIZE) {
            file.write_all(chunk)
                .map_err(|e| PrintError::Device(format!("Write failed: {}", e)))?;
            if data.len() > CHUNK_SIZE {
                thread::sleep(CHUNK_DELAY);
            }
        }

        file.flush()
            .map_err(|e| PrintError::Device(format!("Flush failed: {}", e)))?;
        Ok(())
    }
}

impl Printer for BluetoothPrinter {
    #[instrument(skip(data), fields(device = %self.device, data_len = data.len()))]
    async fn print(&self, data: &[u8]) -> PrintResult<()> {
        let printer = self.clone();
        let data = data.to_vec();

        tokio::task::spawn_blocking(move || printer.print_blocking(&data))
            .await
            .map_err(|e| PrintError::Device(format!("Task join failed: {}", e)))??;

        info!("Print job sent successfully");
        Ok(())
    }

    async fn is_online(&self) -> bool {
        match self.resolve_path() {
            Ok(path) => tokio::fs::metadata(path).await.is_ok(),
            Err(_) => false,
        }
    }
}

/// Validate a Bluetooth MAC address format (XX:XX:XX:XX:XX:XX)
pub fn is_valid_mac(mac: &str) -> bool {
    let parts: Vec<&str> = mac.split(':').collect();
    parts.len() == 6
        && parts
            .iter()
            .all(|part| part.len() == 2 && part.chars().all(|c| c.is_ascii_hexdigit()))
}

/// Find the device bound to `mac` in `/proc/net/rfcomm` content
///
/// Line format: `rfcomm0: 00:11:62:AA:BB:CC channel 1 clean`
fn find_rfcomm_binding(table: &str, mac: &str) -> Option<PathBuf> {
    let mac_upper = mac.to_uppercase();
    table
        .lines()
        .filter(|line| line.to_uppercase().contains(&mac_upper))
        .find_map(|line| line.split(':').next())
        .map(|name| PathBuf::from(format!("/dev/{}", name.trim())))
}

fn open_raw(path: &Path) -> PrintResult<File> {
    let file = OpenOptions::new()
        .write(true)
        .open(path)
        .map_err(|e| PrintError::Device(format!("Failed to open {}: {}", path.display(), e)))?;

    configure_tty_raw(&file)?;
    Ok(file)
}

/// Switch the RFCOMM tty to raw mode
///
/// XON/XOFF must be off: 0x11 and 0x13 can appear in ticket data.
/// Regular files (used in tests) are not ttys and are left alone.
#[cfg(unix)]
fn configure_tty_raw(file: &File) -> PrintResult<()> {
    use std::mem::MaybeUninit;
    use std::os::unix::io::AsRawFd;

    let fd = file.as_raw_fd();
    if unsafe { libc::isatty(fd) } != 1 {
        return Ok(());
    }

    let mut termios = MaybeUninit::uninit();
    if unsafe { libc::tcgetattr(fd, termios.as_mut_ptr()) } != 0 {
        return Err(PrintError::Device(format!(
            "tcgetattr failed: {}",
            std::io::Error::last_os_error()
        )));
    }
    let mut termios = unsafe { termios.assume_init() };

    termios.c_iflag &= !(libc::IGNBRK
        | libc::BRKINT
        | libc::PARMRK
        | libc::ISTRIP
        | libc::INLCR
        | libc::IGNCR
        | libc::ICRNL
        | libc::IXON
        | libc::IXOFF
        | libc::IXANY);
    termios.c_oflag &= !libc::OPOST;
    termios.c_lflag &= !(libc::ECHO | libc::ECHONL | libc::ICANON | libc::ISIG | libc::IEXTEN);
    termios.c_cflag &= !(libc::CSIZE | libc::PARENB);
    termios.c_cflag |= libc::CS8;

    if unsafe { libc::tcsetattr(fd, libc::TCSANOW, &termios) } != 0 {
        return Err(PrintError::Device(format!(
            "tcsetattr failed: {}",
            std::io::Error::last_os_error()
        )));
    }
    Ok(())
}

#[cfg(not(unix))]
fn configure_tty_raw(_file: &File) -> PrintResult<()> {
    Ok(())
}
