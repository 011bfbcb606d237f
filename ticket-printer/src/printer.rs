//! Printer adapters for sending ESC/POS data
//!
//! Supports:
//! - Network printers (raw TCP, port 9100)
//! - USB printers (device file or OS print queue)
//!
//! Bluetooth lives in [`crate::bluetooth`].

use crate::error::{PrintError, PrintResult};
use std::io::Write;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio::process::Command;
use tracing::{info, instrument, warn};

/// Trait for printer adapters
#[allow(async_fn_in_trait)]
pub trait Printer {
    /// Send raw ESC/POS data to the printer
    async fn print(&self, data: &[u8]) -> PrintResult<()>;

    /// Check if the printer is online/reachable
    async fn is_online(&self) -> bool;
}

/// Network printer (TCP port 9100)
///
/// Most thermal printers support raw TCP printing on port 9100.
/// Both the connect and the write are bounded by the same timeout.
#[derive(Debug, Clone)]
pub struct NetworkPrinter {
    addr: SocketAddr,
    timeout: Duration,
}

impl NetworkPrinter {
    /// Create a new network printer
    pub fn new(host: &str, port: u16) -> PrintResult<Self> {
        let addr_str = format!("{}:{}", host, port);
        Self::from_addr(&addr_str)
    }

    /// Create from a socket address string (e.g., "192.168.1.100:9100")
    pub fn from_addr(addr: &str) -> PrintResult<Self> {
        let addr: SocketAddr = addr
            .parse()
            .map_err(|_| PrintError::InvalidConfig(format!("Invalid address: {}", addr)))?;

        Ok(Self {
            addr,
            timeout: Duration::from_secs(5),
        })
    }

    /// Set connect/write timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Get the printer address
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Get the configured timeout
    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

impl Printer for NetworkPrinter {
    #[instrument(skip(data), fields(addr = %self.addr, data_len = data.len()))]
    async fn print(&self, data: &[u8]) -> PrintResult<()> {
        info!("Connecting to printer");

        let mut stream = tokio::time::timeout(self.timeout, TcpStream::connect(self.addr))
            .await
            .map_err(|_| PrintError::Timeout(format!("Connection timeout: {}", self.addr)))?
            .map_err(|e| PrintError::Connection(format!("{}: {}", self.addr, e)))?;

        info!("Connected, sending {} bytes", data.len());

        let write = async {
            stream.write_all(data).await?;
            stream.flush().await?;
            stream.shutdown().await
        };

        tokio::time::timeout(self.timeout, write)
            .await
            .map_err(|_| PrintError::Timeout(format!("Write timeout: {}", self.addr)))?
            .map_err(|e| {
                PrintError::Io(std::io::Error::new(
                    e.kind(),
                    format!("Write failed: {}", e),
                ))
            })?;

        info!("Print job sent successfully");
        Ok(())
    }

    #[instrument(fields(addr = %self.addr))]
    async fn is_online(&self) -> bool {
        let check_timeout = Duration::from_millis(500);

        match tokio::time::timeout(check_timeout, TcpStream::connect(self.addr)).await {
            Ok(Ok(_)) => {
                info!("Printer online");
                true
            }
            Ok(Err(e)) => {
                warn!(error = %e, "Printer offline");
                false
            }
            Err(_) => {
                warn!("Printer check timeout");
                false
            }
        }
    }
}

/// Where a USB printer receives its bytes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UsbTarget {
    /// Character device or file, e.g. `/dev/usb/lp0`
    Device(PathBuf),
    /// Print queue handed to `lp -o raw`
    Queue(String),
}

/// USB printer
///
/// An absolute path is written to directly; anything else is treated as
/// the name of an OS print queue.
#[derive(Debug, Clone)]
pub struct UsbPrinter {
    target: UsbTarget,
}

impl UsbPrinter {
    /// Create from a device path or print queue name
    pub fn new(device: &str) -> PrintResult<Self> {
        let device = device.trim();
        if device.is_empty() {
            return Err(PrintError::InvalidConfig(
                "USB printer requires a device path".to_string(),
            ));
        }

        let target = if device.starts_with('/') {
            UsbTarget::Device(PathBuf::from(device))
        } else {
            UsbTarget::Queue(device.to_string())
        };

        Ok(Self { target })
    }

    /// Get the resolved target
    pub fn target(&self) -> &UsbTarget {
        &self.target
    }

    /// Write to the device on the calling thread
    ///
    /// Blocks until the device has taken every byte. Queue targets are
    /// rejected; they go through [`Printer::print`].
    pub fn print_blocking(&self, data: &[u8]) -> PrintResult<()> {
        match &self.target {
            UsbTarget::Device(path) => Self::write_device(path, data),
            UsbTarget::Queue(queue) => Err(PrintError::InvalidConfig(format!(
                "print queue '{}' cannot be written synchronously",
                queue
            ))),
        }
    }

    fn write_device(path: &Path, data: &[u8]) -> PrintResult<()> {
        let mut file = std::fs::OpenOptions::new()
            .write(true)
            .open(path)
            .map_err(|e| PrintError::Device(format!("Failed to open {}: {}", path.display(), e)))?;

        file.write_all(data)
            .map_err(|e| PrintError::Device(format!("Write to {} failed: {}", path.display(), e)))?;
        file.flush()?;
        Ok(())
    }

    async fn submit_to_queue(queue: &str, data: &[u8]) -> PrintResult<()> {
        let mut child = Command::new("lp")
            .args(["-d", queue, "-o", "raw"])
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| PrintError::Device(format!("Failed to start lp: {}", e)))?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(data).await?;
            stdin.shutdown().await?;
        }

        let output = child.wait_with_output().await?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(PrintError::Device(format!(
                "lp exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }
        Ok(())
    }
}

impl Printer for UsbPrinter {
    #[instrument(skip(data), fields(target = ?self.target, data_len = data.len()))]
    async fn print(&self, data: &[u8]) -> PrintResult<()> {
        match &self.target {
            UsbTarget::Device(_) => {
                // File writes on device nodes block, keep them off the runtime
                let printer = self.clone();
                let data = data.to_vec();
                tokio::task::spawn_blocking(move || printer.print_blocking(&data))
                    .await
                    .map_err(|e| PrintError::Device(format!("Task join failed: {}", e)))??;
            }
            UsbTarget::Queue(queue) => Self::submit_to_queue(queue, data).await?,
        }

        info!("Print job sent successfully");
        Ok(())
    }

    async fn is_online(&self) -> bool {
        match &self.target {
            UsbTarget::Device(path) => tokio::fs::metadata(path).await.is_ok(),
            // Queue state is owned by the print system
            UsbTarget::Queue(_) => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncReadExt;
    use tokio::net::TcpListener;

    #[test]
    fn test_network_printer_new() {
        let printer = NetworkPrinter::new("192.168.1.100", 9100).unwrap();
        assert_eq!(printer.addr().port(), 9100);
        assert_eq!(printer.timeout(), Duration::from_secs(5));
    }

    #[test]
    fn test_network_printer_from_addr() {
        let printer = NetworkPrinter::from_addr("192.168.1.100:9100").unwrap();
        assert_eq!(printer.addr().port(), 9100);
    }

    #[test]
    fn test_invalid_addr() {
        let result = NetworkPrinter::from_addr("invalid");
        assert!(matches!(result, Err(PrintError::InvalidConfig(_))));
    }

    #[tokio::test]
    async fn test_network_print_delivers_bytes() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let server = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut received = Vec::new();
            socket.read_to_end(&mut received).await.unwrap();
            received
        });

        let printer = NetworkPrinter::from_addr(&addr.to_string()).unwrap();
        printer.print(b"\x1B@hello").await.unwrap();

        assert_eq!(server.await.unwrap(), b"\x1B@hello");
    }

    #[tokio::test]
    async fn test_network_print_refused() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let printer = NetworkPrinter::from_addr(&addr.to_string())
            .unwrap()
            .with_timeout(Duration::from_millis(500));
        let result = printer.print(b"data").await;
        assert!(result.is_err());
        assert!(!printer.is_online().await);
    }

    #[test]
    fn test_usb_target_resolution() {
        let device = UsbPrinter::new("/dev/usb/lp0").unwrap();
        assert_eq!(
            device.target(),
            &UsbTarget::Device(PathBuf::from("/dev/usb/lp0"))
        );

        let queue = UsbPrinter::new("EPSON_TM_T20").unwrap();
        assert_eq!(queue.target(), &UsbTarget::Queue("EPSON_TM_T20".to_string()));

        assert!(UsbPrinter::new("  ").is_err());
    }

    #[tokio::test]
    async fn test_usb_print_writes_device_file() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let path = file.path().to_str().unwrap().to_string();

        let printer = UsbPrinter::new(&path).unwrap();
        assert!(printer.is_online().await);
        printer.print(b"ticket").await.unwrap();

        assert_eq!(std::fs::read(file.path()).unwrap(), b"ticket");
    }

    #[test]
    fn test_usb_print_blocking() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let device = UsbPrinter::new(file.path().to_str().unwrap()).unwrap();
        device.print_blocking(b"ticket").unwrap();
        assert_eq!(std::fs::read(file.path()).unwrap(), b"ticket");

        let queue = UsbPrinter::new("EPSON_TM_T20").unwrap();
        assert!(matches!(
            queue.print_blocking(b"ticket"),
            Err(PrintError::InvalidConfig(_))
        ));
    }

    #[tokio::test]
    async fn test_usb_print_missing_device_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lp9");

        let printer = UsbPrinter::new(path.to_str().unwrap()).unwrap();
        assert!(!printer.is_online().await);
        let result = printer.print(b"ticket").await;
        assert!(matches!(result, Err(PrintError::Device(_))));
    }
}
