//! FFT accelerator character device client
//!
//! The accelerator exposes one ioctl that fills a frame struct with the
//! current magnitude vector, a monotonic sample counter, and a validity
//! flag. The driver handshakes with the hardware internally; userspace
//! sees a blocking request per sample at `SAMPLING_FREQ /
//! DOWN_SAMPLING_FACTOR` columns per second.

use std::ffi::CString;
use std::os::unix::io::RawFd;

use crate::core::types::LyreResult;
use crate::spectrogram::Spectrogram;

// device parameters

pub const DEVICE_PATH: &str = "/dev/fft_accelerator";

/// Magnitude bins per frame, one side of the 512-point hardware FFT
pub const N_FREQUENCIES: usize = 256;

pub const SAMPLING_FREQ: u32 = 48_000;

/// Input samples consumed per delivered frame
pub const DOWN_SAMPLING_FACTOR: u32 = 512;

/// Fractional bits of the fixed-point amplitude format
pub const AMPL_FRACTIONAL_BITS: u32 = 7;

const IOCTL_MAGIC: u8 = b'q';

/// `_IOR(IOCTL_MAGIC, 2, fft_frame_arg *)`
const READ_FFT: u64 = ior(IOCTL_MAGIC, 2, std::mem::size_of::<*mut FftFrame>());

/// Linux asm-generic `_IOR` encoding
const fn ior(ty: u8, nr: u8, size: usize) -> u64 {
    const IOC_READ: u64 = 2;
    (IOC_READ << 30) | ((size as u64) << 16) | ((ty as u64) << 8) | nr as u64
}

/// ioctl argument, layout shared with the driver
#[repr(C)]
struct FftFrame {
    ampl: [i32; N_FREQUENCIES],
    time: u32,
    valid: u8,
}

#[repr(C)]
struct FftFrameArg {
    // written here, read by the driver
    #[allow(dead_code)]
    frame: *mut FftFrame,
}

/// Convert a fixed-point amplitude to float
pub fn ampl_to_float(fixed: i32) -> f32 {
    fixed as f32 / (1 << AMPL_FRACTIONAL_BITS) as f32
}

/// Spectrogram columns produced in `secs` seconds of capture
pub fn secs_to_columns(secs: f32) -> u32 {
    (secs * (SAMPLING_FREQ / DOWN_SAMPLING_FACTOR) as f32) as u32
}

/// One device read
pub enum Frame {
    /// A real sample: hardware counter plus converted magnitudes
    Sample { time: u32, ampl: Vec<f32> },
    /// The hardware handshake failed; nothing usable was read
    Dropped,
}

/// Open handle to the accelerator device
pub struct FftAccelerator {
    fd: RawFd,
}

impl FftAccelerator {
    /// Open the accelerator at its conventional path
    pub fn open() -> LyreResult<Self> {
        Self::open_path(DEVICE_PATH)
    }

    pub fn open_path(path: &str) -> LyreResult<Self> {
        let c_path =
            CString::new(path).map_err(|_| format!("device path contains NUL: {:?}", path))?;
        let fd = unsafe { libc::open(c_path.as_ptr(), libc::O_RDWR) };
        if fd < 0 {
            return Err(format!(
                "could not open {}: {}",
                path,
                std::io::Error::last_os_error()
            ));
        }
        Ok(FftAccelerator { fd })
    }

    /// Issue one blocking sample request
    ///
    /// An ioctl error means the driver exhausted its retries; the caller
    /// should treat it as end of stream.
    pub fn read_frame(&self) -> LyreResult<Frame> {
        let mut frame = FftFrame {
            ampl: [0; N_FREQUENCIES],
            time: 0,
            valid: 0,
        };
        let mut arg = FftFrameArg { frame: &mut frame };

        let ret = unsafe { libc::ioctl(self.fd, READ_FFT as _, &mut arg as *mut FftFrameArg) };
        if ret != 0 {
            return Err(format!(
                "ioctl(READ_FFT) failed: {}",
                std::io::Error::last_os_error()
            ));
        }
        if frame.valid == 0 {
            return Ok(Frame::Dropped);
        }

        let ampl = frame.ampl.iter().map(|&a| ampl_to_float(a)).collect();
        Ok(Frame::Sample {
            time: frame.time,
            ampl,
        })
    }

    /// Capture for `secs` seconds
    ///
    /// Dropped frames are skipped, not padded, so the result can be
    /// shorter than the nominal column count; an ioctl error ends the
    /// capture with whatever was collected.
    pub fn record(&self, secs: f32) -> Spectrogram {
        let columns = secs_to_columns(secs);
        let mut spec = Spectrogram::new(N_FREQUENCIES);
        let mut dropped = 0u32;

        for _ in 0..columns {
            match self.read_frame() {
                Ok(Frame::Sample { ampl, .. }) => {
                    // length is N_FREQUENCIES by construction
                    let _ = spec.push_column(ampl);
                }
                Ok(Frame::Dropped) => dropped += 1,
                Err(e) => {
                    log::warn!("capture ended early: {}", e);
                    break;
                }
            }
        }

        if dropped > 0 {
            log::debug!("capture dropped {} of {} frames", dropped, columns);
        }
        spec
    }
}

impl Drop for FftAccelerator {
    fn drop(&mut self) {
        unsafe {
            libc::close(self.fd);
        }
    }
}

// tests
