//! Ask the terminal how large one character cell is in pixels.
//!
//! `CSI 14 t` reports the text area in pixels (`CSI 4 ; height ; width t`)
//! and `CSI 18 t` in cells (`CSI 8 ; rows ; columns t`). Terminals that don't
//! answer within half a second get [`CellSize::FALLBACK`].

use std::io::IsTerminal;
use std::time::Duration;

const QUERY_TIMEOUT: Duration = Duration::from_millis(500);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CellSize {
    pub width: u32,
    pub height: u32,
}

impl CellSize {
    pub const FALLBACK: CellSize = CellSize {
        width: 10,
        height: 20,
    };
}

/// Cell size of the controlling terminal, or the fallback.
pub fn query() -> CellSize {
    if !std::io::stdin().is_terminal() || !std::io::stdout().is_terminal() {
        log::debug!("not a terminal, using fallback cell size");
        return CellSize::FALLBACK;
    }
    match query_terminal() {
        Some(size) => {
            log::debug!("terminal cell size {}x{}", size.width, size.height);
            size
        }
        None => {
            log::debug!("no usable cell size report, using fallback");
            CellSize::FALLBACK
        }
    }
}

/// Numeric fields of a `CSI Ps ; ... t` report.
pub fn parse_report(report: &[u8]) -> Option<Vec<u32>> {
    let start = report.iter().position(|&b| b == b'[')? + 1;
    let end = start + report[start..].iter().position(|&b| b == b't')?;
    std::str::from_utf8(&report[start..end])
        .ok()?
        .split(';')
        .map(|field| field.parse().ok())
        .collect()
}

/// Combine the pixel report (`4;h;w`) and the cell report (`8;rows;cols`).
pub fn cell_size_from_reports(pixels: &[u32], cells: &[u32]) -> Option<CellSize> {
    let [_, height, width] = pixels else {
        return None;
    };
    let [_, rows, columns] = cells else {
        return None;
    };
    if *rows == 0 || *columns == 0 {
        return None;
    }
    let size = CellSize {
        width: width / columns,
        height: height / rows,
    };
    (size.width > 0 && size.height > 0).then_some(size)
}

#[cfg(unix)]
fn query_terminal() -> Option<CellSize> {
    use std::os::fd::AsRawFd;

    let fd = std::io::stdin().as_raw_fd();
    let _raw = match raw::RawMode::enable(fd) {
        Ok(guard) => guard,
        Err(e) => {
            log::debug!("cannot switch terminal to raw mode: {e}");
            return None;
        }
    };
    let pixels = raw::report(fd, b"\x1b[14t", QUERY_TIMEOUT)?;
    let cells = raw::report(fd, b"\x1b[18t", QUERY_TIMEOUT)?;
    cell_size_from_reports(&parse_report(&pixels)?, &parse_report(&cells)?)
}

#[cfg(not(unix))]
fn query_terminal() -> Option<CellSize> {
    None
}

#[cfg(unix)]
mod raw {
    use std::io::{self, Write};
    use std::os::fd::RawFd;
    use std::time::{Duration, Instant};

    /// Non-canonical, no-echo terminal mode; the previous mode comes back on drop.
    pub struct RawMode {
        fd: RawFd,
        saved: libc::termios,
    }

    impl RawMode {
        pub fn enable(fd: RawFd) -> io::Result<Self> {
            let mut saved = std::mem::MaybeUninit::<libc::termios>::uninit();
            // SAFETY: tcgetattr fills the struct when it returns 0.
            let saved = unsafe {
                if libc::tcgetattr(fd, saved.as_mut_ptr()) != 0 {
                    return Err(io::Error::last_os_error());
                }
                saved.assume_init()
            };

            let mut raw = saved;
            raw.c_iflag = 0;
            // ISIG off as well: a Ctrl-C during the query must not kill us
            // before the old mode is restored.
            raw.c_lflag &= !(libc::ECHO | libc::ICANON | libc::ISIG | libc::IEXTEN);
            // SAFETY: raw is a valid termios copied from the terminal.
            if unsafe { libc::tcsetattr(fd, libc::TCSANOW, &raw) } != 0 {
                return Err(io::Error::last_os_error());
            }
            Ok(Self { fd, saved })
        }
    }

    impl Drop for RawMode {
        fn drop(&mut self) {
            // SAFETY: restores the termios read in `enable`.
            unsafe {
                libc::tcsetattr(self.fd, libc::TCSAFLUSH, &self.saved);
            }
        }
    }

    /// Send `query` and collect the reply up to its final `t`.
    pub fn report(fd: RawFd, query: &[u8], timeout: Duration) -> Option<Vec<u8>> {
        let mut stdout = io::stdout();
        stdout.write_all(query).ok()?;
        stdout.flush().ok()?;

        let deadline = Instant::now() + timeout;
        let mut reply = Vec::new();
        let mut buf = [0u8; 1024];
        while !reply.ends_with(b"t") {
            let left = deadline.saturating_duration_since(Instant::now());
            if left.is_zero() || !readable(fd, left) {
                log::debug!("terminal report timed out after {} bytes", reply.len());
                return None;
            }
            // SAFETY: buf is valid for buf.len() bytes.
            let n = unsafe { libc::read(fd, buf.as_mut_ptr().cast(), buf.len()) };
            if n <= 0 {
                return None;
            }
            reply.extend_from_slice(&buf[..n as usize]);
        }
        Some(reply)
    }

    fn readable(fd: RawFd, timeout: Duration) -> bool {
        let mut pfd = libc::pollfd {
            fd,
            events: libc::POLLIN,
            revents: 0,
        };
        let millis = timeout.as_millis().min(i32::MAX as u128) as libc::c_int;
        // SAFETY: one valid pollfd.
        let ready = unsafe { libc::poll(&mut pfd, 1, millis) };
        ready > 0 && pfd.revents & libc::POLLIN != 0
    }
}
