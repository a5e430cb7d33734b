//! Socket activation handoff.
//!
//! A supervising process manager (systemd and compatible) can open the
//! listening socket itself and pass it down. The protocol:
//!
//! - `LISTEN_PID` holds the pid the sockets are meant for
//! - `LISTEN_FDS` holds how many descriptors were passed
//! - descriptors are numbered consecutively from 3
//!
//! Variables addressed to another pid, or unparsable, mean "nothing inherited".

use std::env;

/// First descriptor passed by the process manager.
pub const LISTEN_FDS_START: i32 = 3;

const LISTEN_PID: &str = "LISTEN_PID";
const LISTEN_FDS: &str = "LISTEN_FDS";
const LISTEN_FDNAMES: &str = "LISTEN_FDNAMES";

/// Socket activation variables as found at startup.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActivationEnv {
    pub listen_pid: Option<String>,
    pub listen_fds: Option<String>,
}

impl ActivationEnv {
    /// Read the activation variables and remove them from the environment, so
    /// that child processes do not mistake the sockets for their own.
    pub fn take_from_process() -> Self {
        let taken = Self {
            listen_pid: env::var(LISTEN_PID).ok(),
            listen_fds: env::var(LISTEN_FDS).ok(),
        };
        env::remove_var(LISTEN_PID);
        env::remove_var(LISTEN_FDS);
        env::remove_var(LISTEN_FDNAMES);
        taken
    }

    /// Number of sockets handed to process `pid`.
    pub fn inherited_count(&self, pid: u32) -> usize {
        let (Some(listen_pid), Some(listen_fds)) = (&self.listen_pid, &self.listen_fds) else {
            return 0;
        };

        match listen_pid.trim().parse::<u32>() {
            Ok(target) if target == pid => {}
            Ok(target) => {
                tracing::debug!(target_pid = target, pid, "socket activation meant for another process");
                return 0;
            }
            Err(e) => {
                tracing::warn!(value = %listen_pid, error = %e, "ignoring malformed LISTEN_PID");
                return 0;
            }
        }

        match listen_fds.trim().parse::<usize>() {
            Ok(count) => count,
            Err(e) => {
                tracing::warn!(value = %listen_fds, error = %e, "ignoring malformed LISTEN_FDS");
                0
            }
        }
    }
}
