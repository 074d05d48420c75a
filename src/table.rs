extern crate nix;

use nix::sys::signal::{self, Signal};
use nix::unistd::Pid;
use tracing::{info, warn};

use crate::error::ShellError;

pub const MAX_PROCESSES: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcessEntry {
    pub pid: Pid,
    slot: usize,
}

impl ProcessEntry {
    pub fn slot(&self) -> usize {
        self.slot
    }
}

/// Fixed-capacity registry of spawned children.
///
/// Entries are only released by `terminate_all`; a child that was awaited in
/// the foreground keeps its slot until then.
#[derive(Debug, Default)]
pub struct ProcessTable {
    slots: [Option<ProcessEntry>; MAX_PROCESSES],
}

impl ProcessTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `pid` in the first free slot. A full table is left untouched.
    pub fn register(&mut self, pid: Pid) -> Result<usize, ShellError> {
        let slot = match self.slots.iter().position(Option::is_none) {
            Some(slot) => slot,
            None => return Err(ShellError::TableFull(pid)),
        };
        self.slots[slot] = Some(ProcessEntry { pid, slot });
        info!(pid = pid.as_raw(), slot, "registered process");
        Ok(slot)
    }

    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(Option::is_none)
    }

    pub fn len(&self) -> usize {
        self.entries().count()
    }

    pub fn entries(&self) -> impl Iterator<Item = &ProcessEntry> {
        self.slots.iter().flatten()
    }

    /// Sends SIGKILL to every tracked child and empties the table. The
    /// children are not reaped. Returns the signalled pids in slot order.
    pub fn terminate_all(&mut self) -> Vec<Pid> {
        self.terminate_with(|pid| signal::kill(pid, Signal::SIGKILL))
    }

    pub(crate) fn terminate_with<F>(&mut self, mut kill: F) -> Vec<Pid>
    where
        F: FnMut(Pid) -> nix::Result<()>,
    {
        let mut signalled = Vec::new();
        for slot in self.slots.iter_mut() {
            if let Some(entry) = slot.take() {
                match kill(entry.pid) {
                    Ok(()) => info!(
                        pid = entry.pid.as_raw(),
                        slot = entry.slot(),
                        "killed process"
                    ),
                    Err(e) => warn!(pid = entry.pid.as_raw(), error = %e, "kill failed"),
                }
                signalled.push(entry.pid);
            }
        }
        signalled
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::os::unix::process::ExitStatusExt;
    use std::process::Command;

    fn pid(n: i32) -> Pid {
        Pid::from_raw(n)
    }

    #[test]
    fn test_register_fills_slots_in_order() {
        let mut table = ProcessTable::new();
        for i in 0..MAX_PROCESSES {
            assert_eq!(table.register(pid(100 + i as i32)).unwrap(), i);
        }
        assert_eq!(table.len(), MAX_PROCESSES);
        let slots: Vec<_> = table.entries().map(|e| e.slot()).collect();
        assert_eq!(slots, (0..MAX_PROCESSES).collect::<Vec<_>>());
    }

    #[test]
    fn test_full_table_rejects_without_mutation() {
        let mut table = ProcessTable::new();
        for i in 0..MAX_PROCESSES {
            table.register(pid(100 + i as i32)).unwrap();
        }
        let before: Vec<_> = table.entries().copied().collect();
        match table.register(pid(999)) {
            Err(ShellError::TableFull(p)) => assert_eq!(p, pid(999)),
            other => panic!("expected TableFull, got {:?}", other),
        }
        let after: Vec<_> = table.entries().copied().collect();
        assert_eq!(before, after);
    }

    #[test]
    fn test_slots_are_reused_after_clear() {
        let mut table = ProcessTable::new();
        table.register(pid(1)).unwrap();
        table.register(pid(2)).unwrap();
        table.terminate_with(|_| Ok(()));
        assert!(table.is_empty());
        assert_eq!(table.register(pid(3)).unwrap(), 0);
    }

    #[test]
    fn test_terminate_all_on_empty_table_sends_nothing() {
        let mut table = ProcessTable::new();
        let mut calls = 0;
        let signalled = table.terminate_with(|_| {
            calls += 1;
            Ok(())
        });
        assert_eq!(calls, 0);
        assert!(signalled.is_empty());
        assert!(table.is_empty());
    }

    #[test]
    fn test_terminate_signals_each_pid_once() {
        let mut table = ProcessTable::new();
        for n in &[11, 12, 13] {
            table.register(pid(*n)).unwrap();
        }
        let mut seen = Vec::new();
        let signalled = table.terminate_with(|p| {
            seen.push(p);
            Ok(())
        });
        assert_eq!(seen, vec![pid(11), pid(12), pid(13)]);
        assert_eq!(signalled, seen);
        assert!(table.is_empty());
        assert_eq!(table.len(), 0);
    }

    #[test]
    fn test_failed_kill_still_clears_slot() {
        let mut table = ProcessTable::new();
        table.register(pid(21)).unwrap();
        table.terminate_with(|_| Err(nix::Error::Sys(nix::errno::Errno::ESRCH)));
        assert!(table.is_empty());
    }

    #[test]
    fn test_terminate_all_kills_real_child() {
        let mut child = Command::new("sleep").arg("30").spawn().unwrap();
        let mut table = ProcessTable::new();
        table.register(Pid::from_raw(child.id() as i32)).unwrap();

        let signalled = table.terminate_all();
        assert_eq!(signalled.len(), 1);

        // the table does not reap, so collect the child here
        let status = child.wait().unwrap();
        assert_eq!(status.signal(), Some(libc::SIGKILL));
    }
}
