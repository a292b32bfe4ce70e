//! Process memory sampling.
//!
//! | Platform        | Source                         | Meaning             |
//! |-----------------|--------------------------------|---------------------|
//! | Linux           | `/proc/self/statm` resident    | current RSS         |
//! | other Unix      | `getrusage` `ru_maxrss`        | peak RSS (upper bound) |
//! | Windows         | `K32GetProcessMemoryInfo`      | current working set |
//!
//! Peak RSS can only overestimate current usage, so the guard errs on the
//! side of stopping early there.
//!
//! `current_virtual_memory` is the counterpart of `process_memory_ceiling`:
//! an address-space limit has to be compared against address-space usage
//! (statm size on Linux, commit charge on Windows), never against RSS.

/// Current resident memory of this process in bytes, if the platform reports it.
#[cfg(target_os = "linux")]
pub fn current_memory_usage() -> Option<u64> {
    let statm = std::fs::read_to_string("/proc/self/statm").ok()?;
    let resident_pages: u64 = statm.split_whitespace().nth(1)?.parse().ok()?;
    // SAFETY: sysconf has no memory-safety preconditions.
    let page = unsafe { libc::sysconf(libc::_SC_PAGESIZE) };
    if page <= 0 {
        return None;
    }
    Some(resident_pages.saturating_mul(page as u64))
}

#[cfg(all(unix, not(target_os = "linux")))]
pub fn current_memory_usage() -> Option<u64> {
    // SAFETY: zeroed rusage is valid, and the return code is checked.
    let ru = unsafe {
        let mut ru: libc::rusage = std::mem::zeroed();
        if libc::getrusage(libc::RUSAGE_SELF, &mut ru) != 0 {
            return None;
        }
        ru
    };
    if ru.ru_maxrss <= 0 {
        return None;
    }
    let raw = ru.ru_maxrss as u64;
    // macOS reports bytes, the BSDs report KiB.
    if cfg!(target_os = "macos") {
        Some(raw)
    } else {
        Some(raw.saturating_mul(1024))
    }
}

#[cfg(windows)]
pub fn current_memory_usage() -> Option<u64> {
    use windows_sys::Win32::System::ProcessStatus::{
        K32GetProcessMemoryInfo, PROCESS_MEMORY_COUNTERS,
    };
    use windows_sys::Win32::System::Threading::GetCurrentProcess;

    // SAFETY: counters is a plain C struct; cb tells the API its size.
    unsafe {
        let mut counters: PROCESS_MEMORY_COUNTERS = std::mem::zeroed();
        counters.cb = std::mem::size_of::<PROCESS_MEMORY_COUNTERS>() as u32;
        if K32GetProcessMemoryInfo(GetCurrentProcess(), &mut counters, counters.cb) == 0 {
            return None;
        }
        Some(counters.WorkingSetSize as u64)
    }
}

#[cfg(not(any(unix, windows)))]
pub fn current_memory_usage() -> Option<u64> {
    None
}

/// Mapped address space of this process in bytes, if the platform reports it.
#[cfg(target_os = "linux")]
pub fn current_virtual_memory() -> Option<u64> {
    let statm = std::fs::read_to_string("/proc/self/statm").ok()?;
    let size_pages: u64 = statm.split_whitespace().next()?.parse().ok()?;
    // SAFETY: sysconf has no memory-safety preconditions.
    let page = unsafe { libc::sysconf(libc::_SC_PAGESIZE) };
    if page <= 0 {
        return None;
    }
    Some(size_pages.saturating_mul(page as u64))
}

#[cfg(windows)]
pub fn current_virtual_memory() -> Option<u64> {
    use windows_sys::Win32::System::ProcessStatus::{
        K32GetProcessMemoryInfo, PROCESS_MEMORY_COUNTERS,
    };
    use windows_sys::Win32::System::Threading::GetCurrentProcess;

    // SAFETY: counters is a plain C struct; cb tells the API its size.
    unsafe {
        let mut counters: PROCESS_MEMORY_COUNTERS = std::mem::zeroed();
        counters.cb = std::mem::size_of::<PROCESS_MEMORY_COUNTERS>() as u32;
        if K32GetProcessMemoryInfo(GetCurrentProcess(), &mut counters, counters.cb) == 0 {
            return None;
        }
        Some(counters.PagefileUsage as u64)
    }
}

// No portable, unprivileged source elsewhere; unknown usage never blocks a run.
#[cfg(not(any(target_os = "linux", windows)))]
pub fn current_virtual_memory() -> Option<u64> {
    None
}

/// Soft address-space limit of this process, if one is set.
#[cfg(unix)]
pub fn process_memory_ceiling() -> Option<u64> {
    // SAFETY: zeroed rlimit is valid, and the return code is checked.
    let lim = unsafe {
        let mut lim: libc::rlimit = std::mem::zeroed();
        if libc::getrlimit(libc::RLIMIT_AS, &mut lim) != 0 {
            return None;
        }
        lim
    };
    if lim.rlim_cur == libc::RLIM_INFINITY {
        None
    } else {
        Some(lim.rlim_cur as u64)
    }
}

#[cfg(not(unix))]
pub fn process_memory_ceiling() -> Option<u64> {
    None
}
