//! Resident-memory probe and reclamation hint.
//!
//! Optional instrumentation for long runs; correctness never depends on it.

/// Resident set size in MB.
#[cfg(target_os = "linux")]
pub fn resident_mb() -> f64 {
    if let Ok(status) = std::fs::read_to_string("/proc/self/status") {
        for line in status.lines() {
            if let Some(rest) = line.strip_prefix("VmRSS:") {
                if let Some(kb) = rest
                    .split_whitespace()
                    .next()
                    .and_then(|v| v.parse::<u64>().ok())
                {
                    return kb as f64 / 1024.0;
                }
            }
        }
    }
    0.0
}

/// Resident set size in MB.
#[cfg(target_os = "macos")]
pub fn resident_mb() -> f64 {
    use std::process::Command;

    if let Ok(output) = Command::new("ps")
        .args(["-o", "rss=", "-p", &std::process::id().to_string()])
        .output()
    {
        if let Ok(rss_str) = String::from_utf8(output.stdout) {
            if let Ok(rss_kb) = rss_str.trim().parse::<u64>() {
                return rss_kb as f64 / 1024.0;
            }
        }
    }
    0.0
}

#[cfg(not(any(target_os = "linux", target_os = "macos")))]
pub fn resident_mb() -> f64 {
    0.0
}

/// Ask the allocator to return free pages to the OS. No-op outside glibc.
#[cfg(all(target_os = "linux", target_env = "gnu"))]
pub fn reclaim() {
    unsafe {
        libc::malloc_trim(0);
    }
}

#[cfg(not(all(target_os = "linux", target_env = "gnu")))]
pub fn reclaim() {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resident_mb_is_nonnegative() {
        assert!(resident_mb() >= 0.0);
    }

    #[test]
    fn test_reclaim_does_not_panic() {
        reclaim();
    }
}
