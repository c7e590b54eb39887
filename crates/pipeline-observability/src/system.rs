//! Shared system-resource sampling for the Health Monitor (C9) and Real-Time
//! Monitor (C10).
//!
//! `sysinfo`'s CPU usage is only meaningful across repeated refreshes of the same
//! `System`, so one sampler is held and refreshed on each call rather than
//! constructing a fresh `System` per sample.

use sysinfo::{Disks, System};
use tokio::sync::Mutex;

/// CPU/memory/disk usage as percentages in `[0, 100]`.
#[derive(Debug, Clone, Copy)]
pub struct ResourceUsage {
    pub cpu_percent: f32,
    pub memory_percent: f32,
    pub disk_percent: f32,
}

/// Holds the `sysinfo` handles across calls so CPU usage is measured against the
/// previous sample rather than always reading zero.
pub struct SystemSampler {
    inner: Mutex<(System, Disks)>,
}

impl SystemSampler {
    #[must_use]
    pub fn new() -> Self {
        let mut system = System::new_all();
        system.refresh_cpu_usage();
        system.refresh_memory();
        let disks = Disks::new_with_refreshed_list();
        Self { inner: Mutex::new((system, disks)) }
    }

    pub async fn sample(&self) -> ResourceUsage {
        let mut guard = self.inner.lock().await;
        let (system, disks) = &mut *guard;
        system.refresh_cpu_usage();
        system.refresh_memory();
        disks.refresh(true);

        let cpu_percent = system.global_cpu_usage();
        let memory_percent = if system.total_memory() > 0 {
            (system.used_memory() as f64 / system.total_memory() as f64 * 100.0) as f32
        } else {
            0.0
        };
        let disk_percent = disks
            .iter()
            .map(|d| {
                let total = d.total_space();
                if total == 0 {
                    0.0
                } else {
                    ((total - d.available_space()) as f64 / total as f64 * 100.0) as f32
                }
            })
            .fold(0.0_f32, f32::max);

        ResourceUsage { cpu_percent, memory_percent, disk_percent }
    }
}

impl Default for SystemSampler {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_sample_returns_bounded_percentages() {
        let sampler = SystemSampler::new();
        let usage = sampler.sample().await;
        assert!(usage.cpu_percent >= 0.0);
        assert!((0.0..=100.0).contains(&usage.memory_percent));
        assert!((0.0..=100.0).contains(&usage.disk_percent));
    }

    #[tokio::test]
    async fn test_repeated_samples_reuse_the_same_handles() {
        let sampler = SystemSampler::new();
        let first = sampler.sample().await;
        let second = sampler.sample().await;
        assert!(first.memory_percent >= 0.0);
        assert!(second.memory_percent >= 0.0);
    }
}
