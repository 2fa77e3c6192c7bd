// src/utils/system.rs: System functions

use std::time::Duration;

use sysinfo::{CpuRefreshKind, MemoryRefreshKind, RefreshKind, System};
use tokio::time::sleep;


/// Counts physical cores and samples current CPU load.
///
/// # Returns
///
/// (usize, f32) physical cores, current cpu usage
pub async fn detect_cores_and_load() -> (usize, f32) {
    let refresh_kind = RefreshKind::nothing().with_cpu(CpuRefreshKind::nothing().with_cpu_usage());
    let mut system = System::new_with_specifics(refresh_kind);
    system.refresh_cpu_usage();
    let physical_cores = System::physical_core_count().unwrap_or(1);
    sleep(sysinfo::MINIMUM_CPU_UPDATE_INTERVAL.max(Duration::from_millis(100))).await;
    system.refresh_cpu_usage();
    (physical_cores, system.global_cpu_usage())
}


/// Finds the amount of total and available RAM.
///
/// # Returns
///
/// (u64, u64) total ram, available ram in bytes
pub fn detect_ram() -> (u64, u64) {
    let refresh_kind = RefreshKind::nothing().with_memory(MemoryRefreshKind::everything());
    let mut system = System::new_with_specifics(refresh_kind);
    system.refresh_memory_specifics(MemoryRefreshKind::everything());
    (system.total_memory(), system.available_memory())
}


/// Message for a thread request the host cannot honour, if any.
pub fn thread_oversubscription(requested: usize, physical_cores: usize) -> Option<String> {
    if requested > physical_cores {
        Some(format!(
            "Requested {} threads but only {} physical cores were detected",
            requested, physical_cores
        ))
    } else {
        None
    }
}
