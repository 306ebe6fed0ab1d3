use crate::internal::classad::{attrs, Ad};

/// Rewrites a partitionable slot into the dynamic slot that `job_ad` would carve out of it.
///
/// Returns `false` when the memory or disk request of the job cannot be evaluated against
/// the machine; in that case `machine_ad` is left untouched. Slots that are not
/// partitionable (including slots already rewritten by this function) are accepted as
/// they are.
pub fn fixup_partitionable_slot(job_ad: &Ad, machine_ad: &mut Ad) -> bool {
    if !machine_ad
        .lookup_bool(attrs::SLOT_PARTITIONABLE)
        .unwrap_or(false)
    {
        return true;
    }

    let cpus = job_ad
        .eval_int(attrs::REQUEST_CPUS, Some(machine_ad))
        .unwrap_or(1);

    let Some(memory) = job_ad.eval_int(attrs::REQUEST_MEMORY, Some(machine_ad)) else {
        log::debug!("Unable to evaluate {} of the job", attrs::REQUEST_MEMORY);
        return false;
    };

    let Some(disk) = job_ad.eval_int(attrs::REQUEST_DISK, Some(machine_ad)) else {
        log::debug!("Unable to evaluate {} of the job", attrs::REQUEST_DISK);
        return false;
    };

    let total_disk = machine_ad.lookup_int(attrs::TOTAL_DISK).unwrap_or(0);
    let disk = if total_disk > 0 {
        // Disk is handed out in whole percents of the total disk
        let percent = ((disk.max(0) * 100 + total_disk - 1) / total_disk).max(1);
        (percent * total_disk + 99) / 100
    } else {
        disk
    };

    machine_ad.assign(attrs::CPUS, cpus);
    machine_ad.assign(attrs::MEMORY, memory);
    machine_ad.assign(attrs::DISK, disk);
    machine_ad.assign(attrs::SLOT_PARTITIONABLE, false);
    machine_ad.assign(attrs::SLOT_DYNAMIC, true);
    true
}
