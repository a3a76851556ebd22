//! Pre-built mock filesystem scenarios for testing.

use super::filesystem::MockFs;

/// Builds a `/proc/[pid]/stat` line with the fields the sampler reads.
pub fn stat_line(pid: u32, comm: &str, state: char, utime: u64, stime: u64, rss: i64) -> String {
    format!(
        "{pid} ({comm}) {state} 1 {pid} {pid} 0 -1 4194304 100 0 0 0 {utime} {stime} 0 0 20 0 1 0 12345 12345678 {rss} 18446744073709551615 0 0 0 0 0 0 0 0 0 0 0 0 17 0 0 0 0 0 0 0 0 0 0 0 0 0 0"
    )
}

impl MockFs {
    /// Creates a typical 4-CPU system with init, a bash shell and sshd.
    pub fn typical_system() -> Self {
        let mut fs = Self::new();

        let mut proc_stat = String::from("cpu  3600 0 1200 72000 40 0 12 0 0 0\n");
        for cpu in 0..4 {
            proc_stat.push_str(&format!("cpu{} 900 0 300 18000 10 0 3 0 0 0\n", cpu));
        }
        proc_stat.push_str("ctxt 48213\nbtime 1700000000\nprocesses 812\n");
        fs.add_file("/proc/stat", proc_stat);
        fs.add_file("/proc/uptime", "7321.40 27110.92\n");

        fs.add_process(1, "systemd", &stat_line(1, "systemd", 'S', 500, 300, 3000));
        fs.add_process(1000, "bash", &stat_line(1000, "bash", 'S', 10, 5, 1280));
        fs.add_process(1001, "sshd", &stat_line(1001, "sshd", 'S', 42, 17, 2048));

        fs
    }

    /// Typical system plus pid 2000, owned by another user and unreadable.
    pub fn with_protected_process() -> Self {
        let mut fs = Self::typical_system();
        fs.add_process(2000, "secretd", &stat_line(2000, "secretd", 'S', 1, 1, 512));
        fs.deny("/proc/2000");
        fs
    }

    /// Typical system plus zombie pid 4000.
    pub fn with_zombie_process() -> Self {
        let mut fs = Self::typical_system();
        fs.add_process(4000, "defunct", &stat_line(4000, "defunct", 'Z', 0, 0, 0));
        fs
    }

    /// Typical system plus a process whose comm contains spaces and parentheses.
    pub fn with_special_names() -> Self {
        let mut fs = Self::typical_system();
        fs.add_process(
            5000,
            "Web Content",
            &stat_line(5000, "Web (Content)", 'R', 300, 40, 65536),
        );
        fs
    }
}
