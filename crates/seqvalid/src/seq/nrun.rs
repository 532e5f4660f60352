//! Single-pass scan for runs of an ambiguity residue (N or X).

/// Result of scanning one residue stream for `target`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RunScan {
    pub len: usize,
    pub total: usize,
    pub leading: usize,
    pub trailing: usize,
    /// Count of `target` in the first `small_window` bases.
    pub head_small: usize,
    pub head_large: usize,
    pub tail_small: usize,
    pub tail_large: usize,
    /// Internal runs as (start, length); leading/trailing runs excluded.
    pub internal_runs: Vec<(usize, usize)>,
}

impl RunScan {
    /// Percentage of `target` over the whole stream.
    pub fn percent(&self) -> f64 {
        if self.len == 0 {
            0.0
        } else {
            self.total as f64 * 100.0 / self.len as f64
        }
    }

    pub fn is_all_target(&self) -> bool {
        self.len > 0 && self.total == self.len
    }
}

/// Scan `residues` once, counting `target` runs and window occupancy.
pub fn scan(residues: &[u8], target: u8, small_window: usize, large_window: usize) -> RunScan {
    let len = residues.len();
    let mut scan = RunScan {
        len,
        ..Default::default()
    };
    let mut run_start: Option<usize> = None;
    let mut seen_other = false;

    for (pos, residue) in residues.iter().enumerate() {
        let hit = residue.eq_ignore_ascii_case(&target);
        if hit {
            scan.total += 1;
            if pos < small_window {
                scan.head_small += 1;
            }
            if pos < large_window {
                scan.head_large += 1;
            }
            if pos + small_window >= len {
                scan.tail_small += 1;
            }
            if pos + large_window >= len {
                scan.tail_large += 1;
            }
            if run_start.is_none() {
                run_start = Some(pos);
            }
        } else {
            if let Some(start) = run_start.take() {
                if seen_other {
                    scan.internal_runs.push((start, pos - start));
                } else {
                    scan.leading = pos - start;
                }
            }
            seen_other = true;
        }
    }

    if let Some(start) = run_start {
        if seen_other {
            scan.trailing = len - start;
        } else {
            scan.leading = len;
            scan.trailing = len;
        }
    }
    scan
}
