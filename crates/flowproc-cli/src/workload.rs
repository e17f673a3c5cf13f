//! Per-path busy-work standing in for real packet handling, so the CLI's
//! throughput numbers reflect genuinely different costs per path rather
//! than every path being a no-op.

use flowproc_core::{FlowKey, Path, PathWork};

#[derive(Debug, Default)]
pub struct BusyWork;

fn divisor_count(key: FlowKey, limit: u32) -> u32 {
    let mut count = 0;
    for i in 1..=limit.max(1) {
        if key % i == 0 {
            count += 1;
        }
    }
    count
}

impl PathWork for BusyWork {
    fn run(&mut self, key: FlowKey, path: Path) {
        match path {
            Path::UltraFast => {
                std::hint::black_box(key);
            }
            Path::Fast => {
                std::hint::black_box(key.wrapping_mul(2).wrapping_add(1));
            }
            Path::Accelerated => {
                let limit = if key > 100 { 10 } else { (key as f64).sqrt() as u32 };
                std::hint::black_box(divisor_count(key, limit));
            }
            Path::Slow | Path::Adaptive | Path::DeepAnalysis => {
                let limit = (key as f64).sqrt() as u32;
                std::hint::black_box(divisor_count(key, limit));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_path_runs_without_panicking() {
        let mut work = BusyWork;
        for path in Path::ALL {
            work.run(42, path);
        }
    }
}
