//! Per-frame timing report.

use std::fmt;
use std::time::Duration;

/// Timing of the most recent frame, as recorded by each node's timer.
///
/// # Example
///
/// ```ignore
/// scheduler.execute(&clock.tick());
/// println!("{}", scheduler.timing_report());
/// ```
#[derive(Debug, Clone, Default)]
pub struct TimingReport {
    /// Number of frames the scheduler had executed when the report was taken.
    pub frames: u64,
    /// Root node first, then graph members in construction order.
    pub nodes: Vec<NodeTiming>,
    /// Registered processes in registration order.
    pub processes: Vec<ProcessTiming>,
}

/// Timing for a single node.
#[derive(Debug, Clone)]
pub struct NodeTiming {
    pub name: String,
    pub elapsed: Duration,
    pub enabled: bool,
}

/// Summed timing of a process's internal nodes.
#[derive(Debug, Clone)]
pub struct ProcessTiming {
    pub name: String,
    pub elapsed: Duration,
}

impl TimingReport {
    /// Sum over all nodes. Processes are not added again.
    pub fn total(&self) -> Duration {
        self.nodes.iter().map(|node| node.elapsed).sum()
    }

    /// The slowest node, if any.
    pub fn slowest(&self) -> Option<&NodeTiming> {
        self.nodes.iter().max_by_key(|node| node.elapsed)
    }
}

impl fmt::Display for TimingReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Frame graph after {} frame(s): {:.2?} across {} node(s)",
            self.frames,
            self.total(),
            self.nodes.len(),
        )?;
        for node in &self.nodes {
            let state = if node.enabled { "" } else { " (disabled)" };
            writeln!(f, "  {}: {:.2?}{}", node.name, node.elapsed, state)?;
        }
        if !self.processes.is_empty() {
            writeln!(f, "Processes ({}):", self.processes.len())?;
            for process in &self.processes {
                writeln!(f, "  {}: {:.2?}", process.name, process.elapsed)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn timing(name: &str, micros: u64, enabled: bool) -> NodeTiming {
        NodeTiming {
            name: name.to_string(),
            elapsed: Duration::from_micros(micros),
            enabled,
        }
    }

    #[test]
    fn test_total_and_slowest() {
        let report = TimingReport {
            frames: 3,
            nodes: vec![timing("root", 10, true), timing("bloom", 40, true)],
            processes: Vec::new(),
        };
        assert_eq!(report.total(), Duration::from_micros(50));
        assert_eq!(report.slowest().unwrap().name, "bloom");
    }

    #[test]
    fn test_display_lists_nodes_and_processes() {
        let report = TimingReport {
            frames: 1,
            nodes: vec![timing("root", 1, true), timing("ssao", 2, false)],
            processes: vec![ProcessTiming {
                name: "post".to_string(),
                elapsed: Duration::from_micros(2),
            }],
        };
        let text = report.to_string();
        assert!(text.contains("after 1 frame(s)"));
        assert!(text.contains("ssao"));
        assert!(text.contains("(disabled)"));
        assert!(text.contains("Processes (1):"));
        assert!(text.contains("post"));
    }

    #[test]
    fn test_empty_report() {
        let report = TimingReport::default();
        assert_eq!(report.total(), Duration::ZERO);
        assert!(report.slowest().is_none());
    }
}
