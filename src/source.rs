use crate::error::Result;
use crate::models::Snapshot;

/// Anything that can hand out the most recent snapshots, newest first
pub trait SnapshotSource {
    fn fetch_recent(&self, limit: usize) -> Result<Vec<Snapshot>>;

    fn fetch_latest(&self) -> Result<Option<Snapshot>> {
        Ok(self.fetch_recent(1)?.into_iter().next())
    }
}

/// Snapshots held in memory, newest first
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    snapshots: Vec<Snapshot>,
}

impl MemorySource {
    /// Takes snapshots in any order and sorts them newest first
    pub fn new(mut snapshots: Vec<Snapshot>) -> Self {
        snapshots.sort_by(|a, b| b.recorded_at.cmp(&a.recorded_at));
        Self { snapshots }
    }

    pub fn push(&mut self, snapshot: Snapshot) {
        self.snapshots.push(snapshot);
        self.snapshots
            .sort_by(|a, b| b.recorded_at.cmp(&a.recorded_at));
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }
}

impl SnapshotSource for MemorySource {
    fn fetch_recent(&self, limit: usize) -> Result<Vec<Snapshot>> {
        Ok(self.snapshots.iter().take(limit).cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_source_orders_newest_first() {
        let mut source = MemorySource::new(vec![
            Snapshot::new("2024-09-01T07:00:00"),
            Snapshot::new("2024-09-03T07:00:00"),
        ]);
        source.push(Snapshot::new("2024-09-02T07:00:00"));

        let rows = source.fetch_recent(2).unwrap();
        assert_eq!(rows[0].recorded_at, "2024-09-03T07:00:00");
        assert_eq!(rows[1].recorded_at, "2024-09-02T07:00:00");
        assert_eq!(source.len(), 3);
        assert_eq!(
            source.fetch_latest().unwrap().map(|s| s.recorded_at),
            Some("2024-09-03T07:00:00".to_string())
        );
    }

    #[test]
    fn test_empty_source() {
        let source = MemorySource::default();
        assert!(source.is_empty());
        assert!(source.fetch_recent(10).unwrap().is_empty());
        assert!(source.fetch_latest().unwrap().is_none());
    }
}
