/// Maps a bytecode instruction pointer to a source line, for error stack
/// traces and debugger-style diagnostics. Stored sparsely: an entry marks
/// the line that holds from its `ip` up to (not including) the next entry's
/// `ip`, mirroring how a line-number table is typically emitted by a
/// compiler alongside its bytecode.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LineTable {
    entries: Vec<(u32, u32)>,
}

impl LineTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an entry. Entries must be pushed in increasing `ip` order.
    pub fn push(&mut self, ip: u32, line: u32) {
        debug_assert!(
            self.entries.last().map_or(true, |&(last_ip, _)| ip >= last_ip),
            "LineTable entries must be pushed in increasing ip order"
        );
        self.entries.push((ip, line));
    }

    /// Source line active at `ip`, if the table has any entry at or before it.
    pub fn line_at(&self, ip: u32) -> Option<u32> {
        match self.entries.binary_search_by_key(&ip, |&(entry_ip, _)| entry_ip) {
            Ok(index) => Some(self.entries[index].1),
            Err(0) => None,
            Err(index) => Some(self.entries[index - 1].1),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_at_finds_the_most_recent_entry_at_or_before_ip() {
        let mut table = LineTable::new();
        table.push(0, 1);
        table.push(10, 2);
        table.push(25, 5);

        assert_eq!(table.line_at(0), Some(1));
        assert_eq!(table.line_at(5), Some(1));
        assert_eq!(table.line_at(10), Some(2));
        assert_eq!(table.line_at(24), Some(2));
        assert_eq!(table.line_at(100), Some(5));
    }

    #[test]
    fn line_at_returns_none_before_the_first_entry() {
        let mut table = LineTable::new();
        table.push(5, 1);
        assert_eq!(table.line_at(0), None);
    }
}
