//! Query processing options.

/// How the arms of a union are evaluated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExecutionMode {
    /// Arms run in source order; results keep insertion order.
    #[default]
    Sequential,
    /// Arms run on worker threads; only set equivalence with sequential
    /// mode is guaranteed, use [`Options::sort_by_path`] to restore a
    /// deterministic order.
    Parallel,
}

/// Options accepted by every select entry point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Options {
    /// Bound on recursive-descent depth; exceeding it fails the query.
    pub max_depth: usize,
    pub execution_mode: ExecutionMode,
    /// Keep only the first result for each normalized path.
    pub no_duplicates: bool,
    /// Sort results by normalized path.
    pub sort_by_path: bool,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            max_depth: 64,
            execution_mode: ExecutionMode::Sequential,
            no_duplicates: false,
            sort_by_path: false,
        }
    }
}

/// Internal processing flags derived from the options and the parsed query.
/// De-duplication and sorting both imply path tracking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ProcessingFlags(u8);

impl ProcessingFlags {
    const PATHS: u8 = 1;
    const NO_DUPLICATES: u8 = 1 << 1;
    const SORT_BY_PATH: u8 = 1 << 2;

    pub(crate) fn new(options: &Options, paths_needed: bool) -> Self {
        let mut bits = 0;
        if paths_needed {
            bits |= Self::PATHS;
        }
        if options.no_duplicates {
            bits |= Self::NO_DUPLICATES | Self::PATHS;
        }
        if options.sort_by_path {
            bits |= Self::SORT_BY_PATH | Self::PATHS;
        }
        ProcessingFlags(bits)
    }

    pub(crate) fn paths(&self) -> bool {
        self.0 & Self::PATHS != 0
    }

    pub(crate) fn no_duplicates(&self) -> bool {
        self.0 & Self::NO_DUPLICATES != 0
    }

    pub(crate) fn sort_by_path(&self) -> bool {
        self.0 & Self::SORT_BY_PATH != 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = Options::default();
        assert_eq!(options.max_depth, 64);
        assert_eq!(options.execution_mode, ExecutionMode::Sequential);
        assert!(!options.no_duplicates);
        assert!(!options.sort_by_path);
    }

    #[test]
    fn test_deduplication_implies_paths() {
        let options = Options {
            no_duplicates: true,
            ..Options::default()
        };
        let flags = ProcessingFlags::new(&options, false);
        assert!(flags.paths());
        assert!(flags.no_duplicates());
        assert!(!flags.sort_by_path());
    }

    #[test]
    fn test_sorting_implies_paths() {
        let options = Options {
            sort_by_path: true,
            ..Options::default()
        };
        let flags = ProcessingFlags::new(&options, false);
        assert!(flags.paths());
        assert!(flags.sort_by_path());
    }
}
