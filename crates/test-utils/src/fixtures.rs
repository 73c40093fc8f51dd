//! Common test fixtures with hand-checked expected results.

/// Four cells split over two latitude bins.
pub mod two_bin {
    pub const CELL_COUNT: usize = 4;
    pub const BIN_COUNT: usize = 2;
    pub const CELL_TO_BIN: [usize; 4] = [0, 0, 1, 1];
    pub const BIN_COUNTS: [u32; 2] = [2, 2];
    pub const VALUES: [f32; 4] = [1.0, 2.0, 3.0, 4.0];
    pub const SUM_BINS: [f64; 2] = [3.0, 7.0];
    pub const MEAN_BINS: [f64; 2] = [1.5, 3.5];

    /// Membership pairs producing `CELL_TO_BIN`.
    pub fn membership() -> Vec<(usize, Vec<usize>)> {
        vec![(0, vec![0, 1]), (1, vec![2, 3])]
    }
}

/// Two cells with two height levels.
pub mod two_level {
    pub const LEVEL0: [f32; 2] = [1.0, 1.0];
    pub const LEVEL1: [f32; 2] = [3.0, 5.0];
    pub const SUM: [f64; 2] = [4.0, 6.0];
    pub const MEAN: [f64; 2] = [2.0, 3.0];

    pub fn levels() -> Vec<Vec<f32>> {
        vec![LEVEL0.to_vec(), LEVEL1.to_vec()]
    }
}

/// Small synthetic domain sizes that keep tests fast.
pub mod domains {
    /// One cell per latitude bin on average times two.
    pub const SMALL_DOM01_CELLS: usize = 720;
    pub const SMALL_DOM02_CELLS: usize = 1440;
    pub const NHEIGHT: usize = 5;
    pub const NTIME: usize = 2;
}
