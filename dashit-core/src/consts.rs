/// Length of a guide (protospacer) in nucleotides.
pub const GUIDE_LEN: usize = 20;

/// Guide plus the 3 nt NGG PAM.
pub const SITE_LEN: usize = 23;

/// Cut offset from the window start for a forward-strand site (3 nt upstream of the PAM).
pub const FORWARD_CUT_OFFSET: usize = 17;

/// Cut offset from the window start for a reverse-strand site.
pub const REVERSE_CUT_OFFSET: usize = 6;

pub const READ_LENGTH: usize = 150;

/// Cap on the bases sequenced from one fragment when computing coverage.
pub const FRAGMENT_READ_CAP: usize = 2 * READ_LENGTH;

// fragment length classes
pub const IDEAL_CUTOFF: usize = 200;
pub const OKAY_CUTOFF: usize = 301;
pub const LONG_CUTOFF: usize = 501;

pub const SOURCE_CARD: &str = "CARD";
pub const SOURCE_RESFINDER: &str = "Resfinder";
