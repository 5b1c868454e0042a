pub mod microlp;

pub use self::microlp::MicroLpSolver;
