pub mod component;
pub mod fragment;
pub mod gene;
pub mod mutation;
pub mod sequence;
pub mod site;

// re-export for cleaner imports
pub use self::component::{Component, subset};
pub use self::fragment::Fragment;
pub use self::gene::{Gene, GeneStats, Padding};
pub use self::mutation::{MutationIndex, MutationRange, parse_mutation};
pub use self::sequence::Sequence;
pub use self::site::{Site, Strand};
