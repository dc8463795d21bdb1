//! hf-system: chemical system description for haltafall.
//!
//! Provides:
//! - `ChemicalSystem`: components, soluble complexes and solids with their
//!   stoichiometric matrix, formation constants, charges and exclusion flags
//! - `ChemicalSystemBuilder`: name-based construction and validation
//! - species-name normalisation shared with the SIT table loader
//!
//! # Species layout
//!
//! Species are indexed `0..na` for components, `na..na+nx` for soluble
//! complexes and `na+nx..ms` for solids. Non-component species (complexes and
//! solids) are also addressed by a second index `0..nx+n_solids` into the
//! stoichiometric matrix, `a[i][j]` being the coefficient of component `j` in
//! the formation reaction of non-component species `i`.
//!
//! # Example
//!
//! ```
//! use hf_system::ChemicalSystem;
//!
//! let system = ChemicalSystem::builder()
//!     .component("H+", 1.0)
//!     .component("H2O", 0.0)
//!     .complex("OH-", -1.0, -14.0, &[("H2O", 1.0), ("H+", -1.0)])
//!     .build()
//!     .unwrap();
//! assert_eq!(system.component_count(), 2);
//! assert_eq!(system.water_index(), Some(1));
//! ```

pub mod builder;
pub mod error;
pub mod name;
pub mod system;

pub use builder::ChemicalSystemBuilder;
pub use error::{SystemError, SystemResult};
pub use name::{SpeciesName, normalize_species_name};
pub use system::{ChemicalSystem, SpeciesKind};
