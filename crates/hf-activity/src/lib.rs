//! hf-activity: activity coefficients of aqueous species.
//!
//! Provides:
//! - `ActivityModel`: Davies, SIT and simplified HKF models plus the ideal
//!   solution, with water activity from the osmotic coefficient
//! - `WaterProperties`: density and dielectric constant of water, with the
//!   bundled `LiquidWater` correlation
//! - `EpsilonTable`: SIT ion-interaction coefficients and their file loader
//!
//! # Example
//!
//! ```
//! use hf_activity::{ActivityModel, ActivityModelKind, ActivitySettings, IonicStrength};
//!
//! let names = vec!["Na+".to_string(), "Cl-".to_string()];
//! let charges = [1.0, -1.0];
//! let settings = ActivitySettings {
//!     kind: ActivityModelKind::Davies,
//!     ..ActivitySettings::default()
//! };
//! let mut model = ActivityModel::from_parts(&names, &charges, &[false, false], None, settings).unwrap();
//!
//! let mut ln_f = [0.0; 2];
//! let props = model
//!     .ln_activity_coefficients(&[0.1, 0.1], IonicStrength::Calculated, &mut ln_f)
//!     .unwrap();
//! assert!((props.ionic_strength - 0.1).abs() < 1e-12);
//! assert!(ln_f[0] < 0.0);
//! ```

pub mod debye_huckel;
pub mod error;
pub mod model;
pub mod settings;
pub mod sit;
pub mod water;

pub use debye_huckel::{DebyeHuckel, b_gamma_nacl, g_function};
pub use error::{ActivityError, ActivityResult};
pub use model::{ActivityModel, AqueousProperties};
pub use settings::{ActivityModelKind, ActivitySettings, IonicStrength};
pub use sit::{EpsilonTable, SIT_FILE_NAME, fold, load_epsilon_table};
pub use water::{LiquidWater, WaterProperties};
