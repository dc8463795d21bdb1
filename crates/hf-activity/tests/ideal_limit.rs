//! Activity coefficients are one whenever the ionic strength is zero.

use hf_activity::{ActivityModel, ActivityModelKind, ActivitySettings, IonicStrength};
use hf_core::units::celsius;
use proptest::prelude::*;

fn kinds() -> impl Strategy<Value = ActivityModelKind> {
    prop_oneof![
        Just(ActivityModelKind::Ideal),
        Just(ActivityModelKind::Davies),
        Just(ActivityModelKind::Hkf),
        Just(ActivityModelKind::Sit),
    ]
}

proptest! {
    #[test]
    fn zero_ionic_strength_gives_unit_coefficients(
        kind in kinds(),
        charges in prop::collection::vec(-3i32..=3, 1..6),
        conc in prop::collection::vec(0.0f64..5.0, 6),
        t_c in 0.0f64..100.0,
        raw in prop_oneof![Just(0.0), Just(f64::NAN)],
    ) {
        let n = charges.len();
        let names: Vec<String> = (0..n).map(|i| format!("S{i}")).collect();
        let z: Vec<f64> = charges.iter().map(|&c| c as f64).collect();
        let settings = ActivitySettings {
            kind,
            temperature: celsius(t_c),
            ..ActivitySettings::default()
        };
        let mut model = ActivityModel::from_parts(&names, &z, &vec![false; n], None, settings).unwrap();
        let mut ln_f = vec![0.5; n];
        let props = model
            .ln_activity_coefficients(&conc[..n], IonicStrength::from_raw(raw), &mut ln_f)
            .unwrap();
        prop_assert!(ln_f.iter().all(|v| *v == 0.0));
        prop_assert_eq!(props.osmotic_coefficient, 1.0);
        prop_assert_eq!(props.log10_water_activity, 0.0);
    }
}
