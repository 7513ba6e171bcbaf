// Property tests for the sheet engine contract.
//
// Random sequences of valid input writes must preserve:
//   - determinism: same writes from the same start → identical snapshots
//   - totality: a cascaded sheet equals a from-scratch sheet with the same
//     final inputs
//   - isolation: a rejected write leaves the sheet byte-identical

use proptest::prelude::*;

use valvesheet_engine::engine::SheetEngine;
use valvesheet_engine::param::{ParamKey, ParamValue, Role};
use valvesheet_engine::registry::keys;

fn arb_write() -> impl Strategy<Value = (ParamKey, ParamValue)> {
    prop_oneof![
        proptest::sample::select(vec![
            "1/2in", "3/4in", "1in", "1-1/2in", "2in", "3in", "4in", "6in", "8in", "10in", "12in",
        ])
        .prop_map(|nps| (keys::NOMINAL_PIPE_SIZE, ParamValue::text(nps))),
        proptest::sample::select(vec![150i64, 300, 600, 900, 1500, 2500])
            .prop_map(|class| (keys::PRESSURE_CLASS, ParamValue::Integer(class))),
        (-29i32..=200).prop_map(|t| (keys::DESIGN_TEMP_MAX, ParamValue::number(t as f64))),
        (-196i32..=100).prop_map(|t| (keys::DESIGN_TEMP_MIN, ParamValue::number(t as f64))),
        (0i32..=120).prop_map(|ca| {
            (
                keys::CORROSION_ALLOWANCE,
                ParamValue::number(ca as f64 / 10.0),
            )
        }),
        proptest::sample::select(vec![
            "ASTM A105N",
            "ASTM A350 LF2 CL.1",
            "ASTM A182 F316",
            "ASTM A182 F51",
            "ASTM A182 F6NM",
        ])
        .prop_map(|material| (keys::BODY_MATERIAL, ParamValue::text(material))),
    ]
}

proptest! {
    #[test]
    fn same_writes_same_snapshot(writes in proptest::collection::vec(arb_write(), 0..12)) {
        let engine = SheetEngine::standard().unwrap();
        let mut a = engine.create_sheet().unwrap();
        let mut b = engine.create_sheet().unwrap();

        for (key, value) in &writes {
            engine.set_input(&mut a, *key, value.clone()).unwrap();
            engine.set_input(&mut b, *key, value.clone()).unwrap();
        }

        prop_assert_eq!(engine.snapshot(&a), engine.snapshot(&b));
    }

    #[test]
    fn cascade_matches_full_recompute(writes in proptest::collection::vec(arb_write(), 0..12)) {
        let engine = SheetEngine::standard().unwrap();
        let mut sheet = engine.create_sheet().unwrap();

        for (key, value) in &writes {
            engine.set_input(&mut sheet, *key, value.clone()).unwrap();
        }

        // Replay only the final input set onto a fresh sheet
        let mut fresh = engine.create_sheet().unwrap();
        for spec in engine.registry().specs() {
            if spec.role == Role::Input {
                let value = sheet.value(spec.key).unwrap().clone();
                engine.set_input(&mut fresh, spec.key, value).unwrap();
            }
        }

        prop_assert_eq!(engine.snapshot(&sheet), engine.snapshot(&fresh));
    }

    #[test]
    fn rejected_write_leaves_sheet_untouched(class in 0i64..5000) {
        let engine = SheetEngine::standard().unwrap();
        let mut sheet = engine.create_sheet().unwrap();
        let before = engine.snapshot(&sheet);

        match engine.set_input(&mut sheet, keys::PRESSURE_CLASS, ParamValue::Integer(class)) {
            Ok(_) => prop_assert!([150, 300, 600, 900, 1500, 2500].contains(&class)),
            Err(err) => {
                prop_assert_eq!(err.kind(), "validation");
                prop_assert_eq!(engine.snapshot(&sheet), before);
                prop_assert_eq!(sheet.revision(), 0);
            }
        }
    }
}
