//! End-to-end tests for building and drawing from dtype strategies

use protest_dtypes::rng::create_seeded_rng;
use protest_dtypes::{
    Constraints, DTYPE_NAMES, Dtype, DtypeError, GeneratorConfig, OptionValue, Strategy, Value,
    arrays, examples, from_dtype, from_dtype_with_options, is_supported,
};

/// Draw `count` values from a seeded stream
fn draw<S: Strategy<Value = Value>>(strategy: &S, seed: u64, count: usize) -> Vec<Value> {
    examples(strategy, Some(seed), &GeneratorConfig::default())
        .take(count)
        .collect::<Result<_, _>>()
        .unwrap()
}

#[test]
fn test_strategies_have_reusable_values() {
    for name in DTYPE_NAMES {
        let strategy = from_dtype(name, Constraints::new()).unwrap();
        assert!(strategy.has_reusable_values(), "{}", name);
    }
}

#[test]
fn test_produces_castable_instances_from_dtype() {
    for (seed, dtype) in Dtype::ALL.into_iter().enumerate() {
        let strategy = from_dtype(dtype, Constraints::new()).unwrap();
        for value in draw(&strategy, seed as u64, 200) {
            assert_eq!(value.builtin(), dtype.descriptor().castable_builtin);
            assert!(value.is_castable_to(dtype.descriptor()), "{} from {}", value, dtype);
        }
    }
}

#[test]
fn test_produces_castable_instances_from_name() {
    for (seed, name) in DTYPE_NAMES.into_iter().enumerate() {
        let strategy = from_dtype(name, Constraints::new()).unwrap();
        assert_eq!(strategy.descriptor().name, name);
        for value in draw(&strategy, 100 + seed as u64, 200) {
            assert!(value.is_castable_to(strategy.descriptor()), "{} from {}", value, name);
        }
    }
}

#[test]
fn test_can_infer_strategy_in_arrays() {
    let mut rng = create_seeded_rng(31);
    let config = GeneratorConfig::default();
    for dtype in Dtype::ALL {
        let elements = from_dtype(dtype, Constraints::new()).unwrap();
        let strategy = arrays(dtype, &[10], elements).unwrap();
        let array = strategy.generate(&mut rng, &config).unwrap();
        assert_eq!(array.size(), 10);
        assert!(array.iter().all(|v| v.is_castable_to(dtype.descriptor())));
    }
}

#[test]
fn test_all_catalog_dtypes_are_supported() {
    for name in DTYPE_NAMES {
        assert!(is_supported(name), "{}", name);
    }
    assert!(!is_supported("complex128"));
}

type Condition = fn(&Value) -> bool;

fn as_f64(value: &Value) -> f64 {
    value.to_f64()
}

#[test]
fn test_from_dtype_with_kwargs() {
    let cases: Vec<(&str, Vec<(&str, OptionValue)>, Condition)> = vec![
        (
            "float32",
            vec![("min_value", 1.into()), ("max_value", 2.into())],
            |v| (1.0..=2.0).contains(&as_f64(v)),
        ),
        (
            "float32",
            vec![
                ("min_value", 1.into()),
                ("max_value", 2.into()),
                ("exclude_min", true.into()),
                ("exclude_max", true.into()),
            ],
            |v| 1.0 < as_f64(v) && as_f64(v) < 2.0,
        ),
        ("float32", vec![("allow_nan", false.into())], |v| !v.is_nan()),
        ("float32", vec![("allow_infinity", false.into())], |v| {
            !v.is_infinite()
        }),
        (
            "float32",
            vec![("allow_nan", false.into()), ("allow_infinity", false.into())],
            |v| v.is_finite(),
        ),
        (
            "int8",
            vec![("min_value", (-1).into()), ("max_value", 1.into())],
            |v| (-1..=1).contains(&v.as_int().unwrap()),
        ),
        (
            "uint8",
            vec![("min_value", 1.into()), ("max_value", 2.into())],
            |v| (1..=2).contains(&v.as_int().unwrap()),
        ),
    ];

    for (seed, (dtype, options, condition)) in cases.into_iter().enumerate() {
        let strategy = from_dtype_with_options(dtype, &options).unwrap();
        for value in draw(&strategy, seed as u64, 500) {
            assert!(
                condition(&value),
                "{} with {:?} produced {}",
                dtype,
                options,
                value
            );
        }
    }
}

#[test]
fn test_exclusive_float_bounds_are_approached() {
    let strategy = from_dtype(
        "float32",
        Constraints::new()
            .min_value(1)
            .max_value(2)
            .exclude_min(true)
            .exclude_max(true),
    )
    .unwrap();
    let values = draw(&strategy, 77, 2000);
    let just_above_one = (1.0f32 + f32::EPSILON) as f64;
    assert!(values.iter().any(|v| v.to_f64() == just_above_one));
}

#[test]
fn test_integer_bounds_are_clamped_to_representable_range() {
    let strategy = from_dtype("uint8", Constraints::new().max_value(300)).unwrap();
    assert_eq!(strategy.constraints().highest(), Value::Int(255));
    let values = draw(&strategy, 8, 1000);
    assert!(values.iter().all(|v| (0..=255).contains(&v.as_int().unwrap())));
    assert!(values.contains(&Value::Int(255)));

    let strategy = from_dtype("int16", Constraints::new().min_value(i64::MIN)).unwrap();
    assert_eq!(strategy.constraints().lowest(), Value::Int(i16::MIN as i128));
}

#[test]
fn test_large_integer_float_bounds_are_respected() {
    let min = (1i128 << 53) + 1;
    let strategy = from_dtype("float64", Constraints::new().min_value(Value::Int(min))).unwrap();
    for value in draw(&strategy, 53, 2000) {
        let v = value.to_f64();
        assert!(v.is_nan() || v >= 9007199254740994.0, "{} is below {}", value, min);
    }

    let max = -(1i128 << 60) - 1;
    let strategy = from_dtype("float32", Constraints::new().max_value(Value::Int(max))).unwrap();
    for value in draw(&strategy, 60, 2000) {
        assert!(value.to_f64() < -(2f64.powi(60)), "{} is above {}", value, max);
    }
}

#[test]
fn test_contradictory_constraints_are_rejected() {
    let cases: Vec<(&str, Vec<(&str, OptionValue)>, Option<&str>)> = vec![
        (
            "float64",
            vec![("min_value", 3.into()), ("max_value", 2.into())],
            Some("min_value"),
        ),
        (
            "float64",
            vec![("min_value", f64::NEG_INFINITY.into()), ("exclude_min", true.into())],
            Some("exclude_min"),
        ),
        (
            "float16",
            vec![("max_value", 1.into()), ("allow_nan", true.into())],
            Some("allow_nan"),
        ),
        (
            "float32",
            vec![
                ("min_value", 0.into()),
                ("max_value", 1.into()),
                ("allow_infinity", true.into()),
            ],
            Some("allow_infinity"),
        ),
        (
            "int32",
            vec![
                ("min_value", 4.into()),
                ("max_value", 4.into()),
                ("exclude_max", true.into()),
            ],
            None,
        ),
        ("int32", vec![("elements", 4.into())], Some("elements")),
    ];

    for (dtype, options, field) in cases {
        match from_dtype_with_options(dtype, &options) {
            Err(err @ DtypeError::InvalidConstraints { .. }) => {
                assert_eq!(err.field(), field, "{} with {:?}", dtype, options)
            }
            other => panic!("{} with {:?} gave {:?}", dtype, options, other),
        }
    }
}

#[test]
fn test_unknown_dtype_is_rejected() {
    assert_eq!(
        from_dtype("bool", Constraints::new()).unwrap_err(),
        DtypeError::unknown_dtype("bool")
    );
}

#[test]
fn test_strategies_are_shared_across_threads() {
    let strategy = from_dtype("float64", Constraints::new().min_value(0).max_value(1)).unwrap();
    let results: Vec<Vec<Value>> = crossbeam::thread::scope(|scope| {
        let handles: Vec<_> = (0..4u64)
            .map(|seed| {
                let strategy = &strategy;
                scope.spawn(move |_| draw(strategy, seed, 100))
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    })
    .unwrap();

    for (seed, values) in results.iter().enumerate() {
        assert_eq!(values, &draw(&strategy, seed as u64, 100));
        assert!(values.iter().all(|v| (0.0..=1.0).contains(&v.to_f64())));
    }
}
