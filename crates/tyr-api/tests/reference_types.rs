use ext_set::{OpenHashSet, OpenHashSetUdt};
use ext_sketch::{HyperLogLog, HyperLogLogUdt};
use ext_vector::{DenseVector, VectorUdt};
use smol_str::SmolStr;
use tyr_api::{TyrError, TypedValue, UserDefinedType};
use tyr_udt::verify_round_trip;

mod common;

#[test]
fn dense_vectors_round_trip() {
    let cases = vec![
        DenseVector::new(vec![]),
        DenseVector::new(vec![1.1, 2.2, 3.3, 4.4]),
        DenseVector::new(vec![-0.0, f64::MIN_POSITIVE, f64::MAX, f64::INFINITY]),
        DenseVector::new(vec![f64::NAN, 0.1 + 0.2]),
    ];
    for v in &cases {
        assert_eq!(&verify_round_trip(&VectorUdt, v).unwrap(), v);
    }
}

#[test]
fn sketches_round_trip() {
    for precision in [4u8, 12, 18] {
        let mut hll = HyperLogLog::new(precision).unwrap();
        for i in 0..1000 {
            hll.add_i64(i * 31);
        }
        let back = verify_round_trip(&HyperLogLogUdt, &hll).unwrap();
        assert_eq!(back, hll);
        assert_eq!(back.estimate().to_bits(), hll.estimate().to_bits());
    }
}

#[test]
fn sets_round_trip() {
    let ints: OpenHashSet<i64> = (-50..50).map(|i| i * i).collect();
    assert_eq!(verify_round_trip(&OpenHashSetUdt::<i64>::new(), &ints).unwrap(), ints);

    let small: OpenHashSet<i32> = [i32::MIN, 0, i32::MAX].into_iter().collect();
    assert_eq!(verify_round_trip(&OpenHashSetUdt::<i32>::new(), &small).unwrap(), small);

    let words: OpenHashSet<SmolStr> = ["a", "", "héllo", "a much longer string than inline"]
        .into_iter()
        .map(SmolStr::new)
        .collect();
    assert_eq!(verify_round_trip(&OpenHashSetUdt::<SmolStr>::new(), &words).unwrap(), words);

    let empty = OpenHashSet::<SmolStr>::new();
    assert_eq!(verify_round_trip(&OpenHashSetUdt::<SmolStr>::new(), &empty).unwrap(), empty);
}

#[test]
fn malformed_internal_values_are_shape_errors() {
    assert!(matches!(
        VectorUdt.deserialize(&TypedValue::List(vec![TypedValue::Double(1.0), TypedValue::Null])),
        Err(TyrError::Shape(_))
    ));
    assert!(matches!(
        HyperLogLogUdt.deserialize(&TypedValue::Blob(vec![1, 12, 0])),
        Err(TyrError::Shape(_))
    ));
    assert!(matches!(
        OpenHashSetUdt::<i64>::new().deserialize(&TypedValue::Int64(3)),
        Err(TyrError::Shape(_))
    ));
}

#[test]
fn identical_sketches_agree() {
    let build = || {
        let mut hll = HyperLogLog::new(12).unwrap();
        for i in 1..=10 {
            hll.add_i64(i);
        }
        hll
    };
    let (a, b) = (build(), build());
    assert_eq!(a.to_bytes(), b.to_bytes());
    assert_eq!(a.estimate().to_bits(), b.estimate().to_bits());

    let datum = HyperLogLogUdt.serialize(&a).unwrap();
    assert_eq!(datum, TypedValue::Blob(b.to_bytes()));
    let back = HyperLogLogUdt.deserialize(&datum).unwrap();
    assert_eq!(back.to_bytes(), a.to_bytes());
    assert_eq!(back.estimate().to_bits(), a.estimate().to_bits());
    assert_eq!(back.cardinality(), a.cardinality());
}

#[test]
fn sketch_survives_persistence() {
    let session = common::session(2);
    let dir = common::TempDir::new("sketch_persist");
    let ds = common::mixed_dataset(&session, 12);
    session.write_dataset(&ds, dir.path()).unwrap();
    let back = session.read_dataset(dir.path()).unwrap();

    let before = ds.host_column_as::<HyperLogLog>("seen").unwrap();
    let mut after: Vec<(i64, Option<HyperLogLog>)> = back
        .column_values("id")
        .unwrap()
        .iter()
        .map(|v| v.as_i64().unwrap())
        .zip(back.host_column_as::<HyperLogLog>("seen").unwrap())
        .collect();
    after.sort_by_key(|(id, _)| *id);
    for ((_, got), want) in after.iter().zip(&before) {
        assert_eq!(got, want);
        if let (Some(got), Some(want)) = (got, want) {
            assert_eq!(got.estimate().to_bits(), want.estimate().to_bits());
        }
    }
}
