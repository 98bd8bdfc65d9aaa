//! Seeded random add/update sequences checked against a simple model.
use std::collections::BTreeMap;

use hypayload::{Payload, PayloadConfig};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

#[derive(Debug, Clone, PartialEq)]
enum Model {
    Int(i64),
    Text(String),
    Blob(Vec<u8>),
    Floats(Vec<f64>),
}

fn random_text(rng: &mut ChaCha8Rng) -> String {
    let len = rng.random_range(0..40);
    (0..len)
        .map(|_| rng.random_range(b'a'..=b'z') as char)
        .collect()
}

fn random_value(rng: &mut ChaCha8Rng, kind: u8) -> Model {
    match kind {
        0 => Model::Int(rng.random()),
        1 => Model::Text(random_text(rng)),
        2 => {
            let len = rng.random_range(1..64);
            Model::Blob((0..len).map(|_| rng.random()).collect())
        }
        _ => {
            let len = rng.random_range(1..8);
            Model::Floats((0..len).map(|_| rng.random_range(-1e6..1e6)).collect())
        }
    }
}

fn write(p: &mut Payload, fid: u16, value: &Model) {
    match value {
        Model::Int(v) => p.update(None, fid, *v).unwrap(),
        Model::Text(v) => p.update_string(None, fid, v).unwrap(),
        Model::Blob(v) => p.update_opaque(None, fid, v).unwrap(),
        Model::Floats(v) => p.update_vector(None, fid, v.as_slice()).unwrap(),
    }
}

fn check(p: &Payload, model: &BTreeMap<u16, Model>) {
    assert_eq!(p.num_fields(), model.len());
    for (&fid, expected) in model {
        let field = p.get_field(None, fid).unwrap();
        let actual = match expected {
            Model::Int(_) => Model::Int(field.get::<i64>().unwrap()),
            Model::Text(_) => Model::Text(field.get_string().unwrap().to_string()),
            Model::Blob(_) => Model::Blob(field.get_opaque().unwrap().to_vec()),
            Model::Floats(_) => Model::Floats(field.get_vector::<f64>().unwrap().to_vec()),
        };
        assert_eq!(&actual, expected, "fid {fid}");
    }
}

fn run(seed: u64, steps: usize) {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let config = PayloadConfig {
        initial_capacity: 8,
        growth_factor: 1.5,
        max_capacity: None,
    };
    let mut p = Payload::with_config(config);
    let mut kinds: BTreeMap<u16, u8> = BTreeMap::new();
    let mut model: BTreeMap<u16, Model> = BTreeMap::new();

    for _ in 0..steps {
        let fid = rng.random_range(1..=24u16);
        // A fid keeps the kind it was created with
        let kind = *kinds.entry(fid).or_insert_with(|| rng.random_range(0..4));
        let value = random_value(&mut rng, kind);
        write(&mut p, fid, &value);
        model.insert(fid, value);

        if rng.random_range(0..16) == 0 {
            let copy = Payload::from_byte_buffer(p.serialize()).unwrap();
            assert_eq!(copy.to_string(), p.to_string());
            p = copy;
        }
    }

    check(&p, &model);
    assert!(p.byte_size() <= p.capacity());
}

#[test]
fn random_upserts_match_the_model() {
    for seed in 0..8 {
        run(seed, 300);
    }
}

#[test]
fn clear_then_refill() {
    let mut rng = ChaCha8Rng::seed_from_u64(0xfeed);
    let mut p = Payload::new();
    for round in 0..4 {
        let mut model = BTreeMap::new();
        for fid in 1..=rng.random_range(1..30u16) {
            let value = random_value(&mut rng, (fid % 4) as u8);
            write(&mut p, fid, &value);
            model.insert(fid, value);
        }
        check(&p, &model);
        p.clear();
        assert!(p.is_empty(), "round {round}");
    }
}
