use std::sync::Arc;
use std::thread;

use slot_algebra::{AlgebraError, IndexAlgebraBuilder, ModPoly, ResidueCoder};

fn coder(m: u64, p: u64, r: u32) -> ResidueCoder {
    let alg = IndexAlgebraBuilder::new(m).prime(p).build().unwrap();
    ResidueCoder::new(alg, r).unwrap()
}

#[test]
fn zero_decomposes_into_zero_slots() {
    let coder = coder(45, 317, 1);
    assert_eq!(coder.n_slots(), 2);
    let zero = ModPoly::zero(317);
    let slots = coder.crt_decompose(&zero).unwrap();
    assert_eq!(slots.len(), 2);
    assert!(slots.iter().all(ModPoly::is_zero));
    assert!(coder.crt_reconstruct(&slots).unwrap().is_zero());
}

#[test]
fn crt_round_trips_both_ways() {
    let coder = coder(45, 317, 1);
    let h = ModPoly::from_coeffs(&(1..=30).map(|i| i * i).collect::<Vec<u64>>(), 317);
    let reduced = h.rem(coder.phim_x_mod());
    let slots = coder.crt_decompose(&h).unwrap();
    assert!(slots.iter().all(|s| s.len() <= 12));
    assert_eq!(coder.crt_reconstruct(&slots).unwrap(), reduced);

    let residues = vec![
        ModPoly::from_coeffs(&[3, 0, 5, 7], 317),
        ModPoly::from_coeffs(&[0, 1, 0, 0, 0, 0, 0, 0, 0, 0, 0, 316], 317),
    ];
    let joined = coder.crt_reconstruct(&residues).unwrap();
    assert_eq!(coder.crt_decompose(&joined).unwrap(), residues);
}

#[test]
fn reconstruct_checks_shape_and_modulus() {
    let coder = coder(15, 2, 1);
    assert_eq!(
        coder.crt_reconstruct(&[ModPoly::one(2)]),
        Err(AlgebraError::SlotCountMismatch {
            expected: 2,
            actual: 1
        })
    );
    assert_eq!(
        coder.crt_decompose(&ModPoly::one(3)),
        Err(AlgebraError::ModulusMismatch {
            expected: 2,
            actual: 3
        })
    );
}

#[test]
fn m128_maps_to_slots_without_extension() {
    let coder = coder(128, 257, 1);
    assert_eq!(coder.n_slots(), 64);
    assert!(coder.factors().iter().all(|f| f.degree() == Some(1)));

    let md = coder.map_to_slots(&ModPoly::x(257)).unwrap();
    assert_eq!(md.deg_g(), 1);
    assert!(md.maps().is_empty());

    let values: Vec<ModPoly> = (0..64).map(|i| ModPoly::constant(3 * i + 1, 257)).collect();
    let h = coder.embed_in_slots(&values, &md).unwrap();
    assert_eq!(coder.decode_plaintext(&h, &md).unwrap(), values);
}

#[test]
fn quadratic_extension_over_gf2() {
    let coder = coder(15, 2, 1);
    let g = ModPoly::from_coeffs(&[1, 1, 1], 2);
    let md = coder.map_to_slots(&g).unwrap();
    assert_eq!(md.deg_g(), 2);
    assert_eq!(md.maps().len(), 2);

    // Each slot image of X is a root of G in that slot.
    for (w, f) in md.maps().iter().zip(coder.factors()) {
        assert!(g.compose_mod(w, f).is_zero());
    }

    let values = vec![ModPoly::x(2), ModPoly::from_coeffs(&[1, 1], 2)];
    let h = coder.embed_in_slots(&values, &md).unwrap();
    assert_eq!(coder.decode_plaintext(&h, &md).unwrap(), values);

    let one = coder.embed_in_all_slots(&ModPoly::one(2), &md).unwrap();
    assert!(one.is_one());
}

#[test]
fn linearized_coefficients_for_identity_and_frobenius() {
    let coder = coder(15, 2, 1);
    let g = ModPoly::from_coeffs(&[1, 1, 1], 2);
    let md = coder.map_to_slots(&g).unwrap();

    let identity = [ModPoly::one(2), ModPoly::x(2)];
    assert_eq!(
        coder.build_lin_poly_coeffs(&identity, &md).unwrap(),
        vec![ModPoly::one(2), ModPoly::zero(2)]
    );

    // X -> X^2 = X + 1 mod G
    let frobenius = [ModPoly::one(2), ModPoly::from_coeffs(&[1, 1], 2)];
    assert_eq!(
        coder.build_lin_poly_coeffs(&frobenius, &md).unwrap(),
        vec![ModPoly::zero(2), ModPoly::one(2)]
    );

    assert!(matches!(
        coder.build_lin_poly_coeffs(&identity[..1], &md),
        Err(AlgebraError::SlotCountMismatch { expected: 2, actual: 1 })
    ));
}

/// Checks `sum_j C[j] * (X^i)^(p^j) = L[i] mod G` for every `i`, with `G` the
/// factor of the first slot and `L` a fixed dense linear map.
fn check_linearized_map(m: u64, p: u64, r: u32) {
    let coder = coder(m, p, r);
    let q = coder.p_pow_r();
    let g = coder.factors()[0].clone();
    let md = coder.map_to_slots(&g).unwrap();
    let d = md.deg_g();
    assert_eq!(d, coder.zm_star().ord_p() as usize);

    let l: Vec<ModPoly> = (0..d)
        .map(|i| {
            let coeffs: Vec<u64> = (0..d)
                .map(|j| ((7 * i + 3 * j * j + 5) as u64 * 2_654_435_761) % q)
                .collect();
            ModPoly::from_coeffs(&coeffs, q)
        })
        .collect();
    let c = coder.build_lin_poly_coeffs(&l, &md).unwrap();
    assert_eq!(c.len(), d);

    for (i, target) in l.iter().enumerate() {
        let mut conjugate = ModPoly::monomial(1, i, q).rem(&g);
        let mut image = ModPoly::zero(q);
        for cj in &c {
            image = &image + &cj.mul_mod(&conjugate, &g);
            conjugate = conjugate.pow_mod(p, &g);
        }
        assert_eq!(image.rem(&g), target.rem(&g), "m = {m}, p = {p}, r = {r}, i = {i}");
    }
}

#[test]
fn linearized_coefficients_reproduce_a_dense_map() {
    check_linearized_map(15, 2, 1);
    check_linearized_map(15, 2, 3);
    check_linearized_map(45, 317, 1);
}

#[test]
fn invalid_extension_polynomials_are_rejected() {
    let coder = coder(15, 2, 1);
    // X^2 + 1 = (X + 1)^2 mod 2
    let reducible = ModPoly::from_coeffs(&[1, 0, 1], 2);
    assert!(matches!(
        coder.map_to_slots(&reducible),
        Err(AlgebraError::InvalidMapping { .. })
    ));
    // Degree 3 does not divide ord(2) = 4.
    let cubic = ModPoly::from_coeffs(&[1, 1, 0, 1], 2);
    assert!(matches!(
        coder.map_to_slots(&cubic),
        Err(AlgebraError::InvalidMapping { .. })
    ));
    assert!(matches!(
        coder.map_to_slots(&ModPoly::one(2)),
        Err(AlgebraError::InvalidMapping { .. })
    ));
}

#[test]
fn lifted_coder_accepts_only_the_base_factor() {
    let coder = coder(15, 2, 2);
    assert_eq!(coder.p_pow_r(), 4);

    let g = ModPoly::from_coeffs(&[1, 1, 1], 4);
    assert!(matches!(
        coder.map_to_slots(&g),
        Err(AlgebraError::InvalidMapping { .. })
    ));

    let base = coder.factors()[0].clone();
    let md = coder.map_to_slots(&base).unwrap();
    let values = vec![
        ModPoly::from_coeffs(&[1, 2, 3, 0], 4),
        ModPoly::from_coeffs(&[3, 3, 0, 1], 4),
    ];
    let h = coder.embed_in_slots(&values, &md).unwrap();
    assert_eq!(coder.decode_plaintext(&h, &md).unwrap(), values);

    let linear = coder.map_to_slots(&ModPoly::x(4)).unwrap();
    assert_eq!(linear.deg_g(), 1);
}

#[test]
fn masks_select_slots_by_coordinate() {
    let coder = coder(15, 19, 1);
    let alg = coder.zm_star().clone();
    let md = coder.map_to_slots(&ModPoly::x(19)).unwrap();
    for i in 0..alg.num_gens() {
        for j in 0..=alg.order_of(i) {
            let mask = coder.mask(i, j).unwrap();
            let decoded = coder.decode_plaintext(mask, &md).unwrap();
            for (idx, value) in decoded.iter().enumerate() {
                let bit = u64::from(alg.coordinate(i, idx) >= j);
                assert_eq!(value, &ModPoly::constant(bit, 19));
            }
        }
    }
    assert!(coder.mask(0, 3).is_none());
    assert!(coder.mask(2, 0).is_none());
    assert!(coder.mask_zzx(0, 0).unwrap().iter().all(|&c| c == 0 || c == 1));
}

#[test]
fn concurrent_mapping_requests_share_one_result() {
    let coder = Arc::new(coder(15, 2, 1));
    let g = ModPoly::from_coeffs(&[1, 1, 1], 2);
    let results: Vec<_> = thread::scope(|s| {
        let handles: Vec<_> = (0..4)
            .map(|_| s.spawn(|| coder.map_to_slots(&g).unwrap()))
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });
    let cached = coder.map_to_slots(&g).unwrap();
    assert!(results.iter().all(|md| Arc::ptr_eq(md, &cached)));
}
