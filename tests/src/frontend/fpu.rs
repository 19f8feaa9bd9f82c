//! FP helper tests — IEEE exception accrual vs trapping, comparison
//! relations, and conversion saturation.

use dbt_frontend::sparc::cpu::{CpuDef, SparcCpu, NO_EXCEPTION};
use dbt_frontend::sparc::fpu::{
    helper_fadds, helper_fcmped, helper_fcmpes, helper_fcmps,
    helper_fdivd, helper_fdivs, helper_fitos, helper_fstod, helper_fstoi,
    helper_ldfsr, helper_fsqrts, FSR_AEXC_SHIFT, FSR_CEXC_MASK, FSR_DZC,
    FSR_DZM, FSR_FCC_MASK, FSR_FCC_SHIFT, FSR_FTT_IEEE, FSR_FTT_MASK,
    FSR_NVC, FSR_NXC, FSR_VER_SHIFT,
};
use dbt_frontend::sparc::trap::TT_FP_EXCP;

fn cpu() -> Box<SparcCpu> {
    SparcCpu::new(&CpuDef::default())
}

fn set_f32(env: &mut SparcCpu, r: usize, v: f32) {
    env.fpr[r] = v.to_bits();
}

fn get_f32(env: &SparcCpu, r: usize) -> f32 {
    f32::from_bits(env.fpr[r])
}

fn fcc(env: &SparcCpu) -> u64 {
    (env.fsr & FSR_FCC_MASK) >> FSR_FCC_SHIFT
}

fn cexc(env: &SparcCpu) -> u64 {
    env.fsr & FSR_CEXC_MASK
}

fn aexc(env: &SparcCpu) -> u64 {
    (env.fsr >> FSR_AEXC_SHIFT) & 0x1f
}

#[test]
fn test_fadds_basic() {
    let mut env = cpu();
    set_f32(&mut env, 1, 1.5);
    set_f32(&mut env, 2, 2.25);
    helper_fadds(&mut *env, 0, 1, 2);
    assert_eq!(get_f32(&env, 0), 3.75);
    assert_eq!(env.exception_index, NO_EXCEPTION);
}

#[test]
fn test_fdivs_by_zero_masked_accrues_sticky_bit() {
    // dz unmasked in the TEM? No — default TEM is zero, so the bit
    // accrues, the result is the signed infinity, and nv stays clear.
    let mut env = cpu();
    set_f32(&mut env, 1, 1.0);
    set_f32(&mut env, 2, 0.0);
    helper_fdivs(&mut *env, 0, 1, 2);
    assert_eq!(get_f32(&env, 0), f32::INFINITY);
    assert_eq!(cexc(&env), FSR_DZC);
    assert_eq!(aexc(&env), FSR_DZC);
    assert_eq!(env.exception_index, NO_EXCEPTION);
}

#[test]
fn test_fdivs_by_zero_unmasked_traps() {
    let mut env = cpu();
    env.fsr |= FSR_DZM;
    set_f32(&mut env, 1, 1.0);
    set_f32(&mut env, 2, 0.0);
    let aexc_before = aexc(&env);
    helper_fdivs(&mut *env, 0, 1, 2);
    assert_eq!(env.exception_index, TT_FP_EXCP as i32);
    assert_eq!(env.fsr & FSR_FTT_MASK, FSR_FTT_IEEE);
    // Trapping exceptions do not accrue.
    assert_eq!(aexc(&env), aexc_before);
}

#[test]
fn test_zero_over_zero_raises_invalid_not_divzero() {
    let mut env = cpu();
    set_f32(&mut env, 1, 0.0);
    set_f32(&mut env, 2, 0.0);
    helper_fdivs(&mut *env, 0, 1, 2);
    assert!(get_f32(&env, 0).is_nan());
    assert_eq!(cexc(&env) & FSR_DZC, 0);
    assert_eq!(cexc(&env) & FSR_NVC, FSR_NVC);
}

#[test]
fn test_fdivd_uses_register_pairs() {
    let mut env = cpu();
    let a = 7.5f64.to_bits();
    env.fpr[2] = (a >> 32) as u32;
    env.fpr[3] = a as u32;
    let b = 2.5f64.to_bits();
    env.fpr[4] = (b >> 32) as u32;
    env.fpr[5] = b as u32;
    helper_fdivd(&mut *env, 0, 2, 4);
    let r = ((env.fpr[0] as u64) << 32) | env.fpr[1] as u64;
    assert_eq!(f64::from_bits(r), 3.0);
}

#[test]
fn test_fcmps_relations() {
    let mut env = cpu();
    set_f32(&mut env, 1, 1.0);
    set_f32(&mut env, 2, 2.0);
    helper_fcmps(&mut *env, 1, 2);
    assert_eq!(fcc(&env), 1); // less
    helper_fcmps(&mut *env, 2, 1);
    assert_eq!(fcc(&env), 2); // greater
    helper_fcmps(&mut *env, 1, 1);
    assert_eq!(fcc(&env), 0); // equal
}

#[test]
fn test_fcmps_quiet_nan_is_unordered_without_invalid() {
    let mut env = cpu();
    set_f32(&mut env, 1, f32::NAN);
    set_f32(&mut env, 2, 1.0);
    helper_fcmps(&mut *env, 1, 2);
    assert_eq!(fcc(&env), 3); // unordered
    assert_eq!(cexc(&env) & FSR_NVC, 0);
}

#[test]
fn test_fcmpes_quiet_nan_raises_invalid() {
    let mut env = cpu();
    set_f32(&mut env, 1, f32::NAN);
    set_f32(&mut env, 2, 1.0);
    helper_fcmpes(&mut *env, 1, 2);
    assert_eq!(cexc(&env) & FSR_NVC, FSR_NVC);
}

#[test]
fn test_fcmped_ordered_form_raises_on_quiet_nan() {
    let mut env = cpu();
    let qnan = f64::NAN.to_bits();
    env.fpr[2] = (qnan >> 32) as u32;
    env.fpr[3] = qnan as u32;
    let one = 1.0f64.to_bits();
    env.fpr[4] = (one >> 32) as u32;
    env.fpr[5] = one as u32;
    helper_fcmped(&mut *env, 2, 4);
    assert_eq!(cexc(&env) & FSR_NVC, FSR_NVC);
}

#[test]
fn test_fstoi_truncates_toward_zero() {
    let mut env = cpu();
    set_f32(&mut env, 1, 3.7);
    helper_fstoi(&mut *env, 0, 1);
    assert_eq!(env.fpr[0] as i32, 3);
    assert_eq!(cexc(&env) & FSR_NXC, FSR_NXC);
    set_f32(&mut env, 1, -3.7);
    helper_fstoi(&mut *env, 0, 1);
    assert_eq!(env.fpr[0] as i32, -3);
}

#[test]
fn test_fstoi_nan_saturates_with_invalid() {
    let mut env = cpu();
    set_f32(&mut env, 1, f32::NAN);
    helper_fstoi(&mut *env, 0, 1);
    assert_eq!(env.fpr[0] as i32, i32::MAX);
    assert_eq!(cexc(&env) & FSR_NVC, FSR_NVC);
}

#[test]
fn test_fitos_exact() {
    let mut env = cpu();
    env.fpr[1] = 42i32 as u32;
    helper_fitos(&mut *env, 0, 1);
    assert_eq!(get_f32(&env, 0), 42.0);
    assert_eq!(cexc(&env), 0);
}

#[test]
fn test_fstod_pair_layout() {
    let mut env = cpu();
    set_f32(&mut env, 3, 1.5);
    helper_fstod(&mut *env, 0, 3);
    let bits = ((env.fpr[0] as u64) << 32) | env.fpr[1] as u64;
    assert_eq!(f64::from_bits(bits), 1.5);
}

#[test]
fn test_fsqrts_negative_raises_invalid() {
    let mut env = cpu();
    set_f32(&mut env, 1, -4.0);
    helper_fsqrts(&mut *env, 0, 1);
    assert!(get_f32(&env, 0).is_nan());
    assert_eq!(cexc(&env) & FSR_NVC, FSR_NVC);
}

#[test]
fn test_ldfsr_preserves_version_and_ftt() {
    let mut env = cpu();
    let ver = env.fsr >> FSR_VER_SHIFT & 0x7;
    env.fsr |= FSR_FTT_IEEE;
    helper_ldfsr(&mut *env, 0xffff_ffff);
    assert_eq!(env.fsr >> FSR_VER_SHIFT & 0x7, ver);
    assert_eq!(env.fsr & FSR_FTT_MASK, FSR_FTT_IEEE);
    // Writable fields did take the load.
    assert_eq!(cexc(&env), 0x1f);
}
