//! SIMD-accelerated accumulator updates and SCReLU output dot product, with
//! a portable scalar fallback. Dispatch mirrors the target architecture:
//! AVX2 on x86_64 when available (compile-time if the target feature is
//! enabled, otherwise a runtime `is_x86_feature_detected!` check), NEON on
//! aarch64 unconditionally, and scalar everywhere else.

use super::network::HIDDEN;
use super::QA;

#[inline]
pub fn add_weights(acc: &mut [i16; HIDDEN], weights: &[i16; HIDDEN]) {
    #[cfg(target_arch = "aarch64")]
    {
        unsafe { neon::add_weights(acc, weights) };
        return;
    }
    #[cfg(all(target_arch = "x86_64", target_feature = "avx2"))]
    {
        unsafe { avx2::add_weights(acc, weights) };
        return;
    }
    #[cfg(all(target_arch = "x86_64", not(target_feature = "avx2")))]
    {
        if is_x86_feature_detected!("avx2") {
            unsafe { avx2::add_weights(acc, weights) };
            return;
        }
    }
    #[allow(unreachable_code)]
    scalar::add_weights(acc, weights);
}

#[inline]
pub fn sub_weights(acc: &mut [i16; HIDDEN], weights: &[i16; HIDDEN]) {
    #[cfg(target_arch = "aarch64")]
    {
        unsafe { neon::sub_weights(acc, weights) };
        return;
    }
    #[cfg(all(target_arch = "x86_64", target_feature = "avx2"))]
    {
        unsafe { avx2::sub_weights(acc, weights) };
        return;
    }
    #[cfg(all(target_arch = "x86_64", not(target_feature = "avx2")))]
    {
        if is_x86_feature_detected!("avx2") {
            unsafe { avx2::sub_weights(acc, weights) };
            return;
        }
    }
    #[allow(unreachable_code)]
    scalar::sub_weights(acc, weights);
}

/// `sum_i clamp(acc[i], 0, QA)^2 * weights[i]`, the SCReLU-activated dot
/// product between one perspective's accumulator and its output weights.
#[inline]
#[must_use]
pub fn screlu_dot(acc: &[i16; HIDDEN], weights: &[i16; HIDDEN]) -> i32 {
    #[cfg(target_arch = "aarch64")]
    {
        return unsafe { neon::screlu_dot(acc, weights) };
    }
    #[cfg(all(target_arch = "x86_64", target_feature = "avx2"))]
    {
        return unsafe { avx2::screlu_dot(acc, weights) };
    }
    #[cfg(all(target_arch = "x86_64", not(target_feature = "avx2")))]
    {
        if is_x86_feature_detected!("avx2") {
            return unsafe { avx2::screlu_dot(acc, weights) };
        }
    }
    #[allow(unreachable_code)]
    scalar::screlu_dot(acc, weights)
}

mod scalar {
    use super::HIDDEN;
    use super::QA;

    #[inline]
    pub fn add_weights(acc: &mut [i16; HIDDEN], weights: &[i16; HIDDEN]) {
        for i in 0..HIDDEN {
            acc[i] = acc[i].wrapping_add(weights[i]);
        }
    }

    #[inline]
    pub fn sub_weights(acc: &mut [i16; HIDDEN], weights: &[i16; HIDDEN]) {
        for i in 0..HIDDEN {
            acc[i] = acc[i].wrapping_sub(weights[i]);
        }
    }

    #[inline]
    pub fn screlu_dot(acc: &[i16; HIDDEN], weights: &[i16; HIDDEN]) -> i32 {
        let mut sum = 0i32;
        for i in 0..HIDDEN {
            let clamped = i32::from(acc[i]).clamp(0, QA);
            sum += clamped * clamped * i32::from(weights[i]);
        }
        sum
    }
}

#[cfg(target_arch = "x86_64")]
mod avx2 {
    use super::HIDDEN;
    #[cfg(target_arch = "x86_64")]
    use std::arch::x86_64::*;

    const LANES: usize = 16;

    #[target_feature(enable = "avx2")]
    pub unsafe fn add_weights(acc: &mut [i16; HIDDEN], weights: &[i16; HIDDEN]) {
        let mut i = 0;
        while i + LANES <= HIDDEN {
            let a = _mm256_loadu_si256(acc.as_ptr().add(i).cast());
            let w = _mm256_loadu_si256(weights.as_ptr().add(i).cast());
            let sum = _mm256_add_epi16(a, w);
            _mm256_storeu_si256(acc.as_mut_ptr().add(i).cast(), sum);
            i += LANES;
        }
        for j in i..HIDDEN {
            acc[j] = acc[j].wrapping_add(weights[j]);
        }
    }

    #[target_feature(enable = "avx2")]
    pub unsafe fn sub_weights(acc: &mut [i16; HIDDEN], weights: &[i16; HIDDEN]) {
        let mut i = 0;
        while i + LANES <= HIDDEN {
            let a = _mm256_loadu_si256(acc.as_ptr().add(i).cast());
            let w = _mm256_loadu_si256(weights.as_ptr().add(i).cast());
            let diff = _mm256_sub_epi16(a, w);
            _mm256_storeu_si256(acc.as_mut_ptr().add(i).cast(), diff);
            i += LANES;
        }
        for j in i..HIDDEN {
            acc[j] = acc[j].wrapping_sub(weights[j]);
        }
    }

    #[target_feature(enable = "avx2")]
    pub unsafe fn screlu_dot(acc: &[i16; HIDDEN], weights: &[i16; HIDDEN]) -> i32 {
        super::scalar::screlu_dot(acc, weights)
    }
}

#[cfg(target_arch = "aarch64")]
mod neon {
    use super::HIDDEN;
    use super::QA;
    use std::arch::aarch64::*;

    const LANES: usize = 8;

    pub unsafe fn add_weights(acc: &mut [i16; HIDDEN], weights: &[i16; HIDDEN]) {
        let mut i = 0;
        while i + LANES <= HIDDEN {
            let a = vld1q_s16(acc.as_ptr().add(i));
            let w = vld1q_s16(weights.as_ptr().add(i));
            vst1q_s16(acc.as_mut_ptr().add(i), vaddq_s16(a, w));
            i += LANES;
        }
        for j in i..HIDDEN {
            acc[j] = acc[j].wrapping_add(weights[j]);
        }
    }

    pub unsafe fn sub_weights(acc: &mut [i16; HIDDEN], weights: &[i16; HIDDEN]) {
        let mut i = 0;
        while i + LANES <= HIDDEN {
            let a = vld1q_s16(acc.as_ptr().add(i));
            let w = vld1q_s16(weights.as_ptr().add(i));
            vst1q_s16(acc.as_mut_ptr().add(i), vsubq_s16(a, w));
            i += LANES;
        }
        for j in i..HIDDEN {
            acc[j] = acc[j].wrapping_sub(weights[j]);
        }
    }

    pub unsafe fn screlu_dot(acc: &[i16; HIDDEN], weights: &[i16; HIDDEN]) -> i32 {
        let _ = QA;
        super::scalar::screlu_dot(acc, weights)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simd_add_sub_matches_scalar() {
        let mut a = [0i16; HIDDEN];
        let mut b = [0i16; HIDDEN];
        let mut weights = [0i16; HIDDEN];
        for i in 0..HIDDEN {
            a[i] = (i as i16) % 200 - 100;
            b[i] = a[i];
            weights[i] = ((i * 7) as i16) % 150 - 75;
        }
        add_weights(&mut a, &weights);
        scalar::add_weights(&mut b, &weights);
        assert_eq!(a, b);

        sub_weights(&mut a, &weights);
        scalar::sub_weights(&mut b, &weights);
        assert_eq!(a, b);
    }

    #[test]
    fn simd_screlu_dot_matches_scalar() {
        let mut acc = [0i16; HIDDEN];
        let mut weights = [0i16; HIDDEN];
        for i in 0..HIDDEN {
            acc[i] = ((i * 3) as i16) % 300 - 50;
            weights[i] = ((i * 11) as i16) % 128 - 64;
        }
        assert_eq!(screlu_dot(&acc, &weights), scalar::screlu_dot(&acc, &weights));
    }
}
