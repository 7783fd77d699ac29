//! Gradient (Perlin) noise.

use crate::sampling::random_unit_vector;
use ember_math::Vec3;
use rand::seq::SliceRandom;
use rand::RngCore;

const POINT_COUNT: usize = 256;

/// Lattice gradient noise with Hermite-smoothed interpolation.
#[derive(Debug, Clone)]
pub struct Perlin {
    randvec: Vec<Vec3>,
    perm_x: Vec<usize>,
    perm_y: Vec<usize>,
    perm_z: Vec<usize>,
}

impl Perlin {
    pub fn new(rng: &mut dyn RngCore) -> Self {
        let randvec = (0..POINT_COUNT).map(|_| random_unit_vector(rng)).collect();
        Self {
            randvec,
            perm_x: Self::generate_perm(rng),
            perm_y: Self::generate_perm(rng),
            perm_z: Self::generate_perm(rng),
        }
    }

    fn generate_perm(rng: &mut dyn RngCore) -> Vec<usize> {
        let mut perm: Vec<usize> = (0..POINT_COUNT).collect();
        perm.shuffle(rng);
        perm
    }

    /// Noise value at `p`, roughly in [-1, 1]. Zero on integer lattice points.
    pub fn noise(&self, p: Vec3) -> f32 {
        let floor = p.floor();
        let (u, v, w) = (p.x - floor.x, p.y - floor.y, p.z - floor.z);
        let (i, j, k) = (floor.x as i64, floor.y as i64, floor.z as i64);

        let uu = u * u * (3.0 - 2.0 * u);
        let vv = v * v * (3.0 - 2.0 * v);
        let ww = w * w * (3.0 - 2.0 * w);

        let mut accum = 0.0;
        for di in 0..2i64 {
            for dj in 0..2i64 {
                for dk in 0..2i64 {
                    let gradient = self.randvec[self.perm_x[((i + di) & 255) as usize]
                        ^ self.perm_y[((j + dj) & 255) as usize]
                        ^ self.perm_z[((k + dk) & 255) as usize]];

                    let (fi, fj, fk) = (di as f32, dj as f32, dk as f32);
                    let weight = Vec3::new(u - fi, v - fj, w - fk);
                    accum += (fi * uu + (1.0 - fi) * (1.0 - uu))
                        * (fj * vv + (1.0 - fj) * (1.0 - vv))
                        * (fk * ww + (1.0 - fk) * (1.0 - ww))
                        * gradient.dot(weight);
                }
            }
        }
        accum
    }

    /// Sum of `depth` octaves, each at double the frequency and half the
    /// weight of the previous one. Always non-negative.
    pub fn turb(&self, p: Vec3, depth: u32) -> f32 {
        let mut accum = 0.0;
        let mut temp_p = p;
        let mut weight = 1.0;

        for _ in 0..depth {
            accum += weight * self.noise(temp_p);
            weight *= 0.5;
            temp_p *= 2.0;
        }

        accum.abs()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn perlin(seed: u64) -> Perlin {
        Perlin::new(&mut StdRng::seed_from_u64(seed))
    }

    #[test]
    fn test_noise_vanishes_on_lattice() {
        let noise = perlin(3);
        for p in [Vec3::ZERO, Vec3::new(1.0, 2.0, 3.0), Vec3::new(-4.0, 7.0, -1.0)] {
            assert!(noise.noise(p).abs() < 1e-6);
        }
    }

    #[test]
    fn test_noise_is_bounded_and_deterministic() {
        let a = perlin(42);
        let b = perlin(42);
        let mut any_nonzero = false;
        for i in 0..200 {
            let p = Vec3::new(i as f32 * 0.37, i as f32 * -0.11, i as f32 * 0.23);
            let n = a.noise(p);
            assert!(n.abs() <= 1.5, "noise {n} out of range at {p:?}");
            assert_eq!(n, b.noise(p));
            any_nonzero |= n.abs() > 1e-3;
        }
        assert!(any_nonzero);
    }

    #[test]
    fn test_turbulence_is_non_negative() {
        let noise = perlin(9);
        for i in 0..100 {
            let p = Vec3::new(i as f32 * 0.53, 1.7, i as f32 * -0.29);
            assert!(noise.turb(p, 7) >= 0.0);
        }
        assert_eq!(noise.turb(Vec3::new(0.3, 0.3, 0.3), 0), 0.0);
    }
}
